use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::types::{DecompVariant, IamSplit, ImageNetSplit};

/// IAM line-image conversion parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IamParams {
    pub dataset: IamSplit,
    /// Height every line image is scaled to
    pub scale_size: usize,
}

impl Default for IamParams {
    fn default() -> Self {
        Self {
            dataset: IamSplit::Trainset,
            scale_size: 40,
        }
    }
}

/// ImageNet conversion parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageNetParams {
    pub dataset: ImageNetSplit,
    /// Short side of a test image before cropping
    pub scale_size: usize,
    /// Side of each square test crop
    pub crop_size: usize,
    /// Synset table (`.mat` or text); None means `<devkit>/<tar_folder>/data/meta.mat`
    pub synsets: Option<PathBuf>,
}

impl Default for ImageNetParams {
    fn default() -> Self {
        Self {
            dataset: ImageNetSplit::Train,
            scale_size: 256,
            crop_size: 224,
            synsets: None,
        }
    }
}

/// Decomposition-matrix parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompParams {
    pub variant: DecompVariant,
    /// Upper bound of the uniform background noise; 0 leaves the background at zero
    pub noise_scale: f64,
    pub seed: u64,
}

impl Default for DecompParams {
    fn default() -> Self {
        Self {
            variant: DecompVariant::Plain,
            noise_scale: 0.0,
            seed: 0,
        }
    }
}

/// Load a params struct from a JSON config file. Missing fields take their defaults.
pub fn load_params<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let p: ImageNetParams = serde_json::from_str(r#"{"dataset":"test","crop_size":112}"#).unwrap();
        assert_eq!(p.dataset, ImageNetSplit::Test);
        assert_eq!(p.crop_size, 112);
        assert_eq!(p.scale_size, 256);
        assert!(p.synsets.is_none());
    }

    #[test]
    fn load_params_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decomp.json");
        std::fs::write(&path, r#"{"variant":"positional","noise_scale":0.001}"#).unwrap();
        let p: DecompParams = load_params(&path).unwrap();
        assert_eq!(p.variant, DecompVariant::Positional);
        assert_eq!(p.noise_scale, 0.001);
        assert_eq!(p.seed, 0);
    }
}
