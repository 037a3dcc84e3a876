//! High-level, ergonomic library API: walk a dataset layout, run the
//! per-image pipelines, and write Kaldi archives plus their label files; or
//! build and save the decomposition matrix and topology. Prefer these entry
//! points over the low-level `core` modules when integrating featprep.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::decomp::{DecompositionMatrix, Lexicon, PhoneList, SlotLayout};
use crate::core::params::{DecompParams, IamParams, ImageNetParams};
use crate::core::processing::pipeline::{
    bbox_image_features, line_image_features, ten_crop_features,
};
use crate::error::{Error, Result};
use crate::io::SynsetTable;
use crate::io::writers::{LabelWriter, open_output, write_json_sidecar, write_kaldi_matrix};
use crate::types::{IamSplit, ImageNetSplit};

pub use crate::core::topology::{Topology, generate_topology};

/// Archive keys are 1-based counters zero-padded to eight digits.
pub fn feature_key(n: usize) -> String {
    format!("{:08}", n)
}

/// Counts from one conversion run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConversionReport {
    pub matrices: usize,
    pub labels: usize,
    pub skipped: usize,
}

/// Sorted entries of a directory.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();
    Ok(paths)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// IAM handwriting lines
// ---------------------------------------------------------------------------

pub fn iam_line_list_path(database: &Path, split: IamSplit) -> PathBuf {
    database
        .join("largeWriterIndependentTextLineRecognitionTask")
        .join(format!("{}.txt", split.list_name()))
}

/// `a01-000u-00` lives at `lines/a01/a01-000u/a01-000u-00.png`.
pub fn iam_line_image_path(database: &Path, line_id: &str) -> Result<PathBuf> {
    let mut parts = line_id.split('-');
    match (parts.next(), parts.next()) {
        (Some(form), Some(sub)) if !form.is_empty() => Ok(database
            .join("lines")
            .join(form)
            .join(format!("{}-{}", form, sub))
            .join(format!("{}.png", line_id))),
        _ => Err(Error::InvalidArgument {
            arg: "line_id",
            value: line_id.to_string(),
        }),
    }
}

/// Convert every line image of an IAM split into a feature matrix. Matrices go
/// to `out`, `key line_id` pairs to `<out_dir>/labels.txt`.
pub fn convert_iam_lines<W: Write>(
    database: &Path,
    out_dir: &Path,
    params: &IamParams,
    out: &mut W,
) -> Result<ConversionReport> {
    fs::create_dir_all(out_dir)?;
    let list_path = iam_line_list_path(database, params.dataset);
    let list = fs::read_to_string(&list_path)?;
    info!("Converting IAM {} lines from {:?}", params.dataset, list_path);

    let mut labels = LabelWriter::create(&out_dir.join("labels.txt"))?;
    let mut report = ConversionReport::default();

    for line_id in list.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let key = feature_key(report.matrices + 1);
        let image_path = iam_line_image_path(database, line_id)?;
        let features = line_image_features(&image_path, params.scale_size)?;
        debug!("{} {} -> {:?}", key, line_id, features.dim());

        write_kaldi_matrix(out, Some(&key), features.view())?;
        labels.write(&key, line_id)?;
        report.matrices += 1;
    }
    out.flush()?;
    report.labels = labels.finish()?;

    info!("IAM conversion complete: {} matrices", report.matrices);
    Ok(report)
}

// ---------------------------------------------------------------------------
// ImageNet
// ---------------------------------------------------------------------------

/// Locations derived from the devkit directory and the devkit tar name,
/// e.g. `ILSVRC2012_devkit_t12.tar.gz` -> folder `ILSVRC2012_devkit_t12`, year `ILSVRC2012`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevkitLayout {
    pub data_dir: PathBuf,
    pub year: String,
}

impl DevkitLayout {
    pub fn new(devkit: &Path, tar_name: &str) -> Self {
        let tar_folder = tar_name.split('.').next().unwrap_or(tar_name);
        let year = tar_folder.split('_').next().unwrap_or(tar_folder);
        Self {
            data_dir: devkit.join(tar_folder).join("data"),
            year: year.to_string(),
        }
    }

    pub fn meta_path(&self) -> PathBuf {
        self.data_dir.join("meta.mat")
    }

    /// Struct field holding the ILSVRC id of a synset, e.g. `ILSVRC2012_ID`.
    pub fn id_field(&self) -> String {
        format!("{}_ID", self.year)
    }

    pub fn ground_truth_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}_validation_ground_truth.txt", self.year))
    }

    /// Stem of validation image `n`, e.g. `ILSVRC2012_val_00000001`.
    pub fn val_stem(&self, n: usize) -> String {
        format!("{}_val_{}", self.year, feature_key(n))
    }
}

/// Synset table for a conversion: the devkit's `meta.mat` unless `table`
/// names another file. A `.mat` override is read the same way, anything
/// else as a `WNID ILSVRC_ID [words]` text table.
pub fn load_synsets(layout: &DevkitLayout, table: Option<&Path>) -> Result<SynsetTable> {
    match table {
        Some(path) if path.extension().is_some_and(|e| e == "mat") => {
            SynsetTable::open_mat(path, &layout.id_field())
        }
        Some(path) => SynsetTable::open(path),
        None => SynsetTable::open_mat(&layout.meta_path(), &layout.id_field()),
    }
}

/// Inputs of an ImageNet conversion
#[derive(Debug, Clone)]
pub struct ImageNetSource<'a> {
    pub database: &'a Path,
    pub bbox_root: &'a Path,
    pub devkit: &'a Path,
    pub tar_name: &'a str,
}

/// Convert ImageNet training classes or validation images into feature
/// matrices written to `out`, with `key label` lines in `<out_dir>/labels.txt`.
pub fn convert_imagenet<W: Write>(
    source: &ImageNetSource<'_>,
    out_dir: &Path,
    params: &ImageNetParams,
    out: &mut W,
) -> Result<ConversionReport> {
    fs::create_dir_all(out_dir)?;
    let layout = DevkitLayout::new(source.devkit, source.tar_name);
    let synsets = load_synsets(&layout, params.synsets.as_deref())?;
    let mut labels = LabelWriter::create(&out_dir.join("labels.txt"))?;

    info!(
        "Converting ImageNet {} set from {:?}",
        params.dataset, source.database
    );
    let mut report = match params.dataset {
        ImageNetSplit::Train => convert_imagenet_train(source, &synsets, &mut labels, out)?,
        ImageNetSplit::Test => {
            convert_imagenet_test(source, &layout, &synsets, params, &mut labels, out)?
        }
    };
    out.flush()?;
    report.labels = labels.finish()?;

    info!(
        "ImageNet conversion complete: {} matrices, {} skipped",
        report.matrices, report.skipped
    );
    Ok(report)
}

fn convert_imagenet_train<W: Write>(
    source: &ImageNetSource<'_>,
    synsets: &SynsetTable,
    labels: &mut LabelWriter,
    out: &mut W,
) -> Result<ConversionReport> {
    let mut report = ConversionReport::default();

    for class_dir in sorted_entries(source.database)? {
        if !class_dir.is_dir() {
            debug!("Skipping non-directory: {:?}", class_dir);
            continue;
        }
        let wnid = file_name(&class_dir);
        let label = synsets.label_for_wnid(&wnid)?;
        info!("Class {} -> label {}", wnid, label);

        for image_path in sorted_entries(&class_dir)? {
            if !image_path.is_file() {
                continue;
            }
            let name = file_name(&image_path);
            let stem = name.split('.').next().unwrap_or(&name);
            let bbox_path = source.bbox_root.join(&wnid).join(format!("{}.xml", stem));

            let key = feature_key(report.matrices + 1);
            let features = bbox_image_features(&image_path, &bbox_path)?;
            write_kaldi_matrix(out, Some(&key), features.view())?;
            labels.write(&key, label)?;
            report.matrices += 1;
        }
    }
    Ok(report)
}

fn convert_imagenet_test<W: Write>(
    source: &ImageNetSource<'_>,
    layout: &DevkitLayout,
    synsets: &SynsetTable,
    params: &ImageNetParams,
    labels: &mut LabelWriter,
    out: &mut W,
) -> Result<ConversionReport> {
    let gt_path = layout.ground_truth_path();
    let ground_truth = fs::read_to_string(&gt_path)?;
    let mut report = ConversionReport::default();

    // Every ground-truth line consumes an image id, kept or not.
    for (n, line) in ground_truth.lines().enumerate() {
        let image_id = n + 1;
        let line = line.trim();
        let ilsvrc_id = line
            .parse::<i64>()
            .map_err(|e| Error::parse(&gt_path, image_id, format!("{:?}: {}", line, e)))?;
        if ilsvrc_id <= 0 {
            warn!("Skipping validation image {} with id {}", image_id, ilsvrc_id);
            report.skipped += 1;
            continue;
        }
        let label = synsets.label_for_id(ilsvrc_id)?;

        let stem = layout.val_stem(image_id);
        let image_path = source.database.join(format!("{}.JPEG", stem));
        let bbox_path = source.bbox_root.join("val").join(format!("{}.xml", stem));

        let crops =
            ten_crop_features(&image_path, &bbox_path, params.scale_size, params.crop_size)?;
        for features in crops {
            let key = feature_key(report.matrices + 1);
            write_kaldi_matrix(out, Some(&key), features.view())?;
            labels.write(&key, label)?;
            report.matrices += 1;
        }
    }
    Ok(report)
}

// ---------------------------------------------------------------------------
// Decomposition matrix
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct DecompSidecar<'a> {
    layout: SlotLayout,
    params: &'a DecompParams,
    phones: &'a Path,
    lexicon: &'a Path,
    rows: usize,
    cols: usize,
}

/// Build the decomposition matrix from a phone list and a lexicon.
pub fn build_decomposition_matrix(
    phones_path: &Path,
    lexicon_path: &Path,
    params: &DecompParams,
) -> Result<DecompositionMatrix> {
    let lexicon = Lexicon::open(lexicon_path, params.variant)?;
    let phones = PhoneList::open(phones_path)?;
    DecompositionMatrix::build(&lexicon, &phones, params)
}

/// Build the matrix and write `decomp.dim`, `decomp.json` and the transposed
/// matrix into `out_dir`. `out_mat` overrides the matrix destination
/// (`-` for stdout); by default it is `<out_dir>/decomp.mat`.
pub fn write_decomposition_matrix(
    phones_path: &Path,
    lexicon_path: &Path,
    out_dir: &Path,
    out_mat: Option<&str>,
    params: &DecompParams,
) -> Result<DecompositionMatrix> {
    fs::create_dir_all(out_dir)?;
    let decomp = build_decomposition_matrix(phones_path, lexicon_path, params)?;
    let (rows, cols) = decomp.matrix.dim();

    fs::write(out_dir.join("decomp.dim"), format!("{} {}\n", rows, cols))?;
    write_json_sidecar(
        &out_dir.join("decomp.json"),
        &DecompSidecar {
            layout: decomp.layout,
            params,
            phones: phones_path,
            lexicon: lexicon_path,
            rows,
            cols,
        },
    )?;

    let mat_target = match out_mat {
        Some(p) => p.to_string(),
        None => out_dir.join("decomp.mat").to_string_lossy().into_owned(),
    };
    let mut out = open_output(&mat_target)?;
    write_kaldi_matrix(&mut out, None, decomp.matrix.t())?;
    out.flush()?;

    info!("Wrote {}x{} decomposition matrix to {}", cols, rows, mat_target);
    Ok(decomp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::mat::fixture::synsets_mat;

    #[test]
    fn keys_are_zero_padded() {
        assert_eq!(feature_key(1), "00000001");
        assert_eq!(feature_key(123456789), "123456789");
    }

    #[test]
    fn iam_paths_follow_form_layout() {
        let db = Path::new("/db");
        assert_eq!(
            iam_line_image_path(db, "a01-000u-00").unwrap(),
            PathBuf::from("/db/lines/a01/a01-000u/a01-000u-00.png")
        );
        assert!(iam_line_image_path(db, "nodash").is_err());
        assert_eq!(
            iam_line_list_path(db, IamSplit::Testset),
            PathBuf::from("/db/largeWriterIndependentTextLineRecognitionTask/testset.txt")
        );
    }

    #[test]
    fn devkit_layout_from_tar_name() {
        let l = DevkitLayout::new(Path::new("/dk"), "ILSVRC2012_devkit_t12.tar.gz");
        assert_eq!(l.year, "ILSVRC2012");
        assert_eq!(l.data_dir, PathBuf::from("/dk/ILSVRC2012_devkit_t12/data"));
        assert_eq!(
            l.ground_truth_path(),
            PathBuf::from("/dk/ILSVRC2012_devkit_t12/data/ILSVRC2012_validation_ground_truth.txt")
        );
        assert_eq!(l.val_stem(42), "ILSVRC2012_val_00000042");
        assert_eq!(l.meta_path(), PathBuf::from("/dk/ILSVRC2012_devkit_t12/data/meta.mat"));
        assert_eq!(l.id_field(), "ILSVRC2012_ID");
    }

    #[test]
    fn synsets_default_to_devkit_meta_mat() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DevkitLayout::new(dir.path(), "ILSVRC2012_devkit_t12.tar.gz");
        fs::create_dir_all(&layout.data_dir).unwrap();
        fs::write(
            layout.meta_path(),
            synsets_mat(&[(1.0, "n01440764"), (2.0, "n01443537")], true),
        )
        .unwrap();

        let table = load_synsets(&layout, None).unwrap();
        assert_eq!(table.label_for_wnid("n01443537").unwrap(), 1);

        let text = dir.path().join("synsets.txt");
        fs::write(&text, "n09999999 7 other\n").unwrap();
        let table = load_synsets(&layout, Some(&text)).unwrap();
        assert_eq!(table.label_for_id(7).unwrap(), 0);

        let missing = dir.path().join("nowhere.mat");
        assert!(load_synsets(&layout, Some(&missing)).is_err());
    }
}
