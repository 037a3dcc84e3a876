use std::path::Path;

use image::ImageReader;
use ndarray::Array3;
use tracing::debug;

use crate::error::{Error, Result};

/// Decode by content, falling back to the extension. Some ImageNet `.JPEG`
/// files hold PNG data.
fn decode(path: &Path) -> Result<image::DynamicImage> {
    Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?)
}

/// Decode an image as 8-bit grayscale, shaped `(height, width, 1)`.
pub fn load_gray(path: &Path) -> Result<Array3<u8>> {
    let img = decode(path)?.to_luma8();
    let (w, h) = img.dimensions();
    to_array(path, h as usize, w as usize, 1, img.into_raw())
}

/// Decode an image as 8-bit RGB, shaped `(height, width, 3)`. Grayscale
/// sources are replicated into all three channels.
pub fn load_rgb(path: &Path) -> Result<Array3<u8>> {
    let img = decode(path)?.to_rgb8();
    let (w, h) = img.dimensions();
    to_array(path, h as usize, w as usize, 3, img.into_raw())
}

fn to_array(path: &Path, h: usize, w: usize, c: usize, raw: Vec<u8>) -> Result<Array3<u8>> {
    if h == 0 || w == 0 {
        return Err(Error::EmptyImage(path.to_path_buf()));
    }
    debug!("Loaded {:?}: {}x{}x{}", path, w, h, c);
    Ok(Array3::from_shape_vec((h, w, c), raw)?)
}
