use std::path::Path;

use ndarray::{Array2, Array3};
use tracing::debug;

use crate::core::processing::crop::{crop_to_bbox, ten_crops};
use crate::core::processing::features::image_to_features;
use crate::core::processing::resize::{
    fixed_height_dimensions, resize_image, short_side_dimensions,
};
use crate::error::{Error, Result};
use crate::io::{load_gray, load_rgb, read_bbox};

/// Grayscale line image scaled to `scale_size` rows, as a feature matrix.
pub fn line_image_features(image_path: &Path, scale_size: usize) -> Result<Array2<f64>> {
    let img = load_gray(image_path)?;
    let (rows, cols, _) = img.dim();
    let (new_cols, new_rows) = fixed_height_dimensions(cols, rows, scale_size);
    let scaled = resize_image(img.view(), new_cols, new_rows)?;
    image_to_features(scaled.view())
}

fn ensure_not_empty(img: &Array3<u8>, image_path: &Path) -> Result<()> {
    let (rows, cols, _) = img.dim();
    if rows == 0 || cols == 0 {
        return Err(Error::EmptyImage(image_path.to_path_buf()));
    }
    Ok(())
}

/// RGB image cropped to its annotated bounding box, as a feature matrix.
pub fn bbox_image_features(image_path: &Path, bbox_path: &Path) -> Result<Array2<f64>> {
    let img = load_rgb(image_path)?;
    let bbox = read_bbox(bbox_path)?;
    let cropped = crop_to_bbox(img.view(), &bbox);
    debug!("{:?}: bbox {:?} -> {:?}", image_path, bbox, cropped.dim());
    ensure_not_empty(&cropped, image_path)?;
    image_to_features(cropped.view())
}

/// Bounding-box crop rescaled to `scale_size` on the short side, then cut
/// into ten `crop_size` squares; one feature matrix per crop.
pub fn ten_crop_features(
    image_path: &Path,
    bbox_path: &Path,
    scale_size: usize,
    crop_size: usize,
) -> Result<Vec<Array2<f64>>> {
    let img = load_rgb(image_path)?;
    let bbox = read_bbox(bbox_path)?;
    let cropped = crop_to_bbox(img.view(), &bbox);
    ensure_not_empty(&cropped, image_path)?;
    let (rows, cols, _) = cropped.dim();
    let (new_cols, new_rows) = short_side_dimensions(cols, rows, scale_size);
    let scaled = resize_image(cropped.view(), new_cols, new_rows)?;

    ten_crops(scaled.view(), crop_size)
        .iter()
        .map(|c| image_to_features(c.view()))
        .collect()
}
