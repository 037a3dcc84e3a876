use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use ndarray::{Array3, ArrayView3};
use tracing::debug;

use crate::error::{Error, Result};

/// Dimensions `(cols, rows)` after scaling so that `rows == target_rows`.
/// Width follows proportionally, rounded down, never below one pixel.
pub fn fixed_height_dimensions(cols: usize, rows: usize, target_rows: usize) -> (usize, usize) {
    let new_cols = (cols * target_rows / rows.max(1)).max(1);
    (new_cols, target_rows)
}

/// Dimensions `(cols, rows)` after scaling so that the short side equals
/// `target_size`. A square image scales by its width.
pub fn short_side_dimensions(cols: usize, rows: usize, target_size: usize) -> (usize, usize) {
    if cols > rows {
        let new_cols = (cols * target_size / rows.max(1)).max(1);
        (new_cols, target_size)
    } else {
        let new_rows = (rows * target_size / cols.max(1)).max(1);
        (target_size, new_rows)
    }
}

fn pixel_type(channels: usize) -> Result<PixelType> {
    match channels {
        1 => Ok(PixelType::U8),
        3 => Ok(PixelType::U8x3),
        4 => Ok(PixelType::U8x4),
        other => Err(Error::InvalidArgument {
            arg: "channels",
            value: other.to_string(),
        }),
    }
}

/// Bilinear resize of an `(height, width, channels)` image.
pub fn resize_image(
    img: ArrayView3<'_, u8>,
    target_cols: usize,
    target_rows: usize,
) -> Result<Array3<u8>> {
    let (rows, cols, channels) = img.dim();
    if rows == target_rows && cols == target_cols {
        return Ok(img.to_owned());
    }
    if target_rows == 0 || target_cols == 0 {
        return Err(Error::InvalidArgument {
            arg: "size",
            value: format!("{}x{}", target_cols, target_rows),
        });
    }
    let pixel_type = pixel_type(channels)?;

    debug!(
        "Resizing {}x{} -> {}x{} ({} channels)",
        cols, rows, target_cols, target_rows, channels
    );

    let resize_options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
    let mut resizer = Resizer::new();

    let src_image = Image::from_vec_u8(
        cols as u32,
        rows as u32,
        img.iter().copied().collect(),
        pixel_type,
    )?;
    let mut dst_image = Image::new(target_cols as u32, target_rows as u32, pixel_type);
    resizer.resize(&src_image, &mut dst_image, &resize_options)?;

    Ok(Array3::from_shape_vec(
        (target_rows, target_cols, channels),
        dst_image.into_vec(),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_height_keeps_aspect() {
        assert_eq!(fixed_height_dimensions(400, 80, 40), (200, 40));
        assert_eq!(fixed_height_dimensions(3, 100, 40), (1, 40));
    }

    #[test]
    fn short_side_hits_target() {
        assert_eq!(short_side_dimensions(500, 375, 256), (341, 256));
        assert_eq!(short_side_dimensions(375, 500, 256), (256, 341));
        assert_eq!(short_side_dimensions(300, 300, 256), (256, 256));
    }

    #[test]
    fn resize_produces_requested_shape() {
        let img = Array3::<u8>::from_elem((10, 20, 3), 128);
        let out = resize_image(img.view(), 7, 5).unwrap();
        assert_eq!(out.dim(), (5, 7, 3));
        assert!(out.iter().all(|&v| v.abs_diff(128) <= 1));
    }

    #[test]
    fn identity_resize_is_a_copy() {
        let img = Array3::<u8>::from_shape_fn((2, 3, 1), |(r, c, _)| (r * 3 + c) as u8);
        assert_eq!(resize_image(img.view(), 3, 2).unwrap(), img);
    }

    #[test]
    fn two_channel_images_are_rejected() {
        let img = Array3::<u8>::zeros((4, 4, 2));
        assert!(resize_image(img.view(), 2, 2).is_err());
    }
}
