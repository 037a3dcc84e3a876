use ndarray::{Array2, ArrayView3};

use crate::error::Result;

/// Turn an `(height, width, channels)` image into a `width x (height * channels)`
/// feature matrix scaled to `[0, 1]`. Row `w` holds the pixels of column `w`
/// from top to bottom, channels interleaved.
pub fn image_to_features(img: ArrayView3<'_, u8>) -> Result<Array2<f64>> {
    let (rows, cols, channels) = img.dim();
    let data: Vec<f64> = img
        .permuted_axes([1, 0, 2])
        .iter()
        .map(|&v| f64::from(v) / 255.0)
        .collect();
    Ok(Array2::from_shape_vec((cols, rows * channels), data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn columns_become_rows() {
        // 2 rows x 3 cols grayscale
        let img = Array3::from_shape_vec((2, 3, 1), vec![0, 51, 102, 153, 204, 255]).unwrap();
        let f = image_to_features(img.view()).unwrap();
        assert_eq!(f.dim(), (3, 2));
        assert_eq!(f[[0, 0]], 0.0);
        assert_eq!(f[[0, 1]], 0.6);
        assert_eq!(f[[2, 0]], 0.4);
        assert_eq!(f[[2, 1]], 1.0);
    }

    #[test]
    fn channels_interleave_per_pixel() {
        let img = Array3::from_shape_fn((2, 1, 3), |(r, _, ch)| (r * 3 + ch) as u8 * 51);
        let f = image_to_features(img.view()).unwrap();
        assert_eq!(f.dim(), (1, 6));
        let row: Vec<f64> = f.row(0).to_vec();
        assert_eq!(row, vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
    }
}
