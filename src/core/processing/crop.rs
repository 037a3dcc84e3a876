use ndarray::{Array3, ArrayView3, s};
use tracing::debug;

use crate::io::BoundingBox;

/// Copy `img[top..bottom, left..right]`, clamping all bounds to the image.
pub fn crop(img: ArrayView3<'_, u8>, top: i64, bottom: i64, left: i64, right: i64) -> Array3<u8> {
    let (rows, cols, _) = img.dim();
    let clamp = |v: i64, max: usize| v.clamp(0, max as i64) as usize;
    let (t, b) = (clamp(top, rows), clamp(bottom, rows));
    let (l, r) = (clamp(left, cols), clamp(right, cols));
    img.slice(s![t..b.max(t), l..r.max(l), ..]).to_owned()
}

pub fn crop_to_bbox(img: ArrayView3<'_, u8>, bbox: &BoundingBox) -> Array3<u8> {
    crop(img, bbox.ymin, bbox.ymax, bbox.xmin, bbox.xmax)
}

/// Mirror left to right.
pub fn flip_lr(img: ArrayView3<'_, u8>) -> Array3<u8> {
    img.slice(s![.., ..;-1, ..]).to_owned()
}

/// Four corner crops and the center crop, followed by the mirror of each.
pub fn ten_crops(img: ArrayView3<'_, u8>, crop_size: usize) -> Vec<Array3<u8>> {
    let (rows, cols, _) = img.dim();
    let (h, w, c) = (rows as i64, cols as i64, crop_size as i64);

    let center_left = (w as f64 / 2.0 - c as f64 / 2.0).max(0.0) as i64;
    let center_top = (h as f64 / 2.0 - c as f64 / 2.0).max(0.0) as i64;

    debug!("Ten-crop {}x{} with crop size {}", cols, rows, crop_size);

    let unflipped = [
        crop(img, 0, c, 0, c),
        crop(img, 0, c, w - c, w),
        crop(img, h - c, h, 0, c),
        crop(img, h - c, h, w - c, w),
        crop(img, center_top, center_top + c, center_left, center_left + c),
    ];
    let flipped: Vec<Array3<u8>> = unflipped.iter().map(|im| flip_lr(im.view())).collect();

    unflipped.into_iter().chain(flipped).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(rows: usize, cols: usize) -> Array3<u8> {
        Array3::from_shape_fn((rows, cols, 1), |(r, c, _)| (r * cols + c) as u8)
    }

    #[test]
    fn crop_clamps_out_of_range_bounds() {
        let img = ramp(4, 5);
        let out = crop(img.view(), -3, 2, 3, 99);
        assert_eq!(out.dim(), (2, 2, 1));
        assert_eq!(out[[0, 0, 0]], 3);
        assert_eq!(out[[1, 1, 0]], 9);
    }

    #[test]
    fn inverted_bounds_give_empty_crop() {
        let img = ramp(4, 5);
        assert_eq!(crop(img.view(), 3, 1, 0, 5).dim(), (0, 5, 1));
    }

    #[test]
    fn bbox_crop_uses_xy_order() {
        let img = ramp(6, 6);
        let b = BoundingBox {
            xmin: 1,
            ymin: 2,
            xmax: 4,
            ymax: 3,
        };
        let out = crop_to_bbox(img.view(), &b);
        assert_eq!(out.dim(), (1, 3, 1));
        assert_eq!(out[[0, 0, 0]], 13);
    }

    #[test]
    fn flip_reverses_columns() {
        let img = ramp(1, 3);
        let out = flip_lr(img.view());
        assert_eq!(out.iter().copied().collect::<Vec<_>>(), vec![2, 1, 0]);
    }

    #[test]
    fn ten_crops_are_corners_center_then_mirrors() {
        let img = ramp(6, 8);
        let crops = ten_crops(img.view(), 4);
        assert_eq!(crops.len(), 10);
        assert!(crops.iter().all(|c| c.dim() == (4, 4, 1)));
        // top-left, top-right, bottom-left, bottom-right, center
        assert_eq!(crops[0][[0, 0, 0]], 0);
        assert_eq!(crops[1][[0, 0, 0]], 4);
        assert_eq!(crops[2][[0, 0, 0]], 16);
        assert_eq!(crops[3][[0, 0, 0]], 20);
        assert_eq!(crops[4][[0, 0, 0]], 10);
        for i in 0..5 {
            assert_eq!(crops[i + 5], flip_lr(crops[i].view()));
        }
    }
}
