//! Seam-selection mask: rasterize, threshold, dilate by the band radius.

use image::GrayImage;

use crate::buffer::MaskBuf;
use crate::config::SeamRepairConfig;
use crate::sample::uv_to_pixel;
use crate::seam::SeamPair;

/// Nearest-neighbor-resamples `src` to `(width, height)`, thresholds at
/// `threshold`, and returns the boolean mask. Without a mask image, the
/// mask is all-true.
pub fn build_mask(
    src: Option<&GrayImage>,
    width: usize,
    height: usize,
    threshold: u8,
) -> MaskBuf {
    let Some(src) = src else {
        return MaskBuf::filled(width, height, true);
    };

    let (sw, sh) = (src.width().max(1), src.height().max(1));
    let mut mask = MaskBuf::filled(width, height, false);
    for y in 0..height {
        let sy = (y * sh as usize / height.max(1)).min(sh as usize - 1);
        for x in 0..width {
            let sx = (x * sw as usize / width.max(1)).min(sw as usize - 1);
            let value = src.get_pixel(sx as u32, sy as u32).0[0];
            mask.set(x, y, value >= threshold);
        }
    }
    mask
}

/// Dilates `mask` by `radius` iterations of a 3x3 morphological max,
/// using edge-replicated neighbor access (no wrap).
pub fn dilate(mask: &MaskBuf, radius: u32) -> MaskBuf {
    if radius == 0 {
        return mask.clone();
    }
    let mut current = mask.clone();
    for _ in 0..radius {
        let mut next = MaskBuf::filled(current.width(), current.height(), false);
        for y in 0..current.height() {
            for x in 0..current.width() {
                let mut hit = false;
                for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        if current.get_clamped(x as i64 + dx, y as i64 + dy) {
                            hit = true;
                        }
                    }
                }
                next.set(x, y, hit);
            }
        }
        current = next;
    }
    current
}

/// Decides whether a seam should be processed: always true unless a mask
/// is supplied and `only_masked_seams` is set, in which case the seam is
/// selected only if one of a handful of edge samples lands inside the
/// (already-dilated) mask.
pub fn seam_is_selected(
    pair: &SeamPair,
    mask: &MaskBuf,
    config: &SeamRepairConfig,
    has_mask_input: bool,
) -> bool {
    if !has_mask_input || !config.only_masked_seams {
        return true;
    }

    const PROBE_T: [f32; 5] = [0.1, 0.3, 0.5, 0.7, 0.9];
    let w = mask.width();
    let h = mask.height();

    for &t in &PROBE_T {
        let uv_a = pair.a.uv0 * (1.0 - t) + pair.a.uv1 * t;
        let uv_b = pair.b.uv0 * (1.0 - t) + pair.b.uv1 * t;
        let (xa, ya) = uv_to_pixel(uv_a, w, h, config.v_flip);
        let (xb, yb) = uv_to_pixel(uv_b, w, h, config.v_flip);

        if in_mask(mask, xa, ya) || in_mask(mask, xb, yb) {
            return true;
        }
    }
    false
}

fn in_mask(mask: &MaskBuf, x: f32, y: f32) -> bool {
    let ix = x.round() as i64;
    let iy = y.round() as i64;
    if ix < 0 || iy < 0 || ix >= mask.width() as i64 || iy >= mask.height() as i64 {
        return false;
    }
    mask.get(ix as usize, iy as usize)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn no_mask_is_all_true() {
        let mask = build_mask(None, 4, 4, 16);
        assert!(mask.data().iter().all(|&b| b));
    }

    #[test]
    fn threshold_splits_black_white() {
        let mut img = GrayImage::new(2, 1);
        img.put_pixel(0, 0, image::Luma([0]));
        img.put_pixel(1, 0, image::Luma([255]));
        let mask = build_mask(Some(&img), 2, 1, 16);
        assert!(!mask.get(0, 0));
        assert!(mask.get(1, 0));
    }

    #[test]
    fn dilate_zero_is_identity() {
        let mut mask = MaskBuf::filled(3, 3, false);
        mask.set(1, 1, true);
        let dilated = dilate(&mask, 0);
        assert!(dilated.get(1, 1));
        assert!(!dilated.get(0, 0));
    }

    #[test]
    fn dilate_one_expands_by_one_ring() {
        let mut mask = MaskBuf::filled(5, 5, false);
        mask.set(2, 2, true);
        let dilated = dilate(&mask, 1);
        for y in 1..=3usize {
            for x in 1..=3usize {
                assert!(dilated.get(x, y), "expected ({x},{y}) set");
            }
        }
        assert!(!dilated.get(0, 0));
    }
}
