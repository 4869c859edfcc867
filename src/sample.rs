//! Bilinear gather/scatter primitives shared by the band splatter, color
//! statistics, and mask-based seam selection.

use nalgebra::Vector2;

use crate::buffer::{Image1f, Image3f, MaskBuf};
use nalgebra::Vector3;

/// Maps a UV coordinate to continuous pixel coordinates. `v_flip` applies
/// the DCC convention where `v = 0` is the bottom of the image.
#[inline]
pub fn uv_to_pixel(uv: Vector2<f32>, width: usize, height: usize, v_flip: bool) -> (f32, f32) {
    let x = uv.x * (width.max(1) - 1) as f32;
    let v = if v_flip { 1.0 - uv.y } else { uv.y };
    let y = v * (height.max(1) - 1) as f32;
    (x, y)
}

/// Converts a UV-space inward direction to a pixel-normalized direction:
/// scale componentwise by `(W-1, H-1)` and renormalize, so the band width
/// stays stable in pixels regardless of UV anisotropy (spec §4.8). Returns
/// zero if the scaled direction is degenerate.
#[inline]
pub fn to_pixel_direction(dir_uv: Vector2<f32>, width: usize, height: usize) -> Vector2<f32> {
    let scale = Vector2::new((width.max(1) - 1) as f32, (height.max(1) - 1) as f32);
    let scaled = dir_uv.component_mul(&scale);
    let len = scaled.norm();
    if len > 1e-9 {
        scaled / len
    } else {
        Vector2::zeros()
    }
}

/// Bilinearly gathers a color from `image` at continuous pixel coordinate
/// `(x, y)`, clamping the coordinate (and its footprint) to the image
/// bounds rather than wrapping.
pub fn gather_bilinear(image: &Image3f, x: f32, y: f32) -> Vector3<f32> {
    let w = image.width();
    let h = image.height();
    if w <= 1 || h <= 1 {
        let cx = (x.round() as i64).clamp(0, w as i64 - 1) as usize;
        let cy = (y.round() as i64).clamp(0, h as i64 - 1) as usize;
        return image.get(cx, cy);
    }

    let x = x.clamp(0.0, (w - 1) as f32);
    let y = y.clamp(0.0, (h - 1) as f32);
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let tx = x - x0 as f32;
    let ty = y - y0 as f32;

    let c00 = image.get(x0, y0);
    let c10 = image.get(x1, y0);
    let c01 = image.get(x0, y1);
    let c11 = image.get(x1, y1);
    let c0 = c00 * (1.0 - tx) + c10 * tx;
    let c1 = c01 * (1.0 - tx) + c11 * tx;
    c0 * (1.0 - ty) + c1 * ty
}

/// Distributes `color * weight` to the four pixels neighboring continuous
/// coordinate `(x, y)`, each weighted by its bilinear footprint, but only
/// into accumulator cells where `mask` is true.
#[allow(clippy::too_many_arguments)]
pub fn splat_bilinear(
    acc: &mut Image3f,
    wacc: &mut Image1f,
    mask: &MaskBuf,
    x: f32,
    y: f32,
    color: Vector3<f32>,
    weight: f32,
) {
    let w = wacc.width();
    let h = wacc.height();
    let x = x.clamp(0.0, (w - 1) as f32);
    let y = y.clamp(0.0, (h - 1) as f32);
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let tx = x - x0 as f32;
    let ty = y - y0 as f32;

    let w00 = (1.0 - tx) * (1.0 - ty) * weight;
    let w10 = tx * (1.0 - ty) * weight;
    let w01 = (1.0 - tx) * ty * weight;
    let w11 = tx * ty * weight;

    let mut deposit = |px: usize, py: usize, w: f32| {
        if w > 0.0 && mask.get(px, py) {
            acc.add_at(px, py, color * w);
            wacc.add_at(px, py, w);
        }
    };
    deposit(x0, y0, w00);
    deposit(x1, y0, w10);
    deposit(x0, y1, w01);
    deposit(x1, y1, w11);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn gather_is_exact_at_integer_coords() {
        let mut img = Image3f::zeros(2, 2);
        img.set(0, 0, Vector3::new(1.0, 0.0, 0.0));
        img.set(1, 0, Vector3::new(0.0, 1.0, 0.0));
        img.set(0, 1, Vector3::new(0.0, 0.0, 1.0));
        img.set(1, 1, Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(gather_bilinear(&img, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(gather_bilinear(&img, 1.0, 1.0), Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn gather_interpolates_at_midpoint() {
        let mut img = Image3f::zeros(2, 1);
        img.set(0, 0, Vector3::new(0.0, 0.0, 0.0));
        img.set(1, 0, Vector3::new(1.0, 1.0, 1.0));
        let mid = gather_bilinear(&img, 0.5, 0.0);
        assert!((mid.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn splat_respects_mask() {
        let mut acc = Image3f::zeros(2, 2);
        let mut wacc = Image1f::zeros(2, 2);
        let mut mask = MaskBuf::filled(2, 2, true);
        mask.set(1, 1, false);
        splat_bilinear(&mut acc, &mut wacc, &mask, 0.5, 0.5, Vector3::new(1.0, 1.0, 1.0), 1.0);
        assert_eq!(wacc.get(1, 1), 0.0);
        assert!(wacc.get(0, 0) > 0.0);
    }

    #[test]
    fn uv_to_pixel_flips_v_by_default() {
        let (x, y) = uv_to_pixel(Vector2::new(0.0, 0.0), 128, 128, true);
        assert_eq!(x, 0.0);
        assert_eq!(y, 127.0);
    }
}
