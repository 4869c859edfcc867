//! Jacobi Poisson blend: relaxes the composited ROI towards a Laplacian
//! guidance field while pinning the boundary to the pre-Poisson source
//! (Dirichlet conditions), without ever sampling across the image edge.

use crate::buffer::{Image3f, MaskBuf};

/// 4-neighbor Laplacian, edge-replicated (no wrap).
pub fn laplacian_noroll(img: &Image3f) -> Image3f {
    let (w, h) = (img.width(), img.height());
    let mut out = Image3f::zeros(w, h);
    for y in 0..h {
        for x in 0..w {
            let c = img.get(x, y);
            let up = img.get_clamped(x as i64, y as i64 - 1);
            let dn = img.get_clamped(x as i64, y as i64 + 1);
            let lf = img.get_clamped(x as i64 - 1, y as i64);
            let rt = img.get_clamped(x as i64 + 1, y as i64);
            out.set(x, y, c * -4.0 + up + dn + lf + rt);
        }
    }
    out
}

/// Runs `iters` Jacobi relaxation steps over `guide_roi`, keeping the
/// result where `mask_roi` is true (after its border is forced false) and
/// snapping back to `src_roi` everywhere else.
pub fn poisson_blend_roi(
    src_roi: &Image3f,
    guide_roi: &Image3f,
    mask_roi: &MaskBuf,
    iters: u32,
) -> Image3f {
    if iters == 0 || !mask_roi.any() {
        return guide_roi.clone();
    }

    let (w, h) = (guide_roi.width(), guide_roi.height());
    let mut interior = mask_roi.clone();
    if w > 0 && h > 0 {
        for x in 0..w {
            interior.set(x, 0, false);
            interior.set(x, h - 1, false);
        }
        for y in 0..h {
            interior.set(0, y, false);
            interior.set(w - 1, y, false);
        }
    }

    let mut u = guide_roi.clone();
    let laplacian = laplacian_noroll(guide_roi);

    for _ in 0..iters {
        u = jacobi_step(&u, &laplacian, &interior, src_roi);
    }

    u
}

/// One Jacobi relaxation sweep. Serial by default; with the `parallel`
/// feature, rows are independent reads against the previous iterate `u`
/// and are computed across a `rayon` thread pool (spec §5: "row-parallel
/// ... Poisson iterations" is an explicitly sanctioned parallel grain).
#[cfg(not(feature = "parallel"))]
fn jacobi_step(u: &Image3f, laplacian: &Image3f, interior: &MaskBuf, src_roi: &Image3f) -> Image3f {
    let (w, h) = (u.width(), u.height());
    let mut next = Image3f::zeros(w, h);
    for y in 0..h {
        for x in 0..w {
            next.set(x, y, jacobi_cell(u, laplacian, interior, src_roi, x, y));
        }
    }
    next
}

#[cfg(feature = "parallel")]
fn jacobi_step(u: &Image3f, laplacian: &Image3f, interior: &MaskBuf, src_roi: &Image3f) -> Image3f {
    use rayon::prelude::*;

    let (w, h) = (u.width(), u.height());
    let rows: Vec<Vec<nalgebra::Vector3<f32>>> = (0..h)
        .into_par_iter()
        .map(|y| (0..w).map(|x| jacobi_cell(u, laplacian, interior, src_roi, x, y)).collect())
        .collect();
    let mut next = Image3f::zeros(w, h);
    for y in 0..h {
        for x in 0..w {
            next.set(x, y, rows[y][x]);
        }
    }
    next
}

#[inline]
fn jacobi_cell(
    u: &Image3f,
    laplacian: &Image3f,
    interior: &MaskBuf,
    src_roi: &Image3f,
    x: usize,
    y: usize,
) -> nalgebra::Vector3<f32> {
    if interior.get(x, y) {
        let up = u.get_clamped(x as i64, y as i64 - 1);
        let dn = u.get_clamped(x as i64, y as i64 + 1);
        let lf = u.get_clamped(x as i64 - 1, y as i64);
        let rt = u.get_clamped(x as i64 + 1, y as i64);
        (up + dn + lf + rt - laplacian.get(x, y)) * 0.25
    } else {
        src_roi.get(x, y)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn laplacian_of_constant_image_is_zero() {
        let img = Image3f::zeros(5, 5);
        let lap = laplacian_noroll(&img);
        for v in 0..25 {
            let (x, y) = (v % 5, v / 5);
            assert_eq!(lap.get(x, y), Vector3::zeros());
        }
    }

    #[test]
    fn boundary_pixels_are_untouched_by_poisson() {
        let w = 6;
        let h = 6;
        let mut guide = Image3f::zeros(w, h);
        let mut src = Image3f::zeros(w, h);
        for y in 0..h {
            for x in 0..w {
                let v = Vector3::new(x as f32, y as f32, 0.0);
                guide.set(x, y, v);
                src.set(x, y, v);
            }
        }
        let mask = MaskBuf::filled(w, h, true);
        let out = poisson_blend_roi(&src, &guide, &mask, 50);
        for x in 0..w {
            assert_eq!(out.get(x, 0), src.get(x, 0));
            assert_eq!(out.get(x, h - 1), src.get(x, h - 1));
        }
        for y in 0..h {
            assert_eq!(out.get(0, y), src.get(0, y));
            assert_eq!(out.get(w - 1, y), src.get(w - 1, y));
        }
    }

    #[test]
    fn no_mask_hits_returns_guide_unchanged() {
        let w = 4;
        let h = 4;
        let guide = Image3f::zeros(w, h);
        let src = Image3f::zeros(w, h);
        let mask = MaskBuf::filled(w, h, false);
        let out = poisson_blend_roi(&src, &guide, &mask, 10);
        for y in 0..h {
            for x in 0..w {
                assert_eq!(out.get(x, y), guide.get(x, y));
            }
        }
    }
}
