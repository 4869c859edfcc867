//! Blends the repaired and original working images through alpha, then
//! optionally relaxes the affected region with a Jacobi Poisson solve.

use crate::buffer::{Image3f, MaskBuf};
use crate::poisson::poisson_blend_roi;

/// `out = working * (1 - alpha) + repaired * alpha`.
pub fn blend(working: &Image3f, repaired: &Image3f, alpha: &crate::buffer::Image1f) -> Image3f {
    let (w, h) = (working.width(), working.height());
    let mut out = Image3f::zeros(w, h);
    for y in 0..h {
        for x in 0..w {
            let a = alpha.get(x, y);
            let blended = working.get(x, y) * (1.0 - a) + repaired.get(x, y) * a;
            out.set(x, y, blended);
        }
    }
    out
}

/// Runs the Jacobi Poisson solve in-place over `out_work`'s ROI bounding
/// `hit`, expanded by `max(2, feather_px + 2)`.
pub fn poisson_refine(out_work: &mut Image3f, working: &Image3f, hit: &MaskBuf, feather_px: u32, iters: u32) {
    if iters == 0 || !hit.any() {
        return;
    }

    let (w, h) = (hit.width(), hit.height());
    let mut min_x = w;
    let mut max_x = 0usize;
    let mut min_y = h;
    let mut max_y = 0usize;
    for y in 0..h {
        for x in 0..w {
            if hit.get(x, y) {
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
        }
    }

    let pad = feather_px.saturating_add(2).max(2) as i64;
    let x0 = (min_x as i64 - pad).max(0) as usize;
    let y0 = (min_y as i64 - pad).max(0) as usize;
    let x1 = ((max_x as i64 + pad + 1).min(w as i64)) as usize;
    let y1 = ((max_y as i64 + pad + 1).min(h as i64)) as usize;
    let (rw, rh) = (x1 - x0, y1 - y0);
    if rw == 0 || rh == 0 {
        return;
    }

    let mut hit_roi = MaskBuf::filled(rw, rh, false);
    let mut src_roi = Image3f::zeros(rw, rh);
    let mut guide_roi = Image3f::zeros(rw, rh);
    for y in 0..rh {
        for x in 0..rw {
            hit_roi.set(x, y, hit.get(x0 + x, y0 + y));
            src_roi.set(x, y, working.get(x0 + x, y0 + y));
            guide_roi.set(x, y, out_work.get(x0 + x, y0 + y));
        }
    }

    if !hit_roi.any() {
        return;
    }

    let solved = poisson_blend_roi(&src_roi, &guide_roi, &hit_roi, iters);
    for y in 0..rh {
        for x in 0..rw {
            out_work.set(x0 + x, y0 + y, solved.get(x, y));
        }
    }
}
