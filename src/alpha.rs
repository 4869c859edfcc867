//! Alpha feathering: distance- or weight-based construction, optionally
//! sharpened by an edge-aware guided-filter refinement.

use crate::buffer::{Image1f, MaskBuf};
use crate::config::AlphaMethod;

fn erode3x3(mask: &MaskBuf) -> MaskBuf {
    let w = mask.width();
    let h = mask.height();
    let mut out = MaskBuf::filled(w, h, false);
    for y in 0..h {
        for x in 0..w {
            let mut all_set = true;
            'neighbors: for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    if !mask.get_clamped(x as i64 + dx, y as i64 + dy) {
                        all_set = false;
                        break 'neighbors;
                    }
                }
            }
            out.set(x, y, all_set);
        }
    }
    out
}

fn bounding_box(hit: &MaskBuf, pad: u32) -> (usize, usize, usize, usize) {
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
    let pad = pad as i64;
    let x0 = (min_x as i64 - pad).max(0) as usize;
    let y0 = (min_y as i64 - pad).max(0) as usize;
    let x1 = ((max_x as i64 + pad + 1).min(w as i64)) as usize;
    let y1 = ((max_y as i64 + pad + 1).min(h as i64)) as usize;
    (x0, y0, x1, y1)
}

/// Erosion-distance alpha: iteratively erodes the hit region up to
/// `feather_px` times, recording at which iteration each pixel first left
/// the shrinking set. `alpha = iteration / feather_px`, clipped to
/// `[0, 1]`; pixels that never leave get `alpha = 1`.
pub fn alpha_distance(hit: &MaskBuf, feather_px: u32) -> Image1f {
    let (w, h) = (hit.width(), hit.height());
    if feather_px == 0 || !hit.any() {
        let mut out = Image1f::zeros(w, h);
        for y in 0..h {
            for x in 0..w {
                out.set(x, y, if hit.get(x, y) { 1.0 } else { 0.0 });
            }
        }
        return out;
    }

    let (x0, y0, x1, y1) = bounding_box(hit, feather_px + 2);
    let (rw, rh) = (x1 - x0, y1 - y0);

    let mut roi = MaskBuf::filled(rw, rh, false);
    for y in 0..rh {
        for x in 0..rw {
            roi.set(x, y, hit.get(x0 + x, y0 + y));
        }
    }

    let mut dist = Image1f::filled(rw, rh, feather_px as f32);
    let mut current = roi;
    for k in 0..feather_px {
        if !current.any() {
            break;
        }
        let eroded = erode3x3(&current);
        for y in 0..rh {
            for x in 0..rw {
                if current.get(x, y) && !eroded.get(x, y) {
                    dist.set(x, y, k as f32);
                }
            }
        }
        current = eroded;
    }
    if current.any() {
        for y in 0..rh {
            for x in 0..rw {
                if current.get(x, y) {
                    dist.set(x, y, feather_px as f32);
                }
            }
        }
    }

    let mut alpha = Image1f::zeros(w, h);
    for y in 0..rh {
        for x in 0..rw {
            let v = (dist.get(x, y) / feather_px as f32).clamp(0.0, 1.0);
            alpha.set(x0 + x, y0 + y, v);
        }
    }
    alpha
}

/// Weight-accumulator alpha: `clip(weight / (weight + 0.25), 0, 1)`.
pub fn alpha_wacc(weight: &Image1f) -> Image1f {
    let (w, h) = (weight.width(), weight.height());
    let mut out = Image1f::zeros(w, h);
    for y in 0..h {
        for x in 0..w {
            let wv = weight.get(x, y);
            out.set(x, y, (wv / (wv + 0.25)).clamp(0.0, 1.0));
        }
    }
    out
}

pub fn build_alpha(method: AlphaMethod, hit: &MaskBuf, weight: &Image1f, feather_px: u32) -> Image1f {
    match method {
        AlphaMethod::Distance => alpha_distance(hit, feather_px),
        AlphaMethod::Wacc => alpha_wacc(weight),
    }
}

fn horiz_row(a: &Image1f, r: usize, y: usize, wsize: usize) -> Vec<f32> {
    let w = a.width();
    let mut cum = vec![0.0f32; w + 2 * r + 1];
    for (i, x) in (-(r as i64)..(w as i64 + r as i64)).enumerate() {
        cum[i + 1] = cum[i] + a.get_clamped(x, y as i64);
    }
    (0..w).map(|x| (cum[x + wsize] - cum[x]) / wsize as f32).collect()
}

fn vert_col(horiz: &Image1f, r: usize, x: usize, wsize: usize) -> Vec<f32> {
    let h = horiz.height();
    let mut cum = vec![0.0f32; h + 2 * r + 1];
    for (i, y) in (-(r as i64)..(h as i64 + r as i64)).enumerate() {
        cum[i + 1] = cum[i] + horiz.get_clamped(x as i64, y);
    }
    (0..h).map(|y| (cum[y + wsize] - cum[y]) / wsize as f32).collect()
}

/// Separable box filter via a 1D integral image per axis, with
/// edge-replicated padding (never wraps).
#[cfg(not(feature = "parallel"))]
fn box_filter(a: &Image1f, r: usize) -> Image1f {
    if r == 0 {
        return a.clone();
    }
    let (w, h) = (a.width(), a.height());
    let wsize = 2 * r + 1;

    let mut horiz = Image1f::zeros(w, h);
    for y in 0..h {
        let row = horiz_row(a, r, y, wsize);
        for x in 0..w {
            horiz.set(x, y, row[x]);
        }
    }

    let mut out = Image1f::zeros(w, h);
    for x in 0..w {
        let col = vert_col(&horiz, r, x, wsize);
        for y in 0..h {
            out.set(x, y, col[y]);
        }
    }
    out
}

/// Separable box filter, row/column-parallel across a `rayon` thread pool
/// (spec §5: "row-parallel box filtering" is an explicitly sanctioned
/// parallel grain, since each row/column's integral image is independent).
#[cfg(feature = "parallel")]
fn box_filter(a: &Image1f, r: usize) -> Image1f {
    use rayon::prelude::*;

    if r == 0 {
        return a.clone();
    }
    let (w, h) = (a.width(), a.height());
    let wsize = 2 * r + 1;

    let horiz_rows: Vec<Vec<f32>> = (0..h).into_par_iter().map(|y| horiz_row(a, r, y, wsize)).collect();
    let mut horiz = Image1f::zeros(w, h);
    for y in 0..h {
        for x in 0..w {
            horiz.set(x, y, horiz_rows[y][x]);
        }
    }

    let vert_cols: Vec<Vec<f32>> = (0..w).into_par_iter().map(|x| vert_col(&horiz, r, x, wsize)).collect();
    let mut out = Image1f::zeros(w, h);
    for x in 0..w {
        for y in 0..h {
            out.set(x, y, vert_cols[x][y]);
        }
    }
    out
}

fn map2(a: &Image1f, b: &Image1f, f: impl Fn(f32, f32) -> f32) -> Image1f {
    let (w, h) = (a.width(), a.height());
    let mut out = Image1f::zeros(w, h);
    for y in 0..h {
        for x in 0..w {
            out.set(x, y, f(a.get(x, y), b.get(x, y)));
        }
    }
    out
}

/// Edge-preserving guided filter (He et al.): `guide` is the structural
/// reference, `input` the signal to smooth, `radius` the box-filter
/// footprint, `eps` the regularization against division by a near-zero
/// guide variance.
pub fn guided_filter(guide: &Image1f, input: &Image1f, radius: usize, eps: f32) -> Image1f {
    let mean_i = box_filter(guide, radius);
    let mean_p = box_filter(input, radius);
    let ip = map2(guide, input, |i, p| i * p);
    let mean_ip = box_filter(&ip, radius);
    let ii = map2(guide, guide, |i, _| i * i);
    let mean_ii = box_filter(&ii, radius);

    let cov_ip = map2(&mean_ip, &map2(&mean_i, &mean_p, |i, p| i * p), |ip, imp| ip - imp);
    let var_i = map2(&mean_ii, &map2(&mean_i, &mean_i, |i, j| i * j), |ii, imi| ii - imi);

    let a = map2(&cov_ip, &var_i, |c, v| c / (v + eps));
    let b = map2(&mean_p, &map2(&a, &mean_i, |a, i| a * i), |p, ai| p - ai);

    let mean_a = box_filter(&a, radius);
    let mean_b = box_filter(&b, radius);

    let q_linear = map2(&mean_a, guide, |ma, i| ma * i);
    map2(&q_linear, &mean_b, |q, b| q + b)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn alpha_distance_reaches_one_at_center_of_large_hit() {
        let mut hit = MaskBuf::filled(21, 21, false);
        for y in 0..21 {
            for x in 0..21 {
                hit.set(x, y, true);
            }
        }
        let alpha = alpha_distance(&hit, 4);
        assert_eq!(alpha.get(10, 10), 1.0);
    }

    #[test]
    fn alpha_distance_is_zero_outside_hit() {
        let mut hit = MaskBuf::filled(10, 10, false);
        hit.set(5, 5, true);
        let alpha = alpha_distance(&hit, 3);
        assert_eq!(alpha.get(0, 0), 0.0);
    }

    #[test]
    fn alpha_distance_empty_hit_is_zero_everywhere() {
        let hit = MaskBuf::filled(5, 5, false);
        let alpha = alpha_distance(&hit, 3);
        assert!(alpha.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn wacc_alpha_increases_with_weight() {
        let mut wacc = Image1f::zeros(2, 1);
        wacc.set(0, 0, 0.0);
        wacc.set(1, 0, 10.0);
        let alpha = alpha_wacc(&wacc);
        assert_eq!(alpha.get(0, 0), 0.0);
        assert!(alpha.get(1, 0) > 0.9);
    }

    #[test]
    fn box_filter_of_constant_image_is_identity() {
        let img = Image1f::filled(9, 9, 0.42);
        let out = box_filter(&img, 2);
        for y in 0..9 {
            for x in 0..9 {
                assert!((out.get(x, y) - 0.42).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn guided_filter_monotonic_or_equal_on_flat_guide() {
        let guide = Image1f::filled(6, 6, 0.5);
        let mut input = Image1f::zeros(6, 6);
        input.set(3, 3, 1.0);
        let q = guided_filter(&guide, &input, 2, 1e-4);
        // With a perfectly flat guide the model degenerates to the box
        // filter's mean, which cannot exceed the input's max.
        for v in q.data() {
            assert!(*v <= 1.0 + 1e-4);
        }
    }
}
