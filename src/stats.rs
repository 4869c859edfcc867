//! Per-seam or global mean/variance color statistics, via Welford's
//! running-moments update, used by the band splatter's color matching.

use nalgebra::{Vector2, Vector3};

use crate::buffer::Image3f;
use crate::sample::{gather_bilinear, to_pixel_direction, uv_to_pixel};
use crate::seam::{inward_direction, SeamPair};

/// Running (count, mean, M2) accumulator for a 3-channel color, updated
/// one sample at a time via Welford's algorithm (stable for long runs,
/// unlike a naive sum-of-squares).
#[derive(Default)]
struct RunningStats3 {
    n: u64,
    mean: Vector3<f64>,
    m2: Vector3<f64>,
}

impl RunningStats3 {
    fn add(&mut self, x: Vector3<f32>) {
        let x64 = x.cast::<f64>();
        self.n += 1;
        let delta = x64 - self.mean;
        self.mean += delta / self.n as f64;
        let delta2 = x64 - self.mean;
        self.m2 += delta.component_mul(&delta2);
    }

    fn finalize(&self) -> (Vector3<f32>, Vector3<f32>) {
        let var = if self.n <= 1 {
            Vector3::zeros()
        } else {
            self.m2 / (self.n - 1) as f64
        };
        let std = var.map(|v| v.max(0.0).sqrt());
        (self.mean.cast::<f32>(), std.cast::<f32>())
    }
}

/// `(mean_a, mean_b, scale)` where `scale = std_a / (std_b + 1e-6)`,
/// used to map side B's color into side A's distribution:
/// `col_b' = (col_b - mean_b) * scale + mean_a`.
#[derive(Copy, Clone, Debug)]
pub struct ColorMatch {
    pub mean_a: Vector3<f32>,
    pub mean_b: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl ColorMatch {
    pub fn identity() -> Self {
        Self {
            mean_a: Vector3::zeros(),
            mean_b: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn apply_to_b(&self, col_b: Vector3<f32>) -> Vector3<f32> {
        (col_b - self.mean_b).component_mul(&self.scale) + self.mean_a
    }
}

fn pixel_dir(uv0: Vector2<f32>, uv1: Vector2<f32>, uv2: Vector2<f32>, w: usize, h: usize) -> Vector2<f32> {
    to_pixel_direction(inward_direction(uv0, uv1, uv2), w, h)
}

fn accumulate_pair_samples(
    pair: &SeamPair,
    working: &Image3f,
    v_flip: bool,
    ns: usize,
    max_depth: u32,
    stats_a: &mut RunningStats3,
    stats_b: &mut RunningStats3,
) {
    let w = working.width();
    let h = working.height();
    let dir_a = pixel_dir(pair.a.uv0, pair.a.uv1, pair.a.uv2, w, h);
    let dir_b = pixel_dir(pair.b.uv0, pair.b.uv1, pair.b.uv2, w, h);
    let scale_px = Vector2::new((w.max(1) - 1) as f32, (h.max(1) - 1) as f32);

    for si in 0..ns {
        let t = (si as f32 + 0.5) / ns as f32;
        let uv_a_edge = pair.a.uv0 * (1.0 - t) + pair.a.uv1 * t;
        let uv_b_edge = pair.b.uv0 * (1.0 - t) + pair.b.uv1 * t;

        for d in 0..=max_depth {
            let uv_a = uv_a_edge + (dir_a * d as f32).component_div(&scale_px);
            let uv_b = uv_b_edge + (dir_b * d as f32).component_div(&scale_px);
            let (xa, ya) = uv_to_pixel(uv_a, w, h, v_flip);
            let (xb, yb) = uv_to_pixel(uv_b, w, h, v_flip);
            stats_a.add(gather_bilinear(working, xa, ya));
            stats_b.add(gather_bilinear(working, xb, yb));
        }
    }
}

fn finalize_match(stats_a: RunningStats3, stats_b: RunningStats3) -> ColorMatch {
    let (mean_a, std_a) = stats_a.finalize();
    let (mean_b, std_b) = stats_b.finalize();
    let scale = std_a.component_div(&(std_b.add_scalar(1e-6)));
    ColorMatch { mean_a, mean_b, scale }
}

/// Global color match: one mean/variance pair accumulated over every
/// selected seam (`ns=18` tangential samples, depths `0..=min(2, band_px-1)`).
pub fn global_match<'a>(
    seams: impl Iterator<Item = &'a SeamPair>,
    working: &Image3f,
    v_flip: bool,
    band_px: u32,
) -> ColorMatch {
    let max_depth = band_px.saturating_sub(1).min(2);
    let mut stats_a = RunningStats3::default();
    let mut stats_b = RunningStats3::default();
    for pair in seams {
        accumulate_pair_samples(pair, working, v_flip, 18, max_depth, &mut stats_a, &mut stats_b);
    }
    finalize_match(stats_a, stats_b)
}

/// Per-seam color match: mean/variance recomputed for a single seam
/// (`ns=24` tangential samples, depths `0..=min(3, band_px-1)`).
pub fn per_seam_match(pair: &SeamPair, working: &Image3f, v_flip: bool, band_px: u32) -> ColorMatch {
    let max_depth = band_px.saturating_sub(1).min(3);
    let mut stats_a = RunningStats3::default();
    let mut stats_b = RunningStats3::default();
    accumulate_pair_samples(pair, working, v_flip, 24, max_depth, &mut stats_a, &mut stats_b);
    finalize_match(stats_a, stats_b)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::seam::SeamSide;

    fn uniform_image(w: usize, h: usize, color: Vector3<f32>) -> Image3f {
        let mut img = Image3f::zeros(w, h);
        for y in 0..h {
            for x in 0..w {
                img.set(x, y, color);
            }
        }
        img
    }

    #[test]
    fn running_stats_matches_known_mean_and_std() {
        let mut s = RunningStats3::default();
        for v in [1.0f32, 2.0, 3.0, 4.0] {
            s.add(Vector3::new(v, v, v));
        }
        let (mean, std) = s.finalize();
        assert!((mean.x - 2.5).abs() < 1e-5);
        // sample stddev of [1,2,3,4] is sqrt(5/3)
        assert!((std.x - (5.0f32 / 3.0).sqrt()).abs() < 1e-4);
    }

    #[test]
    fn global_match_on_uniform_sides_is_identity_like() {
        let a = uniform_image(8, 8, Vector3::new(0.5, 0.5, 0.5));
        let pair = SeamPair {
            a: SeamSide {
                uv0: Vector2::new(0.0, 0.0),
                uv1: Vector2::new(1.0, 0.0),
                uv2: Vector2::new(0.5, 1.0),
            },
            b: SeamSide {
                uv0: Vector2::new(0.0, 0.0),
                uv1: Vector2::new(1.0, 0.0),
                uv2: Vector2::new(0.5, -1.0),
            },
        };
        let m = global_match(std::iter::once(&pair), &a, true, 4);
        assert!((m.mean_a - m.mean_b).norm() < 1e-3);
    }
}
