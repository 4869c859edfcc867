//! Band splatter: walks every selected seam, samples both sides along
//! inward-normal offsets, optionally color-matches side B, and bilinearly
//! scatters weighted samples into the accumulators.

use nalgebra::Vector2;

use crate::buffer::{Image1f, Image3f, MaskBuf};
use crate::config::{ColorMatch as ColorMatchMode, SeamRepairConfig, SplatMode, TextureKind};
use crate::sample::{gather_bilinear, splat_bilinear, to_pixel_direction, uv_to_pixel};
use crate::seam::{inward_direction, SeamPair};
use crate::stats;

/// Accumulators written to by [`splat_seam`]; owned by the orchestrator
/// for the duration of the call (spec §5).
pub struct Accumulators {
    pub color: Image3f,
    pub weight: Image1f,
}

impl Accumulators {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            color: Image3f::zeros(width, height),
            weight: Image1f::zeros(width, height),
        }
    }

    /// Merges `other` into `self` by elementwise addition. Used by the
    /// `parallel` feature to combine per-thread accumulators after a
    /// seam's splats have all landed (spec §5: scatter targets overlap
    /// across seams, so parallel splatting needs per-thread accumulators
    /// reduced at the end, not a single shared one).
    pub fn merge(&mut self, other: &Accumulators) {
        let (w, h) = (self.color.width(), self.color.height());
        for y in 0..h {
            for x in 0..w {
                self.color.add_at(x, y, other.color.get(x, y));
                self.weight.add_at(x, y, other.weight.get(x, y));
            }
        }
    }
}

/// Splats one seam's band into `acc`, using `global_match` unless
/// per-seam matching is selected, in which case a fresh match is computed
/// for just this seam.
pub fn splat_seam(
    pair: &SeamPair,
    working: &Image3f,
    mask: &MaskBuf,
    config: &SeamRepairConfig,
    global_match: &stats::ColorMatch,
    acc: &mut Accumulators,
) {
    let w = working.width();
    let h = working.height();
    let band_px = config.band_px;

    let dir_a = to_pixel_direction(inward_direction(pair.a.uv0, pair.a.uv1, pair.a.uv2), w, h);
    let dir_b = to_pixel_direction(inward_direction(pair.b.uv0, pair.b.uv1, pair.b.uv2), w, h);
    let scale_px = Vector2::new((w.max(1) - 1) as f32, (h.max(1) - 1) as f32);

    let e_a = (pair.a.uv1 - pair.a.uv0).component_mul(&scale_px);
    let e_b = (pair.b.uv1 - pair.b.uv0).component_mul(&scale_px);
    let edge_len_px = e_a.norm().max(e_b.norm());
    let n_samples = (8usize).max((edge_len_px / config.sample_step_px.max(0.5)).ceil() as usize);

    let do_color_match = config.color_match != ColorMatchMode::None && !config.texture_kind.is_normal();
    let per_seam_match;
    let match_to_use = if do_color_match {
        if config.color_match == ColorMatchMode::MeanvarEdge {
            per_seam_match = stats::per_seam_match(pair, working, config.v_flip, band_px);
            &per_seam_match
        } else {
            global_match
        }
    } else {
        global_match
    };

    for si in 0..=n_samples {
        let t = si as f32 / n_samples as f32;
        let uv_a_edge = pair.a.uv0 * (1.0 - t) + pair.a.uv1 * t;
        let uv_b_edge = pair.b.uv0 * (1.0 - t) + pair.b.uv1 * t;

        for d in 0..band_px {
            let ww = (band_px - d) as f32 / band_px as f32;

            let uv_a = uv_a_edge + (dir_a * d as f32).component_div(&scale_px);
            let uv_b = uv_b_edge + (dir_b * d as f32).component_div(&scale_px);

            let (xa, ya) = uv_to_pixel(uv_a, w, h, config.v_flip);
            let (xb, yb) = uv_to_pixel(uv_b, w, h, config.v_flip);

            let a_in = (0.0..=(w - 1) as f32).contains(&xa) && (0.0..=(h - 1) as f32).contains(&ya);
            let b_in = (0.0..=(w - 1) as f32).contains(&xb) && (0.0..=(h - 1) as f32).contains(&yb);
            if !a_in && !b_in {
                continue;
            }

            let col_a = gather_bilinear(working, xa, ya);
            let mut col_b = gather_bilinear(working, xb, yb);
            if do_color_match {
                col_b = match_to_use.apply_to_b(col_b);
            }

            match config.mode {
                SplatMode::Average => {
                    let col = (col_a + col_b) * 0.5;
                    if a_in {
                        splat_bilinear(&mut acc.color, &mut acc.weight, mask, xa, ya, col, ww);
                    }
                    if b_in {
                        splat_bilinear(&mut acc.color, &mut acc.weight, mask, xb, yb, col, ww);
                    }
                }
                SplatMode::AToB => {
                    if b_in {
                        splat_bilinear(&mut acc.color, &mut acc.weight, mask, xb, yb, col_a, ww);
                    }
                }
                SplatMode::BToA => {
                    if a_in {
                        splat_bilinear(&mut acc.color, &mut acc.weight, mask, xa, ya, col_b, ww);
                    }
                }
            }
        }
    }
}

/// Reconstructs the repaired image: `color_acc / weight_acc` wherever
/// `weight_acc > 0`, the untouched working image elsewhere (spec §4.9).
pub fn reconstruct(working: &Image3f, acc: &Accumulators) -> (Image3f, MaskBuf) {
    let w = working.width();
    let h = working.height();
    let mut repaired = working.clone();
    let mut hit = MaskBuf::filled(w, h, false);
    for y in 0..h {
        for x in 0..w {
            let wgt = acc.weight.get(x, y);
            if wgt > 0.0 {
                repaired.set(x, y, acc.color.get(x, y) / wgt);
                hit.set(x, y, true);
            }
        }
    }
    (repaired, hit)
}

pub fn uses_color_match(kind: TextureKind, mode: ColorMatchMode) -> bool {
    mode != ColorMatchMode::None && !kind.is_normal()
}
