//! Seam-aware texture repair: synchronizes color across the UV chart
//! boundaries of a textured 3D mesh.
//!
//! A UV seam is a 3D edge shared by two triangles that map to different,
//! non-adjacent regions of the texture. Lighting bakes, photogrammetry
//! capture and hand-painted textures all tend to disagree slightly across
//! such a seam, which shows up as a visible crack running along the model.
//! [`repair_seams`] finds every such edge from the mesh topology, splats a
//! color-matched band of samples from each side onto the other across the
//! texture, and blends the result back in through a feathered alpha so the
//! repair fades out smoothly rather than leaving a hard patch.

mod alpha;
mod buffer;
mod canon;
mod colorspace;
mod compositor;
mod config;
mod error;
mod mask;
mod obj;
mod poisson;
mod sample;
mod seam;
mod splat;
mod stats;

pub use config::{AlphaMethod, ColorMatch, SeamRepairConfig, SplatMode, TextureKind};
pub use error::{Result, SeamRepairError};

use image::{GrayImage, Rgba, RgbaImage};
use nalgebra::Vector3;

use buffer::{Image1f, Image3f};
use stats::ColorMatch as ColorMatchStats;

fn rgb_from_rgba(src: &RgbaImage) -> Image3f {
    let (w, h) = src.dimensions();
    let mut out = Image3f::zeros(w as usize, h as usize);
    for y in 0..h {
        for x in 0..w {
            let p = src.get_pixel(x, y).0;
            out.set(
                x as usize,
                y as usize,
                Vector3::new(p[0] as f32 / 255.0, p[1] as f32 / 255.0, p[2] as f32 / 255.0),
            );
        }
    }
    out
}

/// Quantizes a working-space channel back to 8 bits, clipping rather than
/// wrapping on out-of-range input.
fn quantize_channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Rebuilds an RGBA image from a working-space color buffer, reusing the
/// alpha channel of `original` unchanged.
fn rgba_from_rgb_and_alpha(rgb: &Image3f, original: &RgbaImage) -> RgbaImage {
    let (w, h) = original.dimensions();
    let mut out = RgbaImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let c = rgb.get(x as usize, y as usize);
            let a = original.get_pixel(x, y).0[3];
            out.put_pixel(
                x,
                y,
                Rgba([quantize_channel(c.x), quantize_channel(c.y), quantize_channel(c.z), a]),
            );
        }
    }
    out
}

fn luminance_image(working: &Image3f) -> Image1f {
    let (w, h) = (working.width(), working.height());
    let mut out = Image1f::zeros(w, h);
    for y in 0..h {
        for x in 0..w {
            out.set(x, y, colorspace::luminance(working.get(x, y)));
        }
    }
    out
}

/// Splats every selected seam into a single set of accumulators.
///
/// Serial by default. With the `parallel` feature enabled, seams are
/// folded across a `rayon` thread pool into per-thread accumulators that
/// are merged at the end, since different seams' scatter footprints can
/// overlap on the texture (spec §5).
#[cfg(not(feature = "parallel"))]
fn splat_all_seams(
    selected: &[&seam::SeamPair],
    working: &Image3f,
    mask: &buffer::MaskBuf,
    config: &SeamRepairConfig,
    global_match: &ColorMatchStats,
) -> splat::Accumulators {
    let (w, h) = (working.width(), working.height());
    let mut acc = splat::Accumulators::zeros(w, h);
    for pair in selected {
        splat::splat_seam(pair, working, mask, config, global_match, &mut acc);
    }
    acc
}

#[cfg(feature = "parallel")]
fn splat_all_seams(
    selected: &[&seam::SeamPair],
    working: &Image3f,
    mask: &buffer::MaskBuf,
    config: &SeamRepairConfig,
    global_match: &ColorMatchStats,
) -> splat::Accumulators {
    use rayon::prelude::*;

    let (w, h) = (working.width(), working.height());
    selected
        .par_iter()
        .fold(
            || splat::Accumulators::zeros(w, h),
            |mut acc, pair| {
                splat::splat_seam(pair, working, mask, config, global_match, &mut acc);
                acc
            },
        )
        .reduce(
            || splat::Accumulators::zeros(w, h),
            |mut a, b| {
                a.merge(&b);
                a
            },
        )
}

fn elementwise_max(a: &Image1f, b: &Image1f) -> Image1f {
    let (w, h) = (a.width(), a.height());
    let mut out = Image1f::zeros(w, h);
    for y in 0..h {
        for x in 0..w {
            out.set(x, y, a.get(x, y).max(b.get(x, y)));
        }
    }
    out
}

/// Repairs every UV seam of `mesh_obj` found on `texture`.
///
/// `seam_mask` restricts the repair to the regions it marks (pixels with
/// luma at or above [`SeamRepairConfig::mask_threshold`]); `None` treats the
/// whole texture as eligible. Returns a new image the same size as
/// `texture`; the source is never mutated.
///
/// Returns an unmodified copy of `texture` if `config.band_px` is zero, the
/// mesh has no UV seams at all, or no seam survives mask selection.
pub fn repair_seams(
    mesh_obj: &str,
    texture: &RgbaImage,
    seam_mask: Option<&GrayImage>,
    config: &SeamRepairConfig,
) -> Result<RgbaImage> {
    config.validate()?;

    let (w, h) = texture.dimensions();
    let (w, h) = (w as usize, h as usize);

    if config.band_px == 0 {
        log::info!("band_px is 0, returning the input texture unchanged");
        return Ok(texture.clone());
    }

    let mesh = obj::parse(mesh_obj)?;
    let seams = seam::detect_seams(&mesh)?;
    log::info!("found {} UV seam(s) on a {w}x{h} texture", seams.len());
    if seams.is_empty() {
        return Ok(texture.clone());
    }

    let src_rgb = rgb_from_rgba(texture);
    let working = colorspace::to_working(&src_rgb, config.texture_kind);

    let has_mask_input = seam_mask.is_some();
    let raw_mask = mask::build_mask(seam_mask, w, h, config.mask_threshold);
    let dilated_mask = mask::dilate(&raw_mask, config.band_px);

    let selected: Vec<&seam::SeamPair> = seams
        .iter()
        .filter(|pair| mask::seam_is_selected(pair, &dilated_mask, config, has_mask_input))
        .collect();
    log::debug!("{} of {} seam(s) selected for repair", selected.len(), seams.len());
    if selected.is_empty() {
        return Ok(texture.clone());
    }

    let do_color_match = splat::uses_color_match(config.texture_kind, config.color_match);
    let global_match = if do_color_match && config.color_match == ColorMatch::Meanvar {
        stats::global_match(selected.iter().copied(), &working, config.v_flip, config.band_px)
    } else {
        ColorMatchStats::identity()
    };

    let acc = splat_all_seams(&selected, &working, &dilated_mask, config, &global_match);

    let (repaired, hit) = splat::reconstruct(&working, &acc);
    if !hit.any() {
        log::debug!("no seam sample landed inside the mask; nothing to blend");
        return Ok(texture.clone());
    }

    let mut alpha = alpha::build_alpha(config.alpha_method, &hit, &acc.weight, config.feather_px);
    if config.alpha_edge_aware && !config.texture_kind.is_normal() {
        let guide = luminance_image(&working);
        let radius = config.feather_px.max(1) as usize;
        let refined = alpha::guided_filter(&guide, &alpha, radius, config.guided_eps);
        // Guided-filter refinement only ever widens the repaired region,
        // never shrinks it below the distance/wacc estimate.
        alpha = elementwise_max(&alpha, &refined);
    }

    let mut out_work = compositor::blend(&working, &repaired, &alpha);

    if config.poisson_iters > 0 && !config.texture_kind.is_normal() {
        log::debug!("running {} Poisson relaxation iteration(s)", config.poisson_iters);
        compositor::poisson_refine(&mut out_work, &working, &hit, config.feather_px, config.poisson_iters);
    }

    let out_rgb = colorspace::from_working(&out_work, config.texture_kind);
    Ok(rgba_from_rgb_and_alpha(&out_rgb, texture))
}
