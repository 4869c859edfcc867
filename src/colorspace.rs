//! Color-space adapters between the 8-bit source texture and the working
//! representation the splatter/filters operate on: linear RGB for base
//! color, unit vectors for normal maps, raw passthrough for data textures.

use nalgebra::Vector3;

use crate::buffer::Image3f;
use crate::config::TextureKind;

const SRGB_THRESHOLD: f32 = 0.04045;
const LINEAR_THRESHOLD: f32 = 0.0031308;
const SRGB_ALPHA: f32 = 0.055;

fn srgb_to_linear_scalar(x: f32) -> f32 {
    let x = x.clamp(0.0, 1.0);
    if x <= SRGB_THRESHOLD {
        x / 12.92
    } else {
        ((x + SRGB_ALPHA) / (1.0 + SRGB_ALPHA)).powf(2.4)
    }
}

fn linear_to_srgb_scalar(x: f32) -> f32 {
    let x = x.clamp(0.0, 1.0);
    if x <= LINEAR_THRESHOLD {
        x * 12.92
    } else {
        (1.0 + SRGB_ALPHA) * x.powf(1.0 / 2.4) - SRGB_ALPHA
    }
}

fn normal_rgb_to_vec(rgb: Vector3<f32>) -> Vector3<f32> {
    let v = rgb * 2.0 - Vector3::new(1.0, 1.0, 1.0);
    let n = v.norm().max(1e-8);
    v / n
}

fn normal_vec_to_rgb(v: Vector3<f32>) -> Vector3<f32> {
    let n = v.norm().max(1e-8);
    let unit = v / n;
    (unit * 0.5 + Vector3::new(0.5, 0.5, 0.5)).map(|c| c.clamp(0.0, 1.0))
}

/// Converts an 8-bit-normalized source RGB image into the working
/// representation for `kind`.
pub fn to_working(src_rgb: &Image3f, kind: TextureKind) -> Image3f {
    match kind {
        TextureKind::Basecolor => src_rgb.map(|c| c.map(srgb_to_linear_scalar)),
        TextureKind::Data => src_rgb.clone(),
        TextureKind::Normal => src_rgb.map(normal_rgb_to_vec),
    }
}

/// Inverts [`to_working`]: maps the composited working image back to the
/// 8-bit-normalized output representation for `kind`.
pub fn from_working(work_rgb: &Image3f, kind: TextureKind) -> Image3f {
    match kind {
        TextureKind::Basecolor => work_rgb.map(|c| c.map(linear_to_srgb_scalar)),
        TextureKind::Data => work_rgb.clone(),
        TextureKind::Normal => work_rgb.map(normal_vec_to_rgb),
    }
}

/// Rec.709 luminance of a working-space linear color, clamped to [0,1].
pub fn luminance(c: Vector3<f32>) -> f32 {
    (0.2126 * c.x + 0.7152 * c.y + 0.0722 * c.z).clamp(0.0, 1.0)
}
