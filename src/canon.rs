//! Merges near-duplicate 3D positions so UV-duplicated vertices share a
//! single canonical id, which is what lets the seam detector build 3D-edge
//! adjacency across UV chart boundaries.

use std::collections::HashMap;

use nalgebra::Vector3;

/// Tolerance used to quantize positions into canonical buckets.
pub const EPSILON: f32 = 1e-5;

/// Returns, for each input position, the id of its canonical bucket
/// (first-seen order). Two positions land in the same bucket iff their
/// quantized `(x, y, z)` keys match: `floor(coord / eps + 0.5)` per axis.
pub fn canonicalize(positions: &[Vector3<f32>], eps: f32) -> Vec<u32> {
    let scale = 1.0 / eps;
    let mut table: HashMap<(i64, i64, i64), u32> = HashMap::with_capacity(positions.len());
    let mut canon = Vec::with_capacity(positions.len());
    let mut next_id = 0u32;

    for p in positions {
        let key = (
            (p.x * scale + 0.5).floor() as i64,
            (p.y * scale + 0.5).floor() as i64,
            (p.z * scale + 0.5).floor() as i64,
        );
        let id = *table.entry(key).or_insert_with(|| {
            let id = next_id;
            next_id += 1;
            id
        });
        canon.push(id);
    }

    canon
}
