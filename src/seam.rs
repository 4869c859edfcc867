//! UV seam detection: shared canonical 3D edges whose two incident
//! triangles disagree on the UV of either endpoint.

use std::collections::HashMap;

use nalgebra::Vector2;

use crate::canon;
use crate::error::{Result, SeamRepairError};
use crate::obj::Mesh;

/// Max-component UV delta above which two UVs are considered distinct.
const UV_EQUAL_EPS: f32 = 1e-6;

/// One triangle's contribution to a `SeamPair`: the UV endpoints of the
/// shared edge (in the pair's canonical endpoint order) plus the UV of
/// the triangle's opposite corner.
#[derive(Copy, Clone, Debug)]
pub struct SeamSide {
    pub uv0: Vector2<f32>,
    pub uv1: Vector2<f32>,
    pub uv2: Vector2<f32>,
}

/// Two triangles' sides of the same UV-discontinuous 3D edge.
#[derive(Copy, Clone, Debug)]
pub struct SeamPair {
    pub a: SeamSide,
    pub b: SeamSide,
}

struct Occurrence {
    triangle: usize,
    i0: usize,
    i1: usize,
    i2: usize,
}

fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn uv_at(mesh: &Mesh, triangle: usize, corner: usize) -> Result<Vector2<f32>> {
    let tri = &mesh.triangles[triangle];
    let uv_idx = tri.uvs[corner];
    if uv_idx < 0 {
        return Err(SeamRepairError::FaceMissingUv {
            face_index: triangle,
            corner,
        });
    }
    Ok(mesh.uvs[uv_idx as usize])
}

fn uv_equal(a: Vector2<f32>, b: Vector2<f32>) -> bool {
    (a - b).abs().max() <= UV_EQUAL_EPS
}

/// Builds one triangle's [`SeamSide`], reordering its UV endpoints so
/// `uv0`/`uv1` follow the canonical edge order `(key0, key1)` rather than
/// the triangle's own local winding.
fn side_for(
    mesh: &Mesh,
    occ: &Occurrence,
    canon: &[u32],
    key0: u32,
    key1: u32,
) -> Result<SeamSide> {
    let tri = &mesh.triangles[occ.triangle];
    let pos0 = canon[tri.positions[occ.i0] as usize];
    let pos1 = canon[tri.positions[occ.i1] as usize];

    let uv_i0 = uv_at(mesh, occ.triangle, occ.i0)?;
    let uv_i1 = uv_at(mesh, occ.triangle, occ.i1)?;
    let uv_i2 = uv_at(mesh, occ.triangle, occ.i2)?;

    let (uv0, uv1) = if pos0 == key0 && pos1 == key1 {
        (uv_i0, uv_i1)
    } else {
        // pos0 == key1 && pos1 == key0, the only other possibility for a
        // shared edge.
        (uv_i1, uv_i0)
    };

    Ok(SeamSide {
        uv0,
        uv1,
        uv2: uv_i2,
    })
}

/// Detects every UV seam in `mesh`: canonical 3D edges with exactly two
/// incident triangles whose UV endpoints differ. Boundary and
/// non-manifold edges (occurrence count != 2) are skipped, not reported.
pub fn detect_seams(mesh: &Mesh) -> Result<Vec<SeamPair>> {
    let canon_ids = canon::canonicalize(&mesh.positions, canon::EPSILON);

    let mut edges: HashMap<(u32, u32), Vec<Occurrence>> = HashMap::new();
    for (ti, tri) in mesh.triangles.iter().enumerate() {
        for &(i0, i1, i2) in &[(0usize, 1usize, 2usize), (1, 2, 0), (2, 0, 1)] {
            let a = canon_ids[tri.positions[i0] as usize];
            let b = canon_ids[tri.positions[i1] as usize];
            edges.entry(edge_key(a, b)).or_default().push(Occurrence {
                triangle: ti,
                i0,
                i1,
                i2,
            });
        }
    }

    let mut seams = Vec::new();
    for (&(key0, key1), occurrences) in edges.iter() {
        if occurrences.len() != 2 {
            continue;
        }
        let side_a = side_for(mesh, &occurrences[0], &canon_ids, key0, key1)?;
        let side_b = side_for(mesh, &occurrences[1], &canon_ids, key0, key1)?;

        if uv_equal(side_a.uv0, side_b.uv0) && uv_equal(side_a.uv1, side_b.uv1) {
            continue;
        }

        seams.push(SeamPair { a: side_a, b: side_b });
    }

    log::debug!("detected {} UV seam(s)", seams.len());
    Ok(seams)
}

/// Computes the 2D unit vector roughly perpendicular to edge `(uv0, uv1)`
/// pointing into the triangle interior (towards `uv2`). Falls back to the
/// direction to `uv2` if the edge is degenerate, and to a zero vector if
/// that is degenerate too (spec §4.4).
pub fn inward_direction(uv0: Vector2<f32>, uv1: Vector2<f32>, uv2: Vector2<f32>) -> Vector2<f32> {
    let e = uv1 - uv0;
    let mut n = Vector2::new(-e.y, e.x);
    let mid = (uv0 + uv1) * 0.5;
    if n.dot(&(uv2 - mid)) < 0.0 {
        n = -n;
    }
    let len = n.norm();
    if len >= 1e-12 {
        return n / len;
    }

    let fallback = uv2 - mid;
    let fallback_len = fallback.norm();
    if fallback_len >= 1e-12 {
        fallback / fallback_len
    } else {
        Vector2::zeros()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::obj;

    #[test]
    fn detects_single_internal_seam() {
        let obj = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0.10 0.90
vt 0.90 0.90
vt 0.90 0.10
vt 0.10 0.10
vt 0.10 0.45
vt 0.90 0.55
f 1/1 2/2 3/3
f 1/5 3/6 4/4
";
        let mesh = obj::parse(obj).unwrap();
        let seams = detect_seams(&mesh).unwrap();
        assert_eq!(seams.len(), 1);
    }

    #[test]
    fn matching_uvs_produce_no_seam() {
        let obj = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
f 1/1 2/2 3/3
f 1/1 3/3 4/4
";
        let mesh = obj::parse(obj).unwrap();
        let seams = detect_seams(&mesh).unwrap();
        assert!(seams.is_empty());
    }

    #[test]
    fn boundary_edges_are_skipped() {
        let obj = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
f 1/1 2/2 3/3
";
        let mesh = obj::parse(obj).unwrap();
        let seams = detect_seams(&mesh).unwrap();
        assert!(seams.is_empty());
    }

    #[test]
    fn inward_direction_points_towards_third_vertex() {
        let uv0 = Vector2::new(0.0, 0.0);
        let uv1 = Vector2::new(1.0, 0.0);
        let uv2 = Vector2::new(0.5, 1.0);
        let dir = inward_direction(uv0, uv1, uv2);
        assert!(dir.y > 0.0);
        assert!((dir.norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn inward_direction_degenerate_edge_falls_back() {
        let uv0 = Vector2::new(0.5, 0.5);
        let uv1 = Vector2::new(0.5, 0.5);
        let uv2 = Vector2::new(0.8, 0.5);
        let dir = inward_direction(uv0, uv1, uv2);
        assert!((dir.norm() - 1.0).abs() < 1e-5);
        assert!(dir.x > 0.0);
    }

    #[test]
    fn inward_direction_fully_degenerate_is_zero() {
        let uv0 = Vector2::new(0.5, 0.5);
        let dir = inward_direction(uv0, uv0, uv0);
        assert_eq!(dir, Vector2::zeros());
    }
}
