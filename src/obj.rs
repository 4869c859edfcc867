//! Minimal OBJ parser: positions, UVs, and fan-triangulated faces.
//!
//! Normals are recognized (`vn`) but discarded; this crate only needs 3D
//! adjacency, which comes from positions, and UV seams, which come from
//! `vt`. Supports `v`, `v/vt`, `v//vn`, `v/vt/vn` corner forms and
//! negative (relative) indices.

use nalgebra::{Vector2, Vector3};

use crate::error::{Result, SeamRepairError};

/// A parsed triangle: position index and UV index (or `-1` if absent) per
/// corner, in face-winding order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Triangle {
    pub positions: [u32; 3],
    pub uvs: [i32; 3],
}

/// The output of [`parse`]: flat vertex pools plus triangle list.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub positions: Vec<Vector3<f32>>,
    pub uvs: Vec<Vector2<f32>>,
    pub triangles: Vec<Triangle>,
}

struct FaceToken {
    position: i64,
    uv: Option<i64>,
}

fn parse_index(raw: &str, line: usize, count: usize) -> Result<i64> {
    let idx: i64 = raw.parse().map_err(|_| SeamRepairError::MalformedObj {
        line,
        message: format!("invalid index '{raw}'"),
    })?;
    if idx == 0 {
        return Err(SeamRepairError::MalformedObj {
            line,
            message: "index cannot be 0".to_string(),
        });
    }
    let resolved = if idx > 0 { idx - 1 } else { count as i64 + idx };
    Ok(resolved)
}

fn parse_face_token(token: &str, line: usize, positions: usize, uvs: usize) -> Result<FaceToken> {
    let mut parts = token.split('/');
    let v_raw = parts.next().unwrap_or("");
    if v_raw.is_empty() {
        return Err(SeamRepairError::MalformedObj {
            line,
            message: "face corner missing a position index".to_string(),
        });
    }
    let position = parse_index(v_raw, line, positions)?;

    let uv = match parts.next() {
        Some(vt) if !vt.is_empty() => Some(parse_index(vt, line, uvs)?),
        _ => None,
    };
    // normal index, if present, is parsed only to validate the line and
    // then discarded.
    if let Some(vn) = parts.next() {
        if !vn.is_empty() {
            let _ = parse_index(vn, line, usize::MAX)?;
        }
    }

    Ok(FaceToken { position, uv })
}

/// Parses an OBJ text stream into positions, UVs and fan-triangulated
/// triangles. A face line with fewer than 3 corner tokens is skipped
/// rather than treated as an error. Fails with
/// [`SeamRepairError::MeshMissingUvs`] if no `vt` line was present, or
/// [`SeamRepairError::MeshNoFaces`] if no face produced a triangle.
pub fn parse(source: &str) -> Result<Mesh> {
    let mut positions = Vec::new();
    let mut uvs = Vec::new();
    let mut triangles = Vec::new();

    for (line_idx, raw_line) in source.lines().enumerate() {
        let line_no = line_idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let directive = fields.next().unwrap_or("");
        let rest: Vec<&str> = fields.collect();

        match directive {
            "v" => {
                if rest.len() < 3 {
                    return Err(SeamRepairError::MalformedObj {
                        line: line_no,
                        message: "expected 3 values for vertex position".to_string(),
                    });
                }
                let x = parse_float(rest[0], line_no)?;
                let y = parse_float(rest[1], line_no)?;
                let z = parse_float(rest[2], line_no)?;
                positions.push(Vector3::new(x, y, z));
            }
            "vt" => {
                if rest.len() < 2 {
                    return Err(SeamRepairError::MalformedObj {
                        line: line_no,
                        message: "expected at least 2 values for texture coordinate".to_string(),
                    });
                }
                let u = parse_float(rest[0], line_no)?;
                let v = parse_float(rest[1], line_no)?;
                // rest[2], if present, is the w component of `vt u v w`; discarded.
                uvs.push(Vector2::new(u, v));
            }
            "vn" => {
                // Normals are ignored entirely.
            }
            "f" => {
                if rest.len() < 3 {
                    // A face line with fewer than 3 corners can't form a
                    // triangle; skip it and keep parsing rather than
                    // aborting the whole mesh.
                    continue;
                }
                let corners: Result<Vec<FaceToken>> = rest
                    .iter()
                    .map(|tok| parse_face_token(tok, line_no, positions.len(), uvs.len()))
                    .collect();
                let corners = corners?;

                // Fan triangulation: (0, i, i+1).
                for i in 1..corners.len() - 1 {
                    let tri_corners = [&corners[0], &corners[i], &corners[i + 1]];
                    let mut tri_positions = [0u32; 3];
                    let mut tri_uvs = [-1i32; 3];
                    for (slot, corner) in tri_corners.into_iter().enumerate() {
                        tri_positions[slot] = corner.position as u32;
                        tri_uvs[slot] = corner.uv.map(|v| v as i32).unwrap_or(-1);
                    }
                    triangles.push(Triangle {
                        positions: tri_positions,
                        uvs: tri_uvs,
                    });
                }
            }
            _ => {
                // o, g, s, usemtl, mtllib, ... all ignored.
            }
        }
    }

    if uvs.is_empty() {
        return Err(SeamRepairError::MeshMissingUvs);
    }
    if triangles.is_empty() {
        return Err(SeamRepairError::MeshNoFaces);
    }

    log::debug!(
        "parsed OBJ: {} positions, {} uvs, {} triangles",
        positions.len(),
        uvs.len(),
        triangles.len()
    );

    Ok(Mesh {
        positions,
        uvs,
        triangles,
    })
}

fn parse_float(raw: &str, line: usize) -> Result<f32> {
    raw.parse().map_err(|_| SeamRepairError::MalformedObj {
        line,
        message: format!("invalid float '{raw}'"),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_simple_triangle() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/1 2/2 3/3\n";
        let mesh = parse(obj).unwrap();
        assert_eq!(mesh.positions.len(), 3);
        assert_eq!(mesh.uvs.len(), 3);
        assert_eq!(mesh.triangles.len(), 1);
        assert_eq!(mesh.triangles[0].positions, [0, 1, 2]);
        assert_eq!(mesh.triangles[0].uvs, [0, 1, 2]);
    }

    #[test]
    fn fan_triangulates_quad() {
        let obj = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\nf 1/1 2/2 3/3 4/4\n";
        let mesh = parse(obj).unwrap();
        assert_eq!(mesh.triangles.len(), 2);
        assert_eq!(mesh.triangles[0].positions, [0, 1, 2]);
        assert_eq!(mesh.triangles[1].positions, [0, 2, 3]);
    }

    #[test]
    fn short_face_line_is_skipped_not_fatal() {
        let obj = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 2/2
f 1/1 2/2 3/3
f 1/1 3/3 4/4
";
        let mesh = parse(obj).unwrap();
        assert_eq!(mesh.triangles.len(), 2);
        assert_eq!(mesh.triangles[0].positions, [0, 1, 2]);
        assert_eq!(mesh.triangles[1].positions, [0, 2, 3]);
    }

    #[test]
    fn fails_when_every_face_line_is_too_short() {
        let obj = "v 0 0 0\nv 1 0 0\nvt 0 0\nvt 1 0\nf 1/1 2/2\n";
        assert!(matches!(parse(obj), Err(SeamRepairError::MeshNoFaces)));
    }

    #[test]
    fn missing_uv_index_yields_negative_one() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1 2 3\n";
        let mesh = parse(obj).unwrap();
        assert_eq!(mesh.triangles[0].uvs, [-1, -1, -1]);
    }

    #[test]
    fn negative_indices_are_relative() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf -3/-3 -2/-2 -1/-1\n";
        let mesh = parse(obj).unwrap();
        assert_eq!(mesh.triangles[0].positions, [0, 1, 2]);
        assert_eq!(mesh.triangles[0].uvs, [0, 1, 2]);
    }

    #[test]
    fn fails_without_uvs() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        assert!(matches!(
            parse(obj),
            Err(SeamRepairError::MeshMissingUvs)
        ));
    }

    #[test]
    fn fails_without_faces() {
        let obj = "v 0 0 0\nvt 0 0\n";
        assert!(matches!(parse(obj), Err(SeamRepairError::MeshNoFaces)));
    }

    #[test]
    fn normals_are_ignored() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/1/1 2/2/1 3/3/1\n";
        let mesh = parse(obj).unwrap();
        assert_eq!(mesh.triangles.len(), 1);
    }
}
