use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use glam::Vec3;

use crate::{AssetError, MeshData, MeshVertex};

/// Load a Wavefront OBJ file. Polygons are fan-triangulated; materials and
/// groups are ignored.
pub fn load_obj(path: impl AsRef<Path>) -> Result<MeshData, AssetError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("mesh")
        .to_string();
    let mut mesh = parse_obj(BufReader::new(file), &name)?;
    mesh.name = name;
    tracing::debug!(
        path = %path.display(),
        vertices = mesh.vertices.len(),
        triangles = mesh.triangle_count(),
        "loaded OBJ mesh"
    );
    Ok(mesh)
}

/// Parse OBJ text from any reader.
pub fn parse_obj(reader: impl BufRead, name: &str) -> Result<MeshData, AssetError> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();

    let mut vertices: Vec<MeshVertex> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut lookup: HashMap<(usize, Option<usize>, Option<usize>), u32> = HashMap::new();
    let mut any_missing_normal = false;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = line_no + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        let rest: Vec<&str> = parts.collect();

        match tag {
            "v" => positions.push(parse_vec3(&rest, line_no)?),
            "vn" => normals.push(parse_vec3(&rest, line_no)?),
            "vt" => {
                let [u, v] = parse_floats::<2>(&rest, line_no)?;
                uvs.push([u, 1.0 - v]);
            }
            "f" => {
                if rest.len() < 3 {
                    return Err(parse_error(line_no, "face needs at least 3 vertices"));
                }
                let mut corners = Vec::with_capacity(rest.len());
                for token in &rest {
                    let key = parse_corner(
                        token,
                        line_no,
                        positions.len(),
                        uvs.len(),
                        normals.len(),
                    )?;
                    let index = match lookup.get(&key) {
                        Some(&i) => i,
                        None => {
                            let (p, t, n) = key;
                            any_missing_normal |= n.is_none();
                            let vertex = MeshVertex {
                                position: positions[p].to_array(),
                                normal: n.map(|n| normals[n].to_array()).unwrap_or([0.0; 3]),
                                uv: t.map(|t| uvs[t]).unwrap_or([0.0, 0.0]),
                            };
                            let i = vertices.len() as u32;
                            vertices.push(vertex);
                            lookup.insert(key, i);
                            i
                        }
                    };
                    corners.push(index);
                }
                for k in 1..corners.len() - 1 {
                    indices.extend_from_slice(&[corners[0], corners[k], corners[k + 1]]);
                }
            }
            // Groups, objects, materials and smoothing groups carry no geometry.
            _ => {}
        }
    }

    if indices.is_empty() {
        return Err(AssetError::EmptyMesh(name.to_string()));
    }

    let mut mesh = MeshData {
        name: name.to_string(),
        vertices,
        indices,
    };
    if any_missing_normal {
        accumulate_normals(&mut mesh);
    }
    Ok(mesh)
}

/// Fill zero normals with the area-weighted average of adjacent face normals.
fn accumulate_normals(mesh: &mut MeshData) {
    let mut sums = vec![Vec3::ZERO; mesh.vertices.len()];
    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let pa = Vec3::from(mesh.vertices[a].position);
        let pb = Vec3::from(mesh.vertices[b].position);
        let pc = Vec3::from(mesh.vertices[c].position);
        let n = (pb - pa).cross(pc - pa);
        sums[a] += n;
        sums[b] += n;
        sums[c] += n;
    }
    for (vertex, sum) in mesh.vertices.iter_mut().zip(sums) {
        if vertex.normal == [0.0; 3] {
            vertex.normal = sum.normalize_or(Vec3::Y).to_array();
        }
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> AssetError {
    AssetError::ObjParse {
        line,
        message: message.into(),
    }
}

fn parse_floats<const N: usize>(parts: &[&str], line: usize) -> Result<[f32; N], AssetError> {
    if parts.len() < N {
        return Err(parse_error(line, format!("expected {N} numbers")));
    }
    let mut out = [0.0; N];
    for (slot, text) in out.iter_mut().zip(parts) {
        *slot = text
            .parse()
            .map_err(|_| parse_error(line, format!("invalid number {text:?}")))?;
    }
    Ok(out)
}

fn parse_vec3(parts: &[&str], line: usize) -> Result<Vec3, AssetError> {
    parse_floats::<3>(parts, line).map(Vec3::from_array)
}

/// Resolve one `v`, `v/vt`, `v//vn` or `v/vt/vn` corner to zero-based indices.
fn parse_corner(
    token: &str,
    line: usize,
    positions: usize,
    uvs: usize,
    normals: usize,
) -> Result<(usize, Option<usize>, Option<usize>), AssetError> {
    let mut fields = token.split('/');
    let p = fields
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| parse_error(line, format!("missing position index in {token:?}")))?;
    let p = resolve_index(p, positions, line)?;
    let t = match fields.next() {
        Some(s) if !s.is_empty() => Some(resolve_index(s, uvs, line)?),
        _ => None,
    };
    let n = match fields.next() {
        Some(s) if !s.is_empty() => Some(resolve_index(s, normals, line)?),
        _ => None,
    };
    Ok((p, t, n))
}

/// OBJ indices are one-based; negative values count back from the end.
fn resolve_index(text: &str, len: usize, line: usize) -> Result<usize, AssetError> {
    let raw: i64 = text
        .parse()
        .map_err(|_| parse_error(line, format!("invalid index {text:?}")))?;
    let resolved = if raw > 0 {
        raw - 1
    } else if raw < 0 {
        len as i64 + raw
    } else {
        -1
    };
    if resolved < 0 || resolved >= len as i64 {
        return Err(parse_error(line, format!("index {raw} out of range")));
    }
    Ok(resolved as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    const QUAD: &str = "\
# unit quad
v 0 0 0
v 1 0 0
v 1 0 1
v 0 0 1
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 1 0
f 1/1/1 4/4/1 3/3/1 2/2/1
";

    #[test]
    fn quad_is_fan_triangulated() {
        let mesh = parse_obj(Cursor::new(QUAD), "quad").unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn texture_v_is_flipped() {
        let mesh = parse_obj(Cursor::new(QUAD), "quad").unwrap();
        assert_eq!(mesh.vertices[0].uv, [0.0, 1.0]);
    }

    #[test]
    fn missing_normals_are_generated() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 0 -1\nf 1 2 3\n";
        let mesh = parse_obj(Cursor::new(text), "tri").unwrap();
        for v in &mesh.vertices {
            assert_eq!(v.normal, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn negative_indices_count_from_end() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let mesh = parse_obj(Cursor::new(text), "tri").unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertices[2].position, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn shared_corners_are_deduplicated() {
        let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3\nf 1 3 4\n";
        let mesh = parse_obj(Cursor::new(text), "quad").unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let text = "v 0 0 0\nf 1 2 3\n";
        let err = parse_obj(Cursor::new(text), "bad").unwrap_err();
        assert!(matches!(err, AssetError::ObjParse { line: 2, .. }));
    }

    #[test]
    fn malformed_number_is_rejected() {
        let text = "v 0 zero 0\n";
        let err = parse_obj(Cursor::new(text), "bad").unwrap_err();
        assert!(matches!(err, AssetError::ObjParse { line: 1, .. }));
    }

    #[test]
    fn file_without_faces_is_empty() {
        let err = parse_obj(Cursor::new("v 0 0 0\n"), "points").unwrap_err();
        assert!(matches!(err, AssetError::EmptyMesh(_)));
    }

    #[test]
    fn load_from_disk_uses_file_stem() {
        let mut tmp = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        tmp.write_all(QUAD.as_bytes()).unwrap();
        let mesh = load_obj(tmp.path()).unwrap();
        let stem = tmp.path().file_stem().unwrap().to_str().unwrap();
        assert_eq!(mesh.name, stem);
    }

    #[test]
    fn unreadable_path_is_io_error() {
        let err = load_obj("/nonexistent/rug.obj").unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));
    }
}
