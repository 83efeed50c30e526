//! Procedural static geometry: cube, pyramid variants and the floor tile.

use glam::Vec3;

use crate::{MeshData, MeshVertex};

/// Axis-aligned cube centred on the origin with the given half extent.
pub fn cube(half: f32) -> MeshData {
    let p = half;
    // (normal, four corners counter-clockwise seen from outside)
    #[rustfmt::skip]
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([0.0, 0.0, 1.0],  [[-p, -p,  p], [ p, -p,  p], [ p,  p,  p], [-p,  p,  p]]),
        ([0.0, 0.0, -1.0], [[ p, -p, -p], [-p, -p, -p], [-p,  p, -p], [ p,  p, -p]]),
        ([1.0, 0.0, 0.0],  [[ p, -p,  p], [ p, -p, -p], [ p,  p, -p], [ p,  p,  p]]),
        ([-1.0, 0.0, 0.0], [[-p, -p, -p], [-p, -p,  p], [-p,  p,  p], [-p,  p, -p]]),
        ([0.0, 1.0, 0.0],  [[-p,  p,  p], [ p,  p,  p], [ p,  p, -p], [-p,  p, -p]]),
        ([0.0, -1.0, 0.0], [[-p, -p, -p], [ p, -p, -p], [ p, -p,  p], [-p, -p,  p]]),
    ];
    let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, corners) in faces {
        let base = vertices.len() as u32;
        for (position, uv) in corners.into_iter().zip(uvs) {
            vertices.push(MeshVertex {
                position,
                normal,
                uv,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    MeshData {
        name: "cube".into(),
        vertices,
        indices,
    }
}

/// Square-based pyramid: base spans [-1, 1] on x and z at y = 0, apex at
/// (`apex_x`, 3, 0). Shifting the apex off-centre gives the three silhouettes
/// used in the scene.
pub fn pyramid(apex_x: f32) -> MeshData {
    let corners = [
        Vec3::new(-1.0, 0.0, -1.0),
        Vec3::new(-1.0, 0.0, 1.0),
        Vec3::new(1.0, 0.0, -1.0),
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(apex_x, 3.0, 0.0),
    ];
    let triangles = [[0, 1, 2], [1, 3, 2], [0, 4, 1], [1, 4, 3], [2, 3, 4], [0, 2, 4]];
    let mut mesh = flat_shaded(&corners, &triangles);
    mesh.name = format!("pyramid({apex_x})");
    mesh
}

/// Unit floor tile on the XZ plane facing +Y, spanning [-0.5, 0.5].
pub fn tile() -> MeshData {
    let corners = [
        ([-0.5, 0.0, 0.5], [0.0, 1.0]),
        ([0.5, 0.0, 0.5], [1.0, 1.0]),
        ([0.5, 0.0, -0.5], [1.0, 0.0]),
        ([-0.5, 0.0, -0.5], [0.0, 0.0]),
    ];
    let vertices = corners
        .into_iter()
        .map(|(position, uv)| MeshVertex {
            position,
            normal: [0.0, 1.0, 0.0],
            uv,
        })
        .collect();
    MeshData {
        name: "tile".into(),
        vertices,
        indices: vec![0, 1, 2, 2, 3, 0],
    }
}

/// Build a flat-shaded mesh, one vertex per triangle corner. Each triangle is
/// wound so its normal points away from the centroid of all corners.
fn flat_shaded(corners: &[Vec3], triangles: &[[usize; 3]]) -> MeshData {
    let centroid = corners.iter().copied().sum::<Vec3>() / corners.len() as f32;
    let mut vertices = Vec::with_capacity(triangles.len() * 3);
    let mut indices = Vec::with_capacity(triangles.len() * 3);

    for &[a, b, c] in triangles {
        let (pa, mut pb, mut pc) = (corners[a], corners[b], corners[c]);
        let mut normal = (pb - pa).cross(pc - pa);
        let face_centre = (pa + pb + pc) / 3.0;
        if normal.dot(face_centre - centroid) < 0.0 {
            std::mem::swap(&mut pb, &mut pc);
            normal = -normal;
        }
        let normal = normal.normalize_or_zero().to_array();
        let uvs = [[0.0, 1.0], [1.0, 1.0], [0.5, 0.0]];
        for (p, uv) in [pa, pb, pc].into_iter().zip(uvs) {
            indices.push(vertices.len() as u32);
            vertices.push(MeshVertex {
                position: p.to_array(),
                normal,
                uv,
            });
        }
    }
    MeshData {
        name: String::new(),
        vertices,
        indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_outward(mesh: &MeshData) {
        let centroid = mesh
            .vertices
            .iter()
            .map(|v| Vec3::from(v.position))
            .sum::<Vec3>()
            / mesh.vertices.len() as f32;
        for tri in mesh.indices.chunks_exact(3) {
            let p: Vec<Vec3> = tri
                .iter()
                .map(|&i| Vec3::from(mesh.vertices[i as usize].position))
                .collect();
            let winding_normal = (p[1] - p[0]).cross(p[2] - p[0]);
            let face_centre = (p[0] + p[1] + p[2]) / 3.0;
            assert!(
                winding_normal.dot(face_centre - centroid) > 0.0,
                "triangle {tri:?} of {} faces inward",
                mesh.name
            );
        }
    }

    #[test]
    fn cube_counts() {
        let mesh = cube(0.2);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn cube_faces_outward() {
        assert_outward(&cube(1.0));
    }

    #[test]
    fn pyramids_face_outward() {
        for apex in [-1.0, 0.0, 1.0] {
            assert_outward(&pyramid(apex));
        }
    }

    #[test]
    fn pyramid_apex_height() {
        let mesh = pyramid(1.0);
        let (_, max) = mesh.bounds().unwrap();
        assert_eq!(max[1], 3.0);
        assert_eq!(mesh.triangle_count(), 6);
    }

    #[test]
    fn tile_faces_up() {
        let mesh = tile();
        let p: Vec<Vec3> = mesh.indices[..3]
            .iter()
            .map(|&i| Vec3::from(mesh.vertices[i as usize].position))
            .collect();
        let n = (p[1] - p[0]).cross(p[2] - p[0]);
        assert!(n.y > 0.0);
    }
}
