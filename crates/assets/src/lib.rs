//! Asset loading: OBJ meshes and image textures from disk, plus the procedural
//! primitives the scene draws (cubes, pyramids, floor tiles).
//!
//! Everything here is CPU-side. The render backend uploads `MeshData` and
//! `ImageData` and hands back opaque handles; the scene only sees handles.

mod obj;
pub mod primitives;
mod texture;

use bytemuck::{Pod, Zeroable};

pub use obj::{load_obj, parse_obj};
pub use texture::{ImageData, load_image};

/// Interleaved vertex shared by every mesh: position, normal, texture coordinate.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Indexed triangle mesh.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds as (min, max). `None` for an empty mesh.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = self.vertices.first()?.position;
        let mut min = first;
        let mut max = first;
        for v in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v.position[i]);
                max[i] = max[i].max(v.position[i]);
            }
        }
        Some((min, max))
    }
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OBJ parse error at line {line}: {message}")]
    ObjParse { line: usize, message: String },
    #[error("mesh {0:?} has no faces")]
    EmptyMesh(String),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
}

pub fn crate_info() -> &'static str {
    "sandscape-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_of_cube() {
        let cube = primitives::cube(0.5);
        let (min, max) = cube.bounds().unwrap();
        assert_eq!(min, [-0.5, -0.5, -0.5]);
        assert_eq!(max, [0.5, 0.5, 0.5]);
    }

    #[test]
    fn bounds_of_empty_mesh() {
        assert!(MeshData::default().bounds().is_none());
    }
}
