//! wgpu render backend for the desert scene.
//!
//! Executes a `DrawList` recorded by the scene: one pipeline per shader
//! program, per-group frame uniforms and per-draw object uniforms in
//! dynamically offset buffers, and a texture bind group per uploaded image.
//!
//! # Invariants
//! - The renderer never mutates scene state; it only reads the draw list.
//! - Unknown mesh handles skip the draw; unknown texture handles fall back to
//!   a 1x1 white texture. Both warn once per handle.

mod context;
mod gpu;
mod shaders;

pub use context::GpuContext;
pub use gpu::WgpuRenderer;

/// Errors from GPU setup and uploads.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("texture {0:?} has zero size")]
    EmptyTexture(String),
}
