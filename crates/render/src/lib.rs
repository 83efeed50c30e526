//! Rendering interface: a renderer-agnostic description of one frame.
//!
//! # Invariants
//! - The scene records draws; it never talks to a GPU API directly.
//! - Shader and texture bindings are scoped guards. A group is committed when
//!   its shader binding drops, and a texture binding restores the previous
//!   texture when it drops, so no binding leaks into the next draw group.
//! - Uniforms unknown to the bound program are logged and ignored.

mod frame;
mod lights;
mod renderer;

pub use frame::{
    DrawCall, DrawGroup, DrawList, MaterialState, MeshHandle, ShaderBinding, ShaderProgram,
    TextureBinding, TextureHandle, uniforms,
};
pub use lights::{
    Attenuation, DirectionalLight, LightBlock, LightColor, POINT_LIGHT_COUNT, PointLight,
    SpotLight,
};
pub use renderer::{DebugTextRenderer, DrawStats, Renderer};

pub fn crate_info() -> &'static str {
    "sandscape-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
