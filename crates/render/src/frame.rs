use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};

use glam::{Mat4, Vec3};

use crate::lights::LightBlock;

/// Opaque handle to uploaded geometry (a primitive or a loaded mesh).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshHandle(pub u32);

/// Opaque handle to an uploaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// Shader programs the scene can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderProgram {
    /// Textured Phong shading with every light in the `LightBlock`.
    Lit,
    /// `Lit` with a time-driven ripple in the vertex stage.
    Rug,
    /// Flat color, no lighting. Used for light markers.
    Unlit,
}

/// Uniform names understood by the shader programs.
pub mod uniforms {
    pub const COLOR: &str = "uColor";
    pub const SHININESS: &str = "uShininess";
    pub const USE_TEXTURE: &str = "uUseTexture";
    pub const VIEW_POS: &str = "uViewPos";
    pub const TIME: &str = "uTime";
}

impl ShaderProgram {
    pub const ALL: [ShaderProgram; 3] =
        [ShaderProgram::Lit, ShaderProgram::Rug, ShaderProgram::Unlit];

    pub fn name(self) -> &'static str {
        match self {
            ShaderProgram::Lit => "lit",
            ShaderProgram::Rug => "rug",
            ShaderProgram::Unlit => "unlit",
        }
    }

    /// Whether the program declares a uniform with this name.
    pub fn has_uniform(self, name: &str) -> bool {
        use self::uniforms::*;
        match self {
            ShaderProgram::Lit => [COLOR, SHININESS, USE_TEXTURE, VIEW_POS].contains(&name),
            ShaderProgram::Rug => [COLOR, SHININESS, USE_TEXTURE, VIEW_POS, TIME].contains(&name),
            ShaderProgram::Unlit => name == COLOR,
        }
    }

    pub fn is_lit(self) -> bool {
        !matches!(self, ShaderProgram::Unlit)
    }
}

/// Per-draw uniform state. Values persist between draws until overwritten.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialState {
    pub color: Vec3,
    pub shininess: f32,
    pub use_texture: bool,
    pub time: f32,
}

impl Default for MaterialState {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            shininess: 32.0,
            use_texture: false,
            time: 0.0,
        }
    }
}

/// One recorded draw: geometry, bound texture, model matrix and uniforms at
/// the moment it was issued.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub mesh: MeshHandle,
    pub texture: Option<TextureHandle>,
    pub model: Mat4,
    pub material: MaterialState,
}

/// Draws issued while one shader program was bound.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawGroup {
    pub program: ShaderProgram,
    pub projection: Mat4,
    pub view: Mat4,
    pub view_position: Vec3,
    pub lights: LightBlock,
    pub draws: Vec<DrawCall>,
}

impl DrawGroup {
    fn new(program: ShaderProgram) -> Self {
        Self {
            program,
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            view_position: Vec3::ZERO,
            lights: LightBlock::default(),
            draws: Vec::new(),
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Everything drawn in one frame, in submission order.
#[derive(Debug, Default)]
pub struct DrawList {
    groups: Vec<DrawGroup>,
    unknown_uniforms: BTreeSet<(ShaderProgram, String)>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a shader program. The group is committed when the binding drops.
    pub fn bind(&mut self, program: ShaderProgram) -> ShaderBinding<'_> {
        ShaderBinding {
            group: DrawGroup::new(program),
            list: self,
            material: MaterialState::default(),
            model: Mat4::IDENTITY,
            texture: None,
        }
    }

    pub fn groups(&self) -> &[DrawGroup] {
        &self.groups
    }

    pub fn draw_count(&self) -> usize {
        self.groups.iter().map(|g| g.draws.len()).sum()
    }

    /// Draw calls issued under one program across all groups.
    pub fn draws_with(&self, program: ShaderProgram) -> impl Iterator<Item = &DrawCall> {
        self.groups
            .iter()
            .filter(move |g| g.program == program)
            .flat_map(|g| g.draws.iter())
    }

    fn report_unknown(&mut self, program: ShaderProgram, name: &str) {
        if self.unknown_uniforms.insert((program, name.to_string())) {
            tracing::warn!(program = program.name(), uniform = name, "uniform not found, ignoring");
        }
    }
}

/// Scoped shader binding. Uniform setters mirror a GL-style program: values
/// stick until overwritten, and a name the program does not declare is
/// logged once and ignored.
pub struct ShaderBinding<'a> {
    list: &'a mut DrawList,
    group: DrawGroup,
    material: MaterialState,
    model: Mat4,
    texture: Option<TextureHandle>,
}

impl<'a> ShaderBinding<'a> {
    pub fn program(&self) -> ShaderProgram {
        self.group.program
    }

    pub fn set_projection(&mut self, projection: Mat4) {
        self.group.projection = projection;
    }

    pub fn set_view(&mut self, view: Mat4) {
        self.group.view = view;
    }

    pub fn set_model(&mut self, model: Mat4) {
        self.model = model;
    }

    /// Light uniforms. Ignored (with a warning) by unlit programs.
    pub fn set_lights(&mut self, lights: &LightBlock) {
        if self.group.program.is_lit() {
            self.group.lights = *lights;
        } else {
            self.list.report_unknown(self.group.program, "uLights");
        }
    }

    pub fn set_uniform_3f(&mut self, name: &str, value: Vec3) {
        if !self.declares(name) {
            return;
        }
        match name {
            uniforms::COLOR => self.material.color = value,
            uniforms::VIEW_POS => self.group.view_position = value,
            _ => self.list.report_unknown(self.group.program, name),
        }
    }

    pub fn set_uniform_1f(&mut self, name: &str, value: f32) {
        if !self.declares(name) {
            return;
        }
        match name {
            uniforms::SHININESS => self.material.shininess = value,
            uniforms::TIME => self.material.time = value,
            _ => self.list.report_unknown(self.group.program, name),
        }
    }

    pub fn set_uniform_1i(&mut self, name: &str, value: i32) {
        if !self.declares(name) {
            return;
        }
        match name {
            uniforms::USE_TEXTURE => self.material.use_texture = value != 0,
            _ => self.list.report_unknown(self.group.program, name),
        }
    }

    /// Bind a texture for the lifetime of the returned guard. The previous
    /// texture is restored when the guard drops.
    pub fn bind_texture(&mut self, texture: TextureHandle) -> TextureBinding<'_, 'a> {
        let previous = self.texture.replace(texture);
        TextureBinding {
            binding: self,
            previous,
        }
    }

    /// Issue a draw with the current model matrix, texture and uniforms.
    pub fn draw(&mut self, mesh: MeshHandle) {
        self.group.draws.push(DrawCall {
            mesh,
            texture: self.texture,
            model: self.model,
            material: self.material,
        });
    }

    fn declares(&mut self, name: &str) -> bool {
        let ok = self.group.program.has_uniform(name);
        if !ok {
            self.list.report_unknown(self.group.program, name);
        }
        ok
    }
}

impl Drop for ShaderBinding<'_> {
    fn drop(&mut self) {
        let program = self.group.program;
        let group = std::mem::replace(&mut self.group, DrawGroup::new(program));
        if !group.draws.is_empty() {
            self.list.groups.push(group);
        }
    }
}

/// Scoped texture binding inside a `ShaderBinding`.
pub struct TextureBinding<'b, 'a> {
    binding: &'b mut ShaderBinding<'a>,
    previous: Option<TextureHandle>,
}

impl<'a> Deref for TextureBinding<'_, 'a> {
    type Target = ShaderBinding<'a>;

    fn deref(&self) -> &Self::Target {
        self.binding
    }
}

impl DerefMut for TextureBinding<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.binding
    }
}

impl Drop for TextureBinding<'_, '_> {
    fn drop(&mut self) {
        self.binding.texture = self.previous;
    }
}
