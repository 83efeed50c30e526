use std::collections::HashSet;
use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use sandscape_assets::{ImageData, MeshData, MeshVertex};
use sandscape_render::{
    DrawCall, DrawGroup, DrawList, LightBlock, LightColor, MeshHandle, ShaderProgram,
    TextureHandle,
};
use wgpu::util::DeviceExt;

use crate::GpuError;
use crate::shaders;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct GpuLightColor {
    ambient: [f32; 4],
    diffuse: [f32; 4],
    specular: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct GpuDirectionalLight {
    direction: [f32; 4],
    color: GpuLightColor,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct GpuPointLight {
    position: [f32; 4],
    color: GpuLightColor,
    attenuation: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct GpuSpotLight {
    position: [f32; 4],
    direction: [f32; 4],
    color: GpuLightColor,
    attenuation: [f32; 4],
    cutoff: [f32; 4],
}

/// Group 0: one slot per draw group.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    view_pos: [f32; 4],
    directional: GpuDirectionalLight,
    points: [GpuPointLight; 3],
    spot: GpuSpotLight,
}

/// Group 1: one slot per draw call.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ObjectUniforms {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 4],
    color: [f32; 4],
    params: [f32; 4],
}

fn vec4(v: Vec3, w: f32) -> [f32; 4] {
    [v.x, v.y, v.z, w]
}

impl From<&LightColor> for GpuLightColor {
    fn from(color: &LightColor) -> Self {
        Self {
            ambient: vec4(color.ambient, 1.0),
            diffuse: vec4(color.diffuse, 1.0),
            specular: vec4(color.specular, 1.0),
        }
    }
}

impl FrameUniforms {
    fn new(group: &DrawGroup) -> Self {
        let LightBlock {
            directional,
            points,
            spot,
        } = &group.lights;
        Self {
            view_proj: group.view_projection().to_cols_array_2d(),
            view_pos: vec4(group.view_position, 1.0),
            directional: GpuDirectionalLight {
                direction: vec4(directional.direction, 0.0),
                color: (&directional.color).into(),
            },
            points: points.map(|p| GpuPointLight {
                position: vec4(p.position, 1.0),
                color: (&p.color).into(),
                attenuation: [
                    p.attenuation.constant,
                    p.attenuation.linear,
                    p.attenuation.quadratic,
                    0.0,
                ],
            }),
            spot: GpuSpotLight {
                position: vec4(spot.position, 1.0),
                direction: vec4(spot.direction, 0.0),
                color: (&spot.color).into(),
                attenuation: [
                    spot.attenuation.constant,
                    spot.attenuation.linear,
                    spot.attenuation.quadratic,
                    0.0,
                ],
                cutoff: [spot.inner_cutoff, spot.outer_cutoff, 0.0, 0.0],
            },
        }
    }
}

/// Inverse-transpose of the model matrix, falling back to the model itself
/// when it cannot be inverted.
fn normal_matrix(model: Mat4) -> Mat4 {
    if model.determinant().abs() > f32::EPSILON {
        model.inverse().transpose()
    } else {
        model
    }
}

impl ObjectUniforms {
    fn new(draw: &DrawCall) -> Self {
        let material = &draw.material;
        Self {
            model: draw.model.to_cols_array_2d(),
            normal: normal_matrix(draw.model).to_cols_array_2d(),
            color: vec4(material.color, 1.0),
            params: [
                material.shininess,
                if material.use_texture && draw.texture.is_some() { 1.0 } else { 0.0 },
                material.time,
                0.0,
            ],
        }
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// A uniform buffer of equally spaced slots bound with dynamic offsets.
/// Grows when a frame needs more slots than it has.
struct UniformArena {
    label: &'static str,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    item_size: u64,
    stride: u64,
    capacity: u64,
}

impl UniformArena {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &'static str,
        item_size: u64,
        alignment: u64,
        capacity: u64,
    ) -> Self {
        let stride = item_size.div_ceil(alignment) * alignment;
        let capacity = capacity.max(1);
        let (buffer, bind_group) =
            Self::allocate(device, layout, label, item_size, stride, capacity);
        Self {
            label,
            buffer,
            bind_group,
            item_size,
            stride,
            capacity,
        }
    }

    fn allocate(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &'static str,
        item_size: u64,
        stride: u64,
        capacity: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: stride * capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(item_size),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn ensure(&mut self, device: &wgpu::Device, layout: &wgpu::BindGroupLayout, count: usize) {
        let count = count as u64;
        if count <= self.capacity {
            return;
        }
        let capacity = count.next_power_of_two();
        tracing::debug!(
            label = self.label,
            from = self.capacity,
            to = capacity,
            "growing uniform arena"
        );
        let (buffer, bind_group) =
            Self::allocate(device, layout, self.label, self.item_size, self.stride, capacity);
        self.buffer = buffer;
        self.bind_group = bind_group;
        self.capacity = capacity;
    }

    fn upload<T: Pod>(&self, queue: &wgpu::Queue, items: &[T]) {
        if items.is_empty() {
            return;
        }
        let stride = self.stride as usize;
        let mut bytes = vec![0u8; stride * items.len()];
        for (slot, item) in bytes.chunks_exact_mut(stride).zip(items) {
            let raw = bytemuck::bytes_of(item);
            slot[..raw.len()].copy_from_slice(raw);
        }
        queue.write_buffer(&self.buffer, 0, &bytes);
    }

    fn offset(&self, index: usize) -> u32 {
        (index as u64 * self.stride) as u32
    }
}

/// Executes `DrawList`s: one pipeline per shader program, uploaded meshes
/// and textures addressed by handle.
pub struct WgpuRenderer {
    lit_pipeline: wgpu::RenderPipeline,
    rug_pipeline: wgpu::RenderPipeline,
    unlit_pipeline: wgpu::RenderPipeline,
    frame_layout: wgpu::BindGroupLayout,
    object_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    frame_uniforms: UniformArena,
    object_uniforms: UniformArena,
    sampler: wgpu::Sampler,
    meshes: Vec<GpuMesh>,
    textures: Vec<wgpu::BindGroup>,
    white_texture: wgpu::BindGroup,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
    clear_color: wgpu::Color,
    missing_meshes: HashSet<MeshHandle>,
    missing_textures: HashSet<TextureHandle>,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let uniform_layout = |label, size: usize| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: NonZeroU64::new(size as u64),
                    },
                    count: None,
                }],
            })
        };
        let frame_layout = uniform_layout("frame_layout", size_of::<FrameUniforms>());
        let object_layout = uniform_layout("object_layout", size_of::<ObjectUniforms>());

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &object_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });

        let pipeline = |label, vs_entry, fs_entry| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some(vs_entry),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: size_of::<MeshVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                            2 => Float32x2,
                        ],
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(fs_entry),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: Some(wgpu::Face::Back),
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
        };
        let lit_pipeline = pipeline("lit_pipeline", "vs_main", "fs_lit");
        let rug_pipeline = pipeline("rug_pipeline", "vs_rug", "fs_lit");
        let unlit_pipeline = pipeline("unlit_pipeline", "vs_main", "fs_unlit");

        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let frame_uniforms = UniformArena::new(
            device,
            &frame_layout,
            "frame_uniforms",
            size_of::<FrameUniforms>() as u64,
            alignment,
            4,
        );
        let object_uniforms = UniformArena::new(
            device,
            &object_layout,
            "object_uniforms",
            size_of::<ObjectUniforms>() as u64,
            alignment,
            512,
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("scene_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let white = ImageData::solid([255, 255, 255, 255]);
        let white_texture = Self::create_texture_bind_group(
            device,
            queue,
            &texture_layout,
            &sampler,
            &white,
            "white",
        );

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            lit_pipeline,
            rug_pipeline,
            unlit_pipeline,
            frame_layout,
            object_layout,
            texture_layout,
            frame_uniforms,
            object_uniforms,
            sampler,
            meshes: Vec::new(),
            textures: Vec::new(),
            white_texture,
            depth_texture,
            surface_format,
            clear_color: wgpu::Color::BLACK,
            missing_meshes: HashSet::new(),
            missing_textures: HashSet::new(),
        }
    }

    pub fn upload_mesh(&mut self, device: &wgpu::Device, mesh: &MeshData) -> MeshHandle {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(mesh.name.as_str()),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(mesh.name.as_str()),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let handle = MeshHandle(self.meshes.len() as u32);
        self.meshes.push(GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        });
        tracing::debug!(
            name = %mesh.name,
            triangles = mesh.triangle_count(),
            ?handle,
            "mesh uploaded"
        );
        handle
    }

    pub fn upload_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &ImageData,
        label: &str,
    ) -> Result<TextureHandle, GpuError> {
        if image.width == 0 || image.height == 0 {
            return Err(GpuError::EmptyTexture(label.to_string()));
        }
        let bind_group = Self::create_texture_bind_group(
            device,
            queue,
            &self.texture_layout,
            &self.sampler,
            image,
            label,
        );
        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(bind_group);
        tracing::debug!(
            label,
            width = image.width,
            height = image.height,
            ?handle,
            "texture uploaded"
        );
        Ok(handle)
    }

    pub fn set_clear_color(&mut self, rgb: [f64; 3]) {
        self.clear_color = wgpu::Color {
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
            a: 1.0,
        };
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Render one recorded frame into `view`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        frame: &DrawList,
    ) {
        let groups = frame.groups();
        let frames: Vec<FrameUniforms> = groups.iter().map(FrameUniforms::new).collect();
        let objects: Vec<ObjectUniforms> = groups
            .iter()
            .flat_map(|g| g.draws.iter())
            .map(ObjectUniforms::new)
            .collect();

        self.report_missing(groups);
        self.frame_uniforms.ensure(device, &self.frame_layout, frames.len());
        self.object_uniforms.ensure(device, &self.object_layout, objects.len());
        self.frame_uniforms.upload(queue, &frames);
        self.object_uniforms.upload(queue, &objects);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scene_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            let mut slot = 0;
            for (index, group) in groups.iter().enumerate() {
                pass.set_pipeline(self.pipeline(group.program));
                pass.set_bind_group(
                    0,
                    &self.frame_uniforms.bind_group,
                    &[self.frame_uniforms.offset(index)],
                );
                for draw in &group.draws {
                    let object_offset = self.object_uniforms.offset(slot);
                    slot += 1;
                    let Some(mesh) = self.meshes.get(draw.mesh.0 as usize) else {
                        continue;
                    };
                    let texture = draw
                        .texture
                        .and_then(|t| self.textures.get(t.0 as usize))
                        .unwrap_or(&self.white_texture);
                    pass.set_bind_group(1, &self.object_uniforms.bind_group, &[object_offset]);
                    pass.set_bind_group(2, texture, &[]);
                    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn pipeline(&self, program: ShaderProgram) -> &wgpu::RenderPipeline {
        match program {
            ShaderProgram::Lit => &self.lit_pipeline,
            ShaderProgram::Rug => &self.rug_pipeline,
            ShaderProgram::Unlit => &self.unlit_pipeline,
        }
    }

    /// Warn once per unknown handle; the draw itself is skipped or falls back
    /// to the white texture.
    fn report_missing(&mut self, groups: &[DrawGroup]) {
        for draw in groups.iter().flat_map(|g| g.draws.iter()) {
            if draw.mesh.0 as usize >= self.meshes.len() && self.missing_meshes.insert(draw.mesh) {
                tracing::warn!(mesh = draw.mesh.0, "draw references unknown mesh, skipping");
            }
            if let Some(texture) = draw.texture {
                if texture.0 as usize >= self.textures.len()
                    && self.missing_textures.insert(texture)
                {
                    tracing::warn!(
                        texture = texture.0,
                        "draw references unknown texture, using white"
                    );
                }
            }
        }
    }

    fn create_texture_bind_group(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        image: &ImageData,
        label: &str,
    ) -> wgpu::BindGroup {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: image.width,
                    height: image.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &image.rgba,
        );
        let view = texture.create_view(&Default::default());
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandscape_render::{MaterialState, ShaderProgram};

    #[test]
    fn uniform_structs_are_vec4_aligned() {
        assert_eq!(size_of::<GpuLightColor>(), 48);
        assert_eq!(size_of::<GpuPointLight>() % 16, 0);
        assert_eq!(size_of::<GpuSpotLight>() % 16, 0);
        assert_eq!(size_of::<FrameUniforms>() % 16, 0);
        assert_eq!(size_of::<ObjectUniforms>(), 160);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let n = normal_matrix(model);
        let normal = n.transform_vector3(Vec3::X);
        assert!(normal.abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn singular_model_keeps_model_as_normal_matrix() {
        let model = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(normal_matrix(model), model);
    }

    #[test]
    fn use_texture_requires_a_bound_texture() {
        let draw = DrawCall {
            mesh: MeshHandle(0),
            texture: None,
            model: Mat4::IDENTITY,
            material: MaterialState {
                use_texture: true,
                ..MaterialState::default()
            },
        };
        assert_eq!(ObjectUniforms::new(&draw).params[1], 0.0);
        let textured = DrawCall {
            texture: Some(TextureHandle(3)),
            ..draw
        };
        assert_eq!(ObjectUniforms::new(&textured).params[1], 1.0);
    }

    #[test]
    fn frame_uniforms_pack_lights() {
        let mut list = DrawList::new();
        let mut lights = LightBlock::default();
        lights.points[1].position = Vec3::new(1.0, 2.0, 3.0);
        lights.spot.inner_cutoff = 0.9;
        {
            let mut lit = list.bind(ShaderProgram::Lit);
            lit.set_lights(&lights);
            lit.draw(MeshHandle(0));
        }
        let packed = FrameUniforms::new(&list.groups()[0]);
        assert_eq!(packed.points[1].position, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(packed.spot.cutoff[0], 0.9);
    }
}
