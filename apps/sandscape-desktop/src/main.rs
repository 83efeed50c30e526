mod bindings;
mod frame_loop;
mod overlay;
mod scene_assets;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use egui::Context as EguiContext;
use rand::SeedableRng;
use rand::rngs::StdRng;
use sandscape_kernel::{Scene, SceneConfig, SceneHandles, SystemClock, ThreadSleeper, aspect_ratio};
use sandscape_render_wgpu::{GpuContext, WgpuRenderer};
use sandscape_tools::FrameInspector;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use crate::frame_loop::{FrameDriver, FrameOutcome};

/// Everything that exists only once a window does.
struct Gpu {
    window: Arc<Window>,
    context: GpuContext,
    renderer: WgpuRenderer,
    handles: SceneHandles,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(
        event_loop: &ActiveEventLoop,
        config: &SceneConfig,
        egui_ctx: &EguiContext,
    ) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(config.window.title.clone())
            .with_inner_size(PhysicalSize::new(config.window.width, config.window.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let size = window.inner_size();
        let context = pollster::block_on(GpuContext::new(window.clone(), size.width, size.height))
            .context("failed to initialize GPU")?;
        let (width, height) = context.size();

        let mut renderer =
            WgpuRenderer::new(&context.device, &context.queue, context.format(), width, height);
        renderer.set_clear_color(config.window.clear_color);

        let root = scene_assets::asset_root();
        let handles =
            scene_assets::upload(&mut renderer, &context.device, &context.queue, &root)?;

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer =
            egui_wgpu::Renderer::new(&context.device, context.format(), None, 1, false);

        Ok(Self {
            window,
            context,
            renderer,
            handles,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.context.resize(size.width, size.height);
        let (width, height) = self.context.size();
        self.renderer.resize(&self.context.device, width, height);
    }

    fn aspect(&self) -> f32 {
        let (width, height) = self.context.size();
        aspect_ratio(width, height)
    }
}

type Driver = FrameDriver<SystemClock, ThreadSleeper, StdRng>;

struct App {
    driver: Driver,
    egui_ctx: EguiContext,
    gpu: Option<Gpu>,
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(config: SceneConfig) -> Self {
        Self {
            driver: FrameDriver::new(
                Scene::new(config),
                SystemClock::default(),
                ThreadSleeper,
                StdRng::from_entropy(),
            ),
            egui_ctx: EguiContext::default(),
            gpu: None,
            fatal: None,
        }
    }

    /// One paced frame. A frame the surface cannot show is still paced.
    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let egui_ctx = &self.egui_ctx;
        let gpu = self.gpu.as_mut();
        let outcome = self.driver.run_frame(move |driver| {
            if let Some(gpu) = gpu {
                render(gpu, egui_ctx, driver);
            }
        });

        match outcome {
            FrameOutcome::Quit => {
                tracing::info!("quit requested");
                event_loop.exit();
            }
            FrameOutcome::Paced { .. } => {
                if let Some(gpu) = &self.gpu {
                    gpu.window.request_redraw();
                }
            }
        }
    }
}

/// Compose, draw and present the scene. Returns early, without presenting,
/// when the surface has no texture to give.
fn render(gpu: &mut Gpu, egui_ctx: &EguiContext, driver: &Driver) {
    let scene = driver.scene();
    let frame = scene.compose(&gpu.handles, gpu.aspect());

    let output = match gpu.context.surface.get_current_texture() {
        Ok(t) => t,
        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
            gpu.context.reconfigure();
            return;
        }
        Err(e) => {
            tracing::error!("surface error: {e}");
            return;
        }
    };
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    gpu.renderer
        .render(&gpu.context.device, &gpu.context.queue, &view, &frame);

    if driver.show_overlay() {
        let summary = FrameInspector::summary(scene, &frame, Some(driver.pacer().timer()));
        draw_overlay(gpu, egui_ctx, &view, |ctx| overlay::draw(ctx, &summary));
    }

    output.present();
}

fn draw_overlay(
    gpu: &mut Gpu,
    egui_ctx: &EguiContext,
    view: &wgpu::TextureView,
    ui: impl FnMut(&EguiContext),
) {
    let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
    let full_output = egui_ctx.run(raw_input, ui);
    gpu.egui_winit
        .handle_platform_output(&gpu.window, full_output.platform_output);

    let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
    let (width, height) = gpu.context.size();
    let screen_descriptor = egui_wgpu::ScreenDescriptor {
        size_in_pixels: [width, height],
        pixels_per_point: full_output.pixels_per_point,
    };

    let device = &gpu.context.device;
    let queue = &gpu.context.queue;
    for (id, image_delta) in &full_output.textures_delta.set {
        gpu.egui_renderer
            .update_texture(device, queue, *id, image_delta);
    }
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("egui_encoder"),
    });
    gpu.egui_renderer
        .update_buffers(device, queue, &mut encoder, &paint_jobs, &screen_descriptor);
    {
        let mut pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            })
            .forget_lifetime();
        gpu.egui_renderer
            .render(&mut pass, &paint_jobs, &screen_descriptor);
    }
    queue.submit(std::iter::once(encoder.finish()));
    for id in &full_output.textures_delta.free {
        gpu.egui_renderer.free_texture(id);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, self.driver.scene().config(), &self.egui_ctx) {
            Ok(gpu) => {
                gpu.window.request_redraw();
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("startup failed: {e:#}");
                self.fatal = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.driver.show_overlay() {
            if let Some(gpu) = self.gpu.as_mut() {
                if gpu.egui_winit.on_window_event(&gpu.window, &event).consumed {
                    return;
                }
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(size);
                }
            }
            WindowEvent::Focused(false) => {
                // Releases may never arrive once focus is gone.
                self.driver.focus_lost();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                if let Some(input) = bindings::key_event(key, state, repeat) {
                    self.driver.push(input);
                }
            }
            WindowEvent::RedrawRequested => self.frame(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("sandscape-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(SceneConfig::desert());
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
