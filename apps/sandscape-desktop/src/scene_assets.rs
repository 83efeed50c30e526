use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sandscape_assets::{load_image, load_obj, primitives};
use sandscape_kernel::{PYRAMID_APEXES, SceneHandles};
use sandscape_render::{MeshHandle, TextureHandle};
use sandscape_render_wgpu::WgpuRenderer;

/// Directory holding `models/` and `textures/`: `./res` when launched from
/// the workspace root, otherwise the copy next to the sources.
pub fn asset_root() -> PathBuf {
    let local = PathBuf::from("res");
    if local.is_dir() {
        return local;
    }
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../res")
}

/// Upload every mesh and texture the scene draws. Any missing or malformed
/// file is fatal.
pub fn upload(
    renderer: &mut WgpuRenderer,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    root: &Path,
) -> Result<SceneHandles> {
    let _span = tracing::info_span!("load_assets", root = %root.display()).entered();

    let cube = renderer.upload_mesh(device, &primitives::cube(0.2));
    let tile = renderer.upload_mesh(device, &primitives::tile());
    let pyramids =
        PYRAMID_APEXES.map(|apex| renderer.upload_mesh(device, &primitives::pyramid(apex)));

    let handles = SceneHandles {
        cube,
        tile,
        pyramids,
        statue: mesh(renderer, device, &root.join("models/statue.obj"))?,
        rug: mesh(renderer, device, &root.join("models/rug.obj"))?,
        sand: texture(renderer, device, queue, &root.join("textures/sand.ppm"))?,
        stone: texture(renderer, device, queue, &root.join("textures/stone.ppm"))?,
        rock: texture(renderer, device, queue, &root.join("textures/rock.ppm"))?,
        statue_texture: texture(renderer, device, queue, &root.join("textures/statue.ppm"))?,
        rug_texture: texture(renderer, device, queue, &root.join("textures/rug.ppm"))?,
    };
    tracing::info!("scene assets loaded");
    Ok(handles)
}

fn mesh(renderer: &mut WgpuRenderer, device: &wgpu::Device, path: &Path) -> Result<MeshHandle> {
    let data = load_obj(path).with_context(|| format!("failed to load mesh {}", path.display()))?;
    Ok(renderer.upload_mesh(device, &data))
}

fn texture(
    renderer: &mut WgpuRenderer,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    path: &Path,
) -> Result<TextureHandle> {
    let image =
        load_image(path).with_context(|| format!("failed to load texture {}", path.display()))?;
    let label = path.file_stem().and_then(|s| s.to_str()).unwrap_or("texture");
    renderer
        .upload_texture(device, queue, &image, label)
        .with_context(|| format!("failed to upload texture {}", path.display()))
}
