use glam::{Mat4, Vec3};
use sandscape_common::{Placement, TransformStep};
use sandscape_render::{
    Attenuation, DirectionalLight, LightBlock, LightColor, MeshHandle, POINT_LIGHT_COUNT,
    PointLight, SpotLight, TextureHandle,
};
use serde::Serialize;

use crate::camera::{CameraConfig, Projection};
use crate::lighting::{FlickerRule, LightConfig};
use crate::pacing::DeltaMode;
use crate::rug::RugConfig;

#[derive(Debug, Clone, Serialize)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: [f64; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct PacingConfig {
    pub target_fps: f32,
    pub delta_mode: DeltaMode,
}

/// A ring of copies of one cube, each rotated a little further.
#[derive(Debug, Clone, Serialize)]
pub struct MoonConfig {
    pub position: Vec3,
    pub scale: f32,
    pub axis: Vec3,
    pub steps: u32,
    pub increment_degrees: f32,
    pub color: Vec3,
}

impl MoonConfig {
    /// Model matrix of instance `k`: `translate ∘ scale ∘ rotate(k·increment)`.
    pub fn instance_model(&self, k: u32) -> Mat4 {
        Placement::new([
            TransformStep::Translate(self.position),
            TransformStep::uniform_scale(self.scale),
            TransformStep::Rotate {
                degrees: k as f32 * self.increment_degrees,
                axis: self.axis,
            },
        ])
        .model_matrix()
    }
}

/// How the floor loop places its tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FloorTiling {
    /// Every grid cell gets its own offset.
    #[default]
    Tiled,
    /// Every iteration reuses the center transform, drawing one tile
    /// `rows * cols` times.
    Overdrawn,
}

#[derive(Debug, Clone, Serialize)]
pub struct FloorConfig {
    pub rows: u32,
    pub cols: u32,
    pub tile_size: f32,
    /// Center of the grid.
    pub center: Vec3,
    pub tiling: FloorTiling,
}

impl FloorConfig {
    /// One model matrix per grid cell, row-major.
    pub fn cell_models(&self) -> Vec<Mat4> {
        let half_x = (self.cols as f32 - 1.0) * 0.5;
        let half_z = (self.rows as f32 - 1.0) * 0.5;
        let scale = Mat4::from_scale(Vec3::new(self.tile_size, 1.0, self.tile_size));
        let mut models = Vec::with_capacity((self.rows * self.cols) as usize);
        for row in 0..self.rows {
            for col in 0..self.cols {
                let offset = match self.tiling {
                    FloorTiling::Tiled => Vec3::new(
                        (col as f32 - half_x) * self.tile_size,
                        0.0,
                        (row as f32 - half_z) * self.tile_size,
                    ),
                    FloorTiling::Overdrawn => Vec3::ZERO,
                };
                models.push(Mat4::from_translation(self.center + offset) * scale);
            }
        }
        models
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PyramidConfig {
    /// Which of the three apex variants to draw.
    pub variant: usize,
    pub placement: Placement,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaterialConfig {
    pub shininess: f32,
    pub stone_shininess: f32,
    pub rug_shininess: f32,
}

/// Every tunable of the desert scene, built once at startup.
#[derive(Debug, Clone, Serialize)]
pub struct SceneConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub projection: Projection,
    pub pacing: PacingConfig,
    pub moon: MoonConfig,
    pub floor: FloorConfig,
    pub pyramids: Vec<PyramidConfig>,
    pub rocks: Vec<Placement>,
    pub statues: Vec<Placement>,
    pub rug: RugConfig,
    pub lights: LightConfig,
    pub marker_scale: f32,
    pub materials: MaterialConfig,
}

/// Apex x of the three pyramid variants.
pub const PYRAMID_APEXES: [f32; 3] = [-1.0, 1.0, 0.0];

/// Backend handles the composer draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneHandles {
    pub cube: MeshHandle,
    pub tile: MeshHandle,
    pub pyramids: [MeshHandle; 3],
    pub statue: MeshHandle,
    pub rug: MeshHandle,
    pub sand: TextureHandle,
    pub stone: TextureHandle,
    pub rock: TextureHandle,
    pub statue_texture: TextureHandle,
    pub rug_texture: TextureHandle,
}

impl SceneHandles {
    /// Distinct placeholder handles for headless composition.
    pub fn placeholder() -> Self {
        Self {
            cube: MeshHandle(0),
            tile: MeshHandle(1),
            pyramids: [MeshHandle(2), MeshHandle(3), MeshHandle(4)],
            statue: MeshHandle(5),
            rug: MeshHandle(6),
            sand: TextureHandle(0),
            stone: TextureHandle(1),
            rock: TextureHandle(2),
            statue_texture: TextureHandle(3),
            rug_texture: TextureHandle(4),
        }
    }
}

const FLOOR_Y: f32 = -0.75;

impl SceneConfig {
    pub fn desert() -> Self {
        Self {
            window: WindowConfig {
                title: "Egypt world".into(),
                width: 1280,
                height: 720,
                clear_color: [0.0902, 0.0902, 0.0902],
            },
            camera: CameraConfig::default(),
            projection: Projection::default(),
            pacing: PacingConfig {
                target_fps: 60.0,
                delta_mode: DeltaMode::FrameTime,
            },
            moon: MoonConfig {
                position: Vec3::new(5.0, 3.5, 0.0),
                scale: 0.7,
                axis: Vec3::new(1.0, 1.0, 0.0),
                steps: 360,
                increment_degrees: 1.0,
                color: Vec3::new(0.85, 0.85, 0.78),
            },
            floor: FloorConfig {
                rows: 6,
                cols: 6,
                tile_size: 4.0,
                center: Vec3::new(0.0, FLOOR_Y, 0.0),
                tiling: FloorTiling::Tiled,
            },
            pyramids: desert_pyramids(),
            rocks: desert_rocks(),
            statues: desert_statues(),
            rug: RugConfig::default(),
            lights: desert_lights(),
            marker_scale: 0.5,
            materials: MaterialConfig {
                shininess: 16.0,
                stone_shininess: 4.0,
                rug_shininess: 32.0,
            },
        }
    }
}

fn desert_pyramids() -> Vec<PyramidConfig> {
    // Scale first, then translate in scaled units, then turn about Y.
    let pyramid = |variant, scale: f32, at: Vec3, yaw: f32| PyramidConfig {
        variant,
        placement: Placement::new([
            TransformStep::uniform_scale(scale),
            TransformStep::Translate(at),
            TransformStep::rotate_y(yaw),
        ]),
    };
    vec![
        pyramid(0, 0.5, Vec3::new(-1.2, -1.5, -2.5), 10.0),
        pyramid(1, 0.37, Vec3::new(3.8, -2.0, -2.0), -5.0),
        pyramid(2, 0.2, Vec3::new(5.0, -3.75, 5.0), -30.0),
    ]
}

fn desert_rocks() -> Vec<Placement> {
    [
        (Vec3::new(-2.1, FLOOR_Y + 0.04, 0.6), Vec3::new(0.5, 0.2, 0.4), 15.0),
        (Vec3::new(-1.7, FLOOR_Y + 0.03, 1.1), Vec3::new(0.3, 0.15, 0.3), 40.0),
        (Vec3::new(1.6, FLOOR_Y + 0.05, 0.2), Vec3::new(0.6, 0.25, 0.5), -20.0),
        (Vec3::new(2.4, FLOOR_Y + 0.03, 1.8), Vec3::new(0.35, 0.15, 0.25), 70.0),
        (Vec3::new(0.3, FLOOR_Y + 0.02, 2.6), Vec3::new(0.25, 0.1, 0.2), 5.0),
        (Vec3::new(-0.9, FLOOR_Y + 0.04, -0.8), Vec3::new(0.45, 0.2, 0.35), -55.0),
    ]
    .into_iter()
    .map(|(at, scale, yaw)| {
        Placement::new([
            TransformStep::Translate(at),
            TransformStep::Scale(scale),
            TransformStep::rotate_y(yaw),
        ])
    })
    .collect()
}

fn desert_statues() -> Vec<Placement> {
    vec![
        Placement::new([
            TransformStep::Translate(Vec3::new(-3.2, -0.5, -0.25)),
            TransformStep::uniform_scale(0.002),
            TransformStep::rotate_y(150.0),
            TransformStep::Rotate {
                degrees: 25.0,
                axis: Vec3::X,
            },
        ]),
        Placement::new([
            TransformStep::Translate(Vec3::new(2.9, -0.5, -0.25)),
            TransformStep::uniform_scale(0.0015),
            TransformStep::rotate_y(240.0),
            TransformStep::Rotate {
                degrees: 12.0,
                axis: Vec3::Z,
            },
        ]),
        Placement::translate_scale(Vec3::new(1.0, 0.0, 3.0), 0.001),
    ]
}

fn desert_lights() -> LightConfig {
    let torch = LightColor {
        ambient: Vec3::new(0.2, 0.1, 0.02),
        diffuse: Vec3::new(1.0, 0.6, 0.25),
        specular: Vec3::new(0.5, 0.4, 0.3),
    };
    let torch_falloff = Attenuation {
        constant: 1.0,
        linear: 0.35,
        quadratic: 0.44,
    };
    let torch_at = |position| PointLight {
        position,
        color: torch,
        attenuation: torch_falloff,
    };
    let points: [PointLight; POINT_LIGHT_COUNT] = [
        torch_at(Vec3::new(-2.0, -0.25, 0.8)),
        torch_at(Vec3::new(2.0, -0.25, 0.8)),
        torch_at(Vec3::new(0.0, -0.25, 3.6)),
    ];
    LightConfig {
        initial: LightBlock {
            directional: DirectionalLight {
                direction: Vec3::new(-0.2, -1.0, -0.3),
                color: LightColor {
                    ambient: Vec3::new(0.06, 0.06, 0.09),
                    diffuse: Vec3::new(0.25, 0.25, 0.35),
                    specular: Vec3::new(0.2, 0.2, 0.2),
                },
            },
            points,
            spot: SpotLight {
                position: Vec3::new(0.0, 4.0, 2.0),
                direction: Vec3::new(0.0, -10.0, 0.0),
                color: LightColor {
                    ambient: Vec3::ZERO,
                    diffuse: Vec3::new(1.0, 1.0, 0.9),
                    specular: Vec3::ONE,
                },
                attenuation: Attenuation {
                    constant: 1.0,
                    linear: 0.09,
                    quadratic: 0.032,
                },
                inner_cutoff: 12.5_f32.to_radians().cos(),
                outer_cutoff: 17.5_f32.to_radians().cos(),
            },
        },
        point_on: torch,
        flicker: FlickerRule::default(),
        marker_on: Vec3::new(1.0, 0.75, 0.35),
        marker_off: Vec3::new(0.1, 0.1, 0.1),
        spot_step: 1.0,
        spot_vertical: (-16.0, -4.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desert_has_expected_counts() {
        let config = SceneConfig::desert();
        assert_eq!(config.moon.steps, 360);
        assert_eq!(config.floor.rows * config.floor.cols, 36);
        assert_eq!(config.pyramids.len(), 3);
        assert_eq!(config.statues.len(), 3);
        assert!(config.pyramids.iter().all(|p| p.variant < PYRAMID_APEXES.len()));
    }

    #[test]
    fn moon_instances_share_position() {
        let moon = SceneConfig::desert().moon;
        let a = moon.instance_model(0).transform_point3(Vec3::ZERO);
        let b = moon.instance_model(123).transform_point3(Vec3::ZERO);
        assert!(a.abs_diff_eq(moon.position, 1e-5));
        assert!(a.abs_diff_eq(b, 1e-5));
        assert_ne!(moon.instance_model(0), moon.instance_model(1));
    }

    #[test]
    fn tiled_floor_cells_are_distinct() {
        let floor = SceneConfig::desert().floor;
        let origins: Vec<Vec3> = floor
            .cell_models()
            .iter()
            .map(|m| m.transform_point3(Vec3::ZERO))
            .collect();
        assert_eq!(origins.len(), 36);
        for (i, a) in origins.iter().enumerate() {
            for b in &origins[i + 1..] {
                assert!(a.distance(*b) >= floor.tile_size - 1e-4);
            }
        }
        let centroid = origins.iter().copied().sum::<Vec3>() / origins.len() as f32;
        assert!(centroid.abs_diff_eq(floor.center, 1e-4));
    }

    #[test]
    fn overdrawn_floor_repeats_one_transform() {
        let floor = FloorConfig {
            tiling: FloorTiling::Overdrawn,
            ..SceneConfig::desert().floor
        };
        let models = floor.cell_models();
        assert_eq!(models.len(), 36);
        assert!(models.iter().all(|m| *m == models[0]));
    }

    #[test]
    fn pyramid_bases_sit_near_floor() {
        for pyramid in SceneConfig::desert().pyramids {
            let base = pyramid.placement.model_matrix().transform_point3(Vec3::ZERO);
            assert!((base.y - FLOOR_Y).abs() < 0.02, "base at {base}");
        }
    }

    #[test]
    fn serializes_to_json() {
        let json = serde_json::to_value(SceneConfig::desert()).unwrap();
        assert_eq!(json["window"]["title"], "Egypt world");
        assert_eq!(json["moon"]["steps"], 360);
        assert_eq!(json["floor"]["tiling"], "Tiled");
        assert_eq!(json["pacing"]["delta_mode"], "FrameTime");
    }
}
