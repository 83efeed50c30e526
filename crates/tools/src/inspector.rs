use std::fmt;
use std::time::Duration;

use glam::Vec3;
use sandscape_kernel::{FrameTimer, Scene};
use sandscape_render::{DrawList, DrawStats, POINT_LIGHT_COUNT};

/// Frame inspector for developer tooling.
///
/// Read-only queries over the scene, the last recorded frame and the frame
/// timer.
pub struct FrameInspector;

impl FrameInspector {
    /// Produce a summary of the current frame.
    pub fn summary(scene: &Scene, frame: &DrawList, timer: Option<&FrameTimer>) -> FrameSummary {
        let camera = scene.camera();
        let stats = DrawStats::of(frame);
        tracing::trace!(
            frame = scene.frames(),
            groups = stats.groups,
            draws = stats.draws,
            "frame summarized"
        );
        FrameSummary {
            frame: scene.frames(),
            elapsed: scene.elapsed(),
            fps: timer.map_or(0.0, FrameTimer::fps),
            frame_time_avg: timer.map_or(Duration::ZERO, FrameTimer::average),
            frame_time_max: timer.map_or(Duration::ZERO, FrameTimer::max),
            camera_position: camera.position(),
            yaw: camera.yaw(),
            pitch: camera.pitch(),
            rug_offset: scene.rug().offset(),
            lights: Self::lights(scene),
            draw_groups: stats.groups,
            draw_calls: stats.draws,
        }
    }

    pub fn lights(scene: &Scene) -> LightReport {
        let rig = scene.lights();
        let flicker = rig.last_flicker();
        let lit_points = rig
            .block()
            .points
            .iter()
            .filter(|p| p.color.diffuse != Vec3::ZERO)
            .count();
        LightReport {
            points_lit: flicker.lit,
            lit_points,
            flicker_sample: flicker.sample,
            spot_direction: rig.spot_direction(),
        }
    }
}

/// State of the light rig this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightReport {
    pub points_lit: bool,
    pub lit_points: usize,
    pub flicker_sample: f32,
    pub spot_direction: Vec3,
}

impl fmt::Display for LightReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.points_lit { "on" } else { "OUT" };
        write!(
            f,
            "Lights: points {status} ({}/{POINT_LIGHT_COUNT}) sample={:.1} spot=({:.1}, {:.1}, {:.1})",
            self.lit_points,
            self.flicker_sample,
            self.spot_direction.x,
            self.spot_direction.y,
            self.spot_direction.z,
        )
    }
}

/// Summary of one frame for the overlay and CLI.
#[derive(Debug, Clone)]
pub struct FrameSummary {
    pub frame: u64,
    pub elapsed: f32,
    pub fps: f32,
    pub frame_time_avg: Duration,
    pub frame_time_max: Duration,
    pub camera_position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub rug_offset: Vec3,
    pub lights: LightReport,
    pub draw_groups: usize,
    pub draw_calls: usize,
}

impl fmt::Display for FrameSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Frame {} t={:.2}s fps={:.1} avg={:.2?} max={:.2?}",
            self.frame, self.elapsed, self.fps, self.frame_time_avg, self.frame_time_max
        )?;
        let p = self.camera_position;
        writeln!(
            f,
            "Camera: pos=({:.2}, {:.2}, {:.2}) yaw={:.1} pitch={:.1}",
            p.x, p.y, p.z, self.yaw, self.pitch
        )?;
        let r = self.rug_offset;
        writeln!(f, "Rug: offset=({:.2}, {:.2}, {:.2})", r.x, r.y, r.z)?;
        writeln!(f, "{}", self.lights)?;
        write!(f, "Draws: {} calls in {} groups", self.draw_calls, self.draw_groups)
    }
}
