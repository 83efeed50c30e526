//! Scene kernel: camera controller, light flicker, rug steering, frame pacing
//! and composition of the desert scene into a `DrawList`.
//!
//! # Invariants
//! - The camera basis is derived from yaw and pitch and always orthonormal.
//! - Every random draw (flicker, rug jitter) comes from the caller's RNG, so a
//!   seeded RNG replays a session exactly.
//! - Light markers and point lights share one flicker decision per frame.

pub mod camera;
pub mod config;
pub mod lighting;
pub mod pacing;
pub mod rug;
pub mod scene;

pub use camera::{Camera, CameraConfig, Projection, aspect_ratio};
pub use config::{
    FloorConfig, FloorTiling, MoonConfig, PYRAMID_APEXES, PacingConfig, PyramidConfig,
    SceneConfig, SceneHandles, WindowConfig,
};
pub use lighting::{FlickerRule, FlickerState, LightConfig, LightRig};
pub use pacing::{
    Clock, DeltaMode, FramePacer, FrameTimer, FrameTiming, Sleeper, SystemClock, ThreadSleeper,
};
pub use rug::{RugConfig, RugState};
pub use scene::{FrameReport, Scene};

pub fn crate_info() -> &'static str {
    "sandscape-kernel v0.1.0"
}
