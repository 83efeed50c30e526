use glam::{Mat4, Vec3};
use serde::Serialize;

/// Start pose and tuning for the first-person camera.
#[derive(Debug, Clone, Serialize)]
pub struct CameraConfig {
    /// Feet position; the eye sits `player_height` above it.
    pub position: Vec3,
    /// Degrees. 90 looks down +Z.
    pub yaw: f32,
    /// Degrees.
    pub pitch: f32,
    /// World units per second.
    pub move_speed: f32,
    /// Degrees per second.
    pub look_speed: f32,
    pub player_height: f32,
    /// Pitch is clamped to [-pitch_limit, pitch_limit] degrees.
    pub pitch_limit: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, -0.75, -2.5),
            yaw: 90.0,
            pitch: 20.0,
            move_speed: 3.0,
            look_speed: 90.0,
            player_height: 0.25,
            pitch_limit: 89.0,
        }
    }
}

/// First-person camera. `front`, `up` and `right` are derived from yaw and
/// pitch and are never set directly.
#[derive(Debug, Clone)]
pub struct Camera {
    world_up: Vec3,
    position: Vec3,
    front: Vec3,
    up: Vec3,
    right: Vec3,
    velocity: Vec3,
    pitch: f32,
    yaw: f32,
    move_speed: f32,
    look_speed: f32,
    player_height: f32,
    pitch_limit: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(&CameraConfig::default())
    }
}

impl Camera {
    pub fn new(config: &CameraConfig) -> Self {
        let pitch_limit = config.pitch_limit.abs().min(89.0);
        let mut camera = Self {
            world_up: Vec3::Y,
            position: config.position,
            front: Vec3::Z,
            up: Vec3::Y,
            right: Vec3::X,
            velocity: Vec3::ZERO,
            pitch: config.pitch.clamp(-pitch_limit, pitch_limit),
            yaw: config.yaw.rem_euclid(360.0),
            move_speed: config.move_speed,
            look_speed: config.look_speed,
            player_height: config.player_height,
            pitch_limit,
        };
        camera.update_vectors();
        camera
    }

    /// Walk along the ground plane. `dx` strafes along `right`, `dy` walks
    /// along `front` with its vertical component removed, so looking up or
    /// down never makes the camera fly.
    pub fn move_by(&mut self, dx: f32, dy: f32, dt: f32) {
        let ground_front = Vec3::new(self.front.x, 0.0, self.front.z).normalize_or_zero();
        let direction = dx * self.right + dy * ground_front;
        if direction == Vec3::ZERO {
            self.velocity = Vec3::ZERO;
            return;
        }
        self.velocity = direction * self.move_speed;
        self.position += self.velocity * dt;
    }

    /// Turn by `dx` (yaw) and `dy` (pitch) intents scaled by look speed and dt.
    pub fn rotate(&mut self, dx: f32, dy: f32, dt: f32) {
        self.yaw = (self.yaw + dx * self.look_speed * dt).rem_euclid(360.0);
        self.pitch =
            (self.pitch + dy * self.look_speed * dt).clamp(-self.pitch_limit, self.pitch_limit);
        self.update_vectors();
    }

    /// Eye position: feet position lifted by the player height.
    pub fn position(&self) -> Vec3 {
        self.position + self.world_up * self.player_height
    }

    /// The look-at point one unit ahead of the eye.
    pub fn target(&self) -> Vec3 {
        self.position() + self.front
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn pitch_limit(&self) -> f32 {
        self.pitch_limit
    }

    pub fn move_speed(&self) -> f32 {
        self.move_speed
    }

    pub fn look_speed(&self) -> f32 {
        self.look_speed
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target(), self.up)
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

/// Perspective lens. The matrix is rebuilt each frame from the current
/// viewport so a resize takes effect immediately.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Projection {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y_degrees: 90.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Projection {
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        Mat4::perspective_rh(self.fov_y_degrees.to_radians(), aspect, self.near, self.far)
    }
}

/// Width over height, treating a zero-sized (minimized) viewport as square.
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    if width == 0 || height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}
