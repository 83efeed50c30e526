use glam::{Mat4, Vec3};
use rand::Rng;
use serde::Serialize;

/// Placement and steering limits for the flying rug.
#[derive(Debug, Clone, Serialize)]
pub struct RugConfig {
    /// Uniform scale applied before every translation.
    pub scale: f32,
    /// Fixed translation in scaled space.
    pub base: Vec3,
    pub initial_offset: Vec3,
    /// Offset change per frame of held intent.
    pub step: f32,
    pub x_bounds: (f32, f32),
    pub y_bounds: (f32, f32),
    /// Upper bound (exclusive) of the per-frame vertical jitter.
    pub jitter_amplitude: f32,
}

impl Default for RugConfig {
    fn default() -> Self {
        Self {
            scale: 0.25,
            base: Vec3::new(0.5, 1.75, 34.0),
            initial_offset: Vec3::new(0.0, 4.0, -26.0),
            step: 0.25,
            x_bounds: (-13.0, 13.0),
            y_bounds: (-4.0, 13.0),
            jitter_amplitude: 1.0 / 8.0,
        }
    }
}

/// Input-driven offset plus this frame's hover jitter.
#[derive(Debug, Clone, PartialEq)]
pub struct RugState {
    offset: Vec3,
    jitter: f32,
}

impl RugState {
    pub fn new(config: &RugConfig) -> Self {
        let mut state = Self {
            offset: config.initial_offset,
            jitter: 0.0,
        };
        state.steer(config, 0.0, 0.0);
        state
    }

    /// Move by whole steps. `dx` and `dy` are intent axes in {-1, 0, 1};
    /// each axis saturates at its bounds independently.
    pub fn steer(&mut self, config: &RugConfig, dx: f32, dy: f32) {
        let (x_lo, x_hi) = config.x_bounds;
        let (y_lo, y_hi) = config.y_bounds;
        self.offset.x = (self.offset.x + dx * config.step).clamp(x_lo, x_hi);
        self.offset.y = (self.offset.y + dy * config.step).clamp(y_lo, y_hi);
    }

    /// Replace the jitter with a fresh draw from `[0, amplitude)`.
    pub fn roll_jitter<R: Rng + ?Sized>(&mut self, config: &RugConfig, rng: &mut R) -> f32 {
        self.jitter = if config.jitter_amplitude > 0.0 {
            rng.gen_range(0.0..config.jitter_amplitude)
        } else {
            0.0
        };
        self.jitter
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub fn jitter(&self) -> f32 {
        self.jitter
    }

    /// `scale ∘ translate(base + jitter) ∘ translate(offset)`.
    pub fn model_matrix(&self, config: &RugConfig) -> Mat4 {
        Mat4::from_scale(Vec3::splat(config.scale))
            * Mat4::from_translation(config.base + Vec3::new(0.0, self.jitter, 0.0))
            * Mat4::from_translation(self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn one_step_left() {
        let config = RugConfig::default();
        let mut rug = RugState::new(&config);
        assert_eq!(rug.offset(), Vec3::new(0.0, 4.0, -26.0));
        rug.steer(&config, 1.0, 0.0);
        assert_eq!(rug.offset(), Vec3::new(0.25, 4.0, -26.0));
    }

    #[test]
    fn axes_clamp_independently() {
        let config = RugConfig::default();
        let mut rug = RugState::new(&config);
        for _ in 0..200 {
            rug.steer(&config, -1.0, 1.0);
        }
        assert_eq!(rug.offset(), Vec3::new(-13.0, 13.0, -26.0));
        for _ in 0..200 {
            rug.steer(&config, 1.0, -1.0);
        }
        assert_eq!(rug.offset(), Vec3::new(13.0, -4.0, -26.0));
    }

    #[test]
    fn jitter_is_fresh_and_bounded() {
        let config = RugConfig::default();
        let mut rug = RugState::new(&config);
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = Vec::new();
        for _ in 0..100 {
            let j = rug.roll_jitter(&config, &mut rng);
            assert!((0.0..config.jitter_amplitude).contains(&j));
            seen.push(j);
        }
        // Not accumulated: the offset is untouched by jitter.
        assert_eq!(rug.offset(), config.initial_offset);
        assert!(seen.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn model_scales_after_translating() {
        let config = RugConfig::default();
        let rug = RugState::new(&config);
        let origin = rug.model_matrix(&config).transform_point3(Vec3::ZERO);
        let expected = (config.base + config.initial_offset) * config.scale;
        assert!(origin.abs_diff_eq(expected, 1e-5));
    }
}
