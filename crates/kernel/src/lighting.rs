use glam::Vec3;
use rand::Rng;
use sandscape_render::{LightBlock, LightColor};
use serde::Serialize;

/// Per-frame Bernoulli outage of the point lights.
///
/// A sample is drawn uniformly from `[0, range)`; the lights are off for the
/// frame when the sample is at or above `threshold`. Nothing carries over
/// between frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlickerRule {
    pub range: f32,
    pub threshold: f32,
}

impl Default for FlickerRule {
    fn default() -> Self {
        Self {
            range: 100.0,
            threshold: 97.9,
        }
    }
}

impl FlickerRule {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        rng.gen_range(0.0..self.range)
    }

    pub fn is_lit(&self, sample: f32) -> bool {
        sample < self.threshold
    }

    /// Probability that a single frame is an outage.
    pub fn outage_probability(&self) -> f32 {
        ((self.range - self.threshold) / self.range).clamp(0.0, 1.0)
    }
}

/// The flicker decision for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlickerState {
    pub sample: f32,
    pub lit: bool,
}

impl Default for FlickerState {
    fn default() -> Self {
        Self {
            sample: 0.0,
            lit: true,
        }
    }
}

/// Startup light layout plus the rules that perturb it each frame.
#[derive(Debug, Clone, Serialize)]
pub struct LightConfig {
    pub initial: LightBlock,
    /// Ambient and diffuse written to every point light on a lit frame.
    /// Specular is left as configured in `initial`.
    pub point_on: LightColor,
    pub flicker: FlickerRule,
    pub marker_on: Vec3,
    pub marker_off: Vec3,
    /// Spotlight direction change per frame of rug intent.
    pub spot_step: f32,
    /// Inclusive bounds for the spotlight's vertical direction component.
    pub spot_vertical: (f32, f32),
}

/// Live light state: the block uploaded to lit shaders and the flicker
/// decision the markers mirror.
#[derive(Debug, Clone)]
pub struct LightRig {
    block: LightBlock,
    point_on: LightColor,
    flicker: FlickerRule,
    marker_on: Vec3,
    marker_off: Vec3,
    spot_step: f32,
    spot_vertical: (f32, f32),
    last: FlickerState,
}

impl LightRig {
    pub fn new(config: &LightConfig) -> Self {
        let (lo, hi) = config.spot_vertical;
        let spot_vertical = (lo.min(hi), lo.max(hi));
        let mut block = config.initial;
        block.spot.direction.y = block.spot.direction.y.clamp(spot_vertical.0, spot_vertical.1);
        let mut rig = Self {
            block,
            point_on: config.point_on,
            flicker: config.flicker,
            marker_on: config.marker_on,
            marker_off: config.marker_off,
            spot_step: config.spot_step,
            spot_vertical,
            last: FlickerState::default(),
        };
        rig.apply_flicker(0.0);
        rig
    }

    /// Draw this frame's sample and apply it.
    pub fn flicker<R: Rng + ?Sized>(&mut self, rng: &mut R) -> FlickerState {
        let sample = self.flicker.sample(rng);
        self.apply_flicker(sample)
    }

    /// Apply a given sample to the point lights.
    pub fn apply_flicker(&mut self, sample: f32) -> FlickerState {
        let lit = self.flicker.is_lit(sample);
        let (ambient, diffuse) = if lit {
            (self.point_on.ambient, self.point_on.diffuse)
        } else {
            (Vec3::ZERO, Vec3::ZERO)
        };
        for point in &mut self.block.points {
            point.color.ambient = ambient;
            point.color.diffuse = diffuse;
        }
        if lit != self.last.lit {
            tracing::debug!(sample, lit, "point lights flickered");
        }
        self.last = FlickerState { sample, lit };
        self.last
    }

    /// Nudge the spotlight by rug intents. Horizontal is unbounded, vertical
    /// saturates at the configured range.
    pub fn steer_spot(&mut self, horizontal: f32, vertical: f32) {
        let direction = &mut self.block.spot.direction;
        direction.x += horizontal * self.spot_step;
        let (lo, hi) = self.spot_vertical;
        direction.y = (direction.y + vertical * self.spot_step).clamp(lo, hi);
    }

    pub fn block(&self) -> &LightBlock {
        &self.block
    }

    pub fn last_flicker(&self) -> FlickerState {
        self.last
    }

    pub fn points_lit(&self) -> bool {
        self.last.lit
    }

    pub fn flicker_rule(&self) -> FlickerRule {
        self.flicker
    }

    /// Marker color for the current frame, following the same decision as
    /// the point lights.
    pub fn marker_color(&self) -> Vec3 {
        if self.last.lit {
            self.marker_on
        } else {
            self.marker_off
        }
    }

    pub fn spot_direction(&self) -> Vec3 {
        self.block.spot.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rig() -> LightRig {
        LightRig::new(&SceneConfig::desert().lights)
    }

    #[test]
    fn starts_lit() {
        let rig = rig();
        assert!(rig.points_lit());
        let on = SceneConfig::desert().lights.point_on;
        assert!(rig.block().points.iter().all(|p| p.color.diffuse == on.diffuse));
    }

    #[test]
    fn threshold_sample_turns_lights_off() {
        let mut rig = rig();
        let state = rig.apply_flicker(97.9);
        assert!(!state.lit);
        for p in &rig.block().points {
            assert_eq!(p.color.ambient, Vec3::ZERO);
            assert_eq!(p.color.diffuse, Vec3::ZERO);
        }
    }

    #[test]
    fn specular_survives_outage() {
        let mut rig = rig();
        let specular = rig.block().points[0].color.specular;
        rig.apply_flicker(99.0);
        assert_eq!(rig.block().points[0].color.specular, specular);
    }

    #[test]
    fn below_threshold_is_lit() {
        let mut rig = rig();
        rig.apply_flicker(99.5);
        assert!(rig.apply_flicker(97.89).lit);
        assert!(rig.block().points.iter().all(|p| p.color.diffuse != Vec3::ZERO));
    }

    #[test]
    fn outage_does_not_persist() {
        let mut rig = rig();
        assert!(!rig.apply_flicker(99.0).lit);
        assert!(rig.apply_flicker(10.0).lit);
    }

    #[test]
    fn marker_follows_flicker() {
        let config = SceneConfig::desert().lights;
        let mut rig = LightRig::new(&config);
        rig.apply_flicker(50.0);
        assert_eq!(rig.marker_color(), config.marker_on);
        rig.apply_flicker(98.0);
        assert_eq!(rig.marker_color(), config.marker_off);
    }

    #[test]
    fn outage_fraction_converges() {
        let mut rig = rig();
        let mut rng = StdRng::seed_from_u64(0xD5E7);
        let frames = 200_000;
        let off = (0..frames).filter(|_| !rig.flicker(&mut rng).lit).count();
        let fraction = off as f64 / frames as f64;
        assert!((fraction - 0.021).abs() < 0.002, "fraction {fraction}");
    }

    #[test]
    fn outage_probability_matches_rule() {
        assert!((FlickerRule::default().outage_probability() - 0.021).abs() < 1e-5);
    }

    #[test]
    fn spot_horizontal_is_unbounded() {
        let mut rig = rig();
        let x = rig.spot_direction().x;
        for _ in 0..1000 {
            rig.steer_spot(1.0, 0.0);
        }
        assert!((rig.spot_direction().x - (x + 1000.0)).abs() < 1e-3);
    }

    #[test]
    fn spot_vertical_saturates() {
        let config = SceneConfig::desert().lights;
        let mut rig = LightRig::new(&config);
        for _ in 0..100 {
            rig.steer_spot(0.0, 1.0);
        }
        assert_eq!(rig.spot_direction().y, config.spot_vertical.1);
        for _ in 0..100 {
            rig.steer_spot(0.0, -1.0);
        }
        assert_eq!(rig.spot_direction().y, config.spot_vertical.0);
    }
}
