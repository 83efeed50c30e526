use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Phong color coefficients shared by every light kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightColor {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl LightColor {
    pub const OFF: Self = Self {
        ambient: Vec3::ZERO,
        diffuse: Vec3::ZERO,
        specular: Vec3::ZERO,
    };
}

/// Distance falloff `1 / (constant + linear*d + quadratic*d^2)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Attenuation {
    pub fn factor(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: LightColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: Vec3,
    pub color: LightColor,
    pub attenuation: Attenuation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    pub position: Vec3,
    /// Not necessarily unit length; shaders normalize it.
    pub direction: Vec3,
    pub color: LightColor,
    pub attenuation: Attenuation,
    /// Cosine of the full-intensity cone half-angle.
    pub inner_cutoff: f32,
    /// Cosine of the zero-intensity cone half-angle.
    pub outer_cutoff: f32,
}

pub const POINT_LIGHT_COUNT: usize = 3;

/// Every light the lit shaders see in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightBlock {
    pub directional: DirectionalLight,
    pub points: [PointLight; POINT_LIGHT_COUNT],
    pub spot: SpotLight,
}

impl Default for LightBlock {
    fn default() -> Self {
        let point = PointLight {
            position: Vec3::ZERO,
            color: LightColor::OFF,
            attenuation: Attenuation {
                constant: 1.0,
                linear: 0.0,
                quadratic: 0.0,
            },
        };
        Self {
            directional: DirectionalLight {
                direction: Vec3::NEG_Y,
                color: LightColor::OFF,
            },
            points: [point; POINT_LIGHT_COUNT],
            spot: SpotLight {
                position: Vec3::ZERO,
                direction: Vec3::NEG_Y,
                color: LightColor::OFF,
                attenuation: point.attenuation,
                inner_cutoff: 1.0,
                outer_cutoff: 1.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attenuation_at_zero_is_inverse_constant() {
        let a = Attenuation {
            constant: 2.0,
            linear: 0.5,
            quadratic: 0.1,
        };
        assert_eq!(a.factor(0.0), 0.5);
        assert!(a.factor(10.0) < a.factor(1.0));
    }

    #[test]
    fn default_block_is_dark() {
        let block = LightBlock::default();
        assert_eq!(block.directional.color, LightColor::OFF);
        assert!(block.points.iter().all(|p| p.color == LightColor::OFF));
    }
}
