use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// One step of a model transform, applied in call-site order.
///
/// Steps post-multiply: `[Translate(t), Scale(s)]` yields `T * S`, so the
/// scale acts on the mesh first and the translation is in unscaled units.
/// `[Scale(s), Translate(t)]` yields `S * T`, which scales the translation too.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransformStep {
    Translate(Vec3),
    Scale(Vec3),
    /// Rotation in degrees around an axis. The axis need not be normalized.
    Rotate { degrees: f32, axis: Vec3 },
}

impl TransformStep {
    pub fn uniform_scale(s: f32) -> Self {
        Self::Scale(Vec3::splat(s))
    }

    pub fn rotate_y(degrees: f32) -> Self {
        Self::Rotate {
            degrees,
            axis: Vec3::Y,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        match *self {
            Self::Translate(t) => Mat4::from_translation(t),
            Self::Scale(s) => Mat4::from_scale(s),
            Self::Rotate { degrees, axis } => {
                let axis = axis.normalize_or_zero();
                if axis == Vec3::ZERO {
                    Mat4::IDENTITY
                } else {
                    Mat4::from_axis_angle(axis, degrees.to_radians())
                }
            }
        }
    }
}

/// Fixed placement of a drawable instance: an ordered list of transform steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub steps: Vec<TransformStep>,
}

impl Placement {
    pub fn new(steps: impl Into<Vec<TransformStep>>) -> Self {
        Self {
            steps: steps.into(),
        }
    }

    /// Translate, then uniformly scale.
    pub fn translate_scale(translation: Vec3, scale: f32) -> Self {
        Self::new([
            TransformStep::Translate(translation),
            TransformStep::uniform_scale(scale),
        ])
    }

    /// Append a step after the existing ones.
    pub fn then(mut self, step: TransformStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.steps
            .iter()
            .fold(Mat4::IDENTITY, |m, step| m * step.matrix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_placement_is_identity() {
        assert_eq!(Placement::default().model_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn translate_then_scale_keeps_translation() {
        let p = Placement::translate_scale(Vec3::new(2.0, 0.0, 0.0), 0.5);
        let origin = p.model_matrix().transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn scale_then_translate_scales_translation() {
        let p = Placement::new([
            TransformStep::uniform_scale(0.5),
            TransformStep::Translate(Vec3::new(2.0, 0.0, 0.0)),
        ]);
        let origin = p.model_matrix().transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn zero_axis_rotation_is_ignored() {
        let step = TransformStep::Rotate {
            degrees: 45.0,
            axis: Vec3::ZERO,
        };
        assert_eq!(step.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn rotate_y_quarter_turn() {
        let m = TransformStep::rotate_y(90.0).matrix();
        let v = m.transform_vector3(Vec3::X);
        assert!(v.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-6));
    }
}
