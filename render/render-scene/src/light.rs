//! Directional lighting.

use mesh_types::Vector3;
use nalgebra::{Rotation3, Unit};

/// A light infinitely far away, shining along `direction`.
///
/// The default sun is tilted 45° about X, matching the default camera's
/// view direction, so parts are lit from over the viewer's shoulder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunLight {
    /// Direction the light travels.
    pub direction: Unit<Vector3<f64>>,
    /// Multiplier on the diffuse term.
    pub strength: f64,
}

impl Default for SunLight {
    fn default() -> Self {
        Self::tilted(45.0)
    }
}

impl SunLight {
    /// A sun pointing straight down, then tilted `degrees` about X.
    #[must_use]
    pub fn tilted(degrees: f64) -> Self {
        let tilt = Rotation3::from_euler_angles(degrees.to_radians(), 0.0, 0.0);
        Self {
            direction: Unit::new_normalize(tilt * -Vector3::z()),
            strength: 1.0,
        }
    }

    /// Lambert factor for a surface with unit `normal`, in `[0, strength]`.
    #[must_use]
    pub fn diffuse(&self, normal: &Vector3<f64>) -> f64 {
        (-self.direction.dot(normal)).max(0.0) * self.strength
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_direction() {
        let sun = SunLight::default();
        let half = std::f64::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(sun.direction.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(sun.direction.y, half, epsilon = 1e-12);
        assert_relative_eq!(sun.direction.z, -half, epsilon = 1e-12);
    }

    #[test]
    fn faces_away_get_no_light() {
        let sun = SunLight::tilted(0.0);
        assert_relative_eq!(sun.diffuse(&Vector3::z()), 1.0);
        assert_relative_eq!(sun.diffuse(&-Vector3::z()), 0.0);
    }
}
