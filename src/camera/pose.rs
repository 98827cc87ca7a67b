use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, Result};
use crate::math::{Matrix3, Point3, Vector3, TOLERANCE};

/// Maximum deviation of `RᵀR` from the identity accepted as orthonormal.
const ORTHONORMAL_TOLERANCE: f64 = 1e-6;

/// World-to-camera rigid transform: `x_cam = rotation * x_world + translation`.
///
/// Camera space follows the usual computer-vision convention: +x right,
/// +y down in the image, +z along the optical axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Rotation from world to camera axes.
    pub rotation: Matrix3,
    /// Translation applied after the rotation.
    pub translation: Vector3,
}

impl Pose {
    /// Creates a pose from a rotation and translation. No validation.
    #[must_use]
    pub fn new(rotation: Matrix3, translation: Vector3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// The pose of a camera located at `eye` whose optical axis passes
    /// through `target`. `up` is the world direction that appears upward
    /// in the image.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if `eye` coincides with
    /// `target` or `up` is parallel to the viewing direction.
    pub fn look_at(eye: &Point3, target: &Point3, up: &Vector3) -> Result<Self> {
        let forward = target - eye;
        let forward_len = forward.norm();
        if forward_len < TOLERANCE {
            return Err(
                GeometryError::Degenerate("camera eye coincides with target".into()).into(),
            );
        }
        let z = forward / forward_len;

        let right = z.cross(up);
        let right_len = right.norm();
        if right_len < TOLERANCE {
            return Err(GeometryError::Degenerate(
                "up vector is parallel to the viewing direction".into(),
            )
            .into());
        }
        let x = right / right_len;
        let y = z.cross(&x);

        let rotation = Matrix3::from_rows(&[x.transpose(), y.transpose(), z.transpose()]);
        let translation = -(rotation * eye.coords);
        Ok(Self::new(rotation, translation))
    }

    /// Maps a world point into camera space.
    #[must_use]
    pub fn transform(&self, point: &Point3) -> Point3 {
        Point3::from(self.rotation * point.coords + self.translation)
    }

    /// Camera centre in world coordinates, `-Rᵀt`.
    #[must_use]
    pub fn center(&self) -> Point3 {
        Point3::from(-(self.rotation.transpose() * self.translation))
    }

    /// Optical axis direction in world coordinates.
    #[must_use]
    pub fn viewing_direction(&self) -> Vector3 {
        self.rotation.transpose() * Vector3::z()
    }

    /// Checks that the rotation is a proper orthonormal matrix and every
    /// entry is finite.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NonFinite`] or [`GeometryError::NotOrthonormal`].
    pub fn validate(&self) -> Result<()> {
        if self.rotation.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::NonFinite("rotation").into());
        }
        if self.translation.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::NonFinite("translation").into());
        }
        let gram = self.rotation.transpose() * self.rotation;
        if (gram - Matrix3::identity()).norm() > ORTHONORMAL_TOLERANCE {
            return Err(GeometryError::NotOrthonormal.into());
        }
        if self.rotation.determinant() <= 0.0 {
            return Err(GeometryError::NotOrthonormal.into());
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn look_at_places_target_on_optical_axis() {
        let eye = Point3::new(3.0, -2.0, 5.0);
        let target = Point3::new(0.5, 0.5, 0.0);
        let pose = Pose::look_at(&eye, &target, &Vector3::z()).unwrap();
        pose.validate().unwrap();

        let t = pose.transform(&target);
        assert_relative_eq!(t.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(t.y, 0.0, epsilon = 1e-12);
        assert!(t.z > 0.0);
    }

    #[test]
    fn center_round_trips_eye() {
        let eye = Point3::new(-4.0, 1.0, 2.0);
        let pose = Pose::look_at(&eye, &Point3::origin(), &Vector3::y()).unwrap();
        let c = pose.center();
        assert_relative_eq!(c, eye, epsilon = 1e-12);
        assert_relative_eq!(pose.transform(&eye).coords.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn world_up_maps_to_negative_image_y() {
        let pose = Pose::look_at(&Point3::new(0.0, 0.0, -5.0), &Point3::origin(), &Vector3::y())
            .unwrap();
        let above = pose.transform(&Point3::new(0.0, 1.0, 0.0));
        assert!(above.y < 0.0);
    }

    #[test]
    fn parallel_up_is_degenerate() {
        let err = Pose::look_at(&Point3::new(0.0, 0.0, 5.0), &Point3::origin(), &Vector3::z());
        assert!(err.is_err());
    }

    #[test]
    fn reflection_is_not_a_rotation() {
        let mut m = Matrix3::identity();
        m[(2, 2)] = -1.0;
        let pose = Pose::new(m, Vector3::zeros());
        assert!(matches!(
            pose.validate(),
            Err(crate::HullError::Geometry(GeometryError::NotOrthonormal))
        ));
    }

    #[test]
    fn scaled_matrix_is_not_orthonormal() {
        let pose = Pose::new(Matrix3::identity() * 2.0, Vector3::zeros());
        assert!(pose.validate().is_err());
    }
}
