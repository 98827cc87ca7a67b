use crate::error::{ConfigurationError, GeometryError, Result};
use crate::math::{Matrix3, Matrix3x4, Point2, Point3, Vector3, TOLERANCE};

use super::{ImageSize, Intrinsics, Pose};

/// A calibrated pinhole camera.
///
/// Immutable once constructed. Projection is defined only for points in
/// front of the camera that land on (or within `epsilon` pixels of) the
/// image.
#[derive(Debug, Clone)]
pub struct CameraModel {
    intrinsics: Intrinsics,
    pose: Pose,
    size: ImageSize,
    epsilon: f64,
}

impl CameraModel {
    /// Creates a new camera.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryError`] if the intrinsics are singular, the
    /// rotation is not orthonormal, any value is non-finite, or the image
    /// has zero size.
    pub fn new(intrinsics: Intrinsics, pose: Pose, size: ImageSize) -> Result<Self> {
        intrinsics.validate()?;
        pose.validate()?;
        if size.is_empty() {
            return Err(GeometryError::Degenerate(format!("empty image {size}")).into());
        }
        Ok(Self {
            intrinsics,
            pose,
            size,
            epsilon: 0.0,
        })
    }

    /// Creates a camera at `eye` looking at `target`.
    ///
    /// # Errors
    ///
    /// See [`Pose::look_at`] and [`CameraModel::new`].
    pub fn look_at(
        eye: Point3,
        target: Point3,
        up: Vector3,
        intrinsics: Intrinsics,
        size: ImageSize,
    ) -> Result<Self> {
        let pose = Pose::look_at(&eye, &target, &up)?;
        Self::new(intrinsics, pose, size)
    }

    /// Returns a copy with the given image-bound tolerance, in pixels.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidParameter`] for a negative or
    /// non-finite tolerance.
    pub fn with_epsilon(mut self, epsilon: f64) -> Result<Self> {
        check_epsilon(epsilon)?;
        self.epsilon = epsilon;
        Ok(self)
    }

    /// Returns the intrinsic parameters.
    #[must_use]
    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    /// Returns the world-to-camera pose.
    #[must_use]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Returns the image size.
    #[must_use]
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Returns the image-bound tolerance.
    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Camera centre in world coordinates.
    #[must_use]
    pub fn center(&self) -> Point3 {
        self.pose.center()
    }

    /// Optical axis in world coordinates (unit length).
    #[must_use]
    pub fn viewing_direction(&self) -> Vector3 {
        self.pose.viewing_direction()
    }

    /// The intrinsic matrix `K`.
    #[must_use]
    pub fn intrinsic_matrix(&self) -> Matrix3 {
        self.intrinsics.matrix()
    }

    /// The 3x4 projection matrix `K [R | t]`.
    #[must_use]
    pub fn projection_matrix(&self) -> Matrix3x4 {
        let mut rt = Matrix3x4::zeros();
        rt.fixed_view_mut::<3, 3>(0, 0).copy_from(&self.pose.rotation);
        rt.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.pose.translation);
        self.intrinsics.matrix() * rt
    }

    /// Maps a world point into camera space.
    #[must_use]
    pub fn to_camera(&self, point: &Point3) -> Point3 {
        self.pose.transform(point)
    }

    /// Projects a world point to continuous pixel coordinates.
    ///
    /// Returns `None` (no coverage) when the point is not in front of the
    /// camera or lands more than [`epsilon`](Self::epsilon) pixels outside
    /// the image. Points inside the tolerance band are clamped onto the
    /// image border.
    #[must_use]
    pub fn project(&self, point: &Point3) -> Option<Point2> {
        self.project_with_epsilon(point, self.epsilon)
    }

    /// Same as [`project`](Self::project) with an explicit tolerance.
    #[must_use]
    pub fn project_with_epsilon(&self, point: &Point3, epsilon: f64) -> Option<Point2> {
        let pc = self.pose.transform(point);
        if pc.z.is_nan() || pc.z <= TOLERANCE {
            return None;
        }

        let k = &self.intrinsics;
        let xn = pc.x / pc.z;
        let yn = pc.y / pc.z;
        let u = k.fx * xn + k.skew * yn + k.cx;
        let v = k.fy * yn + k.cy;

        let width = f64::from(self.size.width);
        let height = f64::from(self.size.height);
        let u = clamp_to_image(u, width, epsilon)?;
        let v = clamp_to_image(v, height, epsilon)?;
        Some(Point2::new(u, v))
    }
}

/// Validates an image-bound tolerance.
pub(crate) fn check_epsilon(epsilon: f64) -> Result<()> {
    if !epsilon.is_finite() || epsilon < 0.0 {
        return Err(ConfigurationError::InvalidParameter {
            name: "projection_epsilon",
            value: epsilon,
        }
        .into());
    }
    Ok(())
}

/// Clamps a coordinate within `epsilon` of `[0, limit)` into it.
fn clamp_to_image(value: f64, limit: f64, epsilon: f64) -> Option<f64> {
    if !value.is_finite() || value < -epsilon || value > limit + epsilon {
        return None;
    }
    // Largest value strictly below the last pixel edge.
    let upper = limit - limit * f64::EPSILON;
    Some(value.clamp(0.0, upper))
}
