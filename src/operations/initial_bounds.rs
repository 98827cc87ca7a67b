use serde::{Deserialize, Serialize};

use crate::camera::CameraModel;
use crate::error::{ConfigurationError, Result};
use crate::math::{Aabb, Point3};

/// Guesses a generous starting box from the placement of a camera rig.
///
/// Intended for turntable-style captures where the cameras surround the
/// object roughly in a horizontal ring around the z axis:
///
/// - x and y span the camera centres, pulled in on each side by
///   `inset` times the span;
/// - z spans the camera centres and the points each camera looks at,
///   taken `reach` times the horizontal diagonal along its optical axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsFromCameras {
    /// Fraction of the x/y span removed from each side, in `[0, 0.5)`.
    pub inset: f64,
    /// Viewing distance, as a multiple of the horizontal diagonal.
    pub reach: f64,
}

impl Default for BoundsFromCameras {
    fn default() -> Self {
        Self {
            inset: 0.25,
            reach: 0.6,
        }
    }
}

impl BoundsFromCameras {
    /// Creates a new `BoundsFromCameras` operation.
    #[must_use]
    pub fn new(inset: f64, reach: f64) -> Self {
        Self { inset, reach }
    }

    /// Checks the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidParameter`] if `inset` is
    /// outside `[0, 0.5)` or `reach` is negative or non-finite.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..0.5).contains(&self.inset) {
            return Err(ConfigurationError::InvalidParameter {
                name: "inset",
                value: self.inset,
            }
            .into());
        }
        if !self.reach.is_finite() || self.reach < 0.0 {
            return Err(ConfigurationError::InvalidParameter {
                name: "reach",
                value: self.reach,
            }
            .into());
        }
        Ok(())
    }

    /// Executes the estimate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::NoCameras`] for an empty rig and
    /// [`ConfigurationError::DegenerateBounds`] when the cameras do not
    /// span a volume (for example a single camera).
    pub fn execute(&self, cameras: &[CameraModel]) -> Result<Aabb> {
        self.validate()?;
        let span = Aabb::from_points(cameras.iter().map(CameraModel::center))
            .ok_or(ConfigurationError::NoCameras)?;

        let extents = span.extents();
        let range = self.reach * extents.x.hypot(extents.y);

        let mut z_min = span.min.z;
        let mut z_max = span.max.z;
        for camera in cameras {
            let target = camera.center() + camera.viewing_direction() * range;
            z_min = z_min.min(target.z);
            z_max = z_max.max(target.z);
        }

        let dx = extents.x * self.inset;
        let dy = extents.y * self.inset;
        let bounds = Aabb::new(
            Point3::new(span.min.x + dx, span.min.y + dy, z_min),
            Point3::new(span.max.x - dx, span.max.y - dy, z_max),
        );
        bounds.validate()?;

        tracing::debug!(%bounds, cameras = cameras.len(), "initial bounds from camera rig");
        Ok(bounds)
    }
}
