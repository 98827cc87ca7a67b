use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, Result};
use crate::math::{Matrix3, TOLERANCE};

/// Pinhole intrinsic parameters, in pixels.
///
/// The intrinsic matrix is
///
/// ```text
/// | fx  skew  cx |
/// |  0   fy   cy |
/// |  0    0    1 |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    /// Focal length along x.
    pub fx: f64,
    /// Focal length along y.
    pub fy: f64,
    /// Principal point x.
    pub cx: f64,
    /// Principal point y.
    pub cy: f64,
    /// Axis skew, usually zero.
    #[serde(default)]
    pub skew: f64,
}

impl Intrinsics {
    /// Creates intrinsics without skew.
    #[must_use]
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self {
            fx,
            fy,
            cx,
            cy,
            skew: 0.0,
        }
    }

    /// Returns a copy with the given skew.
    #[must_use]
    pub fn with_skew(mut self, skew: f64) -> Self {
        self.skew = skew;
        self
    }

    /// Returns the 3x3 intrinsic matrix `K`.
    #[must_use]
    pub fn matrix(&self) -> Matrix3 {
        Matrix3::new(
            self.fx, self.skew, self.cx, //
            0.0, self.fy, self.cy, //
            0.0, 0.0, 1.0,
        )
    }

    /// Checks that `K` is invertible and finite.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NonFinite`] for NaN or infinite entries and
    /// [`GeometryError::Degenerate`] when a focal length vanishes.
    pub fn validate(&self) -> Result<()> {
        let values = [self.fx, self.fy, self.cx, self.cy, self.skew];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::NonFinite("intrinsics").into());
        }
        if self.fx.abs() < TOLERANCE || self.fy.abs() < TOLERANCE {
            return Err(GeometryError::Degenerate(format!(
                "singular intrinsics: fx = {}, fy = {}",
                self.fx, self.fy
            ))
            .into());
        }
        Ok(())
    }
}
