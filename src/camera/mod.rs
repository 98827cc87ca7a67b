//! Calibrated pinhole cameras.
//!
//! A [`CameraModel`] bundles intrinsics, a world-to-camera [`Pose`] and the
//! image size, and maps world points to continuous pixel coordinates.

mod intrinsics;
mod model;
mod pose;

pub(crate) use model::check_epsilon;
pub use intrinsics::Intrinsics;
pub use model::CameraModel;
pub use pose::Pose;

use serde::{Deserialize, Serialize};

/// Image resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    /// Number of pixel columns.
    pub width: u32,
    /// Number of pixel rows.
    pub height: u32,
}

impl ImageSize {
    /// Creates a new image size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of pixels.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns `true` if either dimension is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
