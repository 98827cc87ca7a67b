//! Binary foreground masks, one per camera.

mod mask;

pub use mask::{MaskSampling, SilhouetteMask};

use crate::camera::ImageSize;
use crate::math::Point2;

/// A per-camera binary foreground test over image-plane coordinates.
///
/// Implementations must be deterministic and free of side effects: the
/// carving engine queries them concurrently from several threads.
pub trait Silhouette {
    /// Image size the mask was produced for.
    fn size(&self) -> ImageSize;

    /// Returns `true` if the continuous pixel coordinate lies on the
    /// foreground. Out-of-image points are background.
    fn contains(&self, point: &Point2) -> bool;
}

impl<S: Silhouette + ?Sized> Silhouette for &S {
    fn size(&self) -> ImageSize {
        (**self).size()
    }

    fn contains(&self, point: &Point2) -> bool {
        (**self).contains(point)
    }
}
