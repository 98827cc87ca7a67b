use serde::{Deserialize, Serialize};

use crate::camera::ImageSize;
use crate::error::{ConfigurationError, Result};
use crate::math::Point2;

use super::Silhouette;

/// How a continuous image point is resolved against the pixel mask.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum MaskSampling {
    /// Use the pixel containing the point.
    #[default]
    Nearest,
    /// Interpolate the four surrounding pixel centres and compare the
    /// result against `threshold` (in `(0, 1]`).
    Bilinear { threshold: f64 },
}

/// A dense binary silhouette stored row-major.
///
/// Pixel `(x, y)` covers the half-open square `[x, x + 1) x [y, y + 1)` in
/// continuous image coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SilhouetteMask {
    size: ImageSize,
    pixels: Vec<bool>,
    sampling: MaskSampling,
}

impl SilhouetteMask {
    /// Creates a mask from a row-major pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MaskSizeMismatch`] if the buffer length
    /// is not `width * height`.
    pub fn new(size: ImageSize, pixels: Vec<bool>) -> Result<Self> {
        if pixels.len() != size.pixel_count() {
            return Err(ConfigurationError::MaskSizeMismatch {
                expected: size.pixel_count(),
                actual: pixels.len(),
            }
            .into());
        }
        Ok(Self {
            size,
            pixels,
            sampling: MaskSampling::Nearest,
        })
    }

    /// Builds a mask by evaluating `f(x, y)` at every pixel.
    pub fn from_fn<F>(size: ImageSize, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        let mut pixels = Vec::with_capacity(size.pixel_count());
        for y in 0..size.height {
            for x in 0..size.width {
                pixels.push(f(x, y));
            }
        }
        Self {
            size,
            pixels,
            sampling: MaskSampling::Nearest,
        }
    }

    /// A mask whose every pixel is foreground.
    #[must_use]
    pub fn filled(size: ImageSize) -> Self {
        Self::from_fn(size, |_, _| true)
    }

    /// A mask whose every pixel is background.
    #[must_use]
    pub fn empty(size: ImageSize) -> Self {
        Self::from_fn(size, |_, _| false)
    }

    /// Thresholds an 8-bit single-channel buffer: values `>= threshold`
    /// become foreground.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MaskSizeMismatch`] if the buffer length
    /// is not `width * height`.
    pub fn from_luma(size: ImageSize, luma: &[u8], threshold: u8) -> Result<Self> {
        Self::new(size, luma.iter().map(|&v| v >= threshold).collect())
    }

    /// Returns a copy using the given sampling mode.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidParameter`] if a bilinear
    /// threshold is outside `(0, 1]`.
    pub fn with_sampling(mut self, sampling: MaskSampling) -> Result<Self> {
        if let MaskSampling::Bilinear { threshold } = sampling {
            if !(threshold > 0.0 && threshold <= 1.0) {
                return Err(ConfigurationError::InvalidParameter {
                    name: "bilinear_threshold",
                    value: threshold,
                }
                .into());
            }
        }
        self.sampling = sampling;
        Ok(self)
    }

    /// Returns the sampling mode.
    #[must_use]
    pub fn sampling(&self) -> MaskSampling {
        self.sampling
    }

    /// Returns the value of pixel `(x, y)`, or `false` outside the image.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.size.width || y >= self.size.height {
            return false;
        }
        self.pixels[self.offset(x as usize, y as usize)]
    }

    /// Number of foreground pixels.
    #[must_use]
    pub fn foreground_count(&self) -> usize {
        self.pixels.iter().filter(|&&v| v).count()
    }

    fn offset(&self, x: usize, y: usize) -> usize {
        y * self.size.width as usize + x
    }

    fn value(&self, x: usize, y: usize) -> f64 {
        if self.pixels[self.offset(x, y)] {
            1.0
        } else {
            0.0
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn sample_nearest(&self, point: &Point2) -> bool {
        self.pixels[self.offset(point.x.floor() as usize, point.y.floor() as usize)]
    }

    fn sample_bilinear(&self, point: &Point2, threshold: f64) -> bool {
        let (x0, x1, tx) = bilinear_axis(point.x, self.size.width as usize);
        let (y0, y1, ty) = bilinear_axis(point.y, self.size.height as usize);
        let top = self.value(x0, y0) * (1.0 - tx) + self.value(x1, y0) * tx;
        let bottom = self.value(x0, y1) * (1.0 - tx) + self.value(x1, y1) * tx;
        top * (1.0 - ty) + bottom * ty >= threshold
    }
}

impl Silhouette for SilhouetteMask {
    fn size(&self) -> ImageSize {
        self.size
    }

    fn contains(&self, point: &Point2) -> bool {
        let width = f64::from(self.size.width);
        let height = f64::from(self.size.height);
        // NaN fails every comparison and lands here too.
        if !(point.x >= 0.0 && point.y >= 0.0 && point.x < width && point.y < height) {
            return false;
        }
        match self.sampling {
            MaskSampling::Nearest => self.sample_nearest(point),
            MaskSampling::Bilinear { threshold } => self.sample_bilinear(point, threshold),
        }
    }
}

/// Neighbouring pixel indices and interpolation weight along one axis,
/// with pixel centres at `i + 0.5`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bilinear_axis(coord: f64, len: usize) -> (usize, usize, f64) {
    let c = coord - 0.5;
    if c <= 0.0 {
        return (0, 0, 0.0);
    }
    let lo = c.floor() as usize;
    if lo + 1 >= len {
        return (len - 1, len - 1, 0.0);
    }
    (lo, lo + 1, c - c.floor())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn checker() -> SilhouetteMask {
        // 4x2, foreground where x + y is even.
        SilhouetteMask::from_fn(ImageSize::new(4, 2), |x, y| (x + y) % 2 == 0)
    }

    #[test]
    fn buffer_length_must_match_size() {
        let err = SilhouetteMask::new(ImageSize::new(3, 3), vec![true; 8]);
        assert!(matches!(
            err,
            Err(crate::HullError::Configuration(
                ConfigurationError::MaskSizeMismatch {
                    expected: 9,
                    actual: 8
                }
            ))
        ));
    }

    #[test]
    fn nearest_resolves_to_containing_pixel() {
        let mask = checker();
        assert!(mask.contains(&Point2::new(0.2, 0.9)));
        assert!(!mask.contains(&Point2::new(1.0, 0.0)));
        assert!(mask.contains(&Point2::new(1.99, 1.5)));
        assert!(mask.contains(&Point2::new(3.5, 1.5)));
    }

    #[test]
    fn out_of_bounds_is_background() {
        let mask = SilhouetteMask::filled(ImageSize::new(4, 2));
        assert!(!mask.contains(&Point2::new(-0.01, 0.5)));
        assert!(!mask.contains(&Point2::new(0.5, -0.01)));
        assert!(!mask.contains(&Point2::new(4.0, 0.5)));
        assert!(!mask.contains(&Point2::new(0.5, 2.0)));
        assert!(!mask.contains(&Point2::new(f64::NAN, 0.5)));
        assert!(mask.contains(&Point2::new(3.999, 1.999)));
    }

    #[test]
    fn from_luma_thresholds_bytes() {
        let mask = SilhouetteMask::from_luma(ImageSize::new(3, 1), &[0, 127, 255], 128).unwrap();
        assert!(!mask.get(0, 0));
        assert!(!mask.get(1, 0));
        assert!(mask.get(2, 0));
        assert_eq!(mask.foreground_count(), 1);
    }

    #[test]
    fn bilinear_blends_neighbours() {
        // Left column foreground, right column background.
        let mask = SilhouetteMask::from_fn(ImageSize::new(2, 1), |x, _| x == 0)
            .with_sampling(MaskSampling::Bilinear { threshold: 0.5 })
            .unwrap();
        assert!(mask.contains(&Point2::new(0.9, 0.5)));
        assert!(mask.contains(&Point2::new(1.0, 0.5)));
        assert!(!mask.contains(&Point2::new(1.1, 0.5)));
        assert!(!mask.contains(&Point2::new(1.9, 0.5)));
    }

    #[test]
    fn bilinear_threshold_is_validated() {
        let mask = SilhouetteMask::filled(ImageSize::new(2, 2));
        assert!(mask
            .clone()
            .with_sampling(MaskSampling::Bilinear { threshold: 0.0 })
            .is_err());
        assert!(mask
            .with_sampling(MaskSampling::Bilinear { threshold: 1.5 })
            .is_err());
    }

    #[test]
    fn get_outside_image_is_false() {
        assert!(!checker().get(4, 0));
        assert!(!checker().get(0, 2));
    }
}
