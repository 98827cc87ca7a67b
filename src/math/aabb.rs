use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, Result};

use super::{Point3, Vector3, TOLERANCE};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Creates a box from its two corners. No validation is performed.
    #[must_use]
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Creates the cube `[-half, half]^3` centred on the origin.
    #[must_use]
    pub fn cube(half: f64) -> Self {
        Self::new(
            Point3::new(-half, -half, -half),
            Point3::new(half, half, half),
        )
    }

    /// Smallest box containing every point, or `None` for an empty input.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point3>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut aabb = Self::new(first, first);
        for p in iter {
            aabb.include(&p);
        }
        Some(aabb)
    }

    /// Grows the box to contain `point`.
    pub fn include(&mut self, point: &Point3) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Edge lengths along x, y and z.
    #[must_use]
    pub fn extents(&self) -> Vector3 {
        self.max - self.min
    }

    /// Centre of the box.
    #[must_use]
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Enclosed volume. Zero for inverted boxes.
    #[must_use]
    pub fn volume(&self) -> f64 {
        let e = self.extents();
        if e.iter().any(|&v| v <= 0.0) {
            return 0.0;
        }
        e.x * e.y * e.z
    }

    /// Returns the box padded by `pad` on each side of each axis.
    #[must_use]
    pub fn expanded(&self, pad: &Vector3) -> Self {
        Self::new(self.min - pad, self.max + pad)
    }

    /// Overlap of two boxes, or `None` if they do not overlap.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let out = Self::new(self.min.sup(&other.min), self.max.inf(&other.max));
        if out.extents().iter().all(|&v| v >= 0.0) {
            Some(out)
        } else {
            None
        }
    }

    /// Returns `true` if the point lies inside or on the box.
    #[must_use]
    pub fn contains(&self, point: &Point3) -> bool {
        (0..3).all(|a| point[a] >= self.min[a] && point[a] <= self.max[a])
    }

    /// Checks that the box has finite corners and a positive extent on
    /// every axis.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DegenerateBounds`] otherwise.
    pub fn validate(&self) -> Result<()> {
        let finite = self.min.iter().chain(self.max.iter()).all(|v| v.is_finite());
        if !finite {
            return Err(ConfigurationError::DegenerateBounds(format!(
                "non-finite corner in {self}"
            ))
            .into());
        }
        if self.extents().iter().any(|&v| v <= TOLERANCE) {
            return Err(ConfigurationError::DegenerateBounds(format!(
                "zero volume box {self}"
            ))
            .into());
        }
        Ok(())
    }
}

impl std::fmt::Display for Aabb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:.4}, {:.4}] x [{:.4}, {:.4}] x [{:.4}, {:.4}]",
            self.min.x, self.max.x, self.min.y, self.max.y, self.min.z, self.max.z
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn from_points_spans_all_inputs() {
        let aabb = Aabb::from_points([p(1.0, -2.0, 0.5), p(-1.0, 3.0, 0.0), p(0.0, 0.0, 2.0)])
            .unwrap();
        assert_eq!(aabb.min, p(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, p(1.0, 3.0, 2.0));
    }

    #[test]
    fn from_no_points_is_none() {
        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn volume_and_center() {
        let aabb = Aabb::new(p(0.0, 0.0, 0.0), p(2.0, 3.0, 4.0));
        assert_relative_eq!(aabb.volume(), 24.0);
        assert_eq!(aabb.center(), p(1.0, 1.5, 2.0));
    }

    #[test]
    fn intersection_of_disjoint_boxes_is_none() {
        let a = Aabb::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0));
        let b = Aabb::new(p(2.0, 0.0, 0.0), p(3.0, 1.0, 1.0));
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn intersection_clips_to_overlap() {
        let a = Aabb::cube(1.0);
        let b = Aabb::new(p(0.0, -5.0, 0.5), p(5.0, 5.0, 5.0));
        let c = a.intersection(&b).unwrap();
        assert_eq!(c.min, p(0.0, -1.0, 0.5));
        assert_eq!(c.max, p(1.0, 1.0, 1.0));
    }

    #[test]
    fn flat_box_fails_validation() {
        let flat = Aabb::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 0.0));
        assert!(flat.validate().is_err());
        let inf = Aabb::new(p(0.0, 0.0, 0.0), p(f64::INFINITY, 1.0, 1.0));
        assert!(inf.validate().is_err());
        assert!(Aabb::cube(1.0).validate().is_ok());
    }
}
