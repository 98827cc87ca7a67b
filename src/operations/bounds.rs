use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, EmptyResultError, Result};
use crate::math::{Aabb, Vector3, TOLERANCE};
use crate::voxel::Voxel;

/// Padding added around the occupied region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BoundsMargin {
    /// Pad each axis by this fraction of the box's own extent on that axis.
    Fraction(f64),
    /// Pad every side by a fixed distance in world units.
    Absolute(f64),
    /// Pad every side by this many cell sizes of the source grid.
    Cells(f64),
}

impl Default for BoundsMargin {
    fn default() -> Self {
        Self::Cells(1.0)
    }
}

impl BoundsMargin {
    /// Checks that the margin is finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidParameter`] otherwise.
    pub fn validate(&self) -> Result<()> {
        let (name, value) = match *self {
            Self::Fraction(v) => ("margin_fraction", v),
            Self::Absolute(v) => ("margin_absolute", v),
            Self::Cells(v) => ("margin_cells", v),
        };
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigurationError::InvalidParameter { name, value }.into());
        }
        Ok(())
    }

    fn padding(&self, extents: &Vector3, cell: &Vector3) -> Vector3 {
        match *self {
            Self::Fraction(f) => extents * f,
            Self::Absolute(d) => Vector3::repeat(d),
            Self::Cells(n) => cell * n,
        }
    }
}

/// Which part of each voxel the estimated box must enclose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoundsAnchor {
    /// Voxel centres only. An axis on which every centre coincides is
    /// padded by at least half a cell.
    Centers,
    /// The full cell of every voxel.
    #[default]
    CellExtents,
}

/// Computes a tight axis-aligned box around a set of occupied voxels.
///
/// The tight box is padded by a [`BoundsMargin`] to absorb the
/// discretisation error of the grid that produced the voxels, then
/// optionally clipped to an outer box.
#[derive(Debug, Clone)]
pub struct EstimateBounds {
    margin: BoundsMargin,
    anchor: BoundsAnchor,
    clip: Option<Aabb>,
}

impl EstimateBounds {
    /// Creates a new `EstimateBounds` operation.
    #[must_use]
    pub fn new(margin: BoundsMargin) -> Self {
        Self {
            margin,
            anchor: BoundsAnchor::default(),
            clip: None,
        }
    }

    /// Sets which part of each voxel must be enclosed.
    #[must_use]
    pub fn with_anchor(mut self, anchor: BoundsAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Clips the padded box to `outer`.
    #[must_use]
    pub fn clip_to(mut self, outer: Aabb) -> Self {
        self.clip = Some(outer);
        self
    }

    /// Executes the estimate over the given voxels. Unoccupied voxels in
    /// the input are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyResultError::NoOccupiedVoxels`] if no occupied voxel
    /// is given, [`ConfigurationError::InvalidParameter`] for a bad margin,
    /// and [`ConfigurationError::DegenerateBounds`] if the padded box misses
    /// the clip box.
    pub fn execute<I>(&self, voxels: I) -> Result<Aabb>
    where
        I: IntoIterator<Item = Voxel>,
    {
        self.margin.validate()?;

        let mut tight: Option<Aabb> = None;
        let mut cell = Vector3::zeros();
        for voxel in voxels.into_iter().filter(|v| v.occupied) {
            cell = cell.sup(&voxel.extents);
            let (lo, hi) = match self.anchor {
                BoundsAnchor::Centers => (voxel.center, voxel.center),
                BoundsAnchor::CellExtents => (voxel.min_corner(), voxel.max_corner()),
            };
            match tight.as_mut() {
                Some(aabb) => {
                    aabb.include(&lo);
                    aabb.include(&hi);
                }
                None => tight = Some(Aabb::new(lo, hi)),
            }
        }
        let tight = tight.ok_or(EmptyResultError::NoOccupiedVoxels)?;

        let extents = tight.extents();
        let mut pad = self.margin.padding(&extents, &cell);
        if self.anchor == BoundsAnchor::Centers {
            for axis in 0..3 {
                if extents[axis] <= TOLERANCE {
                    pad[axis] = pad[axis].max(cell[axis] * 0.5);
                }
            }
        }
        let mut bounds = tight.expanded(&pad);
        if let Some(outer) = &self.clip {
            bounds = bounds.intersection(outer).ok_or_else(|| {
                ConfigurationError::DegenerateBounds(format!(
                    "estimated bounds {bounds} do not overlap {outer}"
                ))
            })?;
        }

        tracing::debug!(%tight, %bounds, "estimated bounds");
        Ok(bounds)
    }
}
