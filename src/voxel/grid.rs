use crate::error::{ConfigurationError, Result};
use crate::math::{Aabb, Point3, Vector3};

use super::{GridResolution, Voxel, VoxelIndex};

/// A dense voxel lattice with one occupancy flag per cell.
///
/// Cells tile `bounds` exactly. Occupancy is stored in a flat array indexed
/// `(i * ny + j) * nz + k`; voxel centres are derived on demand.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    bounds: Aabb,
    resolution: GridResolution,
    cell_size: Vector3,
    occupancy: Vec<bool>,
}

impl VoxelGrid {
    /// Partitions `bounds` into roughly `voxel_budget` near-cubic cells,
    /// all initially occupied.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the budget is zero or the box is
    /// degenerate.
    pub fn new(bounds: Aabb, voxel_budget: usize) -> Result<Self> {
        if voxel_budget < 1 {
            return Err(ConfigurationError::InvalidVoxelBudget(voxel_budget).into());
        }
        bounds.validate()?;

        let extents = bounds.extents();
        let resolution = GridResolution::for_budget(&extents, voxel_budget);
        Ok(Self::with_resolution(bounds, resolution))
    }

    /// Builds a grid with explicit per-axis counts.
    fn with_resolution(bounds: Aabb, resolution: GridResolution) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let cell_size = bounds.extents().component_div(&Vector3::new(
            resolution.nx as f64,
            resolution.ny as f64,
            resolution.nz as f64,
        ));
        Self {
            bounds,
            resolution,
            cell_size,
            occupancy: vec![true; resolution.count()],
        }
    }

    /// Returns the box covered by the grid.
    #[must_use]
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Returns the per-axis voxel counts.
    #[must_use]
    pub fn resolution(&self) -> GridResolution {
        self.resolution
    }

    /// Returns the edge lengths of a single cell.
    #[must_use]
    pub fn cell_size(&self) -> Vector3 {
        self.cell_size
    }

    /// Volume of a single cell.
    #[must_use]
    pub fn cell_volume(&self) -> f64 {
        self.cell_size.x * self.cell_size.y * self.cell_size.z
    }

    /// Total number of voxels, occupied or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.occupancy.len()
    }

    /// Always `false` for a successfully constructed grid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occupancy.is_empty()
    }

    /// Number of voxels still occupied.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.occupancy.iter().filter(|&&o| o).count()
    }

    /// World-space centre of the voxel at `index`. The index is not
    /// range-checked.
    #[must_use]
    pub fn center_of(&self, index: VoxelIndex) -> Point3 {
        cell_center(&self.bounds.min, &self.cell_size, index)
    }

    /// Returns the voxel at `index`, or `None` if it is outside the grid.
    #[must_use]
    pub fn voxel(&self, index: VoxelIndex) -> Option<Voxel> {
        let flat = self.flat_index(index)?;
        Some(self.voxel_at(flat))
    }

    /// Lazily visits every voxel once, in flat-index order.
    pub fn iter(&self) -> impl Iterator<Item = Voxel> + '_ {
        (0..self.len()).map(move |flat| self.voxel_at(flat))
    }

    /// Calls `f` on every voxel once, in flat-index order.
    pub fn for_each_voxel<F>(&self, f: F)
    where
        F: FnMut(Voxel),
    {
        self.iter().for_each(f);
    }

    /// Lazily visits every occupied voxel.
    pub fn occupied_voxels(&self) -> impl Iterator<Item = Voxel> + '_ {
        self.occupancy
            .iter()
            .enumerate()
            .filter(|(_, &o)| o)
            .map(move |(flat, _)| self.voxel_at(flat))
    }

    /// Clears the occupancy flag of the voxel at `index`. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::IndexOutOfRange`] if `index` is
    /// outside the grid.
    pub fn mark_carved(&mut self, index: VoxelIndex) -> Result<()> {
        let flat = self
            .flat_index(index)
            .ok_or(ConfigurationError::IndexOutOfRange {
                i: index.i,
                j: index.j,
                k: index.k,
            })?;
        self.occupancy[flat] = false;
        Ok(())
    }

    /// Clears every occupied voxel whose centre fails `keep`, returning the
    /// number of voxels cleared. Unoccupied voxels are never visited and
    /// never re-occupied.
    ///
    /// With the `parallel` feature the predicate runs on the rayon pool;
    /// each worker owns a disjoint slice of the occupancy flags.
    pub(crate) fn retain<F>(&mut self, keep: F) -> usize
    where
        F: Fn(&Point3) -> bool + Sync,
    {
        let origin = self.bounds.min;
        let cell = self.cell_size;
        let resolution = self.resolution;
        let visit = |(flat, occupied): (usize, &mut bool)| -> usize {
            if !*occupied {
                return 0;
            }
            let center = cell_center(&origin, &cell, unflatten(resolution, flat));
            if keep(&center) {
                0
            } else {
                *occupied = false;
                1
            }
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            self.occupancy.par_iter_mut().enumerate().map(visit).sum()
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.occupancy.iter_mut().enumerate().map(visit).sum()
        }
    }

    fn flat_index(&self, index: VoxelIndex) -> Option<usize> {
        let r = self.resolution;
        if index.i >= r.nx || index.j >= r.ny || index.k >= r.nz {
            return None;
        }
        Some((index.i * r.ny + index.j) * r.nz + index.k)
    }

    fn voxel_at(&self, flat: usize) -> Voxel {
        let index = unflatten(self.resolution, flat);
        Voxel {
            index,
            center: self.center_of(index),
            extents: self.cell_size,
            occupied: self.occupancy[flat],
        }
    }
}

fn unflatten(r: GridResolution, flat: usize) -> VoxelIndex {
    let k = flat % r.nz;
    let rest = flat / r.nz;
    VoxelIndex::new(rest / r.ny, rest % r.ny, k)
}

#[allow(clippy::cast_precision_loss)]
fn cell_center(origin: &Point3, cell: &Vector3, index: VoxelIndex) -> Point3 {
    origin
        + Vector3::new(
            (index.i as f64 + 0.5) * cell.x,
            (index.j as f64 + 0.5) * cell.y,
            (index.k as f64 + 0.5) * cell.z,
        )
}
