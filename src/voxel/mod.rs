//! Dense voxel lattices over an axis-aligned box.

mod grid;

pub use grid::VoxelGrid;

use serde::{Deserialize, Serialize};

use crate::math::{Point3, Vector3};

/// Integer lattice coordinates of a voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoxelIndex {
    pub i: usize,
    pub j: usize,
    pub k: usize,
}

impl VoxelIndex {
    /// Creates a new index.
    #[must_use]
    pub fn new(i: usize, j: usize, k: usize) -> Self {
        Self { i, j, k }
    }
}

/// One cell of a [`VoxelGrid`], as handed to callers and exporters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Voxel {
    /// Lattice coordinates.
    pub index: VoxelIndex,
    /// World-space centre of the cell.
    pub center: Point3,
    /// Edge lengths of the cell along x, y and z.
    pub extents: Vector3,
    /// Whether the voxel is still part of the hull.
    pub occupied: bool,
}

impl Voxel {
    /// Minimum corner of the cell.
    #[must_use]
    pub fn min_corner(&self) -> Point3 {
        self.center - self.extents * 0.5
    }

    /// Maximum corner of the cell.
    #[must_use]
    pub fn max_corner(&self) -> Point3 {
        self.center + self.extents * 0.5
    }
}

/// Number of voxels along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridResolution {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl GridResolution {
    /// Creates a new resolution.
    #[must_use]
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// Total number of voxels.
    #[must_use]
    pub fn count(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Chooses per-axis counts for a box of the given `extents` so that
    /// cells are close to cubic and the total is close to `budget`.
    ///
    /// Axes shorter than the ideal cell side get a single cell and the
    /// side is recomputed over the remaining axes. Each shorter free axis
    /// then tries both integers around `extent / side`, the longest axis
    /// takes whatever count brings the total nearest to `budget`, and the
    /// best combination wins.
    ///
    /// The total is a lattice, so it generally differs from `budget` and
    /// from pass to pass: for budgets of 1000 and more the gap stays under
    /// a few percent. `extents` must be positive and `budget` non-zero;
    /// see [`VoxelGrid::new`].
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn for_budget(extents: &Vector3, budget: usize) -> Self {
        let target = budget.max(1) as f64;
        let mut free = [true; 3];
        let mut side = f64::INFINITY;

        loop {
            let axes: Vec<usize> = (0..3).filter(|&a| free[a]).collect();
            if axes.is_empty() {
                break;
            }
            let volume: f64 = axes.iter().map(|&a| extents[a]).product();
            side = (volume / target).powf(1.0 / axes.len() as f64);

            let mut changed = false;
            for &a in &axes {
                if extents[a] < side {
                    free[a] = false;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        let mut axes: Vec<usize> = (0..3).filter(|&a| free[a]).collect();
        axes.sort_by(|&a, &b| extents[b].total_cmp(&extents[a]));
        let Some((&longest, others)) = axes.split_first() else {
            return Self::new(1, 1, 1);
        };

        // Nearest integer first so that ties keep the rounded lattice.
        let choices: Vec<[usize; 2]> = others
            .iter()
            .map(|&a| {
                let ideal = extents[a] / side;
                let nearest = ideal.round();
                let other = if ideal >= nearest {
                    ideal.ceil()
                } else {
                    ideal.floor()
                };
                [(nearest as usize).max(1), (other as usize).max(1)]
            })
            .collect();

        let mut best: Option<(f64, [usize; 3])> = None;
        for pick in 0..(1_usize << others.len()) {
            let mut counts = [1_usize; 3];
            for (bit, (&a, choice)) in others.iter().zip(&choices).enumerate() {
                counts[a] = choice[(pick >> bit) & 1];
            }
            let rest: usize = counts.iter().product();
            counts[longest] = ((target / rest as f64).round() as usize).max(1);

            let error = (counts.iter().product::<usize>() as f64 - target).abs();
            if !matches!(best, Some((e, _)) if e <= error) {
                best = Some((error, counts));
            }
        }

        let [nx, ny, nz] = best.map_or([1, 1, 1], |(_, counts)| counts);
        Self::new(nx, ny, nz)
    }
}

impl std::fmt::Display for GridResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.nx, self.ny, self.nz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_with_cubic_budget_splits_evenly() {
        let res = GridResolution::for_budget(&Vector3::new(2.0, 2.0, 2.0), 1000);
        assert_eq!(res, GridResolution::new(10, 10, 10));
    }

    #[test]
    fn elongated_box_keeps_cells_near_cubic() {
        let res = GridResolution::for_budget(&Vector3::new(4.0, 2.0, 1.0), 8 * 64);
        assert_eq!(res, GridResolution::new(16, 8, 4));
    }

    #[test]
    fn thin_axis_gets_a_single_cell() {
        let res = GridResolution::for_budget(&Vector3::new(100.0, 100.0, 0.001), 1000);
        assert_eq!(res.nz, 1);
        assert!(res.nx.abs_diff(res.ny) <= 1, "{res}");
        let count = res.count();
        assert!((900..=1100).contains(&count), "count = {count}");
    }

    #[test]
    fn budget_of_one_is_a_single_voxel() {
        let res = GridResolution::for_budget(&Vector3::new(1.0, 3.0, 2.0), 1);
        assert_eq!(res.count(), 1);
    }

    #[test]
    fn small_budget_picks_the_closest_lattice() {
        let res = GridResolution::for_budget(&Vector3::new(2.0, 2.0, 2.0), 4);
        assert_eq!(res.count(), 4);
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn realised_count_stays_near_the_budget() {
        let shapes = [
            Vector3::new(2.0, 2.0, 2.0),
            Vector3::new(4.0, 2.0, 1.0),
            Vector3::new(1.0, 2.8, 2.8),
            Vector3::new(2.13, 2.13, 0.222),
            Vector3::new(100.0, 1.0, 1.0),
            Vector3::new(0.3, 7.0, 1.9),
        ];
        for extents in &shapes {
            for budget in [1000, 4096, 27_000, 64_000, 1_000_000] {
                let count = GridResolution::for_budget(extents, budget).count();
                let gap = count.abs_diff(budget) as f64 / budget as f64;
                assert!(gap <= 0.05, "{extents:?} at {budget}: {count}");
            }
        }
    }

    #[test]
    fn voxel_corners_straddle_center() {
        let v = Voxel {
            index: VoxelIndex::new(0, 0, 0),
            center: Point3::new(1.0, 1.0, 1.0),
            extents: Vector3::new(0.5, 0.5, 0.5),
            occupied: true,
        };
        assert_eq!(v.min_corner(), Point3::new(0.75, 0.75, 0.75));
        assert_eq!(v.max_corner(), Point3::new(1.25, 1.25, 1.25));
    }
}
