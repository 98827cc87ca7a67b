use crate::camera::CameraModel;
use crate::error::{EmptyResultError, Result};
use crate::math::{Aabb, Vector3};
use crate::operations::{Carve, EstimateBounds};
use crate::silhouette::Silhouette;
use crate::voxel::{GridResolution, Voxel, VoxelGrid};

use super::{InitialBounds, PassKind, PipelineConfig, PipelineState};

/// Statistics of one completed carve pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassSummary {
    /// Coarse or fine.
    pub kind: PassKind,
    /// Box covered by the pass's grid.
    pub bounds: Aabb,
    /// Per-axis voxel counts of the grid.
    pub resolution: GridResolution,
    /// Edge lengths of one cell.
    pub cell_size: Vector3,
    /// Voxels in the grid.
    pub voxel_count: usize,
    /// Voxels left after carving.
    pub occupied: usize,
}

impl PassSummary {
    /// Volume of one cell.
    #[must_use]
    pub fn cell_volume(&self) -> f64 {
        self.cell_size.x * self.cell_size.y * self.cell_size.z
    }
}

/// The final visual hull: the last fine pass's grid plus per-pass statistics.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    grid: VoxelGrid,
    passes: Vec<PassSummary>,
}

impl Reconstruction {
    /// The grid of the last fine pass.
    #[must_use]
    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    /// Summaries of every pass, coarse first.
    #[must_use]
    pub fn passes(&self) -> &[PassSummary] {
        &self.passes
    }

    /// Number of voxels in the hull.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.grid.occupied_count()
    }

    /// Lazily visits the voxels of the hull.
    pub fn occupied_voxels(&self) -> impl Iterator<Item = Voxel> + '_ {
        self.grid.occupied_voxels()
    }

    /// Collects the voxels of the hull for export.
    #[must_use]
    pub fn into_voxels(self) -> Vec<Voxel> {
        self.grid.occupied_voxels().collect()
    }

    /// Releases the final grid.
    #[must_use]
    pub fn into_grid(self) -> VoxelGrid {
        self.grid
    }
}

/// Validated reconstruction settings. Cameras and masks are supplied per run.
#[derive(Debug, Clone)]
pub struct ReconstructionPipeline {
    config: PipelineConfig,
}

impl ReconstructionPipeline {
    /// Creates a new pipeline.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`](crate::error::ConfigurationError)
    /// if the configuration is invalid.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Prepares a step-wise run over the given cameras and masks.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`](crate::error::ConfigurationError)
    /// if the cameras and masks do not pair up.
    pub fn start<'a, S>(
        &'a self,
        cameras: &'a [CameraModel],
        masks: &'a [S],
    ) -> Result<ReconstructionRun<'a, S>>
    where
        S: Silhouette + Sync,
    {
        Carve::new(cameras, masks).validate()?;
        Ok(ReconstructionRun {
            config: &self.config,
            cameras,
            masks,
            state: PipelineState::CoarsePass,
            passes: Vec::with_capacity(1 + self.config.refinement_passes),
        })
    }

    /// Runs every pass and returns the final hull.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`](crate::error::ConfigurationError)
    /// for malformed inputs and an
    /// [`EmptyResultError`] if any pass carves every voxel.
    pub fn run<S>(&self, cameras: &[CameraModel], masks: &[S]) -> Result<Reconstruction>
    where
        S: Silhouette + Sync,
    {
        self.start(cameras, masks)?.finish()
    }
}

/// A reconstruction in progress. Each [`advance`](Self::advance) runs one
/// pass.
pub struct ReconstructionRun<'a, S> {
    config: &'a PipelineConfig,
    cameras: &'a [CameraModel],
    masks: &'a [S],
    state: PipelineState,
    passes: Vec<PassSummary>,
}

impl<S> ReconstructionRun<'_, S>
where
    S: Silhouette + Sync,
{
    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Summaries of the passes completed so far.
    #[must_use]
    pub fn passes(&self) -> &[PassSummary] {
        &self.passes
    }

    /// Runs the next pass and returns the new state. Does nothing once done.
    ///
    /// # Errors
    ///
    /// Returns an error if the pass fails. The state and the pass summaries
    /// are then left as they were before the call.
    pub fn advance(&mut self) -> Result<&PipelineState> {
        let completed = self.passes.len();
        if let Err(err) = self.step() {
            self.passes.truncate(completed);
            return Err(err);
        }
        Ok(&self.state)
    }

    fn step(&mut self) -> Result<()> {
        match self.state {
            PipelineState::CoarsePass => {
                let initial = self.initial_bounds()?;
                let grid = self.carve_pass(PassKind::Coarse, initial)?;
                if touches_boundary(&grid) {
                    tracing::warn!(
                        bounds = %initial,
                        "coarse hull reaches the initial box; the box may be too small"
                    );
                }
                let bounds = self.tighten(&grid)?;
                self.state = PipelineState::FinePass {
                    bounds,
                    remaining: self.config.refinement_passes,
                };
            }
            PipelineState::FinePass { bounds, remaining } => {
                let grid = self.carve_pass(PassKind::Fine, bounds)?;
                self.state = if remaining > 1 {
                    PipelineState::FinePass {
                        bounds: self.tighten(&grid)?,
                        remaining: remaining - 1,
                    }
                } else {
                    PipelineState::Done(Box::new(Reconstruction {
                        grid,
                        passes: self.passes.clone(),
                    }))
                };
            }
            PipelineState::Done(_) => {}
        }
        Ok(())
    }

    /// Runs the remaining passes and returns the final hull.
    ///
    /// # Errors
    ///
    /// See [`ReconstructionPipeline::run`].
    pub fn finish(mut self) -> Result<Reconstruction> {
        loop {
            if let PipelineState::Done(result) = self.state {
                return Ok(*result);
            }
            self.advance()?;
        }
    }

    fn initial_bounds(&self) -> Result<Aabb> {
        match &self.config.initial_bounds {
            InitialBounds::Explicit(aabb) => Ok(*aabb),
            InitialBounds::FromCameras(estimate) => estimate.execute(self.cameras),
        }
    }

    /// Builds a fresh grid over `bounds` and carves it.
    fn carve_pass(&mut self, kind: PassKind, bounds: Aabb) -> Result<VoxelGrid> {
        let _span = tracing::info_span!("carve_pass", pass = %kind).entered();

        let mut grid = VoxelGrid::new(bounds, self.config.voxel_budget)?;
        let mut carve = Carve::new(self.cameras, self.masks);
        if let Some(epsilon) = self.config.projection_epsilon {
            carve = carve.with_epsilon(epsilon);
        }
        let report = carve.execute(&mut grid)?;

        let summary = PassSummary {
            kind,
            bounds,
            resolution: grid.resolution(),
            cell_size: grid.cell_size(),
            voxel_count: grid.len(),
            occupied: report.remaining,
        };
        tracing::info!(
            %bounds,
            resolution = %summary.resolution,
            voxels = summary.voxel_count,
            occupied = summary.occupied,
            "pass complete"
        );
        self.passes.push(summary);

        if report.remaining == 0 {
            return Err(EmptyResultError::NoSurvivors { pass: kind }.into());
        }
        Ok(grid)
    }

    /// Estimates the next pass's box, never larger than the grid's own box.
    fn tighten(&self, grid: &VoxelGrid) -> Result<Aabb> {
        EstimateBounds::new(self.config.margin)
            .with_anchor(self.config.anchor)
            .clip_to(*grid.bounds())
            .execute(grid.occupied_voxels())
    }
}

/// Returns `true` if any occupied voxel lies in the outermost layer.
fn touches_boundary(grid: &VoxelGrid) -> bool {
    let r = grid.resolution();
    grid.occupied_voxels().any(|v| {
        let idx = v.index;
        idx.i == 0
            || idx.j == 0
            || idx.k == 0
            || idx.i + 1 == r.nx
            || idx.j + 1 == r.ny
            || idx.k + 1 == r.nz
    })
}
