use serde::{Deserialize, Serialize};

use crate::camera::check_epsilon;
use crate::error::{ConfigurationError, Result};
use crate::math::Aabb;
use crate::operations::{BoundsAnchor, BoundsFromCameras, BoundsMargin};

/// Where the coarse pass gets its starting box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialBounds {
    /// A box supplied by the caller.
    Explicit(Aabb),
    /// A box guessed from the camera rig.
    FromCameras(BoundsFromCameras),
}

impl Default for InitialBounds {
    fn default() -> Self {
        Self::FromCameras(BoundsFromCameras::default())
    }
}

/// Parameters of a reconstruction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Starting box of the coarse pass.
    pub initial_bounds: InitialBounds,
    /// Target voxel count of every pass.
    pub voxel_budget: usize,
    /// Padding around the occupied region when tightening bounds.
    pub margin: BoundsMargin,
    /// Which part of each voxel the tightened bounds enclose.
    pub anchor: BoundsAnchor,
    /// Image-bound tolerance in pixels. `None` keeps each camera's own
    /// tolerance; a value overrides every camera.
    pub projection_epsilon: Option<f64>,
    /// Number of fine passes after the coarse pass.
    pub refinement_passes: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            initial_bounds: InitialBounds::default(),
            voxel_budget: 1_000_000,
            margin: BoundsMargin::default(),
            anchor: BoundsAnchor::default(),
            projection_epsilon: None,
            refinement_passes: 1,
        }
    }
}

impl PipelineConfig {
    /// Uses an explicit starting box.
    #[must_use]
    pub fn with_initial_bounds(mut self, bounds: Aabb) -> Self {
        self.initial_bounds = InitialBounds::Explicit(bounds);
        self
    }

    /// Derives the starting box from the camera rig.
    #[must_use]
    pub fn with_bounds_from_cameras(mut self, estimate: BoundsFromCameras) -> Self {
        self.initial_bounds = InitialBounds::FromCameras(estimate);
        self
    }

    /// Sets the voxel budget shared by every pass.
    #[must_use]
    pub fn with_voxel_budget(mut self, voxel_budget: usize) -> Self {
        self.voxel_budget = voxel_budget;
        self
    }

    /// Sets the bounds margin.
    #[must_use]
    pub fn with_margin(mut self, margin: BoundsMargin) -> Self {
        self.margin = margin;
        self
    }

    /// Sets the bounds anchor.
    #[must_use]
    pub fn with_anchor(mut self, anchor: BoundsAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Applies one image-bound tolerance to every camera.
    #[must_use]
    pub fn with_projection_epsilon(mut self, epsilon: f64) -> Self {
        self.projection_epsilon = Some(epsilon);
        self
    }

    /// Sets the number of fine passes.
    #[must_use]
    pub fn with_refinement_passes(mut self, passes: usize) -> Self {
        self.refinement_passes = passes;
        self
    }

    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigurationError`] found.
    pub fn validate(&self) -> Result<()> {
        if self.voxel_budget < 1 {
            return Err(ConfigurationError::InvalidVoxelBudget(self.voxel_budget).into());
        }
        if let Some(epsilon) = self.projection_epsilon {
            check_epsilon(epsilon)?;
        }
        self.margin.validate()?;
        if self.refinement_passes < 1 {
            #[allow(clippy::cast_precision_loss)]
            let value = self.refinement_passes as f64;
            return Err(ConfigurationError::InvalidParameter {
                name: "refinement_passes",
                value,
            }
            .into());
        }
        match &self.initial_bounds {
            InitialBounds::Explicit(aabb) => aabb.validate(),
            InitialBounds::FromCameras(estimate) => estimate.validate(),
        }
    }
}
