//! Coarse-to-fine reconstruction.
//!
//! The pipeline is an explicit state machine:
//!
//! ```text
//! CoarsePass --carve, estimate bounds--> FinePass --carve--> Done
//! ```
//!
//! The coarse pass carves a grid over the initial box to localise the
//! object. Each fine pass builds a fresh grid over the tightened bounds at
//! the same voxel budget, so the cells shrink while memory stays fixed.

mod config;
mod run;

pub use config::{InitialBounds, PipelineConfig};
pub use run::{PassSummary, Reconstruction, ReconstructionPipeline, ReconstructionRun};

use crate::math::Aabb;

/// Which kind of carve pass produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    Coarse,
    Fine,
}

impl std::fmt::Display for PassKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Coarse => f.write_str("coarse"),
            Self::Fine => f.write_str("fine"),
        }
    }
}

/// Current position of a [`ReconstructionRun`].
#[derive(Debug)]
pub enum PipelineState {
    /// Nothing has run yet; the next step carves the initial box.
    CoarsePass,
    /// The next step carves a fresh grid over `bounds`. `remaining` counts
    /// this pass and the fine passes after it.
    FinePass { bounds: Aabb, remaining: usize },
    /// Finished; holds the result of the last fine pass.
    Done(Box<Reconstruction>),
}

impl PipelineState {
    /// Returns `true` once the run has finished.
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}
