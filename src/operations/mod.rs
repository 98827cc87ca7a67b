//! Operations over voxel grids: carving and bounds estimation.
//!
//! Each operation is a small struct configured with builder methods and run
//! with `execute`.

mod bounds;
mod carve;
mod initial_bounds;

pub use bounds::{BoundsAnchor, BoundsMargin, EstimateBounds};
pub use carve::{Carve, CarveReport};
pub use initial_bounds::BoundsFromCameras;
