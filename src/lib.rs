pub mod camera;
pub mod error;
pub mod math;
pub mod operations;
pub mod pipeline;
pub mod silhouette;
pub mod voxel;

pub use error::{HullError, Result};
