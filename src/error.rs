use thiserror::Error;

use crate::camera::ImageSize;
use crate::pipeline::PassKind;

/// Top-level error type for visual hull reconstruction.
#[derive(Debug, Error)]
pub enum HullError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    EmptyResult(#[from] EmptyResultError),
}

/// Invalid inputs detected before or at the start of a pass.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("degenerate bounding box: {0}")]
    DegenerateBounds(String),

    #[error("voxel budget must be at least 1, got {0}")]
    InvalidVoxelBudget(usize),

    #[error(
        "camera {camera} has image size {camera_size} but its silhouette mask is {mask_size}"
    )]
    ResolutionMismatch {
        camera: usize,
        camera_size: ImageSize,
        mask_size: ImageSize,
    },

    #[error("got {cameras} cameras but {masks} silhouette masks")]
    CountMismatch { cameras: usize, masks: usize },

    #[error("at least one camera is required")]
    NoCameras,

    #[error("mask buffer holds {actual} pixels, expected {expected}")]
    MaskSizeMismatch { expected: usize, actual: usize },

    #[error("invalid parameter {name} = {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("voxel index ({i}, {j}, {k}) is outside the grid")]
    IndexOutOfRange { i: usize, j: usize, k: usize },
}

/// Camera geometry for which projection is undefined.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("rotation matrix is not orthonormal")]
    NotOrthonormal,

    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
}

/// A carve pass removed every voxel.
#[derive(Debug, Error)]
pub enum EmptyResultError {
    #[error("no voxel survived the {pass} pass")]
    NoSurvivors { pass: PassKind },

    #[error("cannot estimate bounds from an empty voxel set")]
    NoOccupiedVoxels,
}

/// Convenience type alias for results using [`HullError`].
pub type Result<T> = std::result::Result<T, HullError>;
