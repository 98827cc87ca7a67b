mod aabb;

pub use aabb::Aabb;

/// 2D point type (image-plane coordinates, in pixels).
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 3x3 matrix type (rotations, intrinsic matrices).
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// 3x4 matrix type (camera projection matrices).
pub type Matrix3x4 = nalgebra::Matrix3x4<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;
