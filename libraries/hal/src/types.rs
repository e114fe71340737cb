/// Common data types for hardware abstraction interfaces
pub use nalgebra::Vector3;

/// 3D vector representation using nalgebra
pub type Vector3d = Vector3<f32>;

/// Standard gravity in m/s²
pub const STANDARD_GRAVITY: f32 = 9.80665;
