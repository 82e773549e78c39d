//! 3D Mathematics Library
//!
//! Value types used by the rigid3d physics core.
//!
//! ## Core Types
//!
//! - [`Vec3`] - 3D vector with x, y, z components
//! - [`Quat`] - Unit quaternion for orientations

mod vec3;
mod quat;

pub use vec3::Vec3;
pub use quat::Quat;
