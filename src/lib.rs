//! rigid3d - rigid-body physics application layer
//!
//! Configuration loading, scene construction and frame driving on top of
//! [`rigid3d_physics`].

pub mod config;
pub mod scene;
pub mod systems;

pub use rigid3d_math as math;
pub use rigid3d_physics as physics;
