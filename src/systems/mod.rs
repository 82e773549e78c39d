//! Application systems
//!
//! Frame-level systems that sit between the application loop and the physics world.

mod simulation;

pub use simulation::{SimulationResult, SimulationSystem};
