//! Simulation system
//!
//! Drives the physics world once per frame:
//! - Delta time calculation
//! - Frame delta capping
//! - Physics stepping
//! - Event collection

use std::time::Instant;

use log::trace;
use rigid3d_physics::{PhysicsEvent, PhysicsWorld, StepReport};

/// Result of a simulation update
pub struct SimulationResult {
    /// Frame delta actually handed to the world, after capping
    pub dt: f32,
    /// What the world's step did
    pub report: StepReport,
    /// Events queued by the world since the previous frame
    pub events: Vec<PhysicsEvent>,
}

impl SimulationResult {
    pub fn collisions(&self) -> impl Iterator<Item = &PhysicsEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, PhysicsEvent::Collision(_)))
    }

    pub fn triggers(&self) -> impl Iterator<Item = &PhysicsEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, PhysicsEvent::Trigger(_)))
    }
}

/// Manages the per-frame simulation loop
pub struct SimulationSystem {
    last_frame: Instant,
    max_frame_dt: f32,
}

impl SimulationSystem {
    /// Create a new simulation system that hands at most `max_frame_dt`
    /// seconds to the world per frame
    pub fn new(max_frame_dt: f32) -> Self {
        Self {
            last_frame: Instant::now(),
            max_frame_dt,
        }
    }

    pub fn max_frame_dt(&self) -> f32 {
        self.max_frame_dt
    }

    /// Run one frame using the wall time elapsed since the previous call
    pub fn update(&mut self, world: &mut PhysicsWorld) -> SimulationResult {
        let now = Instant::now();
        let raw_dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.update_with_dt(world, raw_dt)
    }

    /// Run one frame with an explicit delta time
    pub fn update_with_dt(&mut self, world: &mut PhysicsWorld, raw_dt: f32) -> SimulationResult {
        // Cap dt to prevent a spiral of death after a stall
        // The world's accumulator further subdivides into fixed timesteps
        let dt = raw_dt.clamp(0.0, self.max_frame_dt);
        if dt < raw_dt {
            trace!("frame dt {:.4}s capped to {:.4}s", raw_dt, dt);
        }

        let report = world.step(dt);
        let events = world.drain_events();

        SimulationResult { dt, report, events }
    }
}

impl Default for SimulationSystem {
    fn default() -> Self {
        Self::new(0.25)
    }
}
