//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`RIGID3D_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use rigid3d_math::Vec3;
use rigid3d_physics::PhysicsConfig;
use serde::{Serialize, Deserialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Physics engine configuration
    #[serde(default)]
    pub physics: PhysicsConfigSection,
    /// Frame driving configuration
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`RIGID3D_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // RIGID3D_PHYSICS__MAX_SUB_STEPS=4 -> physics.max_sub_steps = 4
        figment = figment.merge(Env::prefixed("RIGID3D_").split("__"));

        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let physics = &self.physics;
        if !(physics.fixed_time_step > 0.0) {
            return Err(ConfigError::invalid(format!(
                "physics.fixed_time_step must be positive, got {}",
                physics.fixed_time_step
            )));
        }
        if physics.max_sub_steps == 0 {
            return Err(ConfigError::invalid("physics.max_sub_steps must be at least 1"));
        }
        if physics.sleep_threshold < 0.0 {
            return Err(ConfigError::invalid("physics.sleep_threshold must not be negative"));
        }
        if !(self.simulation.max_frame_dt > 0.0) {
            return Err(ConfigError::invalid("simulation.max_frame_dt must be positive"));
        }
        if !(self.simulation.frame_rate > 0.0) {
            return Err(ConfigError::invalid("simulation.frame_rate must be positive"));
        }
        Ok(())
    }
}

/// Physics engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfigSection {
    /// Gravity acceleration [x, y, z]
    pub gravity: [f32; 3],
    /// Simulation sub-step length in seconds
    pub fixed_time_step: f32,
    /// Most sub-steps per frame
    pub max_sub_steps: u32,
    /// Contact solver passes per sub-step
    pub velocity_iterations: u32,
    /// Currently unused by the solver
    pub position_iterations: u32,
    /// Let resting bodies fall asleep
    pub enable_sleeping: bool,
    /// Kinetic energy per unit mass below which bodies may sleep
    pub sleep_threshold: f32,
}

impl Default for PhysicsConfigSection {
    fn default() -> Self {
        let engine = PhysicsConfig::default();
        Self {
            gravity: engine.gravity.to_array(),
            fixed_time_step: engine.fixed_time_step,
            max_sub_steps: engine.max_sub_steps,
            velocity_iterations: engine.velocity_iterations,
            position_iterations: engine.position_iterations,
            enable_sleeping: engine.enable_sleeping,
            sleep_threshold: engine.sleep_threshold,
        }
    }
}

impl PhysicsConfigSection {
    /// Convert to the physics engine's config type
    pub fn to_physics_config(&self) -> PhysicsConfig {
        let [x, y, z] = self.gravity;
        PhysicsConfig {
            gravity: Vec3::new(x, y, z),
            fixed_time_step: self.fixed_time_step,
            max_sub_steps: self.max_sub_steps,
            velocity_iterations: self.velocity_iterations,
            position_iterations: self.position_iterations,
            enable_sleeping: self.enable_sleeping,
            sleep_threshold: self.sleep_threshold,
        }
    }
}

/// Frame driving configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Longest frame delta handed to the world, in seconds
    pub max_frame_dt: f32,
    /// Frames the demo runs before exiting
    pub frames: u32,
    /// Frame rate the demo pretends to run at
    pub frame_rate: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_frame_dt: 0.25,
            frames: 300,
            frame_rate: 60.0,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Log every collision event, not just the summary
    pub log_collisions: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_collisions: false,
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        ConfigError {
            message: message.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}
