//! Configuration types for the simulation step.

use ftlog::warn;
use serde::{Deserialize, Serialize};

use crate::error::SandboxError;
use crate::grid::Neighborhood;

/// Configuration for a [`Simulation`](crate::simulation::Simulation).
///
/// # Builder Pattern
/// ```
/// use verlet_sandbox::config::SimulationConfig;
/// use verlet_sandbox::grid::Neighborhood;
///
/// let config = SimulationConfig::new()
///     .with_iterations(2)
///     .with_cell_size(12.0)
///     .with_neighborhood(Neighborhood::Cardinal)
///     .with_sweep_interval(600);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Passes over the global multi-pass constraints per frame. Default: 5.
    pub iterations: usize,
    /// Grid cell edge length; at least a particle diameter. Default: 12.
    pub cell_size: f64,
    /// Cells searched by grid-backed collision. Default: full 3x3.
    pub neighborhood: Neighborhood,
    /// Whether settled particles alternate skipped frames. Default: true.
    pub idle_skip: bool,
    /// Consecutive idle frames before skipping starts. Default: 10.
    pub idle_threshold: u32,
    /// Per-axis speed below which a particle of default radius counts as
    /// idle; scaled linearly with radius. Default: 0.1.
    pub idle_tolerance: f64,
    /// Frames between sweeps of empty grid buckets. Default: 600.
    pub sweep_interval: u64,
}

impl SimulationConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        SimulationConfig {
            iterations: 5,
            cell_size: 12.0,
            neighborhood: Neighborhood::Full,
            idle_skip: true,
            idle_threshold: 10,
            idle_tolerance: 0.1,
            sweep_interval: 600,
        }
    }

    /// Set the number of multi-pass iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the grid cell size.
    pub fn with_cell_size(mut self, cell_size: f64) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Set the cells searched by grid-backed collision.
    pub fn with_neighborhood(mut self, neighborhood: Neighborhood) -> Self {
        self.neighborhood = neighborhood;
        self
    }

    /// Enable or disable idle skipping.
    pub fn with_idle_skip(mut self, idle_skip: bool) -> Self {
        self.idle_skip = idle_skip;
        self
    }

    /// Set the idle frames needed before skipping starts.
    pub fn with_idle_threshold(mut self, idle_threshold: u32) -> Self {
        self.idle_threshold = idle_threshold;
        self
    }

    /// Set the idle speed tolerance for a default-radius particle.
    pub fn with_idle_tolerance(mut self, idle_tolerance: f64) -> Self {
        self.idle_tolerance = idle_tolerance;
        self
    }

    /// Set the frames between empty-bucket sweeps.
    pub fn with_sweep_interval(mut self, sweep_interval: u64) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    /// Reject values the step cannot run with.
    pub fn validate(&self) -> Result<(), SandboxError> {
        let result = if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            Err(SandboxError::InvalidCellSize(self.cell_size))
        } else if self.sweep_interval == 0 {
            Err(SandboxError::InvalidSweepInterval)
        } else if !(self.idle_tolerance.is_finite() && self.idle_tolerance >= 0.0) {
            Err(SandboxError::InvalidIdleTolerance(self.idle_tolerance))
        } else {
            Ok(())
        };
        if let Err(e) = &result {
            warn!("rejected simulation config: {}", e);
        }
        result
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}
