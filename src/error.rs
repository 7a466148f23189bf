//! Error types for sandbox setup and bookkeeping.
//!
//! Physics itself never fails: degenerate geometry is resolved numerically.
//! These errors cover the caller-facing surface (construction, lookups).

use thiserror::Error;

use crate::particle::ParticleKey;
use crate::vec::Vec2;

/// Errors that can occur while building or mutating a sandbox.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SandboxError {
    /// Grid cell size must be positive and finite.
    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f64),
    /// A particle was spawned at a NaN or infinite position.
    #[error("particle position must be finite, got position {position:?} / old position {old_position:?}")]
    NonFinitePosition { position: Vec2, old_position: Vec2 },
    /// The key does not refer to a live particle.
    #[error("no particle with key {0:?}")]
    UnknownParticle(ParticleKey),
    /// Sweeping empty buckets needs a non-zero frame interval.
    #[error("sweep interval must be at least one frame")]
    InvalidSweepInterval,
    /// Idle tolerance must be finite and non-negative.
    #[error("idle tolerance must be finite and non-negative, got {0}")]
    InvalidIdleTolerance(f64),
    /// A world must start from a grid that tracks no particles.
    #[error("grid already tracks {0} particles")]
    GridNotEmpty(usize),
}
