//! Verlet particle sandbox with composable constraints.
//!
//! `verlet_sandbox` evolves a population of circular point masses with
//! position-based Verlet integration. Behaviour comes entirely from
//! constraints applied in two stages each frame: single-pass forces and
//! effectors, then multi-pass projections (boundaries, links, collision)
//! repeated to relax toward consistency. A spatial hash grid keeps the
//! collision broad-phase near linear in the particle count.
//!
//! # Features
//!
//! - **Verlet integration**: implicit velocity, no explicit velocity field
//! - **Constraints**: gravity, friction, point/rotational effectors, circle and
//!   box boundaries, links, collision
//! - **Spatial hash grid**: cardinal or 3x3 neighbourhood queries, periodic
//!   pruning of empty buckets
//! - **Idle skipping**: settled particles simulate every other frame
//! - **Observable**: monitor frames via the `StepObserver` trait
//!
//! ```
//! use verlet_sandbox::{Constraint, Particle, Simulation, SimulationConfig, Vec2};
//! use verlet_sandbox::{NoOpStepObserver, NoPointer};
//!
//! let mut sim = Simulation::new(SimulationConfig::new().with_iterations(2)).unwrap();
//! let collide = sim.grid_collision();
//! sim.add_single_pass(Constraint::gravity(0.5));
//! sim.add_multi_pass(Constraint::screen(Vec2::new(800.0, 600.0)));
//! sim.add_multi_pass(collide);
//!
//! sim.spawn(Particle::at_rest((400.0, 60.0)).with_radius(6.0)).unwrap();
//! let world = sim.step(&NoPointer, &mut NoOpStepObserver);
//! assert_eq!(world.len(), 1);
//! ```

pub mod vec;
pub mod particle;
pub mod constraint;
pub mod collision;
pub mod grid;
pub mod world;
pub mod simulation;
pub mod observer;
pub mod config;
pub mod error;

// Re-export primary API
pub use vec::Vec2;
pub use particle::{Color, Particle, ParticleKey, Properties, PropertyValue};
pub use constraint::{
    Anchor, BoundsConstraint, CircleBoundary, Constraint, Friction, Gravity, GravityMode, Link,
    PointForce, Polarity, Rotational, StepContext,
};
pub use collision::{resolve_pair, NeighborSource};
pub use grid::{cell_of, Cell, Neighborhood, SpatialHashGrid};
pub use world::World;
pub use simulation::{simulate_particle, step_world, IdleSkip, NoPointer, PointSource, Simulation};
pub use observer::{FrameStats, NoOpStepObserver, StepObserver};
pub use config::SimulationConfig;
pub use error::SandboxError;
