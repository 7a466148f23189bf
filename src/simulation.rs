//! Frame-stepped Verlet simulation over a [`World`].
//!
//! Each frame visits particles in the world's iteration order and runs, per
//! particle: idle-skip check, Verlet update, global then particle-local
//! single-pass constraints, global multi-pass constraints `iterations`
//! times, then particle-local multi-pass constraints `num_iterations` times.
//! The particle's grid cell is refreshed afterwards.
//!
//! Everything runs on the calling thread. Collision moves neighbours in
//! place, so a particle visited early in a frame sees a partially updated
//! world; results are reproducible for a fixed iteration order.

use ftlog::debug;

use crate::collision::NeighborSource;
use crate::config::SimulationConfig;
use crate::constraint::{Constraint, StepContext};
use crate::error::SandboxError;
use crate::observer::{FrameStats, StepObserver};
use crate::particle::{Particle, ParticleKey, DEFAULT_RADIUS};
use crate::vec::Vec2;
use crate::world::World;

/// Live point query used by pointer-anchored effectors.
///
/// Queried once at the start of each frame.
pub trait PointSource {
    fn point(&self) -> Option<Vec2>;
}

impl<F: Fn() -> Option<Vec2>> PointSource for F {
    fn point(&self) -> Option<Vec2> {
        self()
    }
}

impl PointSource for Option<Vec2> {
    fn point(&self) -> Option<Vec2> {
        *self
    }
}

/// A point source that never reports a pointer.
pub struct NoPointer;

impl PointSource for NoPointer {
    fn point(&self) -> Option<Vec2> {
        None
    }
}

/// Idle-skip parameters for [`simulate_particle`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IdleSkip {
    pub threshold: u32,
    /// Tolerance for a particle of default radius; scaled by radius.
    pub tolerance: f64,
}

impl IdleSkip {
    pub fn from_config(config: &SimulationConfig) -> Option<Self> {
        config.idle_skip.then(|| IdleSkip {
            threshold: config.idle_threshold,
            tolerance: config.idle_tolerance,
        })
    }

    pub fn tolerance_for(&self, radius: f64) -> f64 {
        self.tolerance * radius / DEFAULT_RADIUS
    }
}

/// Run the per-particle pipeline for one frame.
///
/// Returns `false` when the particle was skipped (idle, or unknown key).
pub fn simulate_particle(
    world: &mut World,
    key: ParticleKey,
    single_pass: &[Constraint],
    multi_pass: &[Constraint],
    iterations: usize,
    idle: Option<IdleSkip>,
    ctx: StepContext,
) -> bool {
    let Some(particle) = world.get_mut(key) else {
        return false;
    };
    if let Some(idle) = idle {
        if particle.idle_skip(idle.threshold, idle.tolerance_for(particle.radius())) {
            return false;
        }
    }
    particle.update();

    // Local lists are moved out while they run so constraints can borrow the world.
    let local_single = std::mem::take(&mut particle.single_pass_constraints);
    let local_multi = std::mem::take(&mut particle.multi_pass_constraints);
    let local_iterations = particle.num_iterations;

    for constraint in single_pass.iter().chain(&local_single) {
        constraint.apply(key, world, ctx);
    }
    for _ in 0..iterations {
        for constraint in multi_pass {
            constraint.apply(key, world, ctx);
        }
    }
    for _ in 0..local_iterations {
        for constraint in &local_multi {
            constraint.apply(key, world, ctx);
        }
    }

    if let Some(particle) = world.get_mut(key) {
        particle.single_pass_constraints = local_single;
        particle.multi_pass_constraints = local_multi;
    }
    true
}

/// Simulate one frame for every particle in `world`, in iteration order.
///
/// Grid cells are refreshed after each particle and once more at the end of
/// the frame, so the grid matches every position when this returns. Empty
/// buckets are not swept here; see [`Simulation::step`].
pub fn step_world<P, O>(
    world: &mut World,
    single_pass: &[Constraint],
    multi_pass: &[Constraint],
    config: &SimulationConfig,
    pointer: &P,
    observer: &mut O,
) -> FrameStats
where
    P: PointSource + ?Sized,
    O: StepObserver,
{
    let pointer = pointer.point();
    let idle = IdleSkip::from_config(config);
    let mut stats = FrameStats::default();

    for index in 0..world.order.len() {
        let key = world.order[index];
        let ctx = StepContext::new(pointer, index);
        let simulated =
            simulate_particle(world, key, single_pass, multi_pass, config.iterations, idle, ctx);

        if world.grid.update(key, &mut world.particles[key]) {
            stats.rebucketed += 1;
        }
        if simulated {
            stats.simulated += 1;
            observer.on_particle(key);
        } else {
            stats.skipped += 1;
            observer.on_skip(key);
        }
    }
    // Collision moves neighbours that were already visited this frame.
    stats.rebucketed += world.refresh_all();
    stats
}

/// A world plus the global constraint stages and a frame counter.
pub struct Simulation {
    world: World,
    single_pass: Vec<Constraint>,
    multi_pass: Vec<Constraint>,
    config: SimulationConfig,
    frame: u64,
    last_stats: FrameStats,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self, SandboxError> {
        config.validate()?;
        let world = World::new(config.cell_size)?;
        debug!("created simulation with {:?}", config);
        Ok(Simulation {
            world,
            single_pass: Vec::new(),
            multi_pass: Vec::new(),
            config,
            frame: 0,
            last_stats: FrameStats::default(),
        })
    }

    pub fn with_single_pass(mut self, constraint: Constraint) -> Self {
        self.single_pass.push(constraint);
        self
    }

    pub fn with_multi_pass(mut self, constraint: Constraint) -> Self {
        self.multi_pass.push(constraint);
        self
    }

    pub fn add_single_pass(&mut self, constraint: Constraint) {
        self.single_pass.push(constraint);
    }

    pub fn add_multi_pass(&mut self, constraint: Constraint) {
        self.multi_pass.push(constraint);
    }

    pub fn clear_constraints(&mut self) {
        self.single_pass.clear();
        self.multi_pass.clear();
    }

    /// Grid-backed collision using the configured neighbourhood.
    pub fn grid_collision(&self) -> Constraint {
        Constraint::Collision(NeighborSource::Grid(self.config.neighborhood))
    }

    pub fn spawn(&mut self, particle: Particle) -> Result<ParticleKey, SandboxError> {
        self.world.spawn(particle)
    }

    pub fn despawn(&mut self, key: ParticleKey) -> Result<Particle, SandboxError> {
        self.world.despawn(key)
    }

    /// Advance one frame and return the world for reading (e.g. drawing).
    ///
    /// Every `sweep_interval` frames, empty grid buckets are dropped.
    pub fn step<P, O>(&mut self, pointer: &P, observer: &mut O) -> &World
    where
        P: PointSource + ?Sized,
        O: StepObserver,
    {
        self.frame += 1;
        let mut stats = step_world(
            &mut self.world,
            &self.single_pass,
            &self.multi_pass,
            &self.config,
            pointer,
            observer,
        );
        stats.frame = self.frame;

        if self.frame % self.config.sweep_interval == 0 {
            stats.swept = self.world.sweep_empty();
            observer.on_sweep(stats.swept);
        }

        observer.on_frame_complete(&stats);
        self.last_stats = stats;
        &self.world
    }

    pub fn world(&self) -> &World { &self.world }
    pub fn world_mut(&mut self) -> &mut World { &mut self.world }
    pub fn config(&self) -> &SimulationConfig { &self.config }
    pub fn frame(&self) -> u64 { self.frame }
    pub fn last_stats(&self) -> FrameStats { self.last_stats }
    pub fn single_pass(&self) -> &[Constraint] { &self.single_pass }
    pub fn multi_pass(&self) -> &[Constraint] { &self.multi_pass }
}
