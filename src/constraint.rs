//! Position-space constraints: forces, effectors, boundaries, links and collision.
//!
//! A constraint maps one particle (and, for links and collision, its
//! neighbourhood) to an updated particle by editing `position` and/or
//! `old_position`. Constraints are composed into two ordered stages by the
//! simulation step: single-pass (forces, once per frame) and multi-pass
//! (geometric projections, repeated to let them relax).

use crate::collision::{self, NeighborSource};
use crate::particle::{Particle, ParticleKey};
use crate::vec::Vec2;
use crate::world::World;

/// Per-call information a constraint may read besides the particle itself.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct StepContext {
    /// Live pointer location for this frame, if any.
    pub pointer: Option<Vec2>,
    /// Position of the particle in the world's iteration order.
    pub index: usize,
}

impl StepContext {
    pub fn new(pointer: Option<Vec2>, index: usize) -> Self {
        StepContext { pointer, index }
    }
}

/// Where a point effector is centred.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Anchor {
    /// A fixed location in simulation space.
    Fixed(Vec2),
    /// The live pointer supplied with each step. Inactive while absent.
    Pointer,
}

impl Anchor {
    pub fn resolve(self, pointer: Option<Vec2>) -> Option<Vec2> {
        match self {
            Anchor::Fixed(point) => Some(point),
            Anchor::Pointer => pointer,
        }
    }
}

/// A constraint that can be applied to a particle in a [`World`].
#[derive(Clone, Debug, PartialEq)]
pub enum Constraint {
    Gravity(Gravity),
    Friction(Friction),
    PointForce(PointForce),
    Rotational(Rotational),
    Circle(CircleBoundary),
    Bounds(BoundsConstraint),
    Link(Link),
    Collision(NeighborSource),
}

impl Constraint {
    pub fn gravity(acceleration: f64) -> Self {
        Constraint::Gravity(Gravity::new(acceleration))
    }

    pub fn friction(coefficient: f64) -> Self {
        Constraint::Friction(Friction::new(coefficient))
    }

    /// Friction read from each particle's `friction` property.
    pub fn property_friction() -> Self {
        Constraint::Friction(Friction::from_property(DEFAULT_PARTICLE_FRICTION))
    }

    pub fn repulsive(force: f64, radius: f64, anchor: Anchor) -> Self {
        Constraint::PointForce(PointForce::repulsive(force, radius, anchor))
    }

    pub fn magnetic(force: f64, radius: f64, anchor: Anchor) -> Self {
        Constraint::PointForce(PointForce::magnetic(force, radius, anchor))
    }

    pub fn rotational(force: f64, drop_off: f64, anchor: Anchor, clockwise: bool) -> Self {
        Constraint::Rotational(Rotational::new(force, drop_off, anchor, clockwise))
    }

    pub fn circle(center: Vec2, radius: f64) -> Self {
        Constraint::Circle(CircleBoundary::new(center, radius))
    }

    pub fn screen(size: Vec2) -> Self {
        Constraint::Bounds(BoundsConstraint::screen(size))
    }

    pub fn rect(min: Vec2, max: Vec2) -> Self {
        Constraint::Bounds(BoundsConstraint::new(min, max))
    }

    pub fn link(other: ParticleKey, rest_length: f64, rigidity: f64) -> Self {
        Constraint::Link(Link::new(other, rest_length, rigidity))
    }

    pub fn collision(source: NeighborSource) -> Self {
        Constraint::Collision(source)
    }

    /// Apply this constraint to the particle stored under `key`.
    ///
    /// Unknown keys are ignored.
    pub fn apply(&self, key: ParticleKey, world: &mut World, ctx: StepContext) {
        match self {
            Constraint::Link(c) => c.apply(key, world),
            Constraint::Collision(source) => {
                collision::resolve(key, world, *source, ctx.index);
            }
            _ => {
                if let Some(particle) = world.get_mut(key) {
                    self.apply_local(particle, ctx.pointer);
                }
            }
        }
    }

    /// Apply a constraint that only reads the particle itself.
    ///
    /// Links and collision need the rest of the world and are skipped here.
    pub fn apply_local(&self, particle: &mut Particle, pointer: Option<Vec2>) {
        match self {
            Constraint::Gravity(c) => c.apply(particle),
            Constraint::Friction(c) => c.apply(particle),
            Constraint::PointForce(c) => c.apply(particle, pointer),
            Constraint::Rotational(c) => c.apply(particle, pointer),
            Constraint::Circle(c) => c.apply(particle),
            Constraint::Bounds(c) => c.apply(particle),
            Constraint::Link(_) | Constraint::Collision(_) => {}
        }
    }
}

/// Which half of the Verlet state gravity displaces.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum GravityMode {
    /// Shift the current position down (`position.y += a * m`).
    #[default]
    Position,
    /// Shift the previous position up (`old_position.y -= a * m`), which
    /// shows up as added velocity on the next update.
    OldPosition,
}

/// Constant downward displacement scaled by the particle's mass.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Gravity {
    pub acceleration: f64,
    pub mode: GravityMode,
}

impl Gravity {
    pub fn new(acceleration: f64) -> Self {
        Gravity { acceleration, mode: GravityMode::Position }
    }

    pub fn with_mode(mut self, mode: GravityMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn apply(&self, particle: &mut Particle) {
        let step = self.acceleration * particle.mass();
        match self.mode {
            GravityMode::Position => particle.position.y += step,
            GravityMode::OldPosition => particle.old_position.y -= step,
        }
    }
}

/// Friction used when a per-particle coefficient is requested but absent.
pub const DEFAULT_PARTICLE_FRICTION: f64 = 0.999;

/// Scales the implicit velocity by a coefficient.
///
/// For `0 <= coefficient <= 1` this never increases speed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Friction {
    pub coefficient: f64,
    /// Prefer the particle's own `friction` property over `coefficient`.
    pub per_particle: bool,
}

impl Friction {
    pub fn new(coefficient: f64) -> Self {
        Friction { coefficient, per_particle: false }
    }

    /// Read the coefficient from each particle, falling back to `fallback`.
    pub fn from_property(fallback: f64) -> Self {
        Friction { coefficient: fallback, per_particle: true }
    }

    pub fn apply(&self, particle: &mut Particle) {
        let coefficient = if self.per_particle {
            particle.properties.friction.unwrap_or(self.coefficient)
        } else {
            self.coefficient
        };
        let velocity = particle.velocity();
        particle.old_position = particle.position - velocity.scale(coefficient);
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Polarity {
    Repel,
    Attract,
}

/// Fixed-step push away from (or pull toward) a point, within a radius.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointForce {
    pub force: f64,
    pub radius: f64,
    pub anchor: Anchor,
    pub polarity: Polarity,
}

impl PointForce {
    pub fn repulsive(force: f64, radius: f64, anchor: Anchor) -> Self {
        PointForce { force, radius, anchor, polarity: Polarity::Repel }
    }

    pub fn magnetic(force: f64, radius: f64, anchor: Anchor) -> Self {
        PointForce { force, radius, anchor, polarity: Polarity::Attract }
    }

    pub fn apply(&self, particle: &mut Particle, pointer: Option<Vec2>) {
        let Some(point) = self.anchor.resolve(pointer) else {
            return;
        };
        let offset = particle.position - point;
        let distance = offset.length();
        if distance >= self.radius {
            return;
        }
        let step = offset.scale(self.force / collision::nonzero(distance));
        match self.polarity {
            Polarity::Repel => particle.position += step,
            Polarity::Attract => particle.position -= step,
        }
    }
}

/// Tangential swirl around a point, within `drop_off`.
///
/// Directions are in screen coordinates (+y down): with `clockwise` unset the
/// particle circles counter-clockwise as seen on screen.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rotational {
    pub force: f64,
    pub drop_off: f64,
    pub anchor: Anchor,
    pub clockwise: bool,
}

impl Rotational {
    pub fn new(force: f64, drop_off: f64, anchor: Anchor, clockwise: bool) -> Self {
        Rotational { force, drop_off, anchor, clockwise }
    }

    pub fn apply(&self, particle: &mut Particle, pointer: Option<Vec2>) {
        let Some(point) = self.anchor.resolve(pointer) else {
            return;
        };
        let offset = particle.position - point;
        let distance = offset.length();
        if distance >= self.drop_off {
            return;
        }
        let tangent = offset.perp().scale(self.force / collision::nonzero(distance));
        if self.clockwise {
            particle.position += tangent;
        } else {
            particle.position -= tangent;
        }
    }
}

/// Keeps a particle, including its radius, inside a circle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CircleBoundary {
    pub center: Vec2,
    pub radius: f64,
}

impl CircleBoundary {
    pub fn new(center: Vec2, radius: f64) -> Self {
        CircleBoundary { center, radius }
    }

    pub fn apply(&self, particle: &mut Particle) {
        let limit = self.radius - particle.radius();
        let offset = particle.position - self.center;
        let distance = offset.length();
        if distance > limit {
            particle.position = self.center + offset.scale(limit / collision::nonzero(distance));
        }
    }
}

/// Keeps a particle, including its radius, inside an axis-aligned box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundsConstraint {
    pub min: Vec2,
    pub max: Vec2,
}

impl BoundsConstraint {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        BoundsConstraint { min, max }
    }

    /// Box spanning `(0, 0)` to `size`.
    pub fn screen(size: Vec2) -> Self {
        BoundsConstraint { min: Vec2::ZERO, max: size }
    }

    pub fn apply(&self, particle: &mut Particle) {
        let r = particle.radius();
        let p = &mut particle.position;
        if p.x < self.min.x + r {
            p.x = self.min.x + r;
        } else if p.x > self.max.x - r {
            p.x = self.max.x - r;
        }
        if p.y < self.min.y + r {
            p.y = self.min.y + r;
        } else if p.y > self.max.y - r {
            p.y = self.max.y - r;
        }
    }
}

/// Rod between the constrained particle and `other`.
///
/// Only the constrained particle moves: its velocity is scaled by
/// `rigidity`, then its position is projected onto the circle of
/// `rest_length` around `other`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Link {
    pub other: ParticleKey,
    pub rest_length: f64,
    pub rigidity: f64,
}

impl Link {
    pub fn new(other: ParticleKey, rest_length: f64, rigidity: f64) -> Self {
        Link { other, rest_length, rigidity }
    }

    pub fn apply(&self, key: ParticleKey, world: &mut World) {
        let Some(anchor) = world.get(self.other).map(|p| p.position) else {
            return;
        };
        if let Some(particle) = world.get_mut(key) {
            self.solve(particle, anchor);
        }
    }

    /// Apply the link against a known anchor position.
    pub fn solve(&self, particle: &mut Particle, anchor: Vec2) {
        let velocity = particle.velocity();
        particle.old_position = particle.position - velocity.scale(self.rigidity);

        let offset = particle.position - anchor;
        let distance = offset.length();
        if distance != 0.0 {
            particle.position = anchor + offset.scale(self.rest_length / distance);
        }
    }
}
