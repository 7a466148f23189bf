//! Verlet particles: position, previous position, and a property bag.

use std::collections::BTreeMap;

use slotmap::new_key_type;

use crate::constraint::Constraint;
use crate::grid::Cell;
use crate::vec::Vec2;

new_key_type! {
    /// Stable handle for a particle stored in a [`World`](crate::world::World).
    pub struct ParticleKey;
}

/// Radius used when a particle carries no `radius` property.
pub const DEFAULT_RADIUS: f64 = 5.0;
/// Mass per unit radius used when a particle carries no `mass` property.
pub const MASS_PER_RADIUS: f64 = 0.02;

/// RGB display color. Only read by renderers.
pub type Color = [u8; 3];

/// Free-form value for caller-defined property keys.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Number(f64),
    Integer(i64),
    Flag(bool),
    Text(String),
}

/// Typed property bag with default-if-absent lookups.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Properties {
    pub radius: Option<f64>,
    pub mass: Option<f64>,
    pub color: Option<Color>,
    /// Per-particle friction coefficient, read by
    /// [`Friction::from_property`](crate::constraint::Friction::from_property).
    pub friction: Option<f64>,
    /// Caller-defined keys.
    pub extra: BTreeMap<String, PropertyValue>,
    /// Grid cell the particle is currently bucketed in. Owned by the grid.
    pub(crate) cell: Option<Cell>,
}

impl Properties {
    /// Radius, falling back to [`DEFAULT_RADIUS`].
    pub fn radius(&self) -> f64 {
        self.radius.unwrap_or(DEFAULT_RADIUS)
    }

    /// Mass, falling back to `radius * MASS_PER_RADIUS`.
    pub fn mass(&self) -> f64 {
        self.mass.unwrap_or_else(|| self.radius() * MASS_PER_RADIUS)
    }

    /// The grid cell recorded for this particle, if it is tracked by a grid.
    pub fn cell(&self) -> Option<Cell> {
        self.cell
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.extra.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: PropertyValue) -> Option<PropertyValue> {
        self.extra.insert(key.into(), value)
    }
}

/// A Verlet particle: position-based dynamics with implicit velocity.
#[derive(Clone, Debug)]
pub struct Particle {
    pub position: Vec2,
    pub old_position: Vec2,
    pub properties: Properties,
    /// Applied once per frame, after the global single-pass constraints.
    pub single_pass_constraints: Vec<Constraint>,
    /// Applied `num_iterations` times per frame, after the global multi-pass ones.
    pub multi_pass_constraints: Vec<Constraint>,
    pub num_iterations: usize,
    pub idle_frames: u32,
    pub skip_pass: bool,
}

impl Particle {
    pub fn new(position: impl Into<Vec2>, old_position: impl Into<Vec2>) -> Self {
        Particle {
            position: position.into(),
            old_position: old_position.into(),
            properties: Properties::default(),
            single_pass_constraints: Vec::new(),
            multi_pass_constraints: Vec::new(),
            num_iterations: 0,
            idle_frames: 0,
            skip_pass: false,
        }
    }

    /// A particle with zero implicit velocity.
    pub fn at_rest(position: impl Into<Vec2>) -> Self {
        let position = position.into();
        Self::new(position, position)
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.properties.radius = Some(radius);
        self
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.properties.mass = Some(mass);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.properties.color = Some(color);
        self
    }

    pub fn with_friction(mut self, friction: f64) -> Self {
        self.properties.friction = Some(friction);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(key, value);
        self
    }

    pub fn with_single_pass(mut self, constraint: Constraint) -> Self {
        self.single_pass_constraints.push(constraint);
        self
    }

    pub fn with_multi_pass(mut self, constraint: Constraint) -> Self {
        self.multi_pass_constraints.push(constraint);
        self
    }

    pub fn with_num_iterations(mut self, num_iterations: usize) -> Self {
        self.num_iterations = num_iterations;
        self
    }

    pub fn radius(&self) -> f64 {
        self.properties.radius()
    }

    pub fn mass(&self) -> f64 {
        self.properties.mass()
    }

    /// Implicit velocity: displacement since the previous frame.
    pub fn velocity(&self) -> Vec2 {
        self.position - self.old_position
    }

    /// Overwrite the implicit velocity by moving `old_position`.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.old_position = self.position - velocity;
    }

    /// Verlet step: extrapolate the current velocity by one frame.
    pub fn update(&mut self) {
        let velocity = self.velocity();
        self.old_position = self.position;
        self.position += velocity;
    }

    /// Advance the idle tracker and report whether this frame is skipped.
    ///
    /// A particle whose velocity stays within `tolerance` of zero for more
    /// than `threshold` consecutive frames alternates between skipped and
    /// simulated frames. Movement resets the idle count; the skip toggle keeps
    /// its phase.
    pub fn idle_skip(&mut self, threshold: u32, tolerance: f64) -> bool {
        if !self.velocity().is_near_zero(tolerance) {
            self.idle_frames = 0;
            return false;
        }
        self.idle_frames = self.idle_frames.saturating_add(1);
        if self.idle_frames > threshold {
            self.skip_pass = !self.skip_pass;
            return self.skip_pass;
        }
        false
    }
}
