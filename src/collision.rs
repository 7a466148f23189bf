//! Circle-circle collision resolution.
//!
//! One call performs a single relaxation pass for one particle against its
//! candidate neighbours: every overlapping pair is pushed apart symmetrically
//! so that, taken alone, the pair ends up exactly touching. Neighbours are
//! moved in place, so results depend on the order particles are visited.
//! Repeating the pass through the multi-pass stage lets dense clusters
//! converge.

use serde::{Deserialize, Serialize};

use crate::grid::Neighborhood;
use crate::particle::{Particle, ParticleKey};
use crate::vec::Vec2;
use crate::world::World;

/// Stand-in distance for coincident centres, keeping divisions finite.
pub const DEGENERATE_DISTANCE: f64 = 1e-4;

/// Extra reach of the linear-scan window beyond the particle's radius.
pub const DEFAULT_WINDOW_MARGIN: f64 = 30.0;

/// `distance`, or [`DEGENERATE_DISTANCE`] when it is exactly zero.
pub fn nonzero(distance: f64) -> f64 {
    if distance == 0.0 {
        DEGENERATE_DISTANCE
    } else {
        distance
    }
}

/// Where collision candidates come from.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NeighborSource {
    /// Query the world's spatial hash grid.
    Grid(Neighborhood),
    /// Scan particles up to and including this one in iteration order,
    /// keeping those within `radius + margin` on both axes.
    Window { margin: f64 },
}

impl Default for NeighborSource {
    fn default() -> Self {
        NeighborSource::Grid(Neighborhood::Full)
    }
}

impl NeighborSource {
    pub fn window() -> Self {
        NeighborSource::Window { margin: DEFAULT_WINDOW_MARGIN }
    }
}

/// Push two overlapping particles apart along the line between their centres.
///
/// Each moves by half the overlap. Returns `true` if they overlapped.
pub fn resolve_pair(particle: &mut Particle, other: &mut Particle) -> bool {
    let offset = particle.position - other.position;
    let distance = offset.length();
    let radii_sum = particle.radius() + other.radius();
    if distance >= radii_sum {
        return false;
    }
    let half = (radii_sum - distance) / 2.0;
    let distance = nonzero(distance);
    let shift = Vec2::new(offset.x / distance * half, offset.y / distance * half);
    particle.position += shift;
    other.position -= shift;
    true
}

/// Resolve overlaps between the particle under `key` and its candidates.
///
/// `index` is the particle's position in the world's iteration order; only
/// the window source reads it. Returns the number of overlaps corrected.
pub fn resolve(key: ParticleKey, world: &mut World, source: NeighborSource, index: usize) -> usize {
    let Some(particle) = world.particles.get(key) else {
        return 0;
    };
    match source {
        NeighborSource::Grid(mode) => {
            let Some(cell) = particle.properties.cell() else {
                return 0;
            };
            let mut contacts = 0;
            for other in world.grid.neighbors_of_cell(cell, mode) {
                if other != key && resolve_keys(&mut world.particles, key, other) {
                    contacts += 1;
                }
            }
            contacts
        }
        NeighborSource::Window { margin } => {
            let reach = particle.radius() + margin;
            let end = (index + 1).min(world.order.len());
            let mut contacts = 0;
            for &other in &world.order[..end] {
                if other == key || !within_window(&world.particles, key, other, reach) {
                    continue;
                }
                if resolve_keys(&mut world.particles, key, other) {
                    contacts += 1;
                }
            }
            contacts
        }
    }
}

fn within_window(
    particles: &slotmap::SlotMap<ParticleKey, Particle>,
    key: ParticleKey,
    other: ParticleKey,
    reach: f64,
) -> bool {
    let (Some(a), Some(b)) = (particles.get(key), particles.get(other)) else {
        return false;
    };
    libm::fabs(a.position.x - b.position.x) < reach && libm::fabs(a.position.y - b.position.y) < reach
}

fn resolve_keys(
    particles: &mut slotmap::SlotMap<ParticleKey, Particle>,
    key: ParticleKey,
    other: ParticleKey,
) -> bool {
    match particles.get_disjoint_mut([key, other]) {
        Some([particle, other]) => resolve_pair(particle, other),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separated_pair_untouched() {
        let mut a = Particle::at_rest((0.0, 0.0));
        let mut b = Particle::at_rest((10.0, 0.0));
        assert!(!resolve_pair(&mut a, &mut b));
        assert_eq!(a.position, Vec2::new(0.0, 0.0));
        assert_eq!(b.position, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn overlap_resolved_to_contact() {
        let mut a = Particle::at_rest((0.0, 0.0)).with_radius(4.0);
        let mut b = Particle::at_rest((0.0, 6.0)).with_radius(4.0);
        assert!(resolve_pair(&mut a, &mut b));
        assert!((a.position.distance(b.position) - 8.0).abs() < 1e-12);
        assert_eq!(a.position, Vec2::new(0.0, -1.0));
        assert_eq!(b.position, Vec2::new(0.0, 7.0));
    }

    #[test]
    fn coincident_centres_stay_finite() {
        let mut a = Particle::at_rest((3.0, 3.0));
        let mut b = Particle::at_rest((3.0, 3.0));
        assert!(resolve_pair(&mut a, &mut b));
        assert!(a.position.is_finite() && b.position.is_finite());
        assert_eq!(a.position, Vec2::new(3.0, 3.0));
        assert_eq!(b.position, Vec2::new(3.0, 3.0));
    }

    #[test]
    fn unequal_radii_share_correction() {
        let mut small = Particle::at_rest((0.0, 0.0)).with_radius(2.0);
        let mut large = Particle::at_rest((4.0, 0.0)).with_radius(6.0);
        resolve_pair(&mut small, &mut large);
        assert_eq!(small.position, Vec2::new(-2.0, 0.0));
        assert_eq!(large.position, Vec2::new(6.0, 0.0));
    }
}
