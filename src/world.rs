//! Particle storage: an arena, a stable iteration order and the broad-phase grid.

use ftlog::debug;
use slotmap::SlotMap;

use crate::error::SandboxError;
use crate::grid::{cell_of, SpatialHashGrid};
use crate::particle::{Particle, ParticleKey};

/// Owns every particle in a simulation together with the spatial grid.
///
/// Keys stay valid until the particle is despawned. Iteration follows spawn
/// order, which keeps order-dependent collision results reproducible.
#[derive(Clone, Debug)]
pub struct World {
    pub(crate) particles: SlotMap<ParticleKey, Particle>,
    pub(crate) order: Vec<ParticleKey>,
    pub(crate) grid: SpatialHashGrid,
}

impl World {
    pub fn new(cell_size: f64) -> Result<Self, SandboxError> {
        Self::with_grid(SpatialHashGrid::new(cell_size)?)
    }

    /// Build a world around an empty grid.
    ///
    /// Keys already tracked by `grid` would alias particles of this arena.
    pub fn with_grid(grid: SpatialHashGrid) -> Result<Self, SandboxError> {
        if grid.tracked_count() != 0 {
            return Err(SandboxError::GridNotEmpty(grid.tracked_count()));
        }
        Ok(World {
            particles: SlotMap::with_key(),
            order: Vec::new(),
            grid,
        })
    }

    /// Store `particle`, append it to the iteration order and bucket it.
    pub fn spawn(&mut self, mut particle: Particle) -> Result<ParticleKey, SandboxError> {
        if !(particle.position.is_finite() && particle.old_position.is_finite()) {
            return Err(SandboxError::NonFinitePosition {
                position: particle.position,
                old_position: particle.old_position,
            });
        }
        particle.properties.cell = None;
        let key = self.particles.insert(particle);
        self.grid.add(key, &mut self.particles[key]);
        self.order.push(key);
        debug!("spawned particle {:?}, {} alive", key, self.particles.len());
        Ok(key)
    }

    /// Remove a particle from the grid, the order and the arena.
    pub fn despawn(&mut self, key: ParticleKey) -> Result<Particle, SandboxError> {
        let mut particle = self.particles.remove(key).ok_or(SandboxError::UnknownParticle(key))?;
        self.grid.remove(key, &mut particle);
        if let Some(index) = self.order.iter().position(|&k| k == key) {
            self.order.remove(index);
        }
        debug!("despawned particle {:?}, {} alive", key, self.particles.len());
        Ok(particle)
    }

    pub fn get(&self, key: ParticleKey) -> Option<&Particle> {
        self.particles.get(key)
    }

    /// Mutable access to a particle.
    ///
    /// Call [`World::refresh`] after moving it so the grid stays in sync.
    pub fn get_mut(&mut self, key: ParticleKey) -> Option<&mut Particle> {
        self.particles.get_mut(key)
    }

    /// Mutable access to two distinct particles at once.
    pub fn pair_mut(&mut self, a: ParticleKey, b: ParticleKey) -> Option<[&mut Particle; 2]> {
        self.particles.get_disjoint_mut([a, b])
    }

    /// Re-bucket one particle after its position changed.
    pub fn refresh(&mut self, key: ParticleKey) -> Result<bool, SandboxError> {
        let particle = self.particles.get_mut(key).ok_or(SandboxError::UnknownParticle(key))?;
        Ok(self.grid.update(key, particle))
    }

    /// Re-bucket every particle. Returns how many changed cell.
    pub fn refresh_all(&mut self) -> usize {
        let mut moved = 0;
        for &key in &self.order {
            if self.grid.update(key, &mut self.particles[key]) {
                moved += 1;
            }
        }
        moved
    }

    /// Drop empty grid buckets. Returns the number removed.
    pub fn sweep_empty(&mut self) -> usize {
        let removed = self.grid.sweep_empty();
        debug!("swept {} empty buckets, {} remain", removed, self.grid.bucket_count());
        removed
    }

    /// Keys in iteration order.
    pub fn keys(&self) -> &[ParticleKey] {
        &self.order
    }

    /// Particles in iteration order.
    pub fn iter(&self) -> impl Iterator<Item = (ParticleKey, &Particle)> + '_ {
        self.order.iter().map(move |&key| (key, &self.particles[key]))
    }

    pub fn grid(&self) -> &SpatialHashGrid {
        &self.grid
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Check that every particle's recorded cell matches its position and
    /// that it sits in exactly that bucket, and nowhere else.
    pub fn grid_is_consistent(&self) -> bool {
        let per_particle = self.order.iter().all(|&key| {
            let particle = &self.particles[key];
            let expected = cell_of(particle.position, self.grid.cell_size());
            particle.properties.cell() == Some(expected)
                && self.grid.bucket(expected).iter().filter(|&&k| k == key).count() == 1
        });
        per_particle && self.grid.tracked_count() == self.particles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec::Vec2;

    #[test]
    fn spawn_tracks_in_grid_and_order() {
        let mut world = World::new(10.0).unwrap();
        let a = world.spawn(Particle::at_rest((1.0, 1.0))).unwrap();
        let b = world.spawn(Particle::at_rest((15.0, 1.0))).unwrap();
        assert_eq!(world.keys(), &[a, b]);
        assert_eq!(world.len(), 2);
        assert!(world.grid_is_consistent());
    }

    #[test]
    fn spawn_rejects_non_finite() {
        let mut world = World::new(10.0).unwrap();
        let err = world.spawn(Particle::at_rest((f64::NAN, 0.0))).unwrap_err();
        assert!(matches!(err, SandboxError::NonFinitePosition { .. }));
        assert!(world.is_empty());
    }

    #[test]
    fn despawn_removes_everywhere() {
        let mut world = World::new(10.0).unwrap();
        let a = world.spawn(Particle::at_rest((1.0, 1.0))).unwrap();
        let b = world.spawn(Particle::at_rest((2.0, 1.0))).unwrap();
        let removed = world.despawn(a).unwrap();
        assert_eq!(removed.properties.cell(), None);
        assert_eq!(world.keys(), &[b]);
        assert_eq!(world.grid().tracked_count(), 1);
        assert_eq!(world.despawn(a).unwrap_err(), SandboxError::UnknownParticle(a));
    }

    #[test]
    fn stale_cell_detected_until_refresh() {
        let mut world = World::new(10.0).unwrap();
        let a = world.spawn(Particle::at_rest((1.0, 1.0))).unwrap();
        world.get_mut(a).unwrap().position = Vec2::new(35.0, 1.0);
        assert!(!world.grid_is_consistent());
        assert!(world.refresh(a).unwrap());
        assert!(world.grid_is_consistent());
    }

    #[test]
    fn with_grid_rejects_populated_grid() {
        let mut other = World::new(10.0).unwrap();
        other.spawn(Particle::at_rest((1.0, 1.0))).unwrap();
        let err = World::with_grid(other.grid().clone()).unwrap_err();
        assert_eq!(err, SandboxError::GridNotEmpty(1));
        assert!(World::with_grid(SpatialHashGrid::new(10.0).unwrap()).is_ok());
    }

    #[test]
    fn pair_mut_rejects_same_key() {
        let mut world = World::new(10.0).unwrap();
        let a = world.spawn(Particle::at_rest((1.0, 1.0))).unwrap();
        assert!(world.pair_mut(a, a).is_none());
    }
}
