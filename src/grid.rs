//! Spatial hash grid used as the collision broad-phase.
//!
//! The plane is cut into square cells of `cell_size`. Each tracked particle
//! lives in exactly one bucket and records that bucket's cell in its own
//! properties; the two must always agree, so every position change has to be
//! followed by [`SpatialHashGrid::update`] before the next neighbourhood query.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::SandboxError;
use crate::particle::{Particle, ParticleKey};
use crate::vec::Vec2;

/// Integer coordinates of a grid cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i64,
    pub y: i64,
}

impl Cell {
    pub const fn new(x: i64, y: i64) -> Self {
        Cell { x, y }
    }

    /// Neighbouring cell, or `None` past the edge of the coordinate range.
    fn offset(self, (dx, dy): (i64, i64)) -> Option<Self> {
        Some(Cell { x: self.x.checked_add(dx)?, y: self.y.checked_add(dy)? })
    }
}

/// Which cells around the focal cell a neighbourhood query visits.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Neighborhood {
    /// Focal cell plus its four edge-sharing neighbours.
    Cardinal,
    /// The full 3x3 block around the focal cell.
    #[default]
    Full,
}

const CARDINAL_OFFSETS: [(i64, i64); 5] = [(0, -1), (-1, 0), (0, 0), (1, 0), (0, 1)];

const FULL_OFFSETS: [(i64, i64); 9] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0), (0, 0), (1, 0),
    (-1, 1), (0, 1), (1, 1),
];

impl Neighborhood {
    fn offsets(self) -> &'static [(i64, i64)] {
        match self {
            Neighborhood::Cardinal => &CARDINAL_OFFSETS,
            Neighborhood::Full => &FULL_OFFSETS,
        }
    }

    /// Cells visited around `cell`, in row-major order.
    ///
    /// Positions far enough out saturate to the extreme cell; offsets beyond
    /// it are left out.
    pub fn cells(self, cell: Cell) -> impl Iterator<Item = Cell> {
        self.offsets().iter().filter_map(move |&o| cell.offset(o))
    }
}

/// Cell containing `position` for the given `cell_size` (floor division).
pub fn cell_of(position: Vec2, cell_size: f64) -> Cell {
    Cell {
        x: libm::floor(position.x / cell_size) as i64,
        y: libm::floor(position.y / cell_size) as i64,
    }
}

/// Sparse map from cell to the particles currently inside it.
#[derive(Clone, Debug)]
pub struct SpatialHashGrid {
    cell_size: f64,
    buckets: HashMap<Cell, Vec<ParticleKey>>,
}

impl SpatialHashGrid {
    /// Create an empty grid. `cell_size` should be at least a particle diameter.
    pub fn new(cell_size: f64) -> Result<Self, SandboxError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(SandboxError::InvalidCellSize(cell_size));
        }
        Ok(SpatialHashGrid { cell_size, buckets: HashMap::new() })
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn cell_of(&self, position: Vec2) -> Cell {
        cell_of(position, self.cell_size)
    }

    /// Insert `particle` into the bucket for its position and record the cell.
    pub fn add(&mut self, key: ParticleKey, particle: &mut Particle) {
        debug_assert!(
            particle.properties.cell.is_none(),
            "particle {key:?} is already tracked by a grid"
        );
        let cell = self.cell_of(particle.position);
        self.buckets.entry(cell).or_default().push(key);
        particle.properties.cell = Some(cell);
    }

    /// Erase `particle` from its recorded bucket and clear the record.
    ///
    /// Returns `false` when the particle was not tracked.
    pub fn remove(&mut self, key: ParticleKey, particle: &mut Particle) -> bool {
        let Some(cell) = particle.properties.cell.take() else {
            return false;
        };
        self.detach(key, cell)
    }

    /// Re-bucket `particle` after its position changed.
    ///
    /// A no-op when the particle is still inside its recorded cell. Returns
    /// `true` when it moved to a different bucket.
    pub fn update(&mut self, key: ParticleKey, particle: &mut Particle) -> bool {
        let Some(old) = particle.properties.cell else {
            self.add(key, particle);
            return true;
        };
        let cell = self.cell_of(particle.position);
        if cell == old {
            return false;
        }
        let detached = self.detach(key, old);
        debug_assert!(detached, "particle {key:?} missing from its recorded cell {old:?}");
        self.buckets.entry(cell).or_default().push(key);
        particle.properties.cell = Some(cell);
        true
    }

    fn detach(&mut self, key: ParticleKey, cell: Cell) -> bool {
        let Some(bucket) = self.buckets.get_mut(&cell) else {
            return false;
        };
        match bucket.iter().position(|&k| k == key) {
            Some(index) => {
                // Keep bucket order stable so neighbour iteration is deterministic.
                bucket.remove(index);
                true
            }
            None => false,
        }
    }

    /// All particles in the focal cell of `particle` and the surrounding
    /// cells selected by `mode`. The particle itself is included.
    pub fn neighbors<'a>(
        &'a self,
        particle: &Particle,
        mode: Neighborhood,
    ) -> impl Iterator<Item = ParticleKey> + 'a {
        particle
            .properties
            .cell
            .into_iter()
            .flat_map(move |cell| self.neighbors_of_cell(cell, mode))
    }

    /// Particles in `cell` and the surrounding cells selected by `mode`.
    pub fn neighbors_of_cell<'a>(
        &'a self,
        cell: Cell,
        mode: Neighborhood,
    ) -> impl Iterator<Item = ParticleKey> + 'a {
        mode.cells(cell)
            .filter_map(move |c| self.buckets.get(&c))
            .flat_map(|bucket| bucket.iter().copied())
    }

    /// Drop buckets with no members. Returns the number of buckets removed.
    ///
    /// O(bucket count); call every few hundred frames rather than every frame.
    pub fn sweep_empty(&mut self) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| !bucket.is_empty());
        before - self.buckets.len()
    }

    /// Members of a single bucket; empty when the bucket is absent.
    pub fn bucket(&self, cell: Cell) -> &[ParticleKey] {
        self.buckets.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of buckets currently allocated, empty ones included.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of particles tracked across all buckets.
    pub fn tracked_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Iterate over `(cell, members)` for every allocated bucket.
    pub fn buckets(&self) -> impl Iterator<Item = (Cell, &[ParticleKey])> + '_ {
        self.buckets.iter().map(|(&cell, keys)| (cell, keys.as_slice()))
    }
}
