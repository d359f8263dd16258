//! Rule-facing access to a single tile's cells.

use rand::Rng;

use crate::materials::MaterialRegistry;
use crate::particle::{particle_flags, Particle};
use crate::tile::{Tile, TILE_SIZE};

/// A bounded window over one tile, handed to the material rules.
///
/// Coordinates are signed so rules can form neighbor offsets freely;
/// anything outside `[0, TILE_SIZE)^2` reads as occupied and
/// non-interacting, which keeps every rule inside its own tile.
pub struct TileView<'a, R: Rng> {
    tile: &'a mut Tile,
    registry: &'a MaterialRegistry,
    rng: &'a mut R,
}

impl<'a, R: Rng> TileView<'a, R> {
    pub(crate) fn new(tile: &'a mut Tile, registry: &'a MaterialRegistry, rng: &'a mut R) -> Self {
        TileView {
            tile,
            registry,
            rng,
        }
    }

    pub fn registry(&self) -> &MaterialRegistry {
        self.registry
    }

    pub fn rng(&mut self) -> &mut R {
        self.rng
    }

    pub fn in_bounds(x: i32, y: i32) -> bool {
        x >= 0 && x < TILE_SIZE as i32 && y >= 0 && y < TILE_SIZE as i32
    }

    /// The cell at `(x, y)`, or `None` outside the tile.
    pub fn particle(&self, x: i32, y: i32) -> Option<&Particle> {
        if !Self::in_bounds(x, y) {
            return None;
        }
        Some(self.tile.get(x as usize, y as usize))
    }

    /// Whether `(x, y)` is an empty in-tile cell. Out-of-tile coordinates
    /// count as occupied.
    pub fn is_empty(&self, x: i32, y: i32) -> bool {
        self.particle(x, y).is_some_and(Particle::is_empty)
    }

    /// Overwrites an in-tile cell and marks it dirty. Out-of-tile writes
    /// are dropped.
    pub fn set(&mut self, x: i32, y: i32, cell: Particle) {
        if Self::in_bounds(x, y) {
            self.tile.set(x as usize, y as usize, cell);
        }
    }

    /// Overwrites an in-tile cell without touching the dirty rect.
    pub(crate) fn write_untracked(&mut self, x: i32, y: i32, cell: Particle) {
        if Self::in_bounds(x, y) {
            *self.tile.get_mut(x as usize, y as usize) = cell;
        }
    }

    /// Moves the cell at the source onto an empty destination, leaving an
    /// empty cell behind and marking both dirty. Fails (returning
    /// `false`) if either end is out of the tile or the destination is
    /// occupied.
    pub fn move_cell(&mut self, src_x: i32, src_y: i32, dst_x: i32, dst_y: i32) -> bool {
        if !Self::in_bounds(src_x, src_y) || !Self::in_bounds(dst_x, dst_y) {
            return false;
        }
        if !self.is_empty(dst_x, dst_y) {
            return false;
        }
        let mut cell = *self.tile.get(src_x as usize, src_y as usize);
        cell.flags |= particle_flags::MOVED;
        self.tile.set(dst_x as usize, dst_y as usize, cell);
        self.tile.set(src_x as usize, src_y as usize, Particle::EMPTY);
        true
    }

    /// Exchanges two in-tile cells and marks both dirty. Non-empty cells
    /// pick up the moved marker so the sweep does not touch them again
    /// this frame.
    pub fn swap_cells(&mut self, ax: i32, ay: i32, bx: i32, by: i32) -> bool {
        if !Self::in_bounds(ax, ay) || !Self::in_bounds(bx, by) {
            return false;
        }
        let mut a = *self.tile.get(ax as usize, ay as usize);
        let mut b = *self.tile.get(bx as usize, by as usize);
        if !a.is_empty() {
            a.flags |= particle_flags::MOVED;
        }
        if !b.is_empty() {
            b.flags |= particle_flags::MOVED;
        }
        self.tile.set(ax as usize, ay as usize, b);
        self.tile.set(bx as usize, by as usize, a);
        true
    }
}
