//! The tile: a fixed square block of cells, the unit of scheduling,
//! dirty tracking and persistence.

use std::io::{self, Read, Write};

use glam::IVec2;
use rand::Rng;

use crate::materials::MaterialRegistry;
use crate::particle::{particle_flags, Particle};
use crate::rules;
use crate::util::grid::Grid;
use crate::util::rect::DirtyRect;

/// Cells per tile edge.
pub const TILE_SIZE: usize = 64;

/// Byte length of one encoded tile: an 8-byte coordinate header plus a
/// packed 17-byte record per cell.
pub const TILE_ENCODED_LEN: usize = 8 + 17 * TILE_SIZE * TILE_SIZE;

static OUT_OF_BOUNDS: Particle = Particle::EMPTY;

/// A `TILE_SIZE` x `TILE_SIZE` grid of cells at an integer tile coordinate.
///
/// Cells outside the dirty rect are guaranteed untouched since the last
/// [`Tile::clear_dirty`]; every write through [`Tile::set`] expands the
/// rect to cover the written cell.
pub struct Tile {
    coord: IVec2,
    cells: Grid<Particle>,
    dirty: DirtyRect,
}

/* Initialization */
impl Tile {
    /// A tile of all-empty cells with an empty dirty rect.
    pub fn new(coord: IVec2) -> Self {
        Tile {
            coord,
            cells: Grid::new_fill(TILE_SIZE, TILE_SIZE, Particle::EMPTY),
            dirty: DirtyRect::EMPTY,
        }
    }
}

/* Getters & Setters */
impl Tile {
    pub fn coord(&self) -> IVec2 {
        self.coord
    }

    /// Reads the cell at `(x, y)`.
    ///
    /// Coordinates outside `[0, TILE_SIZE)^2` are a caller bug (cross-tile
    /// access goes through the world); debug builds assert, release builds
    /// return a shared empty cell.
    pub fn get(&self, x: usize, y: usize) -> &Particle {
        debug_assert!(
            x < TILE_SIZE && y < TILE_SIZE,
            "tile access out of bounds: ({x}, {y})"
        );
        match self.cells.checked_get(x, y) {
            Ok(cell) => cell,
            Err(_) => &OUT_OF_BOUNDS,
        }
    }

    /// Mutable access to the cell at `(x, y)`. Does not touch the dirty
    /// rect; use [`Tile::set`] for tracked writes.
    ///
    /// Out-of-bounds coordinates assert in debug builds and clamp to the
    /// tile edge in release builds.
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut Particle {
        debug_assert!(
            x < TILE_SIZE && y < TILE_SIZE,
            "tile access out of bounds: ({x}, {y})"
        );
        self.cells.get_mut(x.min(TILE_SIZE - 1), y.min(TILE_SIZE - 1))
    }

    /// Overwrites the cell at `(x, y)` and expands the dirty rect to
    /// include it. Out-of-bounds writes assert in debug builds and are
    /// dropped in release builds.
    pub fn set(&mut self, x: usize, y: usize, cell: Particle) {
        debug_assert!(
            x < TILE_SIZE && y < TILE_SIZE,
            "tile write out of bounds: ({x}, {y})"
        );
        if x >= TILE_SIZE || y >= TILE_SIZE {
            return;
        }
        self.cells.set(x, y, cell);
        self.dirty.mark(x as i32, y as i32);
    }

    /// Expands the dirty rect to include `(x, y)` without changing the
    /// cell.
    pub fn mark_dirty(&mut self, x: usize, y: usize) {
        if x >= TILE_SIZE || y >= TILE_SIZE {
            return;
        }
        self.dirty.mark(x as i32, y as i32);
    }

    /// Resets the dirty rect to empty; cells are untouched.
    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn dirty_rect(&self) -> DirtyRect {
        self.dirty
    }
}

/* Simulation */
impl Tile {
    /// Advances every cell inside the dirty rect by one frame.
    ///
    /// The rect is cleared up front, then the old rect (clamped to the
    /// tile) is swept in row-major order, dispatching the material rule
    /// for each non-empty cell; mutations made by rules re-expand the
    /// rect for the next frame. Cells written by a movement primitive
    /// carry [`particle_flags::MOVED`] and are skipped for the remainder
    /// of the sweep; the flag is cleared before this returns.
    pub fn update<R: Rng>(&mut self, registry: &MaterialRegistry, rng: &mut R, dt: f32) {
        if self.dirty.is_empty() {
            return;
        }
        let sweep = self.dirty.clamped(TILE_SIZE as i32, TILE_SIZE as i32);
        self.dirty.clear();

        {
            let mut view = rules::TileView::new(self, registry, rng);
            for y in sweep.y..sweep.bottom() {
                for x in sweep.x..sweep.right() {
                    rules::update_cell(&mut view, x, y, dt);
                }
            }
        }

        self.clear_moved_flags();
    }

    /// Movement markers only live for the duration of one sweep; every
    /// flagged cell is inside the post-sweep dirty rect because the
    /// movement primitives mark both endpoints.
    fn clear_moved_flags(&mut self) {
        let rect = self.dirty.clamped(TILE_SIZE as i32, TILE_SIZE as i32);
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                self.cells.get_mut(x as usize, y as usize).flags &= !particle_flags::MOVED;
            }
        }
    }
}

/* Codec */
impl Tile {
    /// Writes the tile in its packed little-endian form: signed 32-bit
    /// tile x and y, then one 17-byte record per cell in row-major order.
    pub fn save<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.coord.x.to_le_bytes())?;
        writer.write_all(&self.coord.y.to_le_bytes())?;
        for cell in self.cells.iter() {
            writer.write_all(&[cell.material_id])?;
            writer.write_all(&cell.velocity_x.to_le_bytes())?;
            writer.write_all(&cell.velocity_y.to_le_bytes())?;
            writer.write_all(&cell.lifetime.to_le_bytes())?;
            writer.write_all(&cell.flags.to_le_bytes())?;
        }
        Ok(())
    }

    /// Reads a tile written by [`Tile::save`]. The loaded tile's dirty
    /// rect covers the whole tile so the next frame re-evaluates every
    /// cell.
    pub fn load<R: Read>(reader: &mut R) -> io::Result<Tile> {
        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;
        let coord = IVec2::new(
            i32::from_le_bytes(header[0..4].try_into().unwrap()),
            i32::from_le_bytes(header[4..8].try_into().unwrap()),
        );

        let mut tile = Tile::new(coord);
        let mut record = [0u8; 17];
        for cell in tile.cells.iter_mut() {
            reader.read_exact(&mut record)?;
            *cell = Particle {
                material_id: record[0],
                velocity_x: f32::from_le_bytes(record[1..5].try_into().unwrap()),
                velocity_y: f32::from_le_bytes(record[5..9].try_into().unwrap()),
                lifetime: u32::from_le_bytes(record[9..13].try_into().unwrap()),
                flags: u32::from_le_bytes(record[13..17].try_into().unwrap()),
            };
        }

        tile.dirty = DirtyRect::new(0, 0, TILE_SIZE as i32, TILE_SIZE as i32);
        Ok(tile)
    }
}
