//! The world: a map from tile coordinates to exclusively-owned tiles,
//! streamed around a roving observer.

pub mod persistence;
pub(crate) mod scheduler;

pub use persistence::PersistError;

use std::sync::{Arc, Mutex};

use glam::{IVec2, Vec2};
use hashbrown::HashMap;
use itertools::Itertools;
use log::debug;

use crate::generator::{Generator, ProceduralGenerator};
use crate::materials::MaterialRegistry;
use crate::particle::Particle;
use crate::tile::{Tile, TILE_SIZE};

/// Tiles are shared with the scheduler's worker pool for the duration of
/// one frame; the per-tile mutex is uncontended there because each phase
/// batch holds a tile at most once.
pub type SharedTile = Arc<Mutex<Tile>>;

pub(crate) type TileMap = HashMap<IVec2, SharedTile>;

/// Maps a world cell coordinate to the coordinate of its tile.
/// Euclidean division keeps the mapping uniform across negatives.
pub fn world_to_tile(world: IVec2) -> IVec2 {
    IVec2::new(
        world.x.div_euclid(TILE_SIZE as i32),
        world.y.div_euclid(TILE_SIZE as i32),
    )
}

/// Maps a world cell coordinate to its cell coordinate within the tile,
/// always in `[0, TILE_SIZE)`.
pub fn world_to_local(world: IVec2) -> IVec2 {
    IVec2::new(
        world.x.rem_euclid(TILE_SIZE as i32),
        world.y.rem_euclid(TILE_SIZE as i32),
    )
}

/// An unbounded 2d falling-sand world.
///
/// The tile map is the only cross-thread shared structure; its mutex is
/// held for lookups, insertions, removals and the scheduler's per-phase
/// collection, never across a tile update.
pub struct World {
    tiles: Mutex<TileMap>,
    registry: Arc<MaterialRegistry>,
    generator: Box<dyn Generator>,
    observer: Vec2,
    load_radius: i32,
    seed: u64,
    frame: u64,
}

/// Configures and builds a [`World`].
pub struct WorldBuilder {
    seed: u64,
    load_radius: i32,
    registry: Option<MaterialRegistry>,
    generator: Option<Box<dyn Generator>>,
}

impl WorldBuilder {
    pub fn new() -> Self {
        WorldBuilder {
            seed: 0,
            load_radius: 3,
            registry: None,
            generator: None,
        }
    }

    /// Seed for rule randomness and the default generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Streaming radius in tiles (Chebyshev).
    pub fn load_radius(mut self, radius: i32) -> Self {
        self.load_radius = radius;
        self
    }

    /// Material table; defaults to the built-in one.
    pub fn registry(mut self, registry: MaterialRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Terrain source; defaults to [`ProceduralGenerator`] on the world
    /// seed.
    pub fn generator(mut self, generator: Box<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn build(self) -> World {
        let registry = self.registry.unwrap_or_else(MaterialRegistry::with_defaults);
        let generator = self
            .generator
            .unwrap_or_else(|| Box::new(ProceduralGenerator::new(self.seed)));
        World {
            tiles: Mutex::new(TileMap::new()),
            registry: Arc::new(registry),
            generator,
            observer: Vec2::ZERO,
            load_radius: self.load_radius,
            seed: self.seed,
            frame: 0,
        }
    }
}

impl Default for WorldBuilder {
    fn default() -> Self {
        WorldBuilder::new()
    }
}

/* Construction & getters */
impl World {
    pub fn builder() -> WorldBuilder {
        WorldBuilder::new()
    }

    pub fn registry(&self) -> &MaterialRegistry {
        &self.registry
    }

    pub fn observer(&self) -> Vec2 {
        self.observer
    }

    /// Moves the streaming anchor (world space, floating point).
    pub fn set_observer(&mut self, position: Vec2) {
        self.observer = position;
    }

    pub fn load_radius(&self) -> i32 {
        self.load_radius
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.lock().unwrap().len()
    }

    /// Coordinates of every resident tile, in no particular order.
    pub fn resident_coords(&self) -> Vec<IVec2> {
        self.tiles.lock().unwrap().keys().copied().collect()
    }
}

/* Tile lifecycle */
impl World {
    /// The tile at `coord`, if resident. The handle must not be held
    /// across a frame boundary; tile storage belongs to the world.
    pub fn get_tile(&self, coord: IVec2) -> Option<SharedTile> {
        self.tiles.lock().unwrap().get(&coord).cloned()
    }

    /// Returns the tile at `coord`, creating an empty one if absent.
    pub fn create_tile(&self, coord: IVec2) -> SharedTile {
        let mut map = self.tiles.lock().unwrap();
        map.entry(coord)
            .or_insert_with(|| Arc::new(Mutex::new(Tile::new(coord))))
            .clone()
    }

    /// Drops the tile at `coord`. Must not be called while a frame is in
    /// flight; streaming runs strictly before the scheduler.
    pub fn destroy_tile(&self, coord: IVec2) {
        let removed = self.tiles.lock().unwrap().remove(&coord);
        drop(removed);
    }

    /// Drops every resident tile.
    pub fn clear(&self) {
        self.tiles.lock().unwrap().clear();
    }
}

/* Particle access */
impl World {
    /// Reads the particle at a world cell coordinate. Returns the empty
    /// particle when the backing tile is not resident; absent tiles are
    /// never materialized by reads.
    pub fn get_particle(&self, wx: i32, wy: i32) -> Particle {
        let world = IVec2::new(wx, wy);
        let local = world_to_local(world);
        match self.get_tile(world_to_tile(world)) {
            Some(tile) => *tile.lock().unwrap().get(local.x as usize, local.y as usize),
            None => Particle::EMPTY,
        }
    }

    /// Overwrites the particle at a world cell coordinate, lazily
    /// materializing the backing tile. This is the paint entry point; it
    /// is safe to call concurrently with a frame in flight.
    pub fn set_particle(&self, wx: i32, wy: i32, particle: Particle) {
        let world = IVec2::new(wx, wy);
        let local = world_to_local(world);
        let tile = self.create_tile(world_to_tile(world));
        let mut tile = tile.lock().unwrap();
        tile.set(local.x as usize, local.y as usize, particle);
    }

    /// In-place mutation of the particle at a world cell coordinate,
    /// lazily materializing the backing tile. The cell is marked dirty
    /// afterwards.
    pub fn with_particle_mut<T>(
        &self,
        wx: i32,
        wy: i32,
        mutate: impl FnOnce(&mut Particle) -> T,
    ) -> T {
        let world = IVec2::new(wx, wy);
        let local = world_to_local(world);
        let tile = self.create_tile(world_to_tile(world));
        let mut tile = tile.lock().unwrap();
        let result = mutate(tile.get_mut(local.x as usize, local.y as usize));
        tile.mark_dirty(local.x as usize, local.y as usize);
        result
    }
}

/* Streaming & frame driver */
impl World {
    /// Advances the world by one frame: stream tiles around the
    /// observer, then run every dirty tile through the four-phase
    /// schedule. Blocks until the frame completes.
    pub fn update(&mut self, dt: f32) {
        self.stream();
        scheduler::run_frame(&self.tiles, &self.registry, self.seed, self.frame, dt);
        self.frame = self.frame.wrapping_add(1);
    }

    /// Ensures residency of every tile within the load radius of the
    /// observer (Chebyshev), filling fresh tiles from the generator, and
    /// evicts tiles more than two rings beyond it. The hysteresis band
    /// keeps a wandering observer from thrashing the edge tiles.
    pub fn stream(&mut self) {
        let center = self.observer_tile();
        let radius = self.load_radius;

        for (dy, dx) in (-radius..=radius).cartesian_product(-radius..=radius) {
            let coord = center + IVec2::new(dx, dy);
            let resident = self.tiles.lock().unwrap().contains_key(&coord);
            if resident {
                continue;
            }
            // Generate outside the map lock; paints racing this insert
            // land on whichever tile wins the entry.
            let mut tile = Tile::new(coord);
            self.generator.generate(&mut tile);
            self.tiles
                .lock()
                .unwrap()
                .entry(coord)
                .or_insert_with(|| Arc::new(Mutex::new(tile)));
        }

        let evicted: Vec<IVec2> = {
            let map = self.tiles.lock().unwrap();
            map.keys()
                .filter(|coord| {
                    let distance = (**coord - center).abs().max_element();
                    distance > radius + 2
                })
                .copied()
                .collect()
        };
        if !evicted.is_empty() {
            debug!("evicting {} tiles around {center}", evicted.len());
        }
        for coord in evicted {
            self.destroy_tile(coord);
        }
    }

    fn observer_tile(&self) -> IVec2 {
        let cell = IVec2::new(self.observer.x.floor() as i32, self.observer.y.floor() as i32);
        world_to_tile(cell)
    }
}

#[cfg(test)]
mod tests {
    use crate::generator::EmptyGenerator;
    use crate::materials::MaterialId;

    use super::*;

    fn blank_world() -> World {
        World::builder()
            .seed(42)
            .generator(Box::new(EmptyGenerator))
            .build()
    }

    /// tile * TILE_SIZE + local reconstructs the world coordinate, and
    /// local always lands in [0, TILE_SIZE).
    #[test]
    fn coordinate_mapping_round_trips() {
        for w in -200..200 {
            let world = IVec2::new(w, -w * 3 + 1);
            let tile = world_to_tile(world);
            let local = world_to_local(world);
            assert_eq!(tile * TILE_SIZE as i32 + local, world);
            assert!((0..TILE_SIZE as i32).contains(&local.x));
            assert!((0..TILE_SIZE as i32).contains(&local.y));
        }
    }

    #[test]
    fn reads_of_absent_tiles_are_empty_and_do_not_materialize() {
        let world = blank_world();
        assert!(world.get_particle(-100, 250).is_empty());
        assert_eq!(world.tile_count(), 0);
    }

    #[test]
    fn paint_materializes_the_backing_tile() {
        let world = blank_world();
        world.set_particle(-1, -1, Particle::of(MaterialId::Sand));
        assert_eq!(world.tile_count(), 1);
        assert!(world.get_particle(-1, -1).is(MaterialId::Sand));

        let tile = world.get_tile(IVec2::new(-1, -1)).unwrap();
        let tile = tile.lock().unwrap();
        assert_eq!(tile.coord(), IVec2::new(-1, -1));
        assert!(tile.get(TILE_SIZE - 1, TILE_SIZE - 1).is(MaterialId::Sand));
    }

    #[test]
    fn create_tile_is_idempotent() {
        let world = blank_world();
        let first = world.create_tile(IVec2::new(3, 4));
        let second = world.create_tile(IVec2::new(3, 4));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(world.tile_count(), 1);
    }

    #[test]
    fn with_particle_mut_dirties_the_cell() {
        let world = blank_world();
        world.with_particle_mut(10, 10, |cell| {
            *cell = Particle::of(MaterialId::Water);
        });
        let tile = world.get_tile(IVec2::ZERO).unwrap();
        let tile = tile.lock().unwrap();
        assert!(tile.get(10, 10).is(MaterialId::Water));
        assert!(tile.dirty_rect().contains(10, 10));
    }

    #[test]
    fn stream_fills_the_load_square() {
        let mut world = blank_world();
        world.set_observer(Vec2::ZERO);
        world.stream();
        assert_eq!(world.tile_count(), 49);
        for coord in world.resident_coords() {
            assert!(coord.abs().max_element() <= 3);
        }
    }

    #[test]
    fn streaming_relocates_with_the_observer() {
        let mut world = blank_world();
        world.set_observer(Vec2::ZERO);
        world.stream();

        world.set_observer(Vec2::new((TILE_SIZE * 10) as f32, 0.0));
        world.stream();

        let coords = world.resident_coords();
        assert_eq!(coords.len(), 49);
        for coord in coords {
            assert!((7..=13).contains(&coord.x), "stale tile {coord}");
            assert!((-3..=3).contains(&coord.y), "stale tile {coord}");
        }
    }

    #[test]
    fn eviction_has_hysteresis() {
        let mut world = blank_world();
        world.set_observer(Vec2::ZERO);
        world.stream();

        // Two tiles over: edge tiles sit at distance 5 = R + 2 and stay.
        world.set_observer(Vec2::new((TILE_SIZE * 2) as f32, 0.0));
        world.stream();
        let coords = world.resident_coords();
        assert!(coords.contains(&IVec2::new(-3, 0)), "within the band");
        assert_eq!(coords.len(), 49 + 2 * 7);

        // A third step pushes them past R + 2.
        world.set_observer(Vec2::new((TILE_SIZE * 3) as f32, 0.0));
        world.stream();
        assert!(!world.resident_coords().contains(&IVec2::new(-3, 0)));
    }

    #[test]
    fn negative_observer_positions_floor_correctly() {
        let mut world = blank_world();
        world.set_observer(Vec2::new(-0.5, -0.5));
        world.stream();
        // The observer cell is (-1, -1), i.e. tile (-1, -1).
        let coords = world.resident_coords();
        assert!(coords.contains(&IVec2::new(-4, -4)));
        assert!(coords.contains(&IVec2::new(2, 2)));
        assert!(!coords.contains(&IVec2::new(3, 3)));
    }
}
