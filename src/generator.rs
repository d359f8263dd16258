//! Terrain generation for freshly streamed tiles.

use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::materials::MaterialId;
use crate::particle::Particle;
use crate::tile::{Tile, TILE_SIZE};

/// Fills freshly created tiles with starting content.
///
/// The world invokes this exactly once per tile, right after creation
/// during streaming; implementations write cells with [`Tile::set`] and
/// may pick a biome from the tile coordinate.
pub trait Generator: Send + Sync {
    fn generate(&self, tile: &mut Tile);
}

/// Leaves every tile untouched. Useful for tests and blank worlds.
pub struct EmptyGenerator;

impl Generator for EmptyGenerator {
    fn generate(&self, _tile: &mut Tile) {}
}

/// Value-noise terrain with three biomes selected by tile coordinate:
/// cave systems on the outer bands, a flat slab high up, rolling surface
/// terrain elsewhere.
///
/// Generation is a pure function of `(seed, tile coordinate)`, so a tile
/// that is evicted and later streamed back in regenerates identically.
pub struct ProceduralGenerator {
    seed: u64,
}

impl ProceduralGenerator {
    const NOISE_SCALE: f32 = 0.03;
    const CAVE_SCALE: f32 = 0.05;

    pub fn new(seed: u64) -> Self {
        ProceduralGenerator { seed }
    }

    fn tile_rng(&self, coord: IVec2) -> ChaCha8Rng {
        let mut h = self.seed;
        for salt in [coord.x as i64 as u64, coord.y as i64 as u64] {
            h = h.wrapping_add(salt).wrapping_add(0x9E37_79B9_7F4A_7C15);
            h = (h ^ (h >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            h ^= h >> 31;
        }
        ChaCha8Rng::seed_from_u64(h)
    }

    fn generate_surface(&self, tile: &mut Tile, rng: &mut ChaCha8Rng) {
        let coord = tile.coord();
        let size = TILE_SIZE as i32;
        let base_height = size / 2;

        for x in 0..TILE_SIZE {
            let world_x = x as f32 + (coord.x * size) as f32;
            let noise = octave_noise(
                world_x * Self::NOISE_SCALE,
                coord.y as f32 * Self::NOISE_SCALE,
                0.5,
                4,
            );
            let height = (base_height + (noise * 20.0) as i32).min(size - 1);

            for y in height..size {
                let cell = if y == height {
                    Particle::of(MaterialId::Sand)
                } else if y < height + 5 {
                    // A loose sandy crust over the stone body.
                    if rng.gen_bool(0.8) {
                        Particle::of(MaterialId::Sand)
                    } else {
                        Particle::of(MaterialId::Stone)
                    }
                } else {
                    Particle::of(MaterialId::Stone)
                };
                tile.set(x, y as usize, cell);
            }

            // Pool water into depressions below the mean surface.
            if height > base_height + 5 {
                for y in (base_height + 3)..height {
                    if tile.get(x, y as usize).is_empty() {
                        tile.set(x, y as usize, Particle::of(MaterialId::Water));
                    }
                }
            }
        }

        // Scatter a few wood deposits in the open sky.
        for _ in 0..10 {
            let x = rng.gen_range(0..TILE_SIZE);
            let y = rng.gen_range(0..TILE_SIZE / 2);
            if !tile.get(x, y).is_empty() {
                continue;
            }
            tile.set(x, y, Particle::of(MaterialId::Wood));
            for _ in 0..3 {
                let nx = x as i32 + rng.gen_range(-2..=2);
                let ny = y as i32 + rng.gen_range(-2..=2);
                let in_bounds =
                    nx >= 0 && nx < TILE_SIZE as i32 && ny >= 0 && ny < TILE_SIZE as i32;
                if in_bounds && tile.get(nx as usize, ny as usize).is_empty() {
                    tile.set(nx as usize, ny as usize, Particle::of(MaterialId::Wood));
                }
            }
        }
    }

    fn generate_caves(&self, tile: &mut Tile, rng: &mut ChaCha8Rng) {
        let coord = tile.coord();
        let size = TILE_SIZE as i32;

        for y in 0..TILE_SIZE {
            for x in 0..TILE_SIZE {
                let world_x = x as f32 + (coord.x * size) as f32;
                let world_y = y as f32 + (coord.y * size) as f32;
                let noise = octave_noise(
                    world_x * Self::CAVE_SCALE,
                    world_y * Self::CAVE_SCALE,
                    0.5,
                    4,
                );

                if noise > 0.3 {
                    tile.set(x, y, Particle::of(MaterialId::Stone));
                } else if noise > 0.2 {
                    let cell = if rng.gen_bool(0.8) {
                        Particle::of(MaterialId::Stone)
                    } else {
                        Particle::of(MaterialId::Sand)
                    };
                    tile.set(x, y, cell);
                } else if noise > 0.0 && rng.gen_range(0..20) == 0 {
                    tile.set(x, y, Particle::of(MaterialId::Water));
                }
            }
        }
    }

    fn generate_flat(&self, tile: &mut Tile) {
        let ground = TILE_SIZE / 2 + 10;
        for y in (ground + 1)..TILE_SIZE {
            for x in 0..TILE_SIZE {
                tile.set(x, y, Particle::of(MaterialId::Stone));
            }
        }
    }
}

impl Generator for ProceduralGenerator {
    fn generate(&self, tile: &mut Tile) {
        let coord = tile.coord();
        let mut rng = self.tile_rng(coord);
        if coord.x < -5 || coord.x > 5 {
            self.generate_caves(tile, &mut rng);
        } else if coord.y < -3 {
            self.generate_flat(tile);
        } else {
            self.generate_surface(tile, &mut rng);
        }
    }
}

/// Integer-hash white noise in `[0, 1]`.
fn lattice_noise(x: f32, y: f32) -> f32 {
    let n = (x as i32).wrapping_add((y as i32).wrapping_mul(57));
    let n = n.wrapping_shl(13) ^ n;
    let hashed = n
        .wrapping_mul(n.wrapping_mul(n).wrapping_mul(15731).wrapping_add(789_221))
        .wrapping_add(1_376_312_589)
        & 0x7fff_ffff;
    let signed = 1.0 - hashed as f32 / 1_073_741_824.0;
    0.5 * (signed + 1.0)
}

/// Corner/side/center smoothing over the lattice.
fn smooth_noise(x: f32, y: f32) -> f32 {
    let corners = (lattice_noise(x - 1.0, y - 1.0)
        + lattice_noise(x + 1.0, y - 1.0)
        + lattice_noise(x - 1.0, y + 1.0)
        + lattice_noise(x + 1.0, y + 1.0))
        / 16.0;
    let sides = (lattice_noise(x - 1.0, y)
        + lattice_noise(x + 1.0, y)
        + lattice_noise(x, y - 1.0)
        + lattice_noise(x, y + 1.0))
        / 8.0;
    let center = lattice_noise(x, y) / 4.0;
    corners + sides + center
}

/// Octave accumulation with the given persistence, normalized to `[0, 1]`.
fn octave_noise(x: f32, y: f32, persistence: f32, octaves: u32) -> f32 {
    let mut total = 0.0;
    let mut frequency = 1.0;
    let mut amplitude = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves {
        total += smooth_noise(x * frequency, y * frequency) * amplitude;
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= 2.0;
    }

    total / max_value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octave_noise_stays_normalized() {
        for i in 0..100 {
            let v = octave_noise(i as f32 * 0.17, i as f32 * 0.09, 0.5, 4);
            assert!((0.0..=1.0).contains(&v), "noise {v} escaped [0, 1]");
        }
    }

    #[test]
    fn generation_is_deterministic_per_tile() {
        let generator = ProceduralGenerator::new(1234);
        let coord = IVec2::new(2, 1);

        let mut first = Tile::new(coord);
        let mut second = Tile::new(coord);
        generator.generate(&mut first);
        generator.generate(&mut second);

        for y in 0..TILE_SIZE {
            for x in 0..TILE_SIZE {
                assert_eq!(first.get(x, y), second.get(x, y));
            }
        }
    }

    #[test]
    fn surface_tiles_carry_terrain_and_are_dirty() {
        let generator = ProceduralGenerator::new(7);
        let mut tile = Tile::new(IVec2::ZERO);
        generator.generate(&mut tile);

        assert!(tile.is_dirty());
        let filled = (0..TILE_SIZE)
            .flat_map(|y| (0..TILE_SIZE).map(move |x| (x, y)))
            .filter(|&(x, y)| !tile.get(x, y).is_empty())
            .count();
        assert!(filled > TILE_SIZE, "suspiciously sparse terrain: {filled}");
    }

    #[test]
    fn far_bands_become_caves() {
        let generator = ProceduralGenerator::new(7);
        let mut tile = Tile::new(IVec2::new(9, 0));
        generator.generate(&mut tile);
        // Cave tiles are mostly stone with carved-out voids.
        let stone = (0..TILE_SIZE)
            .flat_map(|y| (0..TILE_SIZE).map(move |x| (x, y)))
            .filter(|&(x, y)| tile.get(x, y).is(MaterialId::Stone))
            .count();
        assert!(stone > 0);
    }

    #[test]
    fn high_tiles_are_flat_slabs() {
        let generator = ProceduralGenerator::new(7);
        let mut tile = Tile::new(IVec2::new(0, -4));
        generator.generate(&mut tile);
        let ground = TILE_SIZE / 2 + 10;
        for x in 0..TILE_SIZE {
            assert!(tile.get(x, ground).is_empty());
            assert!(tile.get(x, ground + 1).is(MaterialId::Stone));
        }
    }
}
