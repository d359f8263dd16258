//! Acid: a liquid that eats away its neighbors, dense ones more slowly.

use rand::Rng;

use super::{liquid, TileView};
use crate::materials::MaterialId;
use crate::particle::Particle;

pub(super) fn update<R: Rng>(view: &mut TileView<R>, x: i32, y: i32) {
    let corrosiveness = view
        .particle(x, y)
        .map(|cell| view.registry().get(cell.material_id).corrosiveness)
        .unwrap_or(0.0);

    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let (nx, ny) = (x + dx, y + dy);
            let Some(&neighbor) = view.particle(nx, ny) else {
                continue;
            };
            if neighbor.is_empty()
                || neighbor.is(MaterialId::Fire)
                || neighbor.is(MaterialId::Smoke)
            {
                continue;
            }

            let density = view.registry().get(neighbor.material_id).density;
            if density <= 0.0 {
                continue;
            }
            let mut chance = corrosiveness * (1.0 / density) * 0.1;
            if neighbor.is(MaterialId::Stone) {
                chance *= 0.2;
            }
            if view.rng().gen_bool(chance.clamp(0.0, 1.0) as f64) {
                view.set(nx, ny, Particle::EMPTY);
            }
        }
    }

    liquid::update(view, x, y);
}

#[cfg(test)]
mod tests {
    use crate::materials::MaterialId;
    use crate::particle::Particle;
    use crate::rules::test_support::{count_of, registry, rng, tile_with};
    use crate::tile::TILE_SIZE;

    /// Frames until the acid opens its first hole in a slab of `target`,
    /// re-marking the acid row so the probabilistic scan keeps running
    /// even when nothing moves.
    fn frames_to_first_bite(target: MaterialId, seed: u64, limit: usize) -> usize {
        let registry = registry();
        let mut rng = rng(seed);
        let mut tile = tile_with(&[]);
        let surface = 32;
        for y in surface..TILE_SIZE {
            for x in 0..TILE_SIZE {
                tile.set(x, y, Particle::of(target));
            }
        }
        tile.set(32, surface - 1, Particle::of(MaterialId::Acid));

        let slab_count = (TILE_SIZE - surface) * TILE_SIZE;
        for frame in 1..=limit {
            for x in 0..TILE_SIZE {
                tile.mark_dirty(x, surface - 1);
            }
            tile.update(&registry, &mut rng, 1.0 / 60.0);
            if count_of(&tile, target) < slab_count {
                return frame;
            }
        }
        limit
    }

    #[test]
    fn dissolves_what_it_touches() {
        let frames = frames_to_first_bite(MaterialId::Sand, 1, 2000);
        assert!(frames < 2000, "acid never bit into the sand");
    }

    #[test]
    fn stone_resists_longer_than_sand() {
        let mut sand_total = 0usize;
        let mut stone_total = 0usize;
        for seed in 0..20 {
            sand_total += frames_to_first_bite(MaterialId::Sand, seed, 5000);
            stone_total += frames_to_first_bite(MaterialId::Stone, seed, 5000);
        }
        assert!(
            sand_total < stone_total,
            "sand {sand_total} vs stone {stone_total}"
        );
    }
}
