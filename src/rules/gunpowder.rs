//! Gunpowder: a powder that detonates when touched by flame.

use rand::Rng;

use super::{powder, TileView};
use crate::materials::MaterialId;
use crate::particle::Particle;

pub(super) fn update<R: Rng>(view: &mut TileView<R>, x: i32, y: i32) {
    let near_fire = neighbors(x, y)
        .into_iter()
        .any(|(nx, ny)| view.particle(nx, ny).is_some_and(|p| p.is(MaterialId::Fire)));

    if near_fire && view.rng().gen_bool(0.8) {
        let lifetime = 150 + view.rng().gen_range(0..=50);
        view.set(x, y, Particle::with_lifetime(MaterialId::Fire, lifetime));

        // The blast scatters flame and smoke into the surrounding air.
        for (nx, ny) in neighbors(x, y) {
            if !view.is_empty(nx, ny) || !view.rng().gen_bool(0.4) {
                continue;
            }
            let burst = if view.rng().gen_bool(0.5) {
                Particle::with_lifetime(MaterialId::Smoke, 0)
            } else {
                let lifetime = 100 + view.rng().gen_range(0..=50);
                Particle::with_lifetime(MaterialId::Fire, lifetime)
            };
            view.set(nx, ny, burst);
        }
        return;
    }

    powder::update(view, x, y);
}

fn neighbors(x: i32, y: i32) -> [(i32, i32); 8] {
    [
        (x - 1, y - 1),
        (x, y - 1),
        (x + 1, y - 1),
        (x - 1, y),
        (x + 1, y),
        (x - 1, y + 1),
        (x, y + 1),
        (x + 1, y + 1),
    ]
}
