//! Salt: a powder that slowly dissolves into neighboring water.

use rand::Rng;

use super::{powder, TileView};
use crate::materials::MaterialId;
use crate::particle::Particle;

pub(super) fn update<R: Rng>(view: &mut TileView<R>, x: i32, y: i32) {
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let touching_water = view
                .particle(x + dx, y + dy)
                .is_some_and(|p| p.is(MaterialId::Water));
            if touching_water && view.rng().gen_bool(0.05) {
                view.set(x, y, Particle::EMPTY);
                return;
            }
        }
    }

    powder::update(view, x, y);
}
