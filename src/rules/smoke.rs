//! Smoke: a gas on a timer. Old saves may carry smoke without a
//! lifetime; those cells are re-seeded on first contact.

use rand::Rng;

use super::{gas, TileView};
use crate::particle::Particle;

pub(super) fn update<R: Rng>(view: &mut TileView<R>, x: i32, y: i32) {
    let Some(&cell) = view.particle(x, y) else {
        return;
    };

    let mut cell = cell;
    if cell.lifetime == 0 {
        cell.lifetime = view.rng().gen_range(300..=500);
    }
    cell.lifetime -= 1;
    view.set(x, y, cell);

    if cell.lifetime < 30 && view.rng().gen_bool(0.1) {
        view.set(x, y, Particle::EMPTY);
        return;
    }

    gas::update(view, x, y);
}
