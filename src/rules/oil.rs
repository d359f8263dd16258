//! Oil: a flammable liquid that trades places with water it touches
//! below instead of stacking on it.

use rand::Rng;

use super::{liquid, TileView};
use crate::materials::MaterialId;
use crate::particle::Particle;

pub(super) fn update<R: Rng>(view: &mut TileView<R>, x: i32, y: i32) {
    // Any neighboring flame is likely to take the whole cell.
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let touching_fire = view
                .particle(x + dx, y + dy)
                .is_some_and(|p| p.is(MaterialId::Fire));
            if touching_fire && view.rng().gen_bool(0.7) {
                let lifetime = 120 + view.rng().gen_range(0..=40);
                view.set(x, y, Particle::with_lifetime(MaterialId::Fire, lifetime));
                return;
            }
        }
    }

    if view.move_cell(x, y, x, y + 1) {
        return;
    }

    // Lighter than water: trade places with the first water cell found
    // below or on the down-diagonals.
    for (dx, dy) in [(0, 1), (-1, 1), (1, 1)] {
        let is_water = view
            .particle(x + dx, y + dy)
            .is_some_and(|p| p.is(MaterialId::Water));
        if is_water {
            view.swap_cells(x, y, x + dx, y + dy);
            return;
        }
    }

    let spread = view
        .particle(x, y)
        .map(|cell| view.registry().get(cell.material_id).spread_factor as i32)
        .unwrap_or(0);
    if !liquid::spread_laterally(view, x, y, spread) {
        liquid::flow_diagonal(view, x, y);
    }
}
