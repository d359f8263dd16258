//! Granular solids: fall straight down, then slide down a random
//! diagonal.

use rand::Rng;

use super::TileView;

pub(super) fn update<R: Rng>(view: &mut TileView<R>, x: i32, y: i32) {
    if view.move_cell(x, y, x, y + 1) {
        return;
    }

    // Coin-flip which diagonal to try first so piles grow evenly.
    let first: i32 = if view.rng().gen_bool(0.5) { -1 } else { 1 };
    if !view.move_cell(x, y, x + first, y + 1) {
        view.move_cell(x, y, x - first, y + 1);
    }
}
