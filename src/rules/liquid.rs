//! Liquids: fall, spread sideways up to the material's reach, then seep
//! down a diagonal.

use rand::Rng;

use super::TileView;

pub(super) fn update<R: Rng>(view: &mut TileView<R>, x: i32, y: i32) {
    if view.move_cell(x, y, x, y + 1) {
        return;
    }

    let spread = view
        .particle(x, y)
        .map(|cell| view.registry().get(cell.material_id).spread_factor as i32)
        .unwrap_or(0);

    if !spread_laterally(view, x, y, spread) {
        flow_diagonal(view, x, y);
    }
}

/// Scans outward up to `spread` cells in a coin-flipped direction and
/// takes the first empty cell; tries the other direction if the first
/// yields nothing. Returns whether the cell moved.
pub(super) fn spread_laterally<R: Rng>(view: &mut TileView<R>, x: i32, y: i32, spread: i32) -> bool {
    let first: i32 = if view.rng().gen_bool(0.5) { -1 } else { 1 };
    for direction in [first, -first] {
        for offset in 1..=spread {
            if view.move_cell(x, y, x + direction * offset, y) {
                return true;
            }
        }
    }
    false
}

/// One diagonal-below attempt, left then right.
pub(super) fn flow_diagonal<R: Rng>(view: &mut TileView<R>, x: i32, y: i32) {
    if !view.move_cell(x, y, x - 1, y + 1) {
        view.move_cell(x, y, x + 1, y + 1);
    }
}
