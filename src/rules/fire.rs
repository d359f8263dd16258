//! Fire: burns down over its lifetime, flickers upward, ignites
//! flammable neighbors and sheds smoke.

use rand::Rng;

use super::TileView;
use crate::materials::MaterialId;
use crate::particle::Particle;

/// Hard cap on ignitions per fire cell per frame.
const MAX_IGNITIONS: u32 = 2;

pub(super) fn update<R: Rng>(view: &mut TileView<R>, x: i32, y: i32) {
    let Some(&cell) = view.particle(x, y) else {
        return;
    };

    // Burn down. At zero the flame either collapses into smoke or just
    // goes out.
    let mut cell = cell;
    cell.lifetime = cell.lifetime.saturating_sub(1);
    if cell.lifetime == 0 {
        if view.rng().gen_bool(0.6) {
            let lifetime = view.rng().gen_range(200..=350);
            view.set(x, y, Particle::with_lifetime(MaterialId::Smoke, lifetime));
        } else {
            view.set(x, y, Particle::EMPTY);
        }
        return;
    }
    view.set(x, y, cell);

    // Flicker: an occasional restless hop, preferring up.
    if view.rng().gen_bool(0.3) {
        flicker(view, x, y);
    }

    // Ignition pass over the eight neighbors. The scan stays anchored at
    // the pre-flicker coordinate.
    let mut ignitions = 0;
    'scan: for dy in -1..=1 {
        for dx in -1..=1 {
            if ignitions >= MAX_IGNITIONS {
                break 'scan;
            }
            if dx == 0 && dy == 0 {
                continue;
            }
            if let Some(lifetime) = try_ignite(view, x + dx, y + dy) {
                view.set(
                    x + dx,
                    y + dy,
                    Particle::with_lifetime(MaterialId::Fire, lifetime),
                );
                ignitions += 1;
            }
        }
    }

    // A flame occasionally smokes out of its top.
    if view.rng().gen_bool(0.05) && view.is_empty(x, y - 1) {
        let lifetime = view.rng().gen_range(250..=400);
        view.set(x, y - 1, Particle::with_lifetime(MaterialId::Smoke, lifetime));
    }
}

fn flicker<R: Rng>(view: &mut TileView<R>, x: i32, y: i32) {
    if view.move_cell(x, y, x, y - 1) {
        return;
    }
    let first: i32 = if view.rng().gen_bool(0.5) { -1 } else { 1 };
    if view.move_cell(x, y, x + first, y - 1) || view.move_cell(x, y, x - first, y - 1) {
        return;
    }
    if !view.move_cell(x, y, x - 1, y) {
        view.move_cell(x, y, x + 1, y);
    }
}

/// Rolls ignition for the neighbor at `(x, y)`. Returns the lifetime of
/// the new flame on success.
fn try_ignite<R: Rng>(view: &mut TileView<R>, x: i32, y: i32) -> Option<u32> {
    let &neighbor = view.particle(x, y)?;
    if neighbor.is_empty() || neighbor.is(MaterialId::Fire) || neighbor.is(MaterialId::Smoke) {
        return None;
    }

    let flammability = view.registry().get(neighbor.material_id).flammability;
    if flammability <= 0.0 {
        return None;
    }

    let mut chance = flammability * 0.15;
    if neighbor.is(MaterialId::Gunpowder) {
        chance *= 2.0;
    }
    if neighbor.is(MaterialId::Oil) {
        chance *= 1.5;
    }
    if !view.rng().gen_bool(chance.clamp(0.0, 1.0) as f64) {
        return None;
    }

    let mut lifetime = 100 + view.rng().gen_range(0..=50);
    if neighbor.is(MaterialId::Wood) {
        lifetime += 100;
    }
    if neighbor.is(MaterialId::Oil) {
        lifetime += 50;
    }
    Some(lifetime)
}
