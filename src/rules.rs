//! Per-material cellular-automaton rules.
//!
//! The dispatcher reads the material of a cell and applies that
//! material's transition rule through a [`TileView`], which restricts all
//! reads and writes to the cell's own tile. Out-of-tile neighbors read as
//! occupied and non-interacting; that restriction is what lets the
//! scheduler run non-adjacent tiles in parallel without ever sharing a
//! cell. Particles stack against tile edges as a consequence, which is an
//! accepted tradeoff of the single-tile view.
//!
//! Rules never fail. The movement primitives report success as `bool`,
//! and rule logic branches on it.

mod acid;
mod fire;
mod gas;
mod gunpowder;
mod liquid;
mod oil;
mod powder;
mod salt;
mod smoke;
mod view;

pub use view::TileView;

use rand::Rng;

use crate::materials::MaterialId;
use crate::particle::particle_flags;

const GRAVITY: f32 = 9.8;
const GAS_LIFT: f32 = 3.0;

/// Advances the cell at `(x, y)` by one frame: material rule first, then
/// the universal kinematics.
pub(crate) fn update_cell<R: Rng>(view: &mut TileView<R>, x: i32, y: i32, dt: f32) {
    let Some(&cell) = view.particle(x, y) else {
        return;
    };
    if cell.is_empty() || cell.flags & particle_flags::MOVED != 0 {
        return;
    }

    match MaterialId::from_repr(cell.material_id) {
        Some(MaterialId::Sand) | Some(MaterialId::Stone) | Some(MaterialId::Wood) => {
            powder::update(view, x, y)
        }
        Some(MaterialId::Water) => liquid::update(view, x, y),
        Some(MaterialId::Fire) => fire::update(view, x, y),
        Some(MaterialId::Gunpowder) => gunpowder::update(view, x, y),
        Some(MaterialId::Acid) => acid::update(view, x, y),
        Some(MaterialId::Oil) => oil::update(view, x, y),
        Some(MaterialId::Smoke) => smoke::update(view, x, y),
        Some(MaterialId::Salt) => salt::update(view, x, y),
        Some(MaterialId::Empty) => return,
        None => update_by_category(view, x, y, cell.material_id),
    }

    apply_kinematics(view, x, y, dt);
}

/// Fallback for registered materials without a specialized rule: the
/// category flags pick the generic behavior.
fn update_by_category<R: Rng>(view: &mut TileView<R>, x: i32, y: i32, material_id: u8) {
    let material = view.registry().get(material_id);
    let (is_solid, is_liquid, is_gas, flammability) = (
        material.is_solid,
        material.is_liquid,
        material.is_gas,
        material.flammability,
    );
    if is_solid {
        powder::update(view, x, y);
    } else if is_liquid {
        liquid::update(view, x, y);
    } else if is_gas {
        gas::update(view, x, y);
    } else if flammability > 0.0 {
        fire::update(view, x, y);
    }
}

/// Viscous damping followed by gravity (gases get lift instead). Applied
/// to the swept cell if its rule left a particle behind; a particle that
/// moved away picks its kinematics up next frame at the new position.
///
/// Velocities feed the save format and future effects only; grid movement
/// stays integer-based, and the velocity write deliberately does not
/// re-dirty the cell, so resting piles settle to a clean tile.
fn apply_kinematics<R: Rng>(view: &mut TileView<R>, x: i32, y: i32, dt: f32) {
    let Some(&cell) = view.particle(x, y) else {
        return;
    };
    if cell.is_empty() {
        return;
    }

    let material = view.registry().get(cell.material_id);
    let damping = 1.0 - material.viscosity * 0.5;
    let is_gas = material.is_gas;

    let mut cell = cell;
    cell.velocity_x *= damping;
    cell.velocity_y *= damping;
    if is_gas {
        cell.velocity_y -= GAS_LIFT * dt;
    } else {
        cell.velocity_y += GRAVITY * dt;
    }
    view.write_untracked(x, y, cell);
}

#[cfg(test)]
pub(crate) mod test_support {
    use glam::IVec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::materials::{MaterialId, MaterialRegistry};
    use crate::particle::Particle;
    use crate::tile::Tile;

    pub fn registry() -> MaterialRegistry {
        MaterialRegistry::with_defaults()
    }

    pub fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    pub fn tile_with(cells: &[(usize, usize, MaterialId)]) -> Tile {
        let mut tile = Tile::new(IVec2::ZERO);
        for &(x, y, id) in cells {
            tile.set(x, y, Particle::of(id));
        }
        tile
    }

    /// Runs `frames` updates with a fixed timestep.
    pub fn run(tile: &mut Tile, registry: &MaterialRegistry, rng: &mut ChaCha8Rng, frames: usize) {
        for _ in 0..frames {
            tile.update(registry, rng, 1.0 / 60.0);
        }
    }

    /// Count cells holding the given material.
    pub fn count_of(tile: &Tile, id: MaterialId) -> usize {
        let mut count = 0;
        for y in 0..crate::tile::TILE_SIZE {
            for x in 0..crate::tile::TILE_SIZE {
                if tile.get(x, y).is(id) {
                    count += 1;
                }
            }
        }
        count
    }
}
