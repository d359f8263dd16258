//! A streaming falling-sand world.
//!
//! Space is split into fixed-size square [`tile::Tile`]s of typed
//! [`particle::Particle`] cells. Per-material cellular-automaton rules in
//! [`rules`] advance each tile inside its dirty rectangle, while
//! [`world::World`] keeps the region around a roving observer resident,
//! fills fresh tiles through a [`generator::Generator`], and drives all
//! dirty tiles each frame with a four-phase checkerboard schedule so that
//! no two adjacent tiles ever update concurrently.

pub mod generator;
pub mod materials;
pub mod particle;
pub mod rules;
pub mod tile;
pub mod util;
pub mod world;

pub use generator::{EmptyGenerator, Generator, ProceduralGenerator};
pub use materials::{Material, MaterialId, MaterialRegistry};
pub use particle::{particle_flags, Particle};
pub use tile::{Tile, TILE_SIZE};
pub use world::{World, WorldBuilder};
