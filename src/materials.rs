//! Material definitions and the registry that maps material ids to their
//! physical properties.
//!
//! Ids 0..=10 are fixed by the tile wire format and must not be remapped;
//! additional materials can be registered at init time with any free id.

use glam::Vec4;
use serde::Deserialize;
use strum_macros::{EnumIter, FromRepr};
use thiserror::Error;

/// The well-known material ids baked into the save format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, FromRepr)]
#[repr(u8)]
pub enum MaterialId {
    Empty = 0,
    Sand = 1,
    Water = 2,
    Stone = 3,
    Fire = 4,
    Wood = 5,
    Gunpowder = 6,
    Acid = 7,
    Oil = 8,
    Smoke = 9,
    Salt = 10,
}

/// Physical properties of one material. Immutable once registered.
#[derive(Debug, Clone)]
pub struct Material {
    pub id: u8,
    pub name: String,
    pub density: f32,
    /// 0..1, damps cell velocity each frame.
    pub viscosity: f32,
    /// 0..1, scales the chance of catching fire.
    pub flammability: f32,
    /// RGBA for the renderer's color lookup.
    pub color: Vec4,
    pub is_solid: bool,
    pub is_liquid: bool,
    pub is_gas: bool,
    /// Lateral reach of liquids, in cells per frame.
    pub spread_factor: f32,
    /// 0..1, how aggressively this material dissolves its neighbors.
    pub corrosiveness: f32,
}

impl Material {
    /// A material with neutral defaults; callers fill in what differs.
    pub fn new(id: u8, name: &str) -> Self {
        Material {
            id,
            name: name.to_owned(),
            density: 1.0,
            viscosity: 0.0,
            flammability: 0.0,
            color: Vec4::ONE,
            is_solid: false,
            is_liquid: false,
            is_gas: false,
            spread_factor: 1.0,
            corrosiveness: 0.0,
        }
    }
}

/// Read-mostly table indexed by material id.
///
/// Registration happens during init only; the world takes the registry by
/// value and freezes it behind an `Arc`, so rules can assume stable
/// references for the whole run.
pub struct MaterialRegistry {
    table: Vec<Option<Material>>,
}

/* Initialization */
impl MaterialRegistry {
    pub fn new() -> Self {
        MaterialRegistry {
            table: (0..=u8::MAX as usize).map(|_| None).collect(),
        }
    }

    /// The built-in table for the eleven well-known materials.
    pub fn with_defaults() -> Self {
        let mut registry = MaterialRegistry::new();

        registry.register(Material {
            density: 0.0,
            color: Vec4::ZERO,
            ..Material::new(MaterialId::Empty as u8, "Empty")
        });
        registry.register(Material {
            density: 1.5,
            is_solid: true,
            color: Vec4::new(0.76, 0.7, 0.5, 1.0),
            ..Material::new(MaterialId::Sand as u8, "Sand")
        });
        registry.register(Material {
            density: 1.0,
            viscosity: 0.7,
            is_liquid: true,
            spread_factor: 4.0,
            color: Vec4::new(0.0, 0.3, 0.8, 0.8),
            ..Material::new(MaterialId::Water as u8, "Water")
        });
        registry.register(Material {
            density: 2.5,
            is_solid: true,
            color: Vec4::new(0.5, 0.5, 0.5, 1.0),
            ..Material::new(MaterialId::Stone as u8, "Stone")
        });
        registry.register(Material {
            density: 0.2,
            flammability: 1.0,
            color: Vec4::new(1.0, 0.3, 0.0, 0.9),
            ..Material::new(MaterialId::Fire as u8, "Fire")
        });
        registry.register(Material {
            density: 0.8,
            is_solid: true,
            flammability: 0.7,
            color: Vec4::new(0.6, 0.4, 0.2, 1.0),
            ..Material::new(MaterialId::Wood as u8, "Wood")
        });
        registry.register(Material {
            density: 1.3,
            is_solid: true,
            flammability: 0.95,
            color: Vec4::new(0.2, 0.2, 0.2, 1.0),
            ..Material::new(MaterialId::Gunpowder as u8, "Gunpowder")
        });
        registry.register(Material {
            density: 1.1,
            viscosity: 0.6,
            is_liquid: true,
            spread_factor: 3.5,
            corrosiveness: 0.8,
            color: Vec4::new(0.8, 1.0, 0.2, 0.9),
            ..Material::new(MaterialId::Acid as u8, "Acid")
        });
        registry.register(Material {
            density: 0.85,
            viscosity: 0.8,
            is_liquid: true,
            spread_factor: 3.0,
            flammability: 0.85,
            color: Vec4::new(0.1, 0.1, 0.1, 0.8),
            ..Material::new(MaterialId::Oil as u8, "Oil")
        });
        registry.register(Material {
            density: 0.1,
            is_gas: true,
            color: Vec4::new(0.7, 0.7, 0.7, 0.4),
            ..Material::new(MaterialId::Smoke as u8, "Smoke")
        });
        registry.register(Material {
            density: 1.4,
            is_solid: true,
            color: Vec4::new(0.9, 0.9, 0.9, 1.0),
            ..Material::new(MaterialId::Salt as u8, "Salt")
        });

        registry
    }

    /// Inserts a material, replacing any previous entry with the same id.
    pub fn register(&mut self, material: Material) {
        let id = material.id;
        self.table[id as usize] = Some(material);
    }
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        MaterialRegistry::with_defaults()
    }
}

/* Lookup */
impl MaterialRegistry {
    /// Looks up a material by id.
    ///
    /// # Panics
    ///
    /// Panics on an unregistered id: a world referencing an unknown
    /// material is corrupt, and a silent default would hide that.
    pub fn get(&self, id: u8) -> &Material {
        match self.table[id as usize] {
            Some(ref material) => material,
            None => panic!("material id {id} is not registered"),
        }
    }

    pub fn try_get(&self, id: u8) -> Option<&Material> {
        self.table[id as usize].as_ref()
    }

    pub fn is_registered(&self, id: u8) -> bool {
        self.table[id as usize].is_some()
    }
}

/* Loading from JSON */

#[derive(Debug, Error)]
pub enum MaterialFileError {
    #[error("failed to read material table: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed material table: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct MaterialFile {
    materials: Vec<MaterialEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MaterialEntry {
    id: u8,
    name: String,
    density: Option<f32>,
    viscosity: Option<f32>,
    flammability: Option<f32>,
    is_solid: Option<bool>,
    is_liquid: Option<bool>,
    is_gas: Option<bool>,
    spread_factor: Option<f32>,
    corrosiveness: Option<f32>,
    color: Option<ColorEntry>,
}

#[derive(Deserialize)]
struct ColorEntry {
    r: f32,
    g: f32,
    b: f32,
    a: f32,
}

impl MaterialRegistry {
    /// Registers every material in a `{"materials": [...]}` JSON document.
    /// Entries override built-ins with the same id. Returns how many
    /// materials were registered.
    pub fn load_json(&mut self, source: &str) -> Result<usize, MaterialFileError> {
        let file: MaterialFile = serde_json::from_str(source)?;
        let count = file.materials.len();
        for entry in file.materials {
            let mut material = Material::new(entry.id, &entry.name);
            if let Some(density) = entry.density {
                material.density = density;
            }
            if let Some(viscosity) = entry.viscosity {
                material.viscosity = viscosity;
            }
            if let Some(flammability) = entry.flammability {
                material.flammability = flammability;
            }
            if let Some(is_solid) = entry.is_solid {
                material.is_solid = is_solid;
            }
            if let Some(is_liquid) = entry.is_liquid {
                material.is_liquid = is_liquid;
            }
            if let Some(is_gas) = entry.is_gas {
                material.is_gas = is_gas;
            }
            if let Some(spread_factor) = entry.spread_factor {
                material.spread_factor = spread_factor;
            }
            if let Some(corrosiveness) = entry.corrosiveness {
                material.corrosiveness = corrosiveness;
            }
            if let Some(color) = entry.color {
                material.color = Vec4::new(color.r, color.g, color.b, color.a);
            }
            self.register(material);
        }
        Ok(count)
    }

    /// [`Self::load_json`] from a file on disk.
    pub fn load_json_file(&mut self, path: &std::path::Path) -> Result<usize, MaterialFileError> {
        let source = std::fs::read_to_string(path)?;
        self.load_json(&source)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn defaults_cover_every_well_known_id() {
        let registry = MaterialRegistry::with_defaults();
        for id in MaterialId::iter() {
            assert!(
                registry.is_registered(id as u8),
                "missing builtin material {:?}",
                id
            );
            assert_eq!(registry.get(id as u8).id, id as u8);
        }
    }

    #[test]
    fn category_flags_are_exclusive() {
        let registry = MaterialRegistry::with_defaults();
        for id in MaterialId::iter() {
            let material = registry.get(id as u8);
            let set = [material.is_solid, material.is_liquid, material.is_gas]
                .iter()
                .filter(|&&flag| flag)
                .count();
            assert!(set <= 1, "{} claims multiple categories", material.name);
        }
    }

    #[test]
    #[should_panic(expected = "not registered")]
    fn unknown_id_fails_loudly() {
        let registry = MaterialRegistry::with_defaults();
        registry.get(200);
    }

    #[test]
    fn json_entries_override_builtins() {
        let mut registry = MaterialRegistry::with_defaults();
        let count = registry
            .load_json(
                r#"{
                    "materials": [
                        {
                            "id": 2,
                            "name": "Brine",
                            "density": 1.2,
                            "isLiquid": true,
                            "spreadFactor": 5.0,
                            "color": {"r": 0.1, "g": 0.4, "b": 0.7, "a": 1.0}
                        },
                        {"id": 42, "name": "Dust", "isSolid": true}
                    ]
                }"#,
            )
            .unwrap();
        assert_eq!(count, 2);

        let brine = registry.get(2);
        assert_eq!(brine.name, "Brine");
        assert_eq!(brine.density, 1.2);
        assert_eq!(brine.spread_factor, 5.0);

        let dust = registry.get(42);
        assert!(dust.is_solid);
        assert_eq!(dust.density, 1.0);
    }

    #[test]
    fn malformed_json_is_rejected() {
        let mut registry = MaterialRegistry::new();
        assert!(matches!(
            registry.load_json("{\"materials\": 3}"),
            Err(MaterialFileError::Parse(_))
        ));
    }
}
