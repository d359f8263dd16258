//! Directory save/load: one `chunk_<x>_<y>.bin` file per resident tile.
//!
//! The observer is deliberately not persisted; a loaded world streams
//! around wherever its observer is next placed.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use glam::IVec2;
use log::{info, warn};
use thiserror::Error;

use crate::tile::Tile;

use super::World;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("world io: {0}")]
    Io(#[from] std::io::Error),
}

impl World {
    /// Writes every resident tile into `directory`, creating it if
    /// needed. The first I/O failure aborts the save.
    pub fn save(&self, directory: &Path) -> Result<(), PersistError> {
        fs::create_dir_all(directory)?;

        let map = self.tiles.lock().unwrap();
        for (coord, tile) in map.iter() {
            let path = directory.join(format!("chunk_{}_{}.bin", coord.x, coord.y));
            let mut writer = BufWriter::new(File::create(&path)?);
            tile.lock().unwrap().save(&mut writer)?;
            writer.flush()?;
        }

        info!("saved {} tiles to {}", map.len(), directory.display());
        Ok(())
    }

    /// Replaces the resident set with the tiles found in `directory`.
    ///
    /// Files that fail to parse or read are skipped with a warning; the
    /// world keeps whatever tiles loaded cleanly. A missing directory is
    /// an error.
    pub fn load(&mut self, directory: &Path) -> Result<(), PersistError> {
        let entries = fs::read_dir(directory)?;
        self.clear();

        let mut loaded = 0usize;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("bin") {
                continue;
            }
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            let Some(coord) = parse_tile_filename(stem) else {
                warn!("skipping unrecognized tile file {}", path.display());
                continue;
            };

            let tile = File::open(&path)
                .map_err(PersistError::from)
                .and_then(|file| Ok(Tile::load(&mut BufReader::new(file))?));
            match tile {
                Ok(tile) if tile.coord() == coord => {
                    self.tiles
                        .lock()
                        .unwrap()
                        .insert(coord, Arc::new(Mutex::new(tile)));
                    loaded += 1;
                }
                Ok(tile) => {
                    warn!(
                        "skipping {}: stored coordinate {} disagrees with the filename",
                        path.display(),
                        tile.coord()
                    );
                }
                Err(error) => {
                    warn!("skipping {}: {}", path.display(), error);
                }
            }
        }

        info!("loaded {loaded} tiles from {}", directory.display());
        Ok(())
    }
}

/// Parses `chunk_<x>_<y>` into a tile coordinate.
fn parse_tile_filename(stem: &str) -> Option<IVec2> {
    let rest = stem.strip_prefix("chunk_")?;
    let (x, y) = rest.split_once('_')?;
    Some(IVec2::new(x.parse().ok()?, y.parse().ok()?))
}
