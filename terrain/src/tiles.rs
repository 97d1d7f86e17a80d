//! SRTM/NASADEM tile directory.

use crate::{ElevationSource, TerrainError};
use dashmap::DashMap;
use dem::{DemError, Tile, HGT_VOID};
use geo::geometry::Coord;
use log::debug;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

/// A directory of `.hgt` tiles, loaded lazily as points are queried.
pub struct Tiles {
    /// Where the `.hgt` files live.
    dir: PathBuf,

    /// Storage used for tiles as they are loaded.
    mode: TileMode,

    /// Every 1x1 degree cell looked up so far, keyed by its southwest
    /// corner. `None` marks a cell with no file in `dir`.
    cache: DashMap<Coord<i16>, Option<Arc<Tile>>>,
}

impl Tiles {
    /// Fails unless `dir` holds at least one `.hgt` file.
    pub fn new(dir: PathBuf, mode: TileMode) -> Result<Self, TerrainError> {
        let is_hgt = |path: &Path| {
            path.extension()
                .and_then(std::ffi::OsStr::to_str)
                .is_some_and(|ext| ext.eq_ignore_ascii_case("hgt"))
        };
        let mut has_tiles = false;
        for entry in std::fs::read_dir(&dir)? {
            if is_hgt(&entry?.path()) {
                has_tiles = true;
                break;
            }
        }
        if !has_tiles {
            return Err(TerrainError::Path(dir));
        }
        Ok(Self {
            dir,
            mode,
            cache: DashMap::new(),
        })
    }

    /// Returns the tile containing `coord`, or `None` if there is no
    /// such tile in the directory.
    ///
    /// `Tiles` will attempt to fetch the tile from disk if it hasn't
    /// looked for it before.
    pub fn get(&self, coord: Coord<f64>) -> Result<Option<Arc<Tile>>, TerrainError> {
        let cell = cell_of(coord);
        let entry = self.cache.entry(cell).or_try_insert_with(|| {
            match self.load(cell) {
                Ok(tile) => Ok(Some(Arc::new(tile))),
                Err(TerrainError::Dem(DemError::Io(e))) if e.kind() == ErrorKind::NotFound => {
                    debug!("no tile for cell {cell:?}");
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        })?;
        Ok(entry.value().clone())
    }
}

impl ElevationSource for Tiles {
    type Error = TerrainError;

    fn nodata(&self) -> Option<f64> {
        Some(f64::from(HGT_VOID))
    }

    /// Neighbouring points usually share a tile, so the last tile is
    /// reused until a point falls outside it.
    fn sample(&self, batch: &[Coord<f64>]) -> Vec<Result<f64, TerrainError>> {
        let mut tile: Option<Arc<Tile>> = None;
        batch
            .iter()
            .map(|&coord| {
                if let Some(elevation) = tile.as_ref().and_then(|t| t.get(coord)) {
                    return Ok(f64::from(elevation));
                }
                let no_tile = || TerrainError::NoTile {
                    lat: coord.y,
                    lon: coord.x,
                };
                let next = self.get(coord)?.ok_or_else(no_tile)?;
                let elevation = next.get(coord).ok_or_else(no_tile)?;
                tile = Some(next);
                Ok(f64::from(elevation))
            })
            .collect()
    }
}

/// Private API.
impl Tiles {
    /// Loads the tile for `cell`, trying the canonical upper case file
    /// name first and then its lower case form.
    fn load(&self, cell: Coord<i16>) -> Result<Tile, TerrainError> {
        let name = file_name(cell);
        let path = [name.clone(), name.to_lowercase()]
            .into_iter()
            .map(|name| self.dir.join(name))
            .find(|path| path.exists())
            .unwrap_or_else(|| self.dir.join(&name));
        debug!("loading {path:?} as {:?}", self.mode);
        let tile = match self.mode {
            TileMode::InMem => Tile::load(&path)?,
            TileMode::MemMap => Tile::memmap(&path)?,
        };
        Ok(tile)
    }
}

/// Storage for loaded tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileMode {
    /// Decode every sample into memory up front. A 1 arcsecond tile
    /// takes about 25 MB.
    InMem,

    /// Map the file and decode samples on access.
    MemMap,
}

/// Returns the southwest corner of the 1x1 degree cell holding `coord`.
#[allow(clippy::cast_possible_truncation)]
fn cell_of(coord: Coord<f64>) -> Coord<i16> {
    Coord {
        x: coord.x.floor() as i16,
        y: coord.y.floor() as i16,
    }
}

/// Returns the SRTM file name of the tile whose southwest corner is
/// `cell`, e.g. `N44W072.hgt`.
fn file_name(cell: Coord<i16>) -> String {
    let ns = if cell.y < 0 { 'S' } else { 'N' };
    let ew = if cell.x < 0 { 'W' } else { 'E' };
    format!(
        "{ns}{:02}{ew}{:03}.hgt",
        cell.y.unsigned_abs(),
        cell.x.unsigned_abs()
    )
}
