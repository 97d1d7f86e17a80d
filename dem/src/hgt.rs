//! SRTM/NASADEM elevation (`.hgt`) tiles.

use crate::{DemError, C};
use byteorder::{BigEndian as BE, ByteOrder, ReadBytesExt};
use geo::geometry::Coord;
use memmap2::Mmap;
use std::{fs::File, io::BufReader, mem::size_of, path::Path};

/// Sample value marking a void (no measurement) in HGT files.
pub const HGT_VOID: i16 = i16::MIN;

const ARCSEC_PER_DEG: C = 3600.0;

pub struct Tile {
    /// Southwest corner of the tile.
    ///
    /// Specifically, the _center_ of the SW most sample of the tile.
    sw_corner_center: Coord<C>,

    /// Arcseconds per sample.
    resolution: u8,

    /// Number of (columns, rows) in this tile.
    dimensions: (usize, usize),

    /// Elevation samples, north row first.
    samples: SampleStore,
}

enum SampleStore {
    InMem(Box<[i16]>),
    MemMap(Mmap),
}

impl SampleStore {
    fn get_unchecked(&self, index: usize) -> i16 {
        match self {
            Self::InMem(samples) => samples[index],
            Self::MemMap(raw) => {
                let start = index * size_of::<i16>();
                BE::read_i16(&raw[start..start + size_of::<i16>()])
            }
        }
    }
}

impl Tile {
    /// Returns a Tile read into memory from the file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let (resolution, dimensions @ (cols, rows)) = extract_resolution(&path)?;
        let sw_corner_center = sw_corner_center(&path)?;

        let mut file = BufReader::new(File::open(path)?);
        let mut samples = Vec::with_capacity(cols * rows);
        for _ in 0..(cols * rows) {
            samples.push(file.read_i16::<BE>()?);
        }

        Ok(Self {
            sw_corner_center,
            resolution,
            dimensions,
            samples: SampleStore::InMem(samples.into_boxed_slice()),
        })
    }

    /// Returns a Tile using the memory-mapped file as storage.
    pub fn memmap<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let (resolution, dimensions) = extract_resolution(&path)?;
        let sw_corner_center = sw_corner_center(&path)?;

        let file = File::open(path)?;
        // Safety: tiles are treated as read-only for the life of the map.
        let mmap = unsafe { Mmap::map(&file)? };

        Ok(Self {
            sw_corner_center,
            resolution,
            dimensions,
            samples: SampleStore::MemMap(mmap),
        })
    }

    /// Returns the number of samples in this tile.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        let (x, y) = self.dimensions;
        x * y
    }

    /// Returns this tile's resolution in arcseconds per sample.
    pub fn resolution(&self) -> u8 {
        self.resolution
    }

    /// Returns the center of this tile's southwest sample.
    pub fn sw_corner(&self) -> Coord<C> {
        self.sw_corner_center
    }

    /// Returns the sample at the given geo coordinates, or `None` if
    /// `coord` is not covered by this tile.
    ///
    /// Voids are returned as-is ([`HGT_VOID`]).
    #[allow(clippy::cast_possible_wrap)]
    pub fn get(&self, coord: Coord<C>) -> Option<i16> {
        let (idx_x, idx_y) = self.coord_to_xy(coord);
        if 0 <= idx_x
            && idx_x < self.dimensions.0 as isize
            && 0 <= idx_y
            && idx_y < self.dimensions.1 as isize
        {
            #[allow(clippy::cast_sign_loss)]
            let idx_1d = self.xy_to_linear_index((idx_x as usize, idx_y as usize));
            Some(self.samples.get_unchecked(idx_1d))
        } else {
            None
        }
    }
}

/// Private API
impl Tile {
    fn coord_to_xy(&self, coord: Coord<C>) -> (isize, isize) {
        let c = ARCSEC_PER_DEG / C::from(self.resolution);
        // Samples are centered on grid points, so shift by half a cell
        // before truncating.
        let cc = 1. / (c * 2.);
        #[allow(clippy::cast_possible_truncation)]
        let x = ((coord.x - self.sw_corner_center.x + cc) * c).floor() as isize;
        #[allow(clippy::cast_possible_truncation)]
        let y = ((coord.y - self.sw_corner_center.y + cc) * c).floor() as isize;
        (x, y)
    }

    fn xy_to_linear_index(&self, (x, y): (usize, usize)) -> usize {
        self.dimensions.0 * (self.dimensions.1 - y - 1) + x
    }
}

fn extract_resolution<P: AsRef<Path>>(path: P) -> Result<(u8, (usize, usize)), DemError> {
    const RES_1_ARCSECOND_LEN: u64 = 3601 * 3601 * size_of::<i16>() as u64;
    const RES_3_ARCSECOND_LEN: u64 = 1201 * 1201 * size_of::<i16>() as u64;
    match path.as_ref().metadata().map(|m| m.len())? {
        RES_1_ARCSECOND_LEN => Ok((1, (3601, 3601))),
        RES_3_ARCSECOND_LEN => Ok((3, (1201, 1201))),
        invalid_len => Err(DemError::HgtLen(invalid_len, path.as_ref().to_owned())),
    }
}

fn sw_corner_center<P: AsRef<Path>>(path: P) -> Result<Coord<C>, DemError> {
    let Coord { x, y } = parse_sw_corner(path)?;
    Ok(Coord {
        x: C::from(x),
        y: C::from(y),
    })
}

fn parse_sw_corner<P: AsRef<Path>>(path: P) -> Result<Coord<i16>, DemError> {
    let mk_err = || DemError::HgtName(path.as_ref().to_owned());
    let name = path
        .as_ref()
        .file_stem()
        .and_then(std::ffi::OsStr::to_str)
        .ok_or_else(mk_err)?;
    if name.len() != 7 || !name.is_ascii() {
        return Err(mk_err());
    }
    let lat_sign = match &name[0..1] {
        "N" | "n" => 1,
        "S" | "s" => -1,
        _ => return Err(mk_err()),
    };
    let lat = lat_sign * name[1..3].parse::<i16>().map_err(|_| mk_err())?;
    let lon_sign = match &name[3..4] {
        "E" | "e" => 1,
        "W" | "w" => -1,
        _ => return Err(mk_err()),
    };
    let lon = lon_sign * name[4..7].parse::<i16>().map_err(|_| mk_err())?;
    Ok(Coord { x: lon, y: lat })
}
