//! Single-file GeoTIFF elevation rasters.

use crate::{DemError, C};
use geo::geometry::Coord;
use std::{fs::File, io::BufReader, path::Path};
use tiff::{
    decoder::{Decoder, DecodingResult, Limits},
    tags::Tag,
};

/// `ModelPixelScaleTag`: (ScaleX, ScaleY, ScaleZ).
const MODEL_PIXEL_SCALE: Tag = Tag::ModelPixelScaleTag;

/// `ModelTiepointTag`: (I, J, K, X, Y, Z).
const MODEL_TIEPOINT: Tag = Tag::ModelTiepointTag;

/// `GeoKeyDirectoryTag`: header then (KeyID, Location, Count, Value)
/// entries.
const GEO_KEY_DIRECTORY: Tag = Tag::GeoKeyDirectoryTag;

/// `GDAL_NODATA`: ASCII encoded no-data value.
const GDAL_NODATA: Tag = Tag::GdalNodata;

/// `GTRasterTypeGeoKey` and its `RasterPixelIsPoint` value.
const GT_RASTER_TYPE_KEY: u16 = 1025;
const RASTER_PIXEL_IS_POINT: u16 = 2;

/// Geographic extent of a raster, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: C,
    pub max_lat: C,
    pub min_lon: C,
    pub max_lon: C,
}

impl Bounds {
    /// Returns true if `coord` lies inside or on the edge of these
    /// bounds.
    pub fn contains(&self, coord: Coord<C>) -> bool {
        self.min_lat <= coord.y
            && coord.y <= self.max_lat
            && self.min_lon <= coord.x
            && coord.x <= self.max_lon
    }
}

/// An elevation raster decoded from a GeoTIFF file.
///
/// The first band is held in memory in row-major order, north row
/// first, as `f32` regardless of the on-disk sample type.
#[derive(Debug)]
pub struct GeoTiff {
    data: Vec<f32>,
    width: usize,
    height: usize,
    bounds: Bounds,
    nodata: Option<f32>,
}

impl GeoTiff {
    /// Decodes the GeoTIFF at `path`.
    ///
    /// The raster must be georeferenced with a model tiepoint and
    /// pixel scale in geographic (degree) coordinates.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let file = BufReader::new(File::open(path)?);
        let mut limits = Limits::default();
        limits.decoding_buffer_size = 1 << 30;
        limits.intermediate_buffer_size = 1 << 30;
        limits.ifd_value_size = 1 << 30;
        let mut decoder = Decoder::new(file)?.with_limits(limits);

        let (width, height) = decoder.dimensions()?;
        let (width, height) = (width as usize, height as usize);
        let bounds = read_bounds(&mut decoder, width, height)?;
        let nodata = match decoder.find_tag(GDAL_NODATA)? {
            Some(value) => {
                let text = value.into_string()?;
                let text = text.trim_matches(char::from(0)).trim();
                Some(text.parse::<f32>().map_err(|_| {
                    DemError::GeoTiff(format!("unparsable GDAL_NODATA {text:?}"))
                })?)
            }
            None => None,
        };
        let data = first_band(decoder.read_image()?, width * height)?;

        Self::from_parts(data, width, height, bounds, nodata)
    }

    /// Builds a raster from already decoded samples.
    pub fn from_parts(
        data: Vec<f32>,
        width: usize,
        height: usize,
        bounds: Bounds,
        nodata: Option<f32>,
    ) -> Result<Self, DemError> {
        if width == 0 || height == 0 || data.len() != width * height {
            return Err(DemError::GeoTiff(format!(
                "{} samples for a {width}x{height} raster",
                data.len()
            )));
        }
        if !(bounds.min_lat < bounds.max_lat && bounds.min_lon < bounds.max_lon) {
            return Err(DemError::GeoTiff(format!("empty extent {bounds:?}")));
        }
        Ok(Self {
            data,
            width,
            height,
            bounds,
            nodata,
        })
    }

    /// Returns the (width, height) of this raster in cells.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Returns the value this raster uses to mark missing data.
    pub fn nodata(&self) -> Option<f32> {
        self.nodata
    }

    /// Returns the raw value of the cell containing `coord`.
    ///
    /// No-data cells are returned as-is; compare against
    /// [`GeoTiff::nodata`].
    pub fn get(&self, coord: Coord<C>) -> Result<f32, DemError> {
        if !self.bounds.contains(coord) {
            return Err(DemError::OutOfBounds {
                lat: coord.y,
                lon: coord.x,
            });
        }
        let Bounds {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        } = self.bounds;
        let col = ((coord.x - min_lon) / (max_lon - min_lon) * self.width as C).floor();
        let row = ((max_lat - coord.y) / (max_lat - min_lat) * self.height as C).floor();
        // Points on the east and south edges belong to the last cell.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (col, row) = (
            (col as usize).min(self.width - 1),
            (row as usize).min(self.height - 1),
        );
        Ok(self.data[row * self.width + col])
    }
}

/// Reads the extent covered by the raster's cells.
///
/// The tiepoint marks a cell's corner unless `GTRasterTypeGeoKey` says
/// `RasterPixelIsPoint`, in which case it marks the cell's center.
fn read_bounds<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    width: usize,
    height: usize,
) -> Result<Bounds, DemError> {
    let tiepoint = decoder
        .find_tag(MODEL_TIEPOINT)?
        .ok_or_else(|| DemError::GeoTiff("missing ModelTiepointTag".into()))?
        .into_f64_vec()?;
    let scale = decoder
        .find_tag(MODEL_PIXEL_SCALE)?
        .ok_or_else(|| DemError::GeoTiff("missing ModelPixelScaleTag".into()))?
        .into_f64_vec()?;
    if tiepoint.len() < 6 || scale.len() < 2 {
        return Err(DemError::GeoTiff("short georeferencing tags".into()));
    }
    let pixel_is_point = match decoder.find_tag(GEO_KEY_DIRECTORY)? {
        Some(keys) => raster_type(&keys.into_u16_vec()?) == Some(RASTER_PIXEL_IS_POINT),
        None => false,
    };

    // The tiepoint maps raster position (i, j) to model (x, y).
    let (mut i, mut j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
    if pixel_is_point {
        i += 0.5;
        j += 0.5;
    }
    let (scale_x, scale_y) = (scale[0], scale[1]);
    let min_lon = x - i * scale_x;
    let max_lat = y + j * scale_y;
    Ok(Bounds {
        min_lat: max_lat - height as C * scale_y,
        max_lat,
        min_lon,
        max_lon: min_lon + width as C * scale_x,
    })
}

/// Returns the inline value of `GTRasterTypeGeoKey`, if present.
fn raster_type(keys: &[u16]) -> Option<u16> {
    keys.get(4..)?
        .chunks_exact(4)
        .find(|entry| entry[0] == GT_RASTER_TYPE_KEY && entry[1] == 0)
        .map(|entry| entry[3])
}

/// Converts decoded samples to `f32`, keeping only the first band of
/// interleaved multi-band images.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn first_band(image: DecodingResult, cells: usize) -> Result<Vec<f32>, DemError> {
    let data: Vec<f32> = match image {
        DecodingResult::F32(data) => data,
        DecodingResult::F64(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::I16(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::I32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U8(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f32).collect(),
    };
    if cells == 0 || data.len() % cells != 0 {
        return Err(DemError::GeoTiff(format!(
            "{} samples do not cover {cells} cells",
            data.len()
        )));
    }
    let bands = data.len() / cells;
    if bands == 1 {
        Ok(data)
    } else {
        Ok(data.into_iter().step_by(bands).collect())
    }
}
