//! Digital elevation model rasters.
//!
//! Two on-disk formats are supported:
//!
//! - [`GeoTiff`]: a single georeferenced raster, the usual output of
//!   GIS export tools. Cells equal to the `GDAL_NODATA` value mean
//!   "no measurement".
//! - [`Tile`]: one SRTM/NASADEM `.hgt` tile covering a 1x1 degree
//!   cell, with voids marked by [`HGT_VOID`].
//!
//! # References
//!
//! 1. [HGT file layout](http://fileformats.archiveteam.org/index.php?title=HGT&oldid=17250)
//! 1. [SRTM Collection User Guide](https://lpdaac.usgs.gov/documents/179/SRTM_User_Guide_V3.pdf)
//! 1. [GeoTIFF tags](http://geotiff.maptools.org/spec/geotiff2.6.html)

mod error;
mod geotiff;
mod hgt;

pub use crate::{
    error::DemError,
    geotiff::{Bounds, GeoTiff},
    hgt::{Tile, HGT_VOID},
};

/// Base floating point type used for all coordinates.
pub type C = f64;
