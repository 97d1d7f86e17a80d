use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("tiff: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("invalid GeoTIFF, {0}")]
    GeoTiff(String),

    #[error("invalid HGT name {0}")]
    HgtName(PathBuf),

    #[error("invalid HGT file len {0} for {1}")]
    HgtLen(u64, PathBuf),

    #[error("({lat}, {lon}) is outside the raster")]
    OutOfBounds { lat: f64, lon: f64 },
}
