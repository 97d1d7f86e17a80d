use dem::DemError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerrainError {
    #[error("missing required parameter '{0}'")]
    Builder(&'static str),

    #[error("invalid configuration, {0}")]
    InvalidConfig(&'static str),

    #[error("route has {0} points, at least 2 are required")]
    InsufficientGeometry(usize),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("no height files in {0}")]
    Path(PathBuf),

    #[error("no tile covers ({lat}, {lon})")]
    NoTile { lat: f64, lon: f64 },

    #[error("{0}")]
    Dem(#[from] DemError),
}
