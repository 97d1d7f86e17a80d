use anyhow::{anyhow, Error as AnyError};
use clap::{ArgGroup, Parser, Subcommand};
use osrm::{AcquirerConfig, PUBLIC_OSRM_URL};
use std::{path::PathBuf, str::FromStr, time::Duration};
use terrain::{geo::geometry::Coord, DEFAULT_BATCH_SIZE, DEFAULT_POINTS};

/// Generate terrain elevation and gradient profiles along road routes.
#[derive(Parser, Debug, Clone)]
#[command(group(ArgGroup::new("elevation").required(true).args(["dem", "tile_dir"])))]
pub struct Cli {
    /// Route start "lat,lon".
    #[arg(long)]
    pub start: LatLon,

    /// Route end "lat,lon".
    #[arg(long)]
    pub end: LatLon,

    /// OSRM route URL template with {lon1}, {lat1}, {lon2} and {lat2}
    /// placeholders.
    #[arg(long, default_value = PUBLIC_OSRM_URL)]
    pub osrm_url: String,

    /// GeoTIFF elevation raster.
    #[arg(long)]
    pub dem: Option<PathBuf>,

    /// Directory of SRTM/NASADEM `.hgt` tiles.
    #[arg(short, long)]
    pub tile_dir: Option<PathBuf>,

    /// Number of evenly spaced profile points.
    #[arg(short = 'n', long, default_value_t = DEFAULT_POINTS)]
    pub points: usize,

    /// Maximum points per elevation query.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch: usize,

    /// Sample elevation batches in parallel.
    #[arg(long, default_value_t = false)]
    pub parallel: bool,

    /// Whole-route request timeout, in seconds.
    #[arg(long, default_value_t = 120)]
    pub timeout: u64,

    /// Per-segment request timeout, in seconds.
    #[arg(long, default_value_t = 90)]
    pub segment_timeout: u64,

    /// Segment counts to try when the whole route request fails.
    #[arg(long, value_delimiter = ',', default_value = "4,8,16")]
    pub segments: Vec<usize>,

    /// Pause between segment requests, in milliseconds.
    #[arg(long, default_value_t = 200)]
    pub segment_pause_ms: u64,

    #[command(subcommand)]
    pub cmd: Command,
}

impl Cli {
    pub fn acquirer_config(&self) -> AcquirerConfig {
        AcquirerConfig {
            whole_timeout: Duration::from_secs(self.timeout),
            segment_timeout: Duration::from_secs(self.segment_timeout),
            segment_levels: self.segments.clone(),
            segment_pause: Duration::from_millis(self.segment_pause_ms),
        }
    }
}

#[derive(Clone, Debug, Copy, PartialEq)]
pub struct LatLon(pub Coord<f64>);

impl FromStr for LatLon {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let (lat_str, lon_str) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("not a valid lat,lon"))?;
        let lat = f64::from_str(lat_str.trim())?;
        let lon = f64::from_str(lon_str.trim())?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(anyhow!("{lat},{lon} is not on the globe"));
        }
        Ok(Self(Coord { y: lat, x: lon }))
    }
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Write profile records as CSV.
    Csv {
        /// Output file, stdout if omitted.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print profile records to stdout as a JSON array.
    Json {
        /// Keep only every Nth record (the last is always kept).
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        every: u64,
    },

    /// Plot elevation to terminal.
    Plot,
}
