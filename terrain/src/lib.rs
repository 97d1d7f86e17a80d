//! Terrain profiles along arbitrary polylines.
//!
//! A route is resampled into points evenly spaced by arc length
//! ([`densify`]), an [`ElevationSource`] is queried at every point
//! ([`Sampler`]), and signed gradients are derived from the result
//! ([`gradients`]). [`Profile::builder`] chains the three.

mod densify;
mod error;
mod gradient;
mod math;
mod profile;
mod sampler;
mod source;
mod tiles;

pub use crate::{
    densify::{densify, Densified},
    error::TerrainError,
    gradient::gradients,
    math::{haversine_m, EARTH_RADIUS_M},
    profile::{Profile, ProfileBuilder, Record, DEFAULT_BATCH_SIZE, DEFAULT_POINTS},
    sampler::{Elevations, Sampler},
    source::ElevationSource,
    tiles::{TileMode, Tiles},
};
pub use {dem, geo};
