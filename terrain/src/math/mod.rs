mod haversine;
mod linspace;

pub use haversine::{haversine_m, EARTH_RADIUS_M};
pub(crate) use linspace::linspace;
