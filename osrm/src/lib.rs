//! Road route geometry from an [OSRM] server.
//!
//! [`Client`] asks a single OSRM `route/v1` endpoint for the geometry
//! between two points. [`Acquirer`] wraps any [`RouteSource`] and,
//! when the whole route cannot be fetched in one request, retries it
//! as a chain of shorter legs along straight-line waypoints.
//!
//! [OSRM]: https://project-osrm.org/docs/v5.24.0/api/#route-service

mod acquire;
mod client;
mod error;

pub use crate::{
    acquire::{stitch, waypoints, Acquirer, AcquirerConfig, Strategy, STITCH_EPSILON_DEG},
    client::{decode_response, Client, RouteSource, PUBLIC_OSRM_URL},
    error::RouteError,
};
pub use geo;
