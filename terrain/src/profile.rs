use crate::{densify, gradients, Densified, ElevationSource, Sampler, TerrainError};
use geo::geometry::Coord;
use log::{debug, info};
use serde::Serialize;
use std::time::Instant;

/// Default number of points in a profile.
pub const DEFAULT_POINTS: usize = 100_000;

/// Default number of points per elevation query.
pub const DEFAULT_BATCH_SIZE: usize = 50_000;

/// A terrain profile along a route.
///
/// All vectors have the same length and are index aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// Total route length in meters.
    pub distance_m: f64,

    /// Points evenly spaced by distance along the route.
    pub points: Vec<Coord<f64>>,

    /// Cumulative distance of each point from the start, in meters.
    pub distances_m: Vec<f64>,

    /// Terrain elevation at each point, `None` where unknown.
    pub elevations_m: Vec<Option<f64>>,

    /// Signed slope from the previous point in percent, `None` where
    /// either elevation is unknown.
    pub gradients_pct: Vec<Option<f64>>,
}

/// One output row of a [`Profile`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Record {
    pub idx: usize,
    pub lat: f64,
    pub lon: f64,
    pub dist_m: f64,
    pub elevation_m: Option<f64>,
    pub gradient_pct: Option<f64>,
}

impl Profile {
    pub fn builder() -> ProfileBuilder {
        ProfileBuilder {
            route: None,
            points: DEFAULT_POINTS,
            batch_size: DEFAULT_BATCH_SIZE,
            parallel: false,
        }
    }

    /// Returns the number of points in this profile.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the number of points without a known elevation.
    pub fn unknown_elevations(&self) -> usize {
        self.elevations_m.iter().filter(|e| e.is_none()).count()
    }

    /// Returns this profile's rows in index order.
    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        self.points
            .iter()
            .zip(&self.distances_m)
            .zip(&self.elevations_m)
            .zip(&self.gradients_pct)
            .enumerate()
            .map(|(idx, (((point, dist), elevation), gradient))| Record {
                idx,
                lat: point.y,
                lon: point.x,
                dist_m: *dist,
                elevation_m: *elevation,
                gradient_pct: *gradient,
            })
    }
}

#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    /// Route to profile (required).
    route: Option<Vec<Coord<f64>>>,

    /// Number of output points (defaults to [`DEFAULT_POINTS`]).
    points: usize,

    /// Points per elevation query (defaults to
    /// [`DEFAULT_BATCH_SIZE`]).
    batch_size: usize,

    /// Sample elevation batches concurrently (defaults to false).
    parallel: bool,
}

impl ProfileBuilder {
    /// Route to profile, `x` longitude and `y` latitude (required).
    #[must_use]
    pub fn route(mut self, route: Vec<Coord<f64>>) -> Self {
        self.route = Some(route);
        self
    }

    /// Number of output points (at least 2, defaults to 100,000).
    #[must_use]
    pub fn points(mut self, n: usize) -> Self {
        self.points = n;
        self
    }

    /// Points per elevation query (at least 1, defaults to 50,000).
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sample elevation batches concurrently (defaults to false).
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Checks the numeric settings without touching the route or any
    /// elevation source.
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.points < 2 {
            return Err(TerrainError::InvalidConfig("point count must be at least 2"));
        }
        if self.batch_size == 0 {
            return Err(TerrainError::InvalidConfig("batch size must be at least 1"));
        }
        Ok(())
    }

    pub fn build<S>(&self, source: &S) -> Result<Profile, TerrainError>
    where
        S: ElevationSource + Sync,
    {
        self.validate()?;
        let route = self.route.as_deref().ok_or(TerrainError::Builder("route"))?;
        if route.len() < 2 {
            return Err(TerrainError::InsufficientGeometry(route.len()));
        }
        let sampler = Sampler::new(self.batch_size)?.parallel(self.parallel);

        let (densified, densify_runtime) = {
            let now = Instant::now();
            let densified = densify(route, self.points)?;
            (densified, now.elapsed())
        };
        let Densified {
            points,
            distances_m,
            total_m,
        } = densified;

        let (elevations, sample_runtime) = {
            let now = Instant::now();
            let elevations = sampler.sample(source, &points);
            (elevations, now.elapsed())
        };
        if elevations.unknown() > 0 {
            info!(
                "{} of {} elevations unknown ({} no-data, {} failed)",
                elevations.unknown(),
                points.len(),
                elevations.nodata,
                elevations.failed
            );
        }

        let gradients_pct = gradients(&elevations.values, &distances_m);

        debug!(
            "profile; vertices: {}, len: {}, distance_m: {:.1}, densify_exec: {:?}, sample_exec: {:?}",
            route.len(),
            points.len(),
            total_m,
            densify_runtime,
            sample_runtime
        );

        Ok(Profile {
            distance_m: total_m,
            points,
            distances_m,
            elevations_m: elevations.values,
            gradients_pct,
        })
    }
}
