use crate::{ElevationSource, TerrainError};
use geo::geometry::Coord;
use log::{debug, trace, warn};
use rayon::prelude::*;

/// Elevations sampled along a path.
#[derive(Debug, Clone, PartialEq)]
pub struct Elevations {
    /// One entry per queried point; `None` where the elevation is
    /// unknown.
    pub values: Vec<Option<f64>>,

    /// Number of points the source reported as no-data.
    pub nodata: usize,

    /// Number of points whose query failed.
    pub failed: usize,
}

impl Elevations {
    /// Returns the number of unknown elevations.
    pub fn unknown(&self) -> usize {
        self.nodata + self.failed
    }
}

/// Queries an [`ElevationSource`] in bounded batches.
///
/// Failures are absorbed per point: a point whose query errors, or
/// whose value is the source's no-data marker or not finite, is
/// recorded as unknown and sampling continues. Nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sampler {
    batch_size: usize,
    parallel: bool,
}

impl Sampler {
    pub fn new(batch_size: usize) -> Result<Self, TerrainError> {
        if batch_size == 0 {
            return Err(TerrainError::InvalidConfig("batch size must be at least 1"));
        }
        Ok(Self {
            batch_size,
            parallel: false,
        })
    }

    /// Sample batches on the rayon thread pool (defaults to false).
    ///
    /// Output order is the same either way.
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns the elevation at each of `points`, index aligned.
    pub fn sample<S>(&self, source: &S, points: &[Coord<f64>]) -> Elevations
    where
        S: ElevationSource + Sync,
    {
        let batches: Vec<Elevations> = if self.parallel {
            points
                .par_chunks(self.batch_size)
                .map(|batch| sample_batch(source, batch))
                .collect()
        } else {
            points
                .chunks(self.batch_size)
                .map(|batch| sample_batch(source, batch))
                .collect()
        };
        debug!(
            "sampled {} points in {} batches of at most {}",
            points.len(),
            batches.len(),
            self.batch_size
        );

        let mut elevations = Elevations {
            values: Vec::with_capacity(points.len()),
            nodata: 0,
            failed: 0,
        };
        for batch in batches {
            elevations.values.extend(batch.values);
            elevations.nodata += batch.nodata;
            elevations.failed += batch.failed;
        }
        elevations
    }
}

fn sample_batch<S: ElevationSource>(source: &S, batch: &[Coord<f64>]) -> Elevations {
    let nodata = source.nodata();
    let mut raw = source.sample(batch);
    let mut elevations = Elevations {
        values: Vec::with_capacity(batch.len()),
        nodata: 0,
        failed: 0,
    };

    if raw.len() != batch.len() {
        warn!(
            "elevation source answered {} of {} queries",
            raw.len(),
            batch.len()
        );
        raw.truncate(batch.len());
        elevations.failed += batch.len() - raw.len();
    }

    for (coord, result) in batch.iter().zip(raw) {
        let value = match result {
            Ok(value) if Some(value) == nodata || !value.is_finite() => {
                elevations.nodata += 1;
                None
            }
            Ok(value) => Some(value),
            Err(e) => {
                trace!("no elevation at {coord:?}: {e}");
                elevations.failed += 1;
                None
            }
        };
        elevations.values.push(value);
    }
    elevations.values.resize(batch.len(), None);
    elevations
}
