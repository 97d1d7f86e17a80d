use crate::{RouteError, RouteSource};
use geo::geometry::Coord;
use log::{debug, info, warn};
use std::{fmt, thread, time::Duration, time::Instant};

/// Largest lat/lon difference, in degrees, at which the first point
/// of a leg is considered a repeat of the previous leg's last point.
pub const STITCH_EPSILON_DEG: f64 = 1e-9;

/// One rung of the acquisition ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// A single request from start to end.
    Whole,

    /// `k` consecutive requests between straight-line waypoints.
    Segmented(usize),
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Whole => f.write_str("whole"),
            Strategy::Segmented(k) => write!(f, "{k}-segment"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquirerConfig {
    /// Timeout of the single whole-route request.
    pub whole_timeout: Duration,

    /// Timeout of each segment request.
    pub segment_timeout: Duration,

    /// Segment counts to try, in order, after the whole route fails.
    pub segment_levels: Vec<usize>,

    /// Pause between consecutive segment requests.
    pub segment_pause: Duration,
}

impl Default for AcquirerConfig {
    fn default() -> Self {
        Self {
            whole_timeout: Duration::from_secs(120),
            segment_timeout: Duration::from_secs(90),
            segment_levels: vec![4, 8, 16],
            segment_pause: Duration::from_millis(200),
        }
    }
}

impl AcquirerConfig {
    pub fn validate(&self) -> Result<(), RouteError> {
        if self.whole_timeout.is_zero() || self.segment_timeout.is_zero() {
            return Err(RouteError::InvalidConfig("timeouts must be positive"));
        }
        if self.segment_levels.is_empty() {
            return Err(RouteError::InvalidConfig("at least one segment level is required"));
        }
        if self.segment_levels.contains(&0) {
            return Err(RouteError::InvalidConfig("segment levels must be at least 1"));
        }
        Ok(())
    }
}

/// Fetches a route, falling back to progressively finer segmented
/// requests when the whole route cannot be fetched at once.
#[derive(Debug)]
pub struct Acquirer<S> {
    source: S,
    config: AcquirerConfig,
}

impl<S: RouteSource> Acquirer<S> {
    pub fn new(source: S, config: AcquirerConfig) -> Result<Self, RouteError> {
        config.validate()?;
        Ok(Self { source, config })
    }

    pub fn config(&self) -> &AcquirerConfig {
        &self.config
    }

    /// Returns the strategies [`Acquirer::acquire`] tries, in order.
    pub fn strategies(&self) -> Vec<Strategy> {
        std::iter::once(Strategy::Whole)
            .chain(self.config.segment_levels.iter().map(|&k| Strategy::Segmented(k)))
            .collect()
    }

    /// Returns the route from `start` to `end` from the first strategy
    /// that succeeds.
    ///
    /// Each failed strategy is logged and the next one is tried. When
    /// none succeed the result is [`RouteError::Exhausted`].
    pub fn acquire(&self, start: Coord<f64>, end: Coord<f64>) -> Result<Vec<Coord<f64>>, RouteError> {
        let strategies = self.strategies();
        for strategy in &strategies {
            let now = Instant::now();
            match self.attempt(*strategy, start, end) {
                Ok(route) => {
                    info!(
                        "{strategy} route succeeded; vertices: {}, exec: {:?}",
                        route.len(),
                        now.elapsed()
                    );
                    return Ok(route);
                }
                Err(e) => warn!("{strategy} route failed: {e}"),
            }
        }
        Err(RouteError::Exhausted {
            attempts: strategies.len(),
        })
    }
}

/// Private API.
impl<S: RouteSource> Acquirer<S> {
    fn attempt(
        &self,
        strategy: Strategy,
        start: Coord<f64>,
        end: Coord<f64>,
    ) -> Result<Vec<Coord<f64>>, RouteError> {
        match strategy {
            Strategy::Whole => self
                .source
                .fetch_route(start, end, self.config.whole_timeout),
            Strategy::Segmented(k) => self.segmented(start, end, k),
        }
    }

    /// Fails on the first leg that fails.
    fn segmented(
        &self,
        start: Coord<f64>,
        end: Coord<f64>,
        k: usize,
    ) -> Result<Vec<Coord<f64>>, RouteError> {
        let mut route = Vec::new();
        for (i, leg) in waypoints(start, end, k).windows(2).enumerate() {
            if i > 0 && !self.config.segment_pause.is_zero() {
                thread::sleep(self.config.segment_pause);
            }
            debug!("segment {}/{k}: {:?} -> {:?}", i + 1, leg[0], leg[1]);
            let segment = self
                .source
                .fetch_route(leg[0], leg[1], self.config.segment_timeout)?;
            stitch(&mut route, segment);
        }
        Ok(route)
    }
}

/// Returns `k + 1` points evenly spaced on the straight lat/lon line
/// from `start` to `end`, both included exactly.
#[allow(clippy::cast_precision_loss)]
pub fn waypoints(start: Coord<f64>, end: Coord<f64>, k: usize) -> Vec<Coord<f64>> {
    (0..=k)
        .map(|i| match i {
            0 => start,
            i if i == k => end,
            i => {
                let t = i as f64 / k as f64;
                Coord {
                    x: start.x + (end.x - start.x) * t,
                    y: start.y + (end.y - start.y) * t,
                }
            }
        })
        .collect()
}

/// Appends `segment` to `route`, dropping its first point when it
/// repeats the last point of `route`.
pub fn stitch(route: &mut Vec<Coord<f64>>, segment: Vec<Coord<f64>>) {
    let repeats = match (route.last(), segment.first()) {
        (Some(last), Some(first)) => {
            (last.x - first.x).abs() <= STITCH_EPSILON_DEG
                && (last.y - first.y).abs() <= STITCH_EPSILON_DEG
        }
        _ => false,
    };
    route.extend(segment.into_iter().skip(usize::from(repeats)));
}
