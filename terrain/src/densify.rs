use crate::{
    math::{haversine_m, linspace},
    TerrainError,
};
use geo::geometry::Coord;

/// A polyline resampled to points evenly spaced by arc length.
#[derive(Debug, Clone, PartialEq)]
pub struct Densified {
    /// Resampled points, first and last matching the source polyline.
    pub points: Vec<Coord<f64>>,

    /// Cumulative path distance of each point in meters.
    pub distances_m: Vec<f64>,

    /// Total length of the source polyline in meters.
    pub total_m: f64,
}

/// Resamples `polyline` into exactly `n` points evenly spaced by
/// cumulative great-circle distance along the path.
///
/// Latitude and longitude are interpolated linearly and independently
/// within the source segment containing each target distance.
/// Zero-length segments are tolerated, including a polyline whose
/// total length is zero.
pub fn densify(polyline: &[Coord<f64>], n: usize) -> Result<Densified, TerrainError> {
    if n < 2 {
        return Err(TerrainError::InvalidConfig("point count must be at least 2"));
    }
    if polyline.len() < 2 {
        return Err(TerrainError::InsufficientGeometry(polyline.len()));
    }

    let seg_lengths: Vec<f64> = polyline
        .windows(2)
        .map(|w| haversine_m(w[0], w[1]))
        .collect();
    let cum: Vec<f64> = std::iter::once(0.0)
        .chain(seg_lengths.iter().scan(0.0, |acc, len| {
            *acc += len;
            Some(*acc)
        }))
        .collect();
    let total_m = cum[cum.len() - 1];
    let distances_m: Vec<f64> = linspace(0.0, total_m, n).collect();

    // Targets are non-decreasing, so the segment cursor only moves
    // forward.
    let last_seg = seg_lengths.len() - 1;
    let mut seg = 0;
    let points = distances_m
        .iter()
        .map(|&d| {
            while seg < last_seg && d > cum[seg + 1] {
                seg += 1;
            }
            let len = seg_lengths[seg];
            let frac = if len == 0.0 {
                0.0
            } else {
                ((d - cum[seg]) / len).clamp(0.0, 1.0)
            };
            lerp(polyline[seg], polyline[seg + 1], frac)
        })
        .collect();

    Ok(Densified {
        points,
        distances_m,
        total_m,
    })
}

fn lerp(a: Coord<f64>, b: Coord<f64>, frac: f64) -> Coord<f64> {
    Coord {
        x: a.x + (b.x - a.x) * frac,
        y: a.y + (b.y - a.y) * frac,
    }
}

#[cfg(test)]
mod tests {
    use super::{densify, Densified};
    use crate::{haversine_m, TerrainError};
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use geo::{coord, Coord};

    fn assert_endpoints(polyline: &[Coord<f64>], densified: &Densified, n: usize) {
        assert_eq!(densified.points.len(), n);
        assert_eq!(densified.distances_m.len(), n);
        let first = densified.points[0];
        let last = densified.points[n - 1];
        let (src_first, src_last) = (polyline[0], polyline[polyline.len() - 1]);
        assert_abs_diff_eq!(first.x, src_first.x, epsilon = 1e-9);
        assert_abs_diff_eq!(first.y, src_first.y, epsilon = 1e-9);
        assert_abs_diff_eq!(last.x, src_last.x, epsilon = 1e-9);
        assert_abs_diff_eq!(last.y, src_last.y, epsilon = 1e-9);
        assert_eq!(densified.distances_m[0], 0.0);
        assert_eq!(densified.distances_m[n - 1], densified.total_m);
        assert!(densified.distances_m.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_two_point_line() {
        let line = [coord!(x: 0.0, y: 0.0), coord!(x: 1.0, y: 0.0)];
        let densified = densify(&line, 5).unwrap();
        assert_endpoints(&line, &densified, 5);

        let total = haversine_m(line[0], line[1]);
        assert_relative_eq!(densified.total_m, total);
        for (i, d) in densified.distances_m.iter().enumerate() {
            assert_relative_eq!(*d, total * i as f64 / 4.0, max_relative = 1e-12);
        }
        let mid = densified.points[2];
        assert_abs_diff_eq!(mid.x, 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(mid.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_spacing_follows_arc_length_not_vertices() {
        // One long segment followed by many short ones.
        let mut line = vec![coord!(x: 0.0, y: 0.0), coord!(x: 1.0, y: 0.0)];
        line.extend((1..=10).map(|i| coord!(x: 1.0 + f64::from(i) * 0.01, y: 0.0)));
        let densified = densify(&line, 12).unwrap();
        assert_endpoints(&line, &densified, 12);

        // 1.1 degrees over 11 steps of 0.1 degree each.
        for (i, p) in densified.points.iter().enumerate() {
            assert_abs_diff_eq!(p.x, i as f64 * 0.1, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_many_vertices_few_points() {
        let line: Vec<_> = (0..1000)
            .map(|i| {
                let t = f64::from(i) / 999.0;
                coord!(x: 30.0 + 7.0 * t, y: 59.0 - 3.0 * t + (t * 40.0).sin() * 0.01)
            })
            .collect();
        for n in [2, 3, 17, 5000] {
            let densified = densify(&line, n).unwrap();
            assert_endpoints(&line, &densified, n);
        }
    }

    #[test]
    fn test_zero_length_segments() {
        let line = [
            coord!(x: 0.0, y: 0.0),
            coord!(x: 0.0, y: 0.0),
            coord!(x: 0.0, y: 1.0),
            coord!(x: 0.0, y: 1.0),
            coord!(x: 0.0, y: 2.0),
            coord!(x: 0.0, y: 2.0),
        ];
        let densified = densify(&line, 9).unwrap();
        assert_endpoints(&line, &densified, 9);
        for (i, p) in densified.points.iter().enumerate() {
            assert_abs_diff_eq!(p.y, i as f64 * 0.25, epsilon = 1e-9);
            assert!(p.x.is_finite());
        }
    }

    #[test]
    fn test_degenerate_route() {
        let here = coord!(x: 37.6173, y: 55.7558);
        let densified = densify(&[here, here], 10).unwrap();
        assert_eq!(densified.total_m, 0.0);
        assert_eq!(densified.points, vec![here; 10]);
        assert_eq!(densified.distances_m, vec![0.0; 10]);
    }

    #[test]
    fn test_invalid_inputs() {
        let line = [coord!(x: 0.0, y: 0.0), coord!(x: 1.0, y: 0.0)];
        assert!(matches!(
            densify(&line, 1),
            Err(TerrainError::InvalidConfig(_))
        ));
        assert!(matches!(
            densify(&line[..1], 10),
            Err(TerrainError::InsufficientGeometry(1))
        ));
        assert!(matches!(
            densify(&[], 10),
            Err(TerrainError::InsufficientGeometry(0))
        ));
    }
}
