/// Returns the signed percent slope at each point of a profile.
///
/// The first point has no predecessor and is defined as flat. Any
/// other point is `None` when its own or its predecessor's elevation
/// is unknown. Coincident points (no horizontal distance) are flat.
pub fn gradients(elevations_m: &[Option<f64>], distances_m: &[f64]) -> Vec<Option<f64>> {
    debug_assert_eq!(elevations_m.len(), distances_m.len());
    if elevations_m.is_empty() {
        return Vec::new();
    }

    let mut grads = Vec::with_capacity(elevations_m.len());
    grads.push(Some(0.0));
    grads.extend(
        elevations_m
            .windows(2)
            .zip(distances_m.windows(2))
            .map(|(elev, dist)| match (elev[0], elev[1]) {
                (Some(e0), Some(e1)) => {
                    let dx = dist[1] - dist[0];
                    if dx == 0.0 {
                        Some(0.0)
                    } else {
                        Some((e1 - e0) / dx * 100.0)
                    }
                }
                _ => None,
            }),
    );
    grads
}

#[cfg(test)]
mod tests {
    use super::gradients;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_point_is_flat() {
        assert_eq!(gradients(&[None], &[0.0]), vec![Some(0.0)]);
        assert_eq!(gradients(&[Some(120.0)], &[0.0]), vec![Some(0.0)]);
        assert_eq!(gradients(&[None, None], &[0.0, 10.0])[0], Some(0.0));
        assert!(gradients(&[], &[]).is_empty());
    }

    #[test]
    fn test_slopes() {
        let elev = [Some(100.0), Some(101.0), Some(99.0), Some(99.0)];
        let dist = [0.0, 50.0, 150.0, 250.0];
        let grads = gradients(&elev, &dist);
        assert_eq!(grads.len(), 4);
        assert_eq!(grads[0], Some(0.0));
        assert_relative_eq!(grads[1].unwrap(), 2.0);
        assert_relative_eq!(grads[2].unwrap(), -2.0);
        assert_relative_eq!(grads[3].unwrap(), 0.0);
    }

    #[test]
    fn test_unknown_propagates_to_both_neighbours() {
        let elev = [Some(10.0), Some(12.0), None, Some(15.0), Some(16.0)];
        let dist = [0.0, 100.0, 200.0, 300.0, 400.0];
        let grads = gradients(&elev, &dist);
        assert_relative_eq!(grads[1].unwrap(), 2.0);
        assert_eq!(grads[2], None);
        assert_eq!(grads[3], None);
        assert_relative_eq!(grads[4].unwrap(), 1.0);
    }

    #[test]
    fn test_coincident_points_are_flat() {
        let elev = [Some(10.0), Some(30.0), Some(30.0)];
        let dist = [0.0, 0.0, 0.0];
        assert_eq!(gradients(&elev, &dist), vec![Some(0.0); 3]);
    }
}
