use num_traits::{Float, FromPrimitive};

/// Returns `n` evenly spaced values from `y_start` to `y_end`
/// inclusive.
///
/// The final value is exactly `y_end`, not an accumulation of steps.
pub fn linspace<T>(y_start: T, y_end: T, n: usize) -> impl Iterator<Item = T>
where
    T: Float + FromPrimitive,
{
    let dy = (y_end - y_start) / T::from(n.saturating_sub(1).max(1)).unwrap();
    (0..n).map(move |x| {
        if x + 1 == n {
            y_end
        } else {
            y_start + T::from(x).unwrap() * dy
        }
    })
}

#[cfg(test)]
mod tests {
    use super::linspace;

    #[test]
    fn test_linspace() {
        let values: Vec<f64> = linspace(0.0, 1.0, 5).collect();
        assert_eq!(values, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_linspace_pins_end() {
        let end = 0.1 + 0.2;
        let values: Vec<f64> = linspace(0.0, end, 7).collect();
        assert_eq!(values.len(), 7);
        assert_eq!(values[0], 0.0);
        assert_eq!(values[6], end);
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_linspace_flat() {
        assert!(linspace(0.0_f64, 0.0, 10).all(|v| v == 0.0));
    }
}
