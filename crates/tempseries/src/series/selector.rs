//! Closest-to-zero selection.

use crate::error::{Error, Result};

/// Select the value of `values` closest to zero.
///
/// Scans once, starting from the first element. A value with a strictly
/// smaller magnitude always replaces the current best. On equal magnitude the
/// new value replaces the best only when it is strictly greater, so `3` beats
/// `-3` and exact duplicates keep the first occurrence.
///
/// # Errors
///
/// Returns [`Error::EmptySeries`] if `values` is empty.
///
/// # Examples
///
/// ```
/// use tempseries::series::closest_to_zero;
///
/// assert_eq!(closest_to_zero(&[10.0, -2.0, 2.0]).unwrap(), 2.0);
/// assert_eq!(closest_to_zero(&[5.0, -3.0, 2.0, -1.0]).unwrap(), -1.0);
/// ```
#[allow(clippy::float_cmp)]
pub fn closest_to_zero(values: &[f64]) -> Result<f64> {
    let (&first, rest) = values.split_first().ok_or(Error::EmptySeries)?;

    let mut closest = first;
    let mut min_distance = first.abs();

    for &value in rest {
        let distance = value.abs();
        if distance < min_distance || (distance == min_distance && value > closest) {
            closest = value;
            min_distance = distance;
        }
    }

    Ok(closest)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn select(values: &[f64]) -> f64 {
        closest_to_zero(values).unwrap()
    }

    #[test]
    fn test_finds_smallest_magnitude() {
        assert_eq!(select(&[5.0, -3.0, 2.0, -1.0]), -1.0);
        assert_eq!(select(&[10.0, -5.0, 3.0, -2.0]), -2.0);
        assert_eq!(select(&[1.0, -1.0, 0.5, -0.5]), 0.5);
    }

    #[test]
    fn test_prefers_positive_on_tie() {
        assert_eq!(select(&[5.0, -5.0, 3.0, -3.0]), 3.0);
        assert_eq!(select(&[2.0, -2.0, 1.0, -1.0]), 1.0);
        assert_eq!(select(&[-3.0, 3.0]), 3.0);
        assert_eq!(select(&[3.0, -3.0]), 3.0);
    }

    #[test]
    fn test_single_value() {
        assert_eq!(select(&[37.2]), 37.2);
        assert_eq!(select(&[-5.3]), -5.3);
    }

    #[test]
    fn test_edge_cases() {
        assert_eq!(select(&[0.0, 1.0, -1.0]), 0.0);
        assert_eq!(select(&[0.1, -0.1]), 0.1);
        assert_eq!(select(&[-0.1, 0.1]), 0.1);
    }

    #[test]
    fn test_smaller_negative_beats_larger_positive() {
        assert_eq!(select(&[4.0, -0.5, 0.6]), -0.5);
    }

    #[test]
    fn test_duplicates() {
        assert_eq!(select(&[2.0, 2.0, 2.0]), 2.0);
        assert_eq!(select(&[-2.0, -2.0]), -2.0);
    }

    #[test]
    fn test_order_does_not_change_result() {
        let forward = [7.5, -1.25, 1.25, 3.0, -9.0];
        let mut reversed = forward;
        reversed.reverse();
        assert_eq!(select(&forward), select(&reversed));
        assert_eq!(select(&forward), 1.25);
    }

    #[test]
    fn test_result_is_element_of_input() {
        let inputs: [&[f64]; 4] = [
            &[36.8, 37.1, 36.9],
            &[-40.0, 12.5, -12.5, 99.9],
            &[0.001, -0.002],
            &[-7.0],
        ];
        for input in inputs {
            let picked = select(input);
            assert!(input.contains(&picked));
            assert!(input.iter().all(|v| picked.abs() <= v.abs()));
        }
    }

    #[test]
    fn test_empty_is_error() {
        let result = closest_to_zero(&[]);
        assert!(matches!(result, Err(Error::EmptySeries)));
    }
}
