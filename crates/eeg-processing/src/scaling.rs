//! Value scaling helpers for display

use num_traits::Float;

/// Min-max scale into `[0, 1]`.
///
/// A constant sequence is returned unchanged.
pub fn normalize<T: Float>(values: &[T]) -> Vec<T> {
    let Some(&first) = values.first() else {
        return Vec::new();
    };
    let (min, max) = values
        .iter()
        .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;
    if range == T::zero() {
        return values.to_vec();
    }
    values.iter().map(|&v| (v - min) / range).collect()
}

/// Zero mean, unit (population) standard deviation.
///
/// A sequence with zero spread is returned unchanged.
pub fn standardize<T: Float>(values: &[T]) -> Vec<T> {
    if values.is_empty() {
        return Vec::new();
    }
    let n = T::from(values.len()).unwrap_or_else(T::one);
    let mean = values.iter().fold(T::zero(), |acc, &v| acc + v) / n;
    let variance = values
        .iter()
        .fold(T::zero(), |acc, &v| acc + (v - mean) * (v - mean))
        / n;
    let std_dev = variance.sqrt();
    if std_dev == T::zero() {
        return values.to_vec();
    }
    values.iter().map(|&v| (v - mean) / std_dev).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_range() {
        assert_eq!(normalize(&[2.0, 4.0, 6.0]), vec![0.0, 0.5, 1.0]);
        assert_eq!(normalize(&[-1.0f32, 1.0]), vec![0.0f32, 1.0]);
    }

    #[test]
    fn test_normalize_constant_and_empty() {
        assert_eq!(normalize(&[5.0, 5.0, 5.0]), vec![5.0, 5.0, 5.0]);
        assert!(normalize::<f64>(&[]).is_empty());
    }

    #[test]
    fn test_standardize() {
        let z = standardize(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mean: f64 = z.iter().sum::<f64>() / 5.0;
        let var: f64 = z.iter().map(|v| v * v).sum::<f64>() / 5.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
        assert!(z[0] < 0.0 && z[4] > 0.0);
    }

    #[test]
    fn test_standardize_flat() {
        assert_eq!(standardize(&[3.0, 3.0]), vec![3.0, 3.0]);
        assert!(standardize::<f32>(&[]).is_empty());
    }
}
