//! # Statistics Engine
//!
//! Stateless aggregate primitives used by reporting and adaptive thresholds.
//! Every function returns `None` for empty input instead of inventing a value.

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance
pub fn variance(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - avg).powi(2)).sum();
    Some(sum_sq / values.len() as f64)
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

/// Nearest-rank percentile. `pct` is clamped to `[0, 100]`; `0` yields the
/// minimum and `100` the maximum.
pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    if values.is_empty() || pct.is_nan() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pct = pct.clamp(0.0, 100.0);
    let rank = (pct * sorted.len() as f64 / 100.0).ceil() as usize;
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    Some(sorted[index])
}

/// Median (mean of the two middle values for even-length input)
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Simple moving average over a trailing window. Returns one value per full
/// window, so the output has `len - window + 1` entries; empty when the input
/// is shorter than the window or the window is zero.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || values.len() < window {
        return Vec::new();
    }
    values
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}

/// Exponentially weighted moving average, seeded with the first value.
/// `alpha` is clamped to `[0, 1]`.
pub fn exponential_moving_average(values: &[f64], alpha: f64) -> Option<f64> {
    let (first, rest) = values.split_first()?;
    let alpha = alpha.clamp(0.0, 1.0);
    Some(
        rest.iter()
            .fold(*first, |acc, value| alpha * value + (1.0 - alpha) * acc),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_empty_input_yields_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(variance(&[]), None);
        assert_eq!(percentile(&[], 50.0), None);
        assert_eq!(median(&[]), None);
        assert_eq!(exponential_moving_average(&[], 0.5), None);
        assert!(moving_average(&[], 3).is_empty());
    }

    #[test]
    fn test_mean_and_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values).unwrap() - 5.0).abs() < EPSILON);
        assert!((variance(&values).unwrap() - 4.0).abs() < EPSILON);
        assert!((std_dev(&values).unwrap() - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_nearest_rank_percentile() {
        let values = [15.0, 20.0, 35.0, 40.0, 50.0];
        assert_eq!(percentile(&values, 0.0), Some(15.0));
        assert_eq!(percentile(&values, 30.0), Some(20.0));
        assert_eq!(percentile(&values, 40.0), Some(20.0));
        assert_eq!(percentile(&values, 50.0), Some(35.0));
        assert_eq!(percentile(&values, 100.0), Some(50.0));
        assert_eq!(percentile(&values, 250.0), Some(50.0));
    }

    #[test]
    fn test_percentile_ignores_input_order() {
        assert_eq!(percentile(&[9.0, 1.0, 5.0], 50.0), Some(5.0));
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_moving_average_windows() {
        let averages = moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(averages, vec![2.0, 3.0, 4.0]);
        assert!(moving_average(&[1.0, 2.0], 3).is_empty());
        assert!(moving_average(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn test_exponential_moving_average() {
        let ema = exponential_moving_average(&[10.0, 20.0], 0.5).unwrap();
        assert!((ema - 15.0).abs() < EPSILON);
        assert_eq!(exponential_moving_average(&[10.0, 20.0], 0.0), Some(10.0));
    }
}
