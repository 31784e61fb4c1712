/// Simple Moving Average (SMA)
/// Returns a vector aligned with `values`:
/// - `None` until enough values exist
/// - `Some(avg)` after `window` values
pub fn sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    // Running sum via scan; the value that falls out of the window is subtracted.
    values
        .iter()
        .enumerate()
        .scan(0.0_f64, move |sum, (i, &v)| {
            *sum += v;
            if i >= window {
                *sum -= values[i - window];
            }

            let out = if i + 1 >= window {
                Some(*sum / window as f64)
            } else {
                None
            };

            Some(out)
        })
        .collect()
}

/// Trailing arithmetic mean of the last `window` values.
///
/// Computed directly over the tail instead of the running sum, so it does not
/// accumulate rounding error on long series. `None` when there are fewer than
/// `window` values.
pub fn trailing_mean(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }

    let tail = &values[values.len() - window..];
    Some(tail.iter().sum::<f64>() / window as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_alignment() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let out = sma(&values, 3);

        assert_eq!(out.len(), values.len());
        assert!(out[0].is_none());
        assert!(out[1].is_none());
        assert_eq!(out[2], Some(2.0));
        assert_eq!(out[3], Some(3.0));
        assert_eq!(out[4], Some(4.0));
    }

    #[test]
    fn test_sma_zero_window() {
        let out = sma(&[1.0, 2.0], 0);
        assert_eq!(out, vec![None, None]);
    }

    #[test]
    fn test_trailing_mean_matches_last_sma_value() {
        let values: Vec<f64> = (0..252).map(|i| 100.0 + (i as f64 * 0.37).sin() * 5.0).collect();

        for window in [50, 200] {
            let last_sma = sma(&values, window).last().copied().flatten().unwrap();
            let mean = trailing_mean(&values, window).unwrap();
            assert!((last_sma - mean).abs() < 1e-9);
        }
    }

    #[test]
    fn test_trailing_mean_needs_full_window() {
        let values = vec![1.0; 199];
        assert_eq!(trailing_mean(&values, 200), None);
        assert_eq!(trailing_mean(&values, 0), None);
        assert_eq!(trailing_mean(&values, 50), Some(1.0));
    }
}
