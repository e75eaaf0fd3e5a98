// Rolling averages for monthly series.

use tracing::warn;

use crate::error::{Result, StatsError};

/// Result of a rolling average, with the window actually used.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingAverage {
    pub values: Vec<f64>,
    pub window: usize,
}

impl RollingAverage {
    /// Points trimmed from each end of the input series.
    pub fn edge(&self) -> usize {
        self.window / 2
    }
}

/// Centered moving average over `window` points, without edge padding.
///
/// The output has `values.len() - window + 1` points, or none if the input is
/// shorter than the window. Even windows are reduced by one.
pub fn rolling_average(values: &[f64], window: usize) -> Result<RollingAverage> {
    if window == 0 {
        return Err(StatsError::InvalidWindow);
    }

    let window = if window % 2 == 0 {
        warn!("window_avg should be odd, decreasing {} by 1", window);
        window - 1
    } else {
        window
    };

    let values = values
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect();

    Ok(RollingAverage { values, window })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_window_is_decremented() {
        let avg = rolling_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 4).unwrap();
        assert_eq!(avg.window, 3);
        assert_eq!(avg.values, vec![2.0, 3.0, 4.0]);
        assert_eq!(avg.edge(), 1);
    }

    #[test]
    fn test_reapplying_corrected_window_is_stable() {
        let data = [0.0, 3.0, 6.0, 3.0, 0.0, 3.0];
        let first = rolling_average(&data, 4).unwrap();
        let second = rolling_average(&data, first.window).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_window_of_one_is_identity() {
        let avg = rolling_average(&[4.0, 2.0], 1).unwrap();
        assert_eq!(avg.values, vec![4.0, 2.0]);
    }

    #[test]
    fn test_short_input_gives_empty_output() {
        let avg = rolling_average(&[1.0, 2.0], 7).unwrap();
        assert!(avg.values.is_empty());
    }

    #[test]
    fn test_zero_window_is_rejected() {
        assert!(matches!(
            rolling_average(&[1.0], 0),
            Err(StatsError::InvalidWindow)
        ));
    }
}
