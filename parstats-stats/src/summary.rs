//! Summary Statistics
//!
//! Mean, median and population standard deviation over integer samples.
//! Each function takes the full sample by shared reference and never writes to it.

use crate::{Sample, StatsError};
use std::fmt;

/// One of the three statistics a worker can be asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    /// Arithmetic mean
    Mean,
    /// Middle value (mean of the two central values for even N)
    Median,
    /// Population standard deviation
    StdDev,
}

impl Statistic {
    /// All statistics, in reporting order
    pub const ALL: [Statistic; 3] = [Statistic::Mean, Statistic::Median, Statistic::StdDev];

    /// Stable machine-readable name
    pub fn name(self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Median => "median",
            Statistic::StdDev => "std_dev",
        }
    }

    /// Compute this statistic over `samples`
    pub fn compute(self, samples: &[Sample]) -> Result<f64, StatsError> {
        match self {
            Statistic::Mean => mean(samples),
            Statistic::Median => median(samples),
            Statistic::StdDev => std_dev(samples),
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The three statistics of one sample
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    /// Arithmetic mean
    pub mean: f64,
    /// Median
    pub median: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

impl Summary {
    /// Value of a single statistic
    pub fn get(&self, statistic: Statistic) -> f64 {
        match statistic {
            Statistic::Mean => self.mean,
            Statistic::Median => self.median,
            Statistic::StdDev => self.std_dev,
        }
    }

    /// Whether every statistic matches `other` within `epsilon`
    pub fn approx_eq(&self, other: &Summary, epsilon: f64) -> bool {
        Statistic::ALL
            .iter()
            .all(|&s| (self.get(s) - other.get(s)).abs() <= epsilon)
    }
}

/// Arithmetic mean.
///
/// The sum is accumulated in a `u64`, which holds `N * u32::MAX` for any `N`
/// that fits in memory.
pub fn mean(samples: &[Sample]) -> Result<f64, StatsError> {
    if samples.is_empty() {
        return Err(StatsError::EmptySample);
    }
    let sum: u64 = samples.iter().map(|&x| u64::from(x)).sum();
    Ok(sum as f64 / samples.len() as f64)
}

/// Median over a private sorted copy of `samples`.
///
/// Fails with [`StatsError::ResourceExhaustion`] if the copy cannot be
/// allocated; it never falls back to sorting the input.
pub fn median(samples: &[Sample]) -> Result<f64, StatsError> {
    if samples.is_empty() {
        return Err(StatsError::EmptySample);
    }

    let mut sorted: Vec<Sample> = Vec::new();
    sorted
        .try_reserve_exact(samples.len())
        .map_err(|_| StatsError::ResourceExhaustion {
            requested: samples.len(),
        })?;
    sorted.extend_from_slice(samples);
    sorted.sort_unstable();

    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 1 {
        f64::from(sorted[mid])
    } else {
        (f64::from(sorted[mid - 1]) + f64::from(sorted[mid])) / 2.0
    };
    Ok(median)
}

/// Population standard deviation (divisor N).
///
/// Recomputes the mean itself instead of taking one from another worker.
pub fn std_dev(samples: &[Sample]) -> Result<f64, StatsError> {
    let mean = mean(samples)?;
    let variance = samples
        .iter()
        .map(|&x| {
            let d = f64::from(x) - mean;
            d * d
        })
        .sum::<f64>()
        / samples.len() as f64;
    Ok(variance.sqrt())
}

/// All three statistics computed inline, one after another
pub fn summarize(samples: &[Sample]) -> Result<Summary, StatsError> {
    Ok(Summary {
        mean: mean(samples)?,
        median: median(samples)?,
        std_dev: std_dev(samples)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_summary() {
        let samples = [1, 2, 3, 4, 5];
        let summary = summarize(&samples).unwrap();

        assert!((summary.mean - 3.0).abs() < f64::EPSILON);
        assert!((summary.median - 3.0).abs() < f64::EPSILON);
        assert!((summary.std_dev - 2.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(format!("{:.3}", summary.std_dev), "1.414");
    }

    #[test]
    fn test_all_zero() {
        let samples = vec![0u32; 1000];
        let summary = summarize(&samples).unwrap();

        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn test_single_sample() {
        let summary = summarize(&[42]).unwrap();

        assert!((summary.mean - 42.0).abs() < f64::EPSILON);
        assert!((summary.median - 42.0).abs() < f64::EPSILON);
        assert!(summary.std_dev.abs() < f64::EPSILON);
    }

    #[test]
    fn test_median_odd_takes_middle() {
        assert!((median(&[9, 1, 5]).unwrap() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_median_even_averages_central_pair() {
        assert!((median(&[4, 1, 3, 2]).unwrap() - 2.5).abs() < f64::EPSILON);
        // Central pair straddling a duplicate run
        assert!((median(&[7, 7, 1, 7]).unwrap() - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_median_does_not_reorder_input() {
        let samples = vec![5, 3, 9, 1, 7];
        let before = samples.clone();
        median(&samples).unwrap();
        assert_eq!(samples, before);
    }

    #[test]
    fn test_median_order_independent() {
        let samples = vec![13, 2, 99, 40, 40, 0, 7, 61];
        let mut sorted = samples.clone();
        sorted.sort_unstable();

        assert_eq!(median(&samples).unwrap(), median(&sorted).unwrap());
    }

    #[test]
    fn test_std_dev_is_population() {
        // Population variance of [2, 4, 4, 4, 5, 5, 7, 9] is exactly 4
        let samples = [2, 4, 4, 4, 5, 5, 7, 9];
        assert!((std_dev(&samples).unwrap() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mean_large_values() {
        let samples = vec![u32::MAX; 4];
        assert!((mean(&samples).unwrap() - f64::from(u32::MAX)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_samples() {
        assert_eq!(mean(&[]), Err(StatsError::EmptySample));
        assert_eq!(median(&[]), Err(StatsError::EmptySample));
        assert_eq!(std_dev(&[]), Err(StatsError::EmptySample));
    }

    #[test]
    fn test_compute_dispatch() {
        let samples = [1, 2, 3, 4, 5];
        let summary = summarize(&samples).unwrap();
        for statistic in Statistic::ALL {
            assert_eq!(statistic.compute(&samples).unwrap(), summary.get(statistic));
        }
    }

    #[test]
    fn test_approx_eq() {
        let a = Summary {
            mean: 1.0,
            median: 2.0,
            std_dev: 3.0,
        };
        let b = Summary {
            std_dev: 3.0 + 1e-12,
            ..a
        };
        assert!(a.approx_eq(&b, 1e-9));
        assert!(!a.approx_eq(&Summary::default(), 1e-9));
    }
}
