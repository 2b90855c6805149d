#![warn(missing_docs)]
//! parstats Statistic Workers
//!
//! Three independent, pure computations over a read-only slice of samples:
//! - Arithmetic mean (wide integer accumulator)
//! - Median over a private sorted copy (the input is never reordered)
//! - Population standard deviation (divisor N, mean recomputed locally)
//!
//! None of the functions depend on each other's output, so they can run on
//! any worker in any order.

mod error;
mod summary;

pub use error::StatsError;
pub use summary::{Statistic, Summary, mean, median, std_dev, summarize};

/// Sample element type shared by every worker.
pub type Sample = u32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistic_order() {
        assert_eq!(
            Statistic::ALL,
            [Statistic::Mean, Statistic::Median, Statistic::StdDev]
        );
    }
}
