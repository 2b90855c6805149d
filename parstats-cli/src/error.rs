//! Driver Errors
//!
//! Every variant is fatal to the strategy run that raised it. There is no
//! retry and no partial result.

use parstats_core::DataError;
use parstats_stats::{Statistic, StatsError};
use thiserror::Error;

/// Why a strategy run failed
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum DriverError {
    #[error("{worker}: resource exhaustion: {message}")]
    ResourceExhaustion { worker: String, message: String },

    #[error("{worker}: result channel failure: {message}")]
    ChannelFailure { worker: String, message: String },

    #[error("failed to launch {worker}: {source}")]
    WorkerLaunchFailure {
        worker: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{worker} failed: {message}")]
    WorkerFailed { worker: String, message: String },

    #[error("no worker reported the {0}")]
    MissingResult(Statistic),

    #[error("the {0} was reported more than once")]
    DuplicateResult(Statistic),

    #[error("failed to report results: {0}")]
    ReportFailed(#[source] std::io::Error),

    #[error(transparent)]
    Data(#[from] DataError),
}

impl DriverError {
    /// Attach a statistic failure to the worker that raised it
    pub fn from_stats(worker: impl Into<String>, error: StatsError) -> Self {
        let worker = worker.into();
        match error {
            StatsError::ResourceExhaustion { .. } => DriverError::ResourceExhaustion {
                worker,
                message: error.to_string(),
            },
            StatsError::EmptySample => DriverError::WorkerFailed {
                worker,
                message: error.to_string(),
            },
        }
    }

    pub(crate) fn channel(worker: impl Into<String>, message: impl Into<String>) -> Self {
        DriverError::ChannelFailure {
            worker: worker.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_error_mapping() {
        let err = DriverError::from_stats(
            "thread worker (median)",
            StatsError::ResourceExhaustion { requested: 10 },
        );
        assert!(matches!(err, DriverError::ResourceExhaustion { .. }));
        assert!(err.to_string().starts_with("thread worker (median)"));

        let err = DriverError::from_stats("sequential", StatsError::EmptySample);
        assert!(matches!(err, DriverError::WorkerFailed { .. }));
    }

    #[test]
    fn test_missing_result_message() {
        assert_eq!(
            DriverError::MissingResult(Statistic::StdDev).to_string(),
            "no worker reported the std_dev"
        );
    }
}
