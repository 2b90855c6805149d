use thiserror::Error;

/// Errors a statistic worker can raise
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("cannot compute a statistic over an empty sample")]
    EmptySample,

    #[error("out of memory reserving {requested} samples for the median working copy")]
    ResourceExhaustion { requested: usize },
}
