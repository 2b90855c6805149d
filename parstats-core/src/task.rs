//! Worker Tasks
//!
//! Maps a [`WorkerTask`] onto the statistic workers. Sequential runs, thread
//! workers and worker processes all go through [`run_task`].

use parstats_ipc::{WorkerMessage, WorkerTask};
use parstats_stats::{Sample, Statistic, StatsError, Summary, summarize};

/// What a worker hands back to the driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkerOutput {
    /// All three statistics from a single worker
    Summary(Summary),
    /// One statistic from a per-statistic worker
    Scalar(Statistic, f64),
}

impl WorkerOutput {
    /// Encode as the worker's final protocol message
    pub fn to_message(self) -> WorkerMessage {
        match self {
            WorkerOutput::Summary(s) => WorkerMessage::Summary {
                mean: s.mean,
                median: s.median,
                std_dev: s.std_dev,
            },
            WorkerOutput::Scalar(statistic, value) => WorkerMessage::Scalar {
                task: task_for(statistic),
                value,
            },
        }
    }

    /// Decode a worker's result message; `None` for anything that is not a result
    pub fn from_message(message: &WorkerMessage) -> Option<Self> {
        match *message {
            WorkerMessage::Summary {
                mean,
                median,
                std_dev,
            } => Some(WorkerOutput::Summary(Summary {
                mean,
                median,
                std_dev,
            })),
            WorkerMessage::Scalar { task, value } => match task_statistics(task) {
                [statistic] => Some(WorkerOutput::Scalar(*statistic, value)),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Statistics a task is responsible for
pub fn task_statistics(task: WorkerTask) -> &'static [Statistic] {
    match task {
        WorkerTask::AllThree => &Statistic::ALL,
        WorkerTask::Mean => &[Statistic::Mean],
        WorkerTask::Median => &[Statistic::Median],
        WorkerTask::StdDev => &[Statistic::StdDev],
    }
}

fn task_for(statistic: Statistic) -> WorkerTask {
    match statistic {
        Statistic::Mean => WorkerTask::Mean,
        Statistic::Median => WorkerTask::Median,
        Statistic::StdDev => WorkerTask::StdDev,
    }
}

/// Run `task` over a read-only view of the samples
pub fn run_task(task: WorkerTask, samples: &[Sample]) -> Result<WorkerOutput, StatsError> {
    match task_statistics(task) {
        [statistic] => Ok(WorkerOutput::Scalar(*statistic, statistic.compute(samples)?)),
        _ => Ok(WorkerOutput::Summary(summarize(samples)?)),
    }
}
