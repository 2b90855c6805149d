//! Worker Launchers and the Thread Model
//!
//! A [`Launcher`] starts one worker for one task and later collects its
//! output. `join` takes the worker by value, so a worker is collected at most
//! once by construction.

use crate::error::DriverError;
use crate::executor::WorkerModel;
use parstats_core::{SampleSet, WorkerOutput, WorkerTask, run_task, task_statistics};
use parstats_stats::StatsError;
use std::thread::JoinHandle;

/// Starts and collects workers of one [`WorkerModel`]
pub trait Launcher {
    /// Handle to a running worker
    type Worker;

    /// Model this launcher implements
    fn model(&self) -> WorkerModel;

    /// Start a worker for `task`. Returns once the worker exists; does not
    /// wait for it to compute anything.
    fn launch(&self, task: WorkerTask, samples: &SampleSet) -> Result<Self::Worker, DriverError>;

    /// Hand a launched worker its input. Called once per worker, after every
    /// launch returned. Workers that got their input at launch need nothing.
    fn dispatch(&self, _worker: &mut Self::Worker, _samples: &SampleSet) -> Result<(), DriverError> {
        Ok(())
    }

    /// Block until the worker finished and take its output
    fn join(&self, worker: Self::Worker) -> Result<WorkerOutput, DriverError>;
}

/// Diagnostic name of a worker, e.g. `thread worker (median)`
pub fn worker_label(model: WorkerModel, task: WorkerTask) -> String {
    let scope = match task_statistics(task) {
        [statistic] => statistic.name(),
        _ => "all",
    };
    format!("{} worker ({})", model, scope)
}

/// Launches threads that read the shared sample array
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadLauncher;

/// A running thread worker. Its output comes back through its own join handle.
pub struct ThreadWorker {
    task: WorkerTask,
    handle: JoinHandle<Result<WorkerOutput, StatsError>>,
}

impl Launcher for ThreadLauncher {
    type Worker = ThreadWorker;

    fn model(&self) -> WorkerModel {
        WorkerModel::Thread
    }

    fn launch(&self, task: WorkerTask, samples: &SampleSet) -> Result<ThreadWorker, DriverError> {
        let samples = samples.share();
        let handle = std::thread::Builder::new()
            .name(worker_label(WorkerModel::Thread, task))
            .spawn(move || run_task(task, &samples))
            .map_err(|source| DriverError::WorkerLaunchFailure {
                worker: worker_label(WorkerModel::Thread, task),
                source,
            })?;
        Ok(ThreadWorker { task, handle })
    }

    fn join(&self, worker: ThreadWorker) -> Result<WorkerOutput, DriverError> {
        let label = worker_label(WorkerModel::Thread, worker.task);
        match worker.handle.join() {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(DriverError::from_stats(label, e)),
            Err(panic) => {
                let message = if let Some(s) = panic.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                Err(DriverError::WorkerFailed {
                    worker: label,
                    message: format!("panicked: {message}"),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parstats_core::SampleSpec;
    use parstats_stats::{Statistic, summarize};

    #[test]
    fn test_thread_worker_round_trip() {
        let samples = SampleSet::generate(SampleSpec::new(1_001, 101, 5).unwrap());
        let expected = summarize(samples.as_slice()).unwrap();

        let launcher = ThreadLauncher;
        let worker = launcher.launch(WorkerTask::Median, &samples).unwrap();
        match launcher.join(worker).unwrap() {
            WorkerOutput::Scalar(Statistic::Median, value) => assert_eq!(value, expected.median),
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(
            worker_label(WorkerModel::Thread, WorkerTask::StdDev),
            "thread worker (std_dev)"
        );
        assert_eq!(
            worker_label(WorkerModel::Process, WorkerTask::AllThree),
            "process worker (all)"
        );
    }
}
