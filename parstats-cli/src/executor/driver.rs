//! Execution Driver
//!
//! Runs one [`PlannedRun`] at a time: launch every worker the strategy needs,
//! dispatch their input, join all of them, assemble the three statistics and
//! hand the outcome to the caller's sink. Runs never overlap.

use super::strategy::{Plan, PlannedRun, WorkerModel};
use super::threads::{Launcher, ThreadLauncher};
use crate::error::DriverError;
use crate::supervisor::ProcessLauncher;
use parstats_core::{
    Clock, DataError, SampleSet, Stopwatch, TimingRecord, WorkerOutput, run_task,
};
use parstats_ipc::{MAX_REQUEST_SAMPLES, WorkerTask};
use parstats_stats::{Statistic, Summary};

/// Lifecycle of a single strategy run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Nothing started yet
    Init,
    /// Every launch call returned
    WorkersLaunched,
    /// Every worker was collected
    WorkersJoined,
    /// The outcome went to the sink
    Reported,
    /// Finished
    Done,
}

impl RunState {
    /// The state that follows, `None` once done
    pub fn next(self) -> Option<RunState> {
        match self {
            RunState::Init => Some(RunState::WorkersLaunched),
            RunState::WorkersLaunched => Some(RunState::WorkersJoined),
            RunState::WorkersJoined => Some(RunState::Reported),
            RunState::Reported => Some(RunState::Done),
            RunState::Done => None,
        }
    }

    fn advance(&mut self, run: &PlannedRun) {
        if let Some(next) = self.next() {
            tracing::debug!(run = %run, from = ?*self, to = ?next, "run state");
            *self = next;
        }
    }
}

/// Result of one completed strategy run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyOutcome {
    /// The run this outcome belongs to
    pub run: PlannedRun,
    /// Workers launched (0 for sequential)
    pub workers: usize,
    /// Assembled statistics
    pub summary: Summary,
    /// Creation and total latency
    pub timing: TimingRecord,
}

/// Drives strategy runs over one sample set
pub struct Driver<'a> {
    samples: &'a SampleSet,
    clock: &'a dyn Clock,
    process: Option<ProcessLauncher>,
}

impl<'a> Driver<'a> {
    /// Driver whose process workers re-execute the current binary
    pub fn new(samples: &'a SampleSet, clock: &'a dyn Clock) -> Self {
        Self {
            samples,
            clock,
            process: None,
        }
    }

    /// Use `launcher` for process workers
    pub fn with_process_launcher(mut self, launcher: ProcessLauncher) -> Self {
        self.process = Some(launcher);
        self
    }

    /// Execute every run of `plan` in order.
    ///
    /// `sink` sees each outcome as soon as its run finished, before the next
    /// run starts. The first failing run aborts the plan.
    pub fn run_plan<F>(&self, plan: &Plan, mut sink: F) -> Result<Vec<StrategyOutcome>, DriverError>
    where
        F: FnMut(&StrategyOutcome) -> std::io::Result<()>,
    {
        let mut outcomes = Vec::with_capacity(plan.runs().len());
        for run in plan.runs() {
            outcomes.push(self.run(*run, &mut sink)?);
        }
        Ok(outcomes)
    }

    /// Execute a single run and report it through `sink`
    pub fn run<F>(&self, run: PlannedRun, sink: &mut F) -> Result<StrategyOutcome, DriverError>
    where
        F: FnMut(&StrategyOutcome) -> std::io::Result<()>,
    {
        let mut state = RunState::Init;
        tracing::info!(run = %run, workers = run.worker_count(), "starting run");

        let (outputs, timing) = match run.model() {
            None => self.run_inline(&run, &mut state)?,
            Some(WorkerModel::Thread) => self.run_workers(&ThreadLauncher, &run, &mut state)?,
            Some(WorkerModel::Process) => {
                check_process_payload(self.samples.len())?;
                let launcher = match &self.process {
                    Some(launcher) => launcher.clone(),
                    None => ProcessLauncher::current_exe().map_err(|source| {
                        DriverError::WorkerLaunchFailure {
                            worker: "process worker".to_string(),
                            source,
                        }
                    })?,
                };
                self.run_workers(&launcher, &run, &mut state)?
            }
        };

        let outcome = StrategyOutcome {
            run,
            workers: run.worker_count(),
            summary: assemble(&outputs)?,
            timing,
        };

        sink(&outcome).map_err(DriverError::ReportFailed)?;
        state.advance(&run);

        tracing::info!(
            run = %run,
            creation_ms = outcome.timing.creation_ms(),
            total_ms = outcome.timing.total_ms(),
            "run finished"
        );
        state.advance(&run);
        Ok(outcome)
    }

    /// Sequential strategy: everything on the calling thread, nothing launched
    fn run_inline(
        &self,
        run: &PlannedRun,
        state: &mut RunState,
    ) -> Result<(Vec<WorkerOutput>, TimingRecord), DriverError> {
        let watch = Stopwatch::start(self.clock);
        state.advance(run);
        let output = run_task(WorkerTask::AllThree, self.samples.as_slice())
            .map_err(|e| DriverError::from_stats("sequential", e))?;
        let timing = watch.finish();
        state.advance(run);
        Ok((vec![output], timing))
    }

    fn run_workers<L: Launcher>(
        &self,
        launcher: &L,
        run: &PlannedRun,
        state: &mut RunState,
    ) -> Result<(Vec<WorkerOutput>, TimingRecord), DriverError> {
        let tasks = run.strategy().tasks();
        let mut watch = Stopwatch::start(self.clock);

        let mut workers = Vec::with_capacity(tasks.len());
        for &task in tasks {
            match launcher.launch(task, self.samples) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    tracing::error!(run = %run, error = %e, "launch failed, draining started workers");
                    for worker in workers {
                        let _ = launcher.join(worker);
                    }
                    return Err(e);
                }
            }
        }
        watch.mark_launched();
        state.advance(run);

        let mut first_error = None;
        for worker in &mut workers {
            if let Err(e) = launcher.dispatch(worker, self.samples) {
                tracing::error!(run = %run, error = %e, "dispatch failed, draining workers");
                first_error = Some(e);
                break;
            }
        }

        // Join all of them even after a failure so nothing is left running.
        let mut outputs = Vec::with_capacity(workers.len());
        for worker in workers {
            match launcher.join(worker) {
                Ok(output) => outputs.push(output),
                Err(e) => {
                    tracing::warn!(run = %run, model = %launcher.model(), error = %e, "worker failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        let timing = watch.finish();
        state.advance(run);

        match first_error {
            Some(e) => Err(e),
            None => Ok((outputs, timing)),
        }
    }
}

/// Reject sample sets too large to ship to a process worker in one request
pub fn check_process_payload(count: usize) -> Result<(), DriverError> {
    if count > MAX_REQUEST_SAMPLES {
        return Err(DriverError::Data(DataError::InvalidSpec(format!(
            "count {count} exceeds the {MAX_REQUEST_SAMPLES} samples a process worker can receive"
        ))));
    }
    Ok(())
}

fn slot(statistic: Statistic) -> usize {
    match statistic {
        Statistic::Mean => 0,
        Statistic::Median => 1,
        Statistic::StdDev => 2,
    }
}

/// Combine worker outputs into one summary, each statistic filled exactly once
pub fn assemble(outputs: &[WorkerOutput]) -> Result<Summary, DriverError> {
    let mut slots: [Option<f64>; 3] = [None; 3];
    let mut fill = |statistic: Statistic, value: f64| -> Result<(), DriverError> {
        let entry = &mut slots[slot(statistic)];
        if entry.is_some() {
            return Err(DriverError::DuplicateResult(statistic));
        }
        *entry = Some(value);
        Ok(())
    };

    for output in outputs {
        match *output {
            WorkerOutput::Summary(summary) => {
                for statistic in Statistic::ALL {
                    fill(statistic, summary.get(statistic))?;
                }
            }
            WorkerOutput::Scalar(statistic, value) => fill(statistic, value)?,
        }
    }

    let take = |statistic: Statistic| slots[slot(statistic)].ok_or(DriverError::MissingResult(statistic));
    Ok(Summary {
        mean: take(Statistic::Mean)?,
        median: take(Statistic::Median)?,
        std_dev: take(Statistic::StdDev)?,
    })
}
