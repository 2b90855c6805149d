//! Strategies and Plans
//!
//! A [`Strategy`] says how the three statistics are split across workers; a
//! [`WorkerModel`] says what a worker is. A [`Plan`] is the ordered list of
//! runs one invocation performs.

use parstats_core::WorkerTask;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the three computations are distributed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Everything inline on the driver, no workers
    Sequential,
    /// One worker computes all three statistics
    SingleWorker,
    /// One worker per statistic
    PerStatistic,
}

impl Strategy {
    /// All strategies, in plan order
    pub const ALL: [Strategy; 3] = [
        Strategy::Sequential,
        Strategy::SingleWorker,
        Strategy::PerStatistic,
    ];

    /// Config/CLI spelling
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::SingleWorker => "single-worker",
            Strategy::PerStatistic => "per-statistic",
        }
    }

    /// Tasks handed to workers, one per worker
    pub fn tasks(self) -> &'static [WorkerTask] {
        match self {
            Strategy::Sequential | Strategy::SingleWorker => &[WorkerTask::AllThree],
            Strategy::PerStatistic => &[WorkerTask::Mean, WorkerTask::Median, WorkerTask::StdDev],
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" | "seq" => Ok(Strategy::Sequential),
            "single-worker" | "single" => Ok(Strategy::SingleWorker),
            "per-statistic" | "per-stat" => Ok(Strategy::PerStatistic),
            other => Err(format!("Unknown strategy: {}", other)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a worker is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkerModel {
    /// Thread sharing the sample array read-only
    Thread,
    /// Isolated process holding a private copy of the sample array
    Process,
}

impl WorkerModel {
    /// All models, in plan order
    pub const ALL: [WorkerModel; 2] = [WorkerModel::Thread, WorkerModel::Process];

    /// Config/CLI spelling
    pub fn name(self) -> &'static str {
        match self {
            WorkerModel::Thread => "thread",
            WorkerModel::Process => "process",
        }
    }
}

impl FromStr for WorkerModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "thread" | "threads" => Ok(WorkerModel::Thread),
            "process" | "processes" => Ok(WorkerModel::Process),
            other => Err(format!("Unknown worker model: {}", other)),
        }
    }
}

impl fmt::Display for WorkerModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One strategy run. Only sequential runs have no worker model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlannedRun {
    strategy: Strategy,
    model: Option<WorkerModel>,
}

impl PlannedRun {
    /// The inline run
    pub fn sequential() -> Self {
        Self {
            strategy: Strategy::Sequential,
            model: None,
        }
    }

    /// A run with workers of `model`; sequential ignores the model
    pub fn new(strategy: Strategy, model: WorkerModel) -> Self {
        match strategy {
            Strategy::Sequential => Self::sequential(),
            _ => Self {
                strategy,
                model: Some(model),
            },
        }
    }

    /// Strategy of this run
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Worker model, `None` for sequential runs
    pub fn model(&self) -> Option<WorkerModel> {
        self.model
    }

    /// Number of workers this run launches
    pub fn worker_count(&self) -> usize {
        match self.model {
            Some(_) => self.strategy.tasks().len(),
            None => 0,
        }
    }
}

impl fmt::Display for PlannedRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.model {
            Some(model) => write!(f, "{}/{}", self.strategy, model),
            None => write!(f, "{}", self.strategy),
        }
    }
}

/// Ordered list of runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    runs: Vec<PlannedRun>,
}

impl Plan {
    /// Build a plan from the selected strategies and models.
    ///
    /// Order is fixed regardless of selection order: sequential first, then
    /// the concurrent strategies grouped by model (threads before processes).
    /// Duplicates collapse.
    pub fn build(strategies: &[Strategy], models: &[WorkerModel]) -> Self {
        let mut runs = Vec::new();
        if strategies.contains(&Strategy::Sequential) {
            runs.push(PlannedRun::sequential());
        }
        for model in WorkerModel::ALL {
            if !models.contains(&model) {
                continue;
            }
            for strategy in [Strategy::SingleWorker, Strategy::PerStatistic] {
                if strategies.contains(&strategy) {
                    runs.push(PlannedRun::new(strategy, model));
                }
            }
        }
        Self { runs }
    }

    /// Runs in execution order
    pub fn runs(&self) -> &[PlannedRun] {
        &self.runs
    }

    /// Whether there is nothing to run
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Whether any run uses `model`
    pub fn uses(&self, model: WorkerModel) -> bool {
        self.runs.iter().any(|run| run.model() == Some(model))
    }
}

impl Default for Plan {
    fn default() -> Self {
        Self::build(&Strategy::ALL, &WorkerModel::ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_plan_order() {
        let labels: Vec<String> = Plan::default().runs().iter().map(|r| r.to_string()).collect();
        assert_eq!(
            labels,
            vec![
                "sequential",
                "single-worker/thread",
                "per-statistic/thread",
                "single-worker/process",
                "per-statistic/process",
            ]
        );
    }

    #[test]
    fn test_plan_ignores_selection_order_and_duplicates() {
        let plan = Plan::build(
            &[Strategy::PerStatistic, Strategy::Sequential, Strategy::PerStatistic],
            &[WorkerModel::Process, WorkerModel::Thread],
        );
        assert_eq!(
            plan.runs(),
            &[
                PlannedRun::sequential(),
                PlannedRun::new(Strategy::PerStatistic, WorkerModel::Thread),
                PlannedRun::new(Strategy::PerStatistic, WorkerModel::Process),
            ]
        );
    }

    #[test]
    fn test_sequential_needs_no_model() {
        let plan = Plan::build(&[Strategy::Sequential], &[]);
        assert_eq!(plan.runs(), &[PlannedRun::sequential()]);
        assert!(Plan::build(&[Strategy::SingleWorker], &[]).is_empty());
    }

    #[test]
    fn test_worker_counts() {
        assert_eq!(PlannedRun::sequential().worker_count(), 0);
        assert_eq!(
            PlannedRun::new(Strategy::Sequential, WorkerModel::Process),
            PlannedRun::sequential()
        );
        assert_eq!(
            PlannedRun::new(Strategy::SingleWorker, WorkerModel::Thread).worker_count(),
            1
        );
        assert_eq!(
            PlannedRun::new(Strategy::PerStatistic, WorkerModel::Process).worker_count(),
            3
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!("per-statistic".parse::<Strategy>(), Ok(Strategy::PerStatistic));
        assert_eq!("Single".parse::<Strategy>(), Ok(Strategy::SingleWorker));
        assert_eq!("processes".parse::<WorkerModel>(), Ok(WorkerModel::Process));
        assert!("fiber".parse::<WorkerModel>().is_err());
    }
}
