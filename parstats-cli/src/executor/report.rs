//! Report Building
//!
//! Converts driver outcomes into the serializable [`Report`].

use super::driver::StrategyOutcome;
use parstats_core::SampleSpec;
use parstats_report::{
    Report, ReportMeta, RunRecord, RunStatistics, RunTiming, SCHEMA_VERSION, SampleInfo,
};

/// Build a report for `outcomes`, all computed over samples drawn from `spec`
pub fn build_report(outcomes: &[StrategyOutcome], spec: &SampleSpec, clock: &str) -> Report {
    let runs = outcomes
        .iter()
        .map(|outcome| RunRecord {
            strategy: outcome.run.strategy().name().to_string(),
            model: outcome.run.model().map(|m| m.name().to_string()),
            workers: outcome.workers,
            statistics: RunStatistics {
                mean: outcome.summary.mean,
                median: outcome.summary.median,
                std_dev: outcome.summary.std_dev,
            },
            timing: RunTiming {
                creation_ms: outcome.timing.creation_ms(),
                total_ms: outcome.timing.total_ms(),
            },
        })
        .collect();

    Report {
        meta: ReportMeta {
            schema_version: SCHEMA_VERSION,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
            clock: clock.to_string(),
            samples: SampleInfo {
                count: spec.count(),
                range: spec.range(),
                seed: spec.seed(),
            },
        },
        runs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{PlannedRun, Strategy, WorkerModel};
    use parstats_core::TimingRecord;
    use parstats_stats::Summary;

    #[test]
    fn test_build_report() {
        let summary = Summary {
            mean: 3.0,
            median: 3.0,
            std_dev: 1.5,
        };
        let outcomes = [
            StrategyOutcome {
                run: PlannedRun::sequential(),
                workers: 0,
                summary,
                timing: TimingRecord::default(),
            },
            StrategyOutcome {
                run: PlannedRun::new(Strategy::PerStatistic, WorkerModel::Process),
                workers: 3,
                summary,
                timing: TimingRecord::default(),
            },
        ];
        let spec = SampleSpec::new(5, 10, 42).unwrap();
        let report = build_report(&outcomes, &spec, "monotonic");

        assert_eq!(report.meta.samples.count, 5);
        assert_eq!(report.meta.samples.seed, 42);
        assert_eq!(report.meta.clock, "monotonic");
        assert_eq!(report.runs.len(), 2);
        assert_eq!(report.runs[0].model, None);
        assert_eq!(report.runs[1].label(), "per-statistic/process");
        assert_eq!(report.runs[1].workers, 3);
        assert!(report.check_consistency(1e-9).is_ok());
    }
}
