//! Output Formatting
//!
//! Human-readable section per strategy run, written as soon as the run is
//! done. Labels and precision are fixed: three decimals for every statistic
//! and latency.

use super::driver::StrategyOutcome;
use super::strategy::{Strategy, WorkerModel};

/// Section title of a run
pub fn section_title(outcome: &StrategyOutcome) -> &'static str {
    match (outcome.run.strategy(), outcome.run.model()) {
        (Strategy::Sequential, _) | (_, None) => "Sequencial (1 thread)",
        (Strategy::SingleWorker, Some(WorkerModel::Thread)) => "1 Thread (todas as estatísticas)",
        (Strategy::PerStatistic, Some(WorkerModel::Thread)) => "3 Threads",
        (Strategy::SingleWorker, Some(WorkerModel::Process)) => "1 Processo (filho único)",
        (Strategy::PerStatistic, Some(WorkerModel::Process)) => "3 Processos",
    }
}

/// Format one run for terminal display, including the trailing blank line
pub fn format_outcome(outcome: &StrategyOutcome) -> String {
    let mut output = String::new();
    let summary = &outcome.summary;

    output.push_str(&format!("=== {} ===\n", section_title(outcome)));
    output.push_str(&format!("Média   = {:.3}\n", summary.mean));
    output.push_str(&format!("Mediana = {:.3}\n", summary.median));
    output.push_str(&format!("Desvio  = {:.3}\n", summary.std_dev));

    let timing = &outcome.timing;
    match outcome.run.model() {
        None => {
            output.push_str(&format!(
                "Tempo total sequencial: {:.3} ms\n",
                timing.total_ms()
            ));
        }
        Some(model) => {
            let (worker, joined) = match model {
                WorkerModel::Thread => ("thread", "join"),
                WorkerModel::Process => ("processo", "wait"),
            };
            let plural = if outcome.workers > 1 { "s" } else { "" };
            output.push_str(&format!(
                "Tempo criação {}{}: {:.3} ms\n",
                worker,
                plural,
                timing.creation_ms()
            ));
            output.push_str(&format!(
                "Tempo total (inclui {}): {:.3} ms\n",
                joined,
                timing.total_ms()
            ));
        }
    }

    output.push('\n');
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::PlannedRun;
    use parstats_core::TimingRecord;
    use parstats_stats::Summary;
    use std::time::Duration;

    fn outcome(run: PlannedRun) -> StrategyOutcome {
        StrategyOutcome {
            run,
            workers: run.worker_count(),
            summary: Summary {
                mean: 50.0123,
                median: 50.0,
                std_dev: 29.1556,
            },
            timing: TimingRecord {
                creation: Duration::from_micros(125),
                total: Duration::from_micros(2_500),
            },
        }
    }

    #[test]
    fn test_sequential_section() {
        let text = format_outcome(&outcome(PlannedRun::sequential()));
        assert_eq!(
            text,
            "=== Sequencial (1 thread) ===\n\
             Média   = 50.012\n\
             Mediana = 50.000\n\
             Desvio  = 29.156\n\
             Tempo total sequencial: 2.500 ms\n\n"
        );
    }

    #[test]
    fn test_worker_sections() {
        let text = format_outcome(&outcome(PlannedRun::new(
            Strategy::PerStatistic,
            WorkerModel::Thread,
        )));
        assert!(text.starts_with("=== 3 Threads ===\n"));
        assert!(text.contains("Tempo criação threads: 0.125 ms\n"));
        assert!(text.contains("Tempo total (inclui join): 2.500 ms\n"));

        let text = format_outcome(&outcome(PlannedRun::new(
            Strategy::SingleWorker,
            WorkerModel::Process,
        )));
        assert!(text.starts_with("=== 1 Processo (filho único) ===\n"));
        assert!(text.contains("Tempo criação processo: 0.125 ms\n"));
        assert!(text.contains("Tempo total (inclui wait): 2.500 ms\n"));
    }

    #[test]
    fn test_process_sections() {
        let text = format_outcome(&outcome(PlannedRun::new(
            Strategy::PerStatistic,
            WorkerModel::Process,
        )));
        assert!(text.starts_with("=== 3 Processos ===\n"));
        assert!(text.contains("Tempo criação processos: 0.125 ms\n"));
        assert!(text.ends_with("\n\n"));
    }
}
