//! Report Data Structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current JSON schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Complete run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub runs: Vec<RunRecord>,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    pub schema_version: u32,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    /// Timing source used for every run
    pub clock: String,
    pub samples: SampleInfo,
}

/// Shape of the sample array every run worked on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleInfo {
    pub count: usize,
    pub range: u32,
    pub seed: u64,
}

/// One strategy run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Strategy identifier (`sequential`, `single-worker`, `per-statistic`)
    pub strategy: String,
    /// Worker model (`thread`, `process`), absent for sequential runs
    pub model: Option<String>,
    /// Number of workers launched
    pub workers: usize,
    pub statistics: RunStatistics,
    pub timing: RunTiming,
}

/// The three statistics a run produced
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

impl RunStatistics {
    fn differs_from(&self, other: &RunStatistics, epsilon: f64) -> Option<(&'static str, f64, f64)> {
        [
            ("mean", self.mean, other.mean),
            ("median", self.median, other.median),
            ("std_dev", self.std_dev, other.std_dev),
        ]
        .into_iter()
        .find(|(_, a, b)| (a - b).abs() > epsilon)
    }
}

/// Latencies of a run, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunTiming {
    pub creation_ms: f64,
    pub total_ms: f64,
}

/// A run whose statistics disagree with the first run
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    /// Label of the first run
    pub reference: String,
    /// Label of the disagreeing run
    pub run: String,
    /// Statistic that differs
    pub statistic: &'static str,
    /// Value of the first run
    pub expected: f64,
    /// Value of the disagreeing run
    pub actual: f64,
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} reported {} = {} but {} reported {}",
            self.run, self.statistic, self.actual, self.reference, self.expected
        )
    }
}

impl RunRecord {
    /// `strategy` or `strategy/model`
    pub fn label(&self) -> String {
        match &self.model {
            Some(model) => format!("{}/{}", self.strategy, model),
            None => self.strategy.clone(),
        }
    }
}

impl Report {
    /// Check that every run computed the same statistics as the first one
    pub fn check_consistency(&self, epsilon: f64) -> Result<(), Vec<Mismatch>> {
        let Some(reference) = self.runs.first() else {
            return Ok(());
        };

        let mismatches: Vec<Mismatch> = self.runs[1..]
            .iter()
            .filter_map(|run| {
                run.statistics
                    .differs_from(&reference.statistics, epsilon)
                    .map(|(statistic, actual, expected)| Mismatch {
                        reference: reference.label(),
                        run: run.label(),
                        statistic,
                        expected,
                        actual,
                    })
            })
            .collect();

        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(mismatches)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{generate_json_report, parse_json_report};

    fn run(strategy: &str, model: Option<&str>, mean: f64) -> RunRecord {
        RunRecord {
            strategy: strategy.to_string(),
            model: model.map(str::to_string),
            workers: 1,
            statistics: RunStatistics {
                mean,
                median: 50.0,
                std_dev: 29.0,
            },
            timing: RunTiming {
                creation_ms: 0.1,
                total_ms: 0.5,
            },
        }
    }

    fn report(runs: Vec<RunRecord>) -> Report {
        Report {
            meta: ReportMeta {
                schema_version: SCHEMA_VERSION,
                version: "0.1.0".to_string(),
                timestamp: Utc::now(),
                clock: "monotonic".to_string(),
                samples: SampleInfo {
                    count: 10_000,
                    range: 101,
                    seed: 0,
                },
            },
            runs,
        }
    }

    #[test]
    fn test_consistent_runs() {
        let report = report(vec![
            run("sequential", None, 50.25),
            run("single-worker", Some("thread"), 50.25),
            run("per-statistic", Some("process"), 50.25),
        ]);
        assert!(report.check_consistency(1e-9).is_ok());
    }

    #[test]
    fn test_mismatch_detected() {
        let report = report(vec![
            run("sequential", None, 50.25),
            run("per-statistic", Some("thread"), 0.0),
        ]);
        let mismatches = report.check_consistency(1e-9).unwrap_err();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].statistic, "mean");
        assert_eq!(mismatches[0].run, "per-statistic/thread");
        assert!(mismatches[0].to_string().contains("sequential"));
    }

    #[test]
    fn test_empty_report_is_consistent() {
        assert!(report(Vec::new()).check_consistency(0.0).is_ok());
    }

    #[test]
    fn test_json_shape() {
        let original = report(vec![run("sequential", None, 50.25)]);
        let json = generate_json_report(&original).unwrap();
        assert!(json.contains("\"schema_version\": 1"));
        assert!(json.contains("\"model\": null"));

        let parsed = parse_json_report(&json).unwrap();
        assert_eq!(parsed.runs[0].statistics, original.runs[0].statistics);
        assert_eq!(parsed.meta.samples, original.meta.samples);
    }
}
