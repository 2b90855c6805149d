//! Configuration loading from parstats.toml
//!
//! The configuration is optional. It is discovered by walking up from the
//! current directory; CLI flags override anything it sets.

use crate::executor::{Strategy, WorkerModel};
use anyhow::Context;
use parstats_core::{DEFAULT_COUNT, DEFAULT_RANGE, DEFAULT_SEED};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up during discovery
pub const CONFIG_FILE_NAME: &str = "parstats.toml";

/// parstats configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct StatsConfig {
    /// Sample array configuration
    #[serde(default)]
    pub data: DataConfig,
    /// Which strategies to run and how to time them
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Sample array configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    /// Number of samples
    #[serde(default = "default_count")]
    pub count: usize,
    /// Exclusive upper bound of sample values
    #[serde(default = "default_range")]
    pub range: u32,
    /// RNG seed
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            range: default_range(),
            seed: default_seed(),
        }
    }
}

fn default_count() -> usize {
    DEFAULT_COUNT
}
fn default_range() -> u32 {
    DEFAULT_RANGE
}
fn default_seed() -> u64 {
    DEFAULT_SEED
}

/// Runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Strategies to run: "sequential", "single-worker", "per-statistic"
    #[serde(default = "default_strategies")]
    pub strategies: Vec<Strategy>,
    /// Worker models for the concurrent strategies: "thread", "process"
    #[serde(default = "default_models")]
    pub models: Vec<WorkerModel>,
    /// Timing source: "monotonic" or "process-cpu"
    #[serde(default = "default_clock")]
    pub clock: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            strategies: default_strategies(),
            models: default_models(),
            clock: default_clock(),
        }
    }
}

fn default_strategies() -> Vec<Strategy> {
    Strategy::ALL.to_vec()
}
fn default_models() -> Vec<WorkerModel> {
    WorkerModel::ALL.to_vec()
}
fn default_clock() -> String {
    "monotonic".to_string()
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Output format: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}

impl StatsConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("invalid {}", path.display()))?;
        Ok(config)
    }

    /// Find the nearest parstats.toml, walking up from `start`
    pub fn find(start: impl Into<PathBuf>) -> Option<PathBuf> {
        let mut dir = start.into();
        loop {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Discover and load configuration from the current directory upwards.
    ///
    /// No file is not an error; a file that does not parse is.
    pub fn discover() -> anyhow::Result<Option<Self>> {
        let cwd = std::env::current_dir().context("cannot determine current directory")?;
        match Self::find(cwd) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration");
                Self::load(&path).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# parstats configuration

[data]
# Number of samples
count = 10000
# Samples are drawn from [0, range)
range = 101
# RNG seed; the same seed always produces the same samples
seed = 0

[runner]
# Strategies: "sequential", "single-worker", "per-statistic"
strategies = ["sequential", "single-worker", "per-statistic"]
# Worker models for the concurrent strategies: "thread", "process"
models = ["thread", "process"]
# Timing source: "monotonic" (wall clock) or "process-cpu"
clock = "monotonic"

[output]
# Output format: human or json
format = "human"
"#
        .to_string()
    }
}
