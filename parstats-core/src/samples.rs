//! Sample Generation
//!
//! Builds the fixed-length array of bounded integers every strategy works on.
//! The seed is always an explicit part of the [`SampleSpec`].

use parstats_stats::Sample;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use thiserror::Error;

/// Default number of samples
pub const DEFAULT_COUNT: usize = 10_000;
/// Default exclusive upper bound of sample values
pub const DEFAULT_RANGE: u32 = 101;
/// Default seed
pub const DEFAULT_SEED: u64 = 0;

/// Errors raised while describing the sample array
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("invalid sample spec: {0}")]
    InvalidSpec(String),
}

/// Shape of the sample array: `count` values drawn from `[0, range)` with `seed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSpec {
    count: usize,
    range: u32,
    seed: u64,
}

impl SampleSpec {
    /// Validate and build a spec
    pub fn new(count: usize, range: u32, seed: u64) -> Result<Self, DataError> {
        if count == 0 {
            return Err(DataError::InvalidSpec("count must be >= 1".to_string()));
        }
        if range == 0 {
            return Err(DataError::InvalidSpec("range must be >= 1".to_string()));
        }
        Ok(Self { count, range, seed })
    }

    /// Number of samples
    pub fn count(&self) -> usize {
        self.count
    }

    /// Exclusive upper bound of sample values
    pub fn range(&self) -> u32 {
        self.range
    }

    /// RNG seed
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            range: DEFAULT_RANGE,
            seed: DEFAULT_SEED,
        }
    }
}

/// The immutable sample array, shared read-only with every worker
#[derive(Debug, Clone)]
pub struct SampleSet {
    spec: SampleSpec,
    values: Arc<[Sample]>,
}

impl SampleSet {
    /// Generate the samples for `spec`. Same spec, same values.
    pub fn generate(spec: SampleSpec) -> Self {
        let mut rng = StdRng::seed_from_u64(spec.seed);
        let values: Arc<[Sample]> = (0..spec.count)
            .map(|_| rng.gen_range(0..spec.range))
            .collect();
        tracing::debug!(
            count = spec.count,
            range = spec.range,
            seed = spec.seed,
            "generated sample set"
        );
        Self { spec, values }
    }

    /// Spec these samples were generated from
    pub fn spec(&self) -> &SampleSpec {
        &self.spec
    }

    /// Read-only view of the values
    pub fn as_slice(&self) -> &[Sample] {
        &self.values
    }

    /// Another read-only handle on the same allocation
    pub fn share(&self) -> Arc<[Sample]> {
        Arc::clone(&self.values)
    }

    /// Private deep copy, for workers that must not share memory with the driver
    pub fn to_vec(&self) -> Vec<Sample> {
        self.values.to_vec()
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false for a generated set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
