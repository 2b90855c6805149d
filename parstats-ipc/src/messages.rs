//! IPC Message Types
//!
//! All messages are serialized with rkyv and validated on receipt.

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};

/// Which computation a worker process performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum WorkerTask {
    /// Mean, median and standard deviation, one after another
    AllThree,
    /// Arithmetic mean only
    Mean,
    /// Median only
    Median,
    /// Population standard deviation only
    StdDev,
}

/// Handshake sent by a worker as soon as it starts
#[derive(Debug, Clone, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct WorkerHello {
    /// Protocol version for compatibility
    pub protocol_version: u32,
    /// OS process id of the worker
    pub pid: u32,
}

impl WorkerHello {
    /// Hello for the calling process
    pub fn current() -> Self {
        Self {
            protocol_version: crate::PROTOCOL_VERSION,
            pid: std::process::id(),
        }
    }
}

/// The single command a worker receives: its task plus a private copy of the samples
#[derive(Debug, Clone, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct ComputeRequest {
    /// What to compute
    pub task: WorkerTask,
    /// Deep copy of the sample array, owned by the worker from here on
    pub samples: Vec<u32>,
}

/// Bytes of a [`ComputeRequest`] frame that are not sample data
const REQUEST_OVERHEAD: usize = 64;

/// Most samples a single [`ComputeRequest`] frame can carry
pub const MAX_REQUEST_SAMPLES: usize =
    (crate::MAX_FRAME_SIZE - REQUEST_OVERHEAD) / std::mem::size_of::<u32>();

/// Messages sent from a worker to the driver
#[derive(Debug, Clone, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum WorkerMessage {
    /// Initial handshake
    Hello(WorkerHello),

    /// All three statistics (reply to [`WorkerTask::AllThree`])
    Summary {
        /// Arithmetic mean
        mean: f64,
        /// Median
        median: f64,
        /// Population standard deviation
        std_dev: f64,
    },

    /// One statistic (reply to a single-statistic task)
    Scalar {
        /// Task this value answers
        task: WorkerTask,
        /// Computed value
        value: f64,
    },

    /// The computation failed; the worker exits right after sending this
    Failure {
        /// Error category
        kind: FailureKind,
        /// Human-readable error message
        message: String,
    },
}

impl WorkerMessage {
    /// Short name for protocol diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            WorkerMessage::Hello(_) => "Hello",
            WorkerMessage::Summary { .. } => "Summary",
            WorkerMessage::Scalar { .. } => "Scalar",
            WorkerMessage::Failure { .. } => "Failure",
        }
    }
}

/// Categories of worker failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum FailureKind {
    /// The median working copy could not be allocated
    ResourceExhaustion,
    /// The worker was handed no samples
    EmptySample,
    /// Rust panic (caught)
    Panic,
    /// The worker could not read its request
    Protocol,
}
