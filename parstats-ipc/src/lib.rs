#![warn(missing_docs)]
//! parstats IPC Protocol
//!
//! Typed messages between the driver and its isolated worker processes.
//! Each worker owns one command pipe and one result pipe; every frame is a
//! length-prefixed rkyv payload, so the driver never reads raw structs off a
//! byte stream.

mod framing;
mod messages;

pub use framing::{FrameError, FrameReader, FrameWriter, MAX_FRAME_SIZE, read_frame, write_frame};
pub use messages::{
    ComputeRequest, FailureKind, MAX_REQUEST_SAMPLES, WorkerHello, WorkerMessage, WorkerTask,
};

/// Protocol version for compatibility checking
pub const PROTOCOL_VERSION: u32 = 1;

/// Environment variable naming the inherited `<read_fd>,<write_fd>` pair
pub const IPC_FD_ENV: &str = "PARSTATS_IPC_FD";

/// Hidden CLI flag that turns the binary into a worker process
pub const WORKER_FLAG: &str = "--stats-worker";
