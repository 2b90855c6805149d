//! Worker Process Entry Point
//!
//! Handles the worker side of the process strategy. A worker greets the
//! driver, receives exactly one [`ComputeRequest`], answers with exactly one
//! result or failure message, and closes its end of the pipe.
//!
//! On Unix, uses the fd pair named by `PARSTATS_IPC_FD`. Without it, falls
//! back to stdin/stdout.

use crate::task::run_task;
use parstats_ipc::{
    ComputeRequest, FailureKind, FrameError, FrameReader, FrameWriter, IPC_FD_ENV, WorkerHello,
    WorkerMessage,
};
use parstats_stats::StatsError;
use std::io::{Read, Write};
use thiserror::Error;

#[cfg(unix)]
use std::os::unix::io::FromRawFd;

/// Why a worker process gave up
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("IPC error: {0}")]
    Ipc(#[from] FrameError),

    #[error("computation failed: {0}")]
    Compute(#[from] StatsError),

    #[error("computation panicked: {0}")]
    Panic(String),
}

/// IPC transport: either inherited fd pair or stdin/stdout fallback.
enum IpcTransport {
    #[cfg(unix)]
    Fds { read_fd: i32, write_fd: i32 },
    Stdio,
}

fn detect_transport() -> IpcTransport {
    #[cfg(unix)]
    if let Ok(val) = std::env::var(IPC_FD_ENV) {
        let parts: Vec<&str> = val.split(',').collect();
        if parts.len() == 2 {
            if let (Ok(r), Ok(w)) = (parts[0].parse::<i32>(), parts[1].parse::<i32>()) {
                return IpcTransport::Fds {
                    read_fd: r,
                    write_fd: w,
                };
            }
        }
        tracing::warn!(
            value = %val,
            "invalid {IPC_FD_ENV} (expected <read_fd>,<write_fd>), falling back to stdio"
        );
    }
    IpcTransport::Stdio
}

/// Worker side of one process-strategy worker
pub struct WorkerMain<R: Read, W: Write> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
}

impl WorkerMain<Box<dyn Read>, Box<dyn Write>> {
    /// Connect to the driver through the inherited fds, or stdin/stdout.
    pub fn from_env() -> Self {
        match detect_transport() {
            #[cfg(unix)]
            IpcTransport::Fds { read_fd, write_fd } => {
                // SAFETY: the driver maps both fds into this process just for us
                // and nothing else in the worker owns them.
                let read_file = unsafe { std::fs::File::from_raw_fd(read_fd) };
                let write_file = unsafe { std::fs::File::from_raw_fd(write_fd) };
                Self::with_io(
                    Box::new(read_file) as Box<dyn Read>,
                    Box::new(write_file) as Box<dyn Write>,
                )
            }
            IpcTransport::Stdio => Self::with_io(
                Box::new(std::io::stdin()) as Box<dyn Read>,
                Box::new(std::io::stdout()) as Box<dyn Write>,
            ),
        }
    }
}

impl<R: Read, W: Write> WorkerMain<R, W> {
    /// Worker over an arbitrary reader/writer pair
    pub fn with_io(reader: R, writer: W) -> Self {
        Self {
            reader: FrameReader::new(reader),
            writer: FrameWriter::new(writer),
        }
    }

    /// Serve the single request and close the result channel
    pub fn run(mut self) -> Result<(), WorkerError> {
        self.writer
            .write(&WorkerMessage::Hello(WorkerHello::current()))?;

        let request: ComputeRequest = match self.reader.read() {
            Ok(request) => request,
            Err(e) => {
                let _ = self.writer.write(&WorkerMessage::Failure {
                    kind: FailureKind::Protocol,
                    message: format!("failed to read compute request: {e}"),
                });
                return Err(e.into());
            }
        };
        tracing::debug!(task = ?request.task, samples = request.samples.len(), "worker received request");

        // The request's samples are this process's private copy.
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            run_task(request.task, &request.samples)
        }));

        let result = match outcome {
            Ok(Ok(output)) => {
                self.writer.write(&output.to_message())?;
                Ok(())
            }
            Ok(Err(e)) => {
                let kind = match e {
                    StatsError::ResourceExhaustion { .. } => FailureKind::ResourceExhaustion,
                    StatsError::EmptySample => FailureKind::EmptySample,
                };
                self.writer.write(&WorkerMessage::Failure {
                    kind,
                    message: e.to_string(),
                })?;
                Err(WorkerError::Compute(e))
            }
            Err(panic) => {
                let message = if let Some(s) = panic.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                self.writer.write(&WorkerMessage::Failure {
                    kind: FailureKind::Panic,
                    message: message.clone(),
                })?;
                Err(WorkerError::Panic(message))
            }
        };

        // Closing our end lets the driver see end-of-stream.
        drop(self.writer.into_inner()?);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parstats_ipc::WorkerTask;
    use std::io::Cursor;

    fn request_bytes(request: &ComputeRequest) -> Vec<u8> {
        let mut bytes = Vec::new();
        FrameWriter::new(&mut bytes).write(request).unwrap();
        bytes
    }

    fn replies(bytes: Vec<u8>) -> Vec<WorkerMessage> {
        let mut reader = FrameReader::new(Cursor::new(bytes));
        let mut messages = Vec::new();
        loop {
            match reader.read::<WorkerMessage>() {
                Ok(msg) => messages.push(msg),
                Err(FrameError::EndOfStream) => return messages,
                Err(e) => panic!("bad reply stream: {e}"),
            }
        }
    }

    #[test]
    fn test_worker_answers_once() {
        let request = ComputeRequest {
            task: WorkerTask::StdDev,
            samples: vec![1, 2, 3, 4, 5],
        };
        let mut out = Vec::new();
        WorkerMain::with_io(Cursor::new(request_bytes(&request)), &mut out)
            .run()
            .unwrap();

        let messages = replies(out);
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], WorkerMessage::Hello(_)));
        match messages[1] {
            WorkerMessage::Scalar { task, value } => {
                assert_eq!(task, WorkerTask::StdDev);
                assert!((value - 2.0_f64.sqrt()).abs() < 1e-12);
            }
            ref other => panic!("expected Scalar, got {}", other.kind_name()),
        }
    }

    #[test]
    fn test_worker_reports_compute_failure() {
        let request = ComputeRequest {
            task: WorkerTask::AllThree,
            samples: Vec::new(),
        };
        let mut out = Vec::new();
        let result = WorkerMain::with_io(Cursor::new(request_bytes(&request)), &mut out).run();
        assert!(matches!(result, Err(WorkerError::Compute(StatsError::EmptySample))));

        let messages = replies(out);
        assert!(matches!(
            messages.last(),
            Some(WorkerMessage::Failure {
                kind: FailureKind::EmptySample,
                ..
            })
        ));
    }

    #[test]
    fn test_worker_without_request() {
        let mut out = Vec::new();
        let result = WorkerMain::with_io(Cursor::new(Vec::<u8>::new()), &mut out).run();
        assert!(matches!(result, Err(WorkerError::Ipc(FrameError::EndOfStream))));

        let messages = replies(out);
        assert!(matches!(
            messages.last(),
            Some(WorkerMessage::Failure {
                kind: FailureKind::Protocol,
                ..
            })
        ));
    }
}
