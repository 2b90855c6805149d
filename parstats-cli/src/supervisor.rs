//! Process Workers
//!
//! Re-executes the current binary in worker mode, one process per task. Each
//! worker gets two private pipes on fds 3/4. Launching only spawns; the
//! driver then dispatches a single [`ComputeRequest`] carrying a deep copy of
//! the samples, closes its write end, and reads the worker's hello and its
//! single answer.

use crate::error::DriverError;
use crate::executor::{Launcher, WorkerModel, worker_label};
use parstats_core::{SampleSet, WorkerOutput, WorkerTask, task_statistics};
use parstats_stats::Statistic;
use parstats_ipc::{
    ComputeRequest, FailureKind, FrameError, FrameReader, FrameWriter, IPC_FD_ENV,
    PROTOCOL_VERSION, WORKER_FLAG, WorkerMessage,
};
use std::io::Read;
use std::os::unix::io::{FromRawFd, RawFd};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

/// Create a pipe pair, returning (read_fd, write_fd).
fn create_pipe() -> Result<(RawFd, RawFd), std::io::Error> {
    let mut fds = [0 as RawFd; 2];
    let ret = unsafe { libc::pipe(fds.as_mut_ptr()) };
    if ret != 0 {
        return Err(std::io::Error::last_os_error());
    }
    // Close-on-exec on both ends; `place_fd` gives the worker its own copies.
    for &fd in &fds {
        unsafe {
            let flags = libc::fcntl(fd, libc::F_GETFD);
            libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC);
        }
    }
    Ok((fds[0], fds[1]))
}

/// Make `fd` readable as `target` after exec. Runs between fork and exec,
/// so it only makes async-signal-safe calls.
fn place_fd(fd: RawFd, target: RawFd) -> Result<(), std::io::Error> {
    let ret = unsafe {
        if fd == target {
            let flags = libc::fcntl(fd, libc::F_GETFD);
            libc::fcntl(fd, libc::F_SETFD, flags & !libc::FD_CLOEXEC)
        } else {
            // The duplicate does not inherit FD_CLOEXEC.
            libc::dup2(fd, target)
        }
    };
    if ret < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// Close a raw file descriptor.
fn close_fd(fd: RawFd) {
    unsafe {
        libc::close(fd);
    }
}

/// Launches worker processes from a binary that understands `--stats-worker`
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    binary: PathBuf,
}

impl ProcessLauncher {
    /// Use the running executable as the worker binary
    pub fn current_exe() -> Result<Self, std::io::Error> {
        Ok(Self::with_binary(std::env::current_exe()?))
    }

    /// Use a specific worker binary (for testing)
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Worker binary path
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn spawn(&self, label: &str) -> Result<(Child, std::fs::File, std::fs::File), DriverError> {
        let launch_err = |source| DriverError::WorkerLaunchFailure {
            worker: label.to_string(),
            source,
        };

        // cmd_pipe: driver writes the request -> worker reads from fd 3
        let (cmd_read, cmd_write) = create_pipe().map_err(launch_err)?;
        // msg_pipe: worker writes messages to fd 4 -> driver reads
        let (msg_read, msg_write) = match create_pipe() {
            Ok(fds) => fds,
            Err(e) => {
                close_fd(cmd_read);
                close_fd(cmd_write);
                return Err(launch_err(e));
            }
        };

        let mut command = Command::new(&self.binary);
        command
            .arg(WORKER_FLAG)
            .env(IPC_FD_ENV, "3,4")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());

        // Every pipe end is close-on-exec, so only the two copies placed on
        // fds 3 and 4 survive into the worker.
        unsafe {
            command.pre_exec(move || {
                let mut msg_write = msg_write;
                if msg_write == 3 {
                    msg_write = libc::fcntl(msg_write, libc::F_DUPFD_CLOEXEC, 5);
                    if msg_write < 0 {
                        return Err(std::io::Error::last_os_error());
                    }
                }
                place_fd(cmd_read, 3)?;
                place_fd(msg_write, 4)?;
                Ok(())
            });
        }

        let child = match command.spawn() {
            Ok(c) => c,
            Err(e) => {
                close_fd(cmd_read);
                close_fd(cmd_write);
                close_fd(msg_read);
                close_fd(msg_write);
                return Err(launch_err(e));
            }
        };

        // Close the child-side ends here, or end-of-stream is never seen.
        close_fd(cmd_read);
        close_fd(msg_write);

        let writer_file = unsafe { std::fs::File::from_raw_fd(cmd_write) };
        let reader_file = unsafe { std::fs::File::from_raw_fd(msg_read) };
        Ok((child, writer_file, reader_file))
    }
}

/// A running worker process
pub struct ProcessWorker {
    task: WorkerTask,
    label: String,
    child: Child,
    writer: Option<FrameWriter<std::fs::File>>,
    reader: FrameReader<std::fs::File>,
}

impl ProcessWorker {
    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Send the request, then close the command pipe
    fn send(&mut self, samples: &SampleSet) -> Result<(), DriverError> {
        let Some(mut writer) = self.writer.take() else {
            return Err(DriverError::channel(&self.label, "request already sent"));
        };
        writer
            .write(&ComputeRequest {
                task: self.task,
                samples: samples.to_vec(),
            })
            .map_err(|e| DriverError::channel(&self.label, e.to_string()))?;
        drop(
            writer
                .into_inner()
                .map_err(|e| DriverError::channel(&self.label, e.to_string()))?,
        );
        Ok(())
    }
}

/// Read a worker's hello, then exactly one answer, then end-of-stream
fn read_answer<R: Read>(
    reader: &mut FrameReader<R>,
    label: &str,
    task: WorkerTask,
    pid: u32,
) -> Result<WorkerOutput, DriverError> {
    let frame_err = |e: FrameError| match e {
        FrameError::EndOfStream => {
            DriverError::channel(label, "worker closed its result channel before answering")
        }
        other => DriverError::channel(label, other.to_string()),
    };

    match reader.read::<WorkerMessage>().map_err(frame_err)? {
        WorkerMessage::Hello(hello) => {
            if hello.protocol_version != PROTOCOL_VERSION {
                return Err(DriverError::channel(
                    label,
                    format!(
                        "protocol version mismatch: expected {}, got {}",
                        PROTOCOL_VERSION, hello.protocol_version
                    ),
                ));
            }
            if hello.pid != pid {
                return Err(DriverError::channel(
                    label,
                    format!("hello from pid {}, expected {}", hello.pid, pid),
                ));
            }
        }
        other => {
            return Err(DriverError::channel(
                label,
                format!("expected Hello, got {}", other.kind_name()),
            ));
        }
    }

    let message: WorkerMessage = reader.read().map_err(frame_err)?;
    let output = match message {
        WorkerMessage::Failure { kind, message } => {
            return Err(match kind {
                FailureKind::ResourceExhaustion => DriverError::ResourceExhaustion {
                    worker: label.to_string(),
                    message,
                },
                FailureKind::Protocol => DriverError::channel(label, message),
                FailureKind::EmptySample | FailureKind::Panic => DriverError::WorkerFailed {
                    worker: label.to_string(),
                    message,
                },
            });
        }
        ref other => WorkerOutput::from_message(other).ok_or_else(|| {
            DriverError::channel(label, format!("expected a result, got {}", other.kind_name()))
        })?,
    };

    let answered: &[Statistic] = match &output {
        WorkerOutput::Summary(_) => &Statistic::ALL,
        WorkerOutput::Scalar(statistic, _) => std::slice::from_ref(statistic),
    };
    if answered != task_statistics(task) {
        return Err(DriverError::channel(
            label,
            format!("answered {:?}, was asked for {:?}", answered, task),
        ));
    }

    reader
        .expect_end()
        .map_err(|e| DriverError::channel(label, e.to_string()))?;
    Ok(output)
}

impl Drop for ProcessWorker {
    fn drop(&mut self) {
        if self.is_alive() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

impl Launcher for ProcessLauncher {
    type Worker = ProcessWorker;

    fn model(&self) -> WorkerModel {
        WorkerModel::Process
    }

    fn launch(&self, task: WorkerTask, _samples: &SampleSet) -> Result<ProcessWorker, DriverError> {
        let label = worker_label(WorkerModel::Process, task);
        let (child, writer_file, reader_file) = self.spawn(&label)?;
        tracing::debug!(pid = child.id(), worker = %label, "spawned worker process");

        Ok(ProcessWorker {
            task,
            label: format!("{} [pid {}]", label, child.id()),
            child,
            writer: Some(FrameWriter::new(writer_file)),
            reader: FrameReader::new(reader_file),
        })
    }

    fn dispatch(&self, worker: &mut ProcessWorker, samples: &SampleSet) -> Result<(), DriverError> {
        // The worker's private copy of the samples, sent once.
        worker.send(samples)
    }

    fn join(&self, mut worker: ProcessWorker) -> Result<WorkerOutput, DriverError> {
        // An undispatched worker sees end-of-stream instead of a request.
        drop(worker.writer.take());
        let pid = worker.child.id();
        let received = read_answer(&mut worker.reader, &worker.label, worker.task, pid);

        // Reap the child whatever the channel said.
        if received.is_err() && worker.is_alive() {
            let _ = worker.child.kill();
        }
        let status = worker.child.wait().map_err(|e| DriverError::WorkerFailed {
            worker: worker.label.clone(),
            message: format!("wait failed: {e}"),
        })?;

        let output = received?;
        if !status.success() {
            return Err(DriverError::WorkerFailed {
                worker: worker.label.clone(),
                message: format!("exited with {status}"),
            });
        }
        tracing::debug!(worker = %worker.label, "collected worker process");
        Ok(output)
    }
}
