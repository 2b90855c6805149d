//! Timing Sources
//!
//! Every strategy is timed through a [`Clock`], so the same driver can report
//! wall-clock latencies or CPU time of the driver process.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// A source of elapsed time, measured from an arbitrary fixed origin
pub trait Clock: Send + Sync {
    /// Name shown in reports
    fn name(&self) -> &'static str;

    /// Time since the clock's origin. Never decreases.
    fn now(&self) -> Duration;
}

/// Wall-clock time from `std::time::Instant`
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Start a clock at the current instant
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn name(&self) -> &'static str {
        "monotonic"
    }

    #[inline(always)]
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// CPU time consumed by the calling process (all of its threads).
///
/// Time spent inside child processes is not counted, so process workers show
/// up only as the driver's own launch and collection cost.
#[derive(Debug, Clone, Copy)]
pub struct ProcessCpuClock {
    _private: (),
}

impl ProcessCpuClock {
    /// Check that the platform exposes a process CPU-time clock
    pub fn new() -> Result<Self, std::io::Error> {
        read_process_cpu_time()?;
        Ok(Self { _private: () })
    }
}

fn read_process_cpu_time() -> Result<Duration, std::io::Error> {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: `ts` is a valid, writable timespec for the duration of the call.
    let ret = unsafe { libc::clock_gettime(libc::CLOCK_PROCESS_CPUTIME_ID, &mut ts) };
    if ret != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32))
}

impl Clock for ProcessCpuClock {
    fn name(&self) -> &'static str {
        "process-cpu"
    }

    fn now(&self) -> Duration {
        // The clock was checked in `new`, it does not start failing afterwards.
        read_process_cpu_time().unwrap_or_default()
    }
}

/// Selectable timing source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockKind {
    /// [`MonotonicClock`]
    #[default]
    Monotonic,
    /// [`ProcessCpuClock`]
    ProcessCpu,
}

impl ClockKind {
    /// Build the clock
    pub fn build(self) -> Result<Box<dyn Clock>, std::io::Error> {
        Ok(match self {
            ClockKind::Monotonic => Box::new(MonotonicClock::new()),
            ClockKind::ProcessCpu => Box::new(ProcessCpuClock::new()?),
        })
    }

    /// Config/CLI spelling
    pub fn name(self) -> &'static str {
        match self {
            ClockKind::Monotonic => "monotonic",
            ClockKind::ProcessCpu => "process-cpu",
        }
    }
}

impl FromStr for ClockKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monotonic" | "wall" => Ok(ClockKind::Monotonic),
            "process-cpu" | "cpu" => Ok(ClockKind::ProcessCpu),
            other => Err(format!("Unknown clock: {}", other)),
        }
    }
}

impl fmt::Display for ClockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Creation and total latency of one strategy run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimingRecord {
    /// From the start of the run until every launch call returned
    pub creation: Duration,
    /// From the start of the run until every result was collected
    pub total: Duration,
}

impl TimingRecord {
    /// Creation latency in milliseconds
    pub fn creation_ms(&self) -> f64 {
        self.creation.as_secs_f64() * 1000.0
    }

    /// Total latency in milliseconds
    pub fn total_ms(&self) -> f64 {
        self.total.as_secs_f64() * 1000.0
    }
}

/// Measures one run against a single start stamp, so creation <= total
pub struct Stopwatch<'a> {
    clock: &'a dyn Clock,
    start: Duration,
    launched: Option<Duration>,
}

impl<'a> Stopwatch<'a> {
    /// Take the start stamp
    pub fn start(clock: &'a dyn Clock) -> Self {
        Self {
            clock,
            start: clock.now(),
            launched: None,
        }
    }

    /// Record that every launch call has returned
    pub fn mark_launched(&mut self) {
        self.launched = Some(self.clock.now().saturating_sub(self.start));
    }

    /// Record that every result has been collected
    pub fn finish(self) -> TimingRecord {
        let total = self.clock.now().saturating_sub(self.start);
        TimingRecord {
            creation: self.launched.unwrap_or_default().min(total),
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spin(duration: Duration) {
        let start = Instant::now();
        let mut x = 0u64;
        while start.elapsed() < duration {
            x = std::hint::black_box(x.wrapping_add(1));
        }
    }

    #[test]
    fn test_monotonic_elapsed() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        std::thread::sleep(Duration::from_millis(10));
        let b = clock.now();
        assert!(b - a >= Duration::from_millis(5));
    }

    #[test]
    fn test_process_cpu_advances_under_load() {
        let clock = ProcessCpuClock::new().unwrap();
        let a = clock.now();
        spin(Duration::from_millis(20));
        assert!(clock.now() > a);
    }

    #[test]
    fn test_stopwatch_creation_within_total() {
        let clock = MonotonicClock::new();
        let mut watch = Stopwatch::start(&clock);
        std::thread::sleep(Duration::from_millis(2));
        watch.mark_launched();
        std::thread::sleep(Duration::from_millis(2));
        let record = watch.finish();

        assert!(record.creation > Duration::ZERO);
        assert!(record.creation <= record.total);
        assert!(record.creation_ms() <= record.total_ms());
    }

    #[test]
    fn test_stopwatch_without_launch() {
        let clock = MonotonicClock::new();
        let record = Stopwatch::start(&clock).finish();
        assert_eq!(record.creation, Duration::ZERO);
    }

    #[test]
    fn test_clock_kind_parse() {
        assert_eq!("monotonic".parse::<ClockKind>(), Ok(ClockKind::Monotonic));
        assert_eq!("CPU".parse::<ClockKind>(), Ok(ClockKind::ProcessCpu));
        assert!("sundial".parse::<ClockKind>().is_err());
        assert_eq!(ClockKind::ProcessCpu.build().unwrap().name(), "process-cpu");
    }
}
