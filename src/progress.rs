/// Scan progress estimation and display

use crate::image::UnitId;
use chrono::{DateTime, Local, TimeDelta};
use std::io::Write;
use std::time::{Duration, Instant};

/// Snapshot of scan progress with a time-rate based projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimate {
    /// Operations finished so far
    pub ops_completed: usize,
    /// Operations in the whole scan
    pub ops_total: usize,
    /// Time since the scan started
    pub elapsed: Duration,
    /// Projected time left, unknown until one operation finished
    pub remaining: Option<Duration>,
    /// Projected wall-clock finish time
    pub eta: Option<DateTime<Local>>,
}

impl Estimate {
    /// Completed share in whole percent
    pub fn percent(&self) -> usize {
        if self.ops_total == 0 {
            return 100;
        }
        self.ops_completed.min(self.ops_total) * 100 / self.ops_total
    }

    /// Average time per finished operation
    pub fn avg_time_per_op(&self) -> Option<Duration> {
        if self.ops_completed == 0 {
            None
        } else {
            Some(self.elapsed.div_f64(self.ops_completed as f64))
        }
    }
}

/// Computes elapsed, remaining and ETA from operation counters
#[derive(Debug, Clone)]
pub struct ProgressEstimator {
    ops_total: usize,
    started: Instant,
}

impl ProgressEstimator {
    /// Start timing a scan of `ops_total` operations
    pub fn start(ops_total: usize) -> Self {
        Self {
            ops_total,
            started: Instant::now(),
        }
    }

    /// Operations in the whole scan
    pub fn ops_total(&self) -> usize {
        self.ops_total
    }

    /// Estimate against the current clock
    pub fn estimate(&self, ops_completed: usize) -> Estimate {
        estimate_at(ops_completed, self.ops_total, self.started.elapsed(), Local::now())
    }
}

/// Estimate progress for explicit counters and clock readings
pub fn estimate_at(
    ops_completed: usize,
    ops_total: usize,
    elapsed: Duration,
    now: DateTime<Local>,
) -> Estimate {
    let (remaining, eta) = if ops_completed == 0 {
        (None, None)
    } else {
        let remaining_ops = ops_total.saturating_sub(ops_completed);
        let remaining = elapsed.mul_f64(remaining_ops as f64 / ops_completed as f64);
        let eta = TimeDelta::from_std(remaining)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta));
        (Some(remaining), eta)
    };

    Estimate {
        ops_completed,
        ops_total,
        elapsed,
        remaining,
        eta,
    }
}

/// Format a duration as `H:MM:SS`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// One unit read, as reported to a progress sink
#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate {
    /// 1-based pass number
    pub pass: usize,
    /// Passes in the scan
    pub passes: usize,
    /// Unit just read
    pub unit: UnitId,
    /// Whether the read returned a full unit
    pub success: bool,
    /// Progress projection after this read
    pub estimate: Estimate,
}

/// Receives scan progress
pub trait ProgressSink {
    /// Called once after every unit read, successful or not
    fn unit_read(&mut self, update: &ProgressUpdate);

    /// Called after a pass that is followed by another one
    fn pass_finished(&mut self, _pass: usize, _passes: usize) {}

    /// Called once the last pass finished
    fn scan_finished(&mut self) {}
}

/// Sink that discards progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn unit_read(&mut self, _update: &ProgressUpdate) {}
}

/// Overwritable single-line progress display
pub struct ConsoleProgress<W: Write> {
    out: W,
}

impl<W: Write> ConsoleProgress<W> {
    /// Display progress on the given writer
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Give back the writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl ConsoleProgress<std::io::Stdout> {
    /// Display progress on standard output
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

/// Render the progress line for an update, without the leading carriage return
pub fn progress_line(update: &ProgressUpdate) -> String {
    let estimate = &update.estimate;
    let remaining = estimate
        .remaining
        .map(format_duration)
        .unwrap_or_else(|| "--:--:--".to_string());
    let eta = estimate
        .eta
        .map(|eta| eta.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());

    format!(
        "Pass {}/{} | {:3}% | {} | Elapsed: {} | Remain: {} | ETA: {} ",
        update.pass,
        update.passes,
        estimate.percent(),
        update.unit,
        format_duration(estimate.elapsed),
        remaining,
        eta
    )
}

impl<W: Write> ProgressSink for ConsoleProgress<W> {
    fn unit_read(&mut self, update: &ProgressUpdate) {
        // Display only; a broken terminal must not stop the scan
        let _ = write!(self.out, "\r{}", progress_line(update));
        let _ = self.out.flush();
    }

    fn pass_finished(&mut self, pass: usize, _passes: usize) {
        let _ = writeln!(self.out, "\nPass {} complete. Stabilizing motor...", pass);
        let _ = self.out.flush();
    }

    fn scan_finished(&mut self) {
        let _ = writeln!(self.out);
        let _ = self.out.flush();
    }
}
