/// Cooldown gate between rescue runs
///
/// Limits wear on a failing drive by refusing to start a new run until a
/// minimum time has passed since the newest archive in the output directory
/// was written. The wait is computed once and can be skipped with an
/// interrupt.

use crate::format::constants::ARCHIVE_EXTENSION;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant, SystemTime};
use tracing::info;

/// How the gate was passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownOutcome {
    /// No recent archive, the run may start immediately
    NotRequired,
    /// The full remaining cooldown was waited out
    Waited(Duration),
    /// The user interrupted the wait
    Skipped {
        /// Time that was still left
        remaining: Duration,
    },
}

/// Blocks until the output directory has been quiet for the cooldown period
#[derive(Debug, Clone)]
pub struct CooldownGate {
    output_dir: PathBuf,
    cooldown: Duration,
    tick: Duration,
}

impl CooldownGate {
    /// Gate on archives in `output_dir`
    pub fn new<P: Into<PathBuf>>(output_dir: P, cooldown: Duration) -> Self {
        Self {
            output_dir: output_dir.into(),
            cooldown,
            tick: Duration::from_millis(200),
        }
    }

    /// Set how often the countdown is redrawn and the interrupt polled
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Get the cooldown period
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Most recently modified archive in the output directory
    pub fn latest_archive(&self) -> Option<(PathBuf, SystemTime)> {
        latest_archive(&self.output_dir)
    }

    /// Time still to wait at `now`, or `None` when the run may start
    pub fn remaining_at(&self, now: SystemTime) -> Option<Duration> {
        if self.cooldown.is_zero() {
            return None;
        }
        let (_, modified) = self.latest_archive()?;
        // An archive stamped in the future counts as brand new
        let since = now.duration_since(modified).unwrap_or(Duration::ZERO);
        self.cooldown.checked_sub(since).filter(|left| !left.is_zero())
    }

    /// Block until the cooldown has passed or `interrupt` is raised
    ///
    /// The interrupt flag is consumed, so a skip does not leak into the scan.
    pub fn wait<W: Write>(&self, interrupt: &AtomicBool, out: &mut W) -> CooldownOutcome {
        let Some(remaining) = self.remaining_at(SystemTime::now()) else {
            return CooldownOutcome::NotRequired;
        };

        info!(
            remaining_secs = remaining.as_secs(),
            dir = %self.output_dir.display(),
            "cooldown active"
        );
        // Too far out to be represented means it never arrives
        let deadline = Instant::now().checked_add(remaining);

        loop {
            let left = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => remaining,
            };
            if interrupt.swap(false, Ordering::SeqCst) {
                let _ = writeln!(out, "\nCooldown skipped.");
                info!(remaining_secs = left.as_secs(), "cooldown skipped by user");
                return CooldownOutcome::Skipped { remaining: left };
            }
            if left.is_zero() {
                break;
            }

            let secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
            let _ = write!(
                out,
                "\rCooldown: {:02}:{:02} remaining (Ctrl+C to skip) ",
                secs / 60,
                secs % 60
            );
            let _ = out.flush();
            thread::sleep(self.tick.min(left));
        }

        let _ = writeln!(out);
        CooldownOutcome::Waited(remaining)
    }
}

/// Newest `.zip` file in `dir` by modification time
fn latest_archive(dir: &Path) -> Option<(PathBuf, SystemTime)> {
    fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case(ARCHIVE_EXTENSION))
                .unwrap_or(false)
        })
        .filter_map(|path| {
            let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
            Some((path, modified))
        })
        .max_by_key(|(_, modified)| *modified)
}
