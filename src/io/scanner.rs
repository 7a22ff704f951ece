/// Multi-pass track scanner
///
/// Sweeps every (track, head) unit of the source once per pass. A unit that
/// fails to read is only recorded as a failed pass; the sweep always carries
/// on with the next unit.

use crate::error::{RescueError, Result};
use crate::format::Geometry;
use crate::image::{MasterImage, RecoveryUnit};
use crate::io::read_at;
use crate::progress::{ProgressEstimator, ProgressSink, ProgressUpdate};
use std::io::{Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Result of a completed scan
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Reconstruction assembled from the first good read of each unit
    pub image: MasterImage,
    /// Per-unit pass results, in track-major order
    pub units: Vec<RecoveryUnit>,
    /// Passes executed
    pub passes: usize,
}

/// Multi-pass scanner configuration
#[derive(Debug, Clone)]
pub struct Scanner {
    geometry: Geometry,
    pass_count: usize,
    settle_delay: Duration,
    interrupt: Option<Arc<AtomicBool>>,
}

impl Scanner {
    /// Create a scanner for the given geometry and number of passes
    pub fn new(geometry: Geometry, pass_count: usize) -> Self {
        Self {
            geometry,
            pass_count,
            settle_delay: Duration::from_secs(1),
            interrupt: None,
        }
    }

    /// Set the pause between passes
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Abort the scan when this flag becomes set
    pub fn interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Get the geometry
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Number of passes this scanner runs
    pub fn pass_count(&self) -> usize {
        self.pass_count
    }

    /// Run every pass over the source
    ///
    /// Fails only when the source cannot be rewound at the start of a pass
    /// (`Hardware`) or when interrupted (`Interrupted`).
    pub fn scan<S, P>(&self, source: &mut S, progress: &mut P) -> Result<ScanOutcome>
    where
        S: Read + Seek,
        P: ProgressSink + ?Sized,
    {
        let geometry = self.geometry;
        let unit_length = geometry.unit_length();
        let estimator = ProgressEstimator::start(geometry.unit_count() * self.pass_count);

        let mut units: Vec<RecoveryUnit> = geometry
            .units()
            .map(|id| RecoveryUnit::new(id, self.pass_count))
            .collect();
        let mut image = MasterImage::new(geometry);
        let mut buffer = vec![0u8; unit_length];
        let mut ops_done = 0;

        info!(
            passes = self.pass_count,
            units = units.len(),
            unit_length,
            "starting scan"
        );

        for pass in 0..self.pass_count {
            source
                .seek(SeekFrom::Start(0))
                .map_err(|source| RescueError::Hardware {
                    pass: pass + 1,
                    source,
                })?;

            let mut failures = 0;
            for unit in units.iter_mut() {
                if self.is_interrupted() {
                    info!(pass = pass + 1, unit = %unit.id, "scan interrupted");
                    return Err(RescueError::Interrupted { pass: pass + 1 });
                }

                let offset = geometry.unit_offset(unit.id);
                let success = match read_at(source, offset, &mut buffer) {
                    Ok(read) if read == unit_length => true,
                    Ok(read) => {
                        debug!(pass = pass + 1, unit = %unit.id, read, "short read");
                        false
                    }
                    Err(err) => {
                        debug!(pass = pass + 1, unit = %unit.id, error = %err, "read failed");
                        false
                    }
                };

                if !success {
                    failures += 1;
                }
                if unit.record(pass, success) {
                    image.store_unit(unit.id, &buffer);
                }

                ops_done += 1;
                progress.unit_read(&ProgressUpdate {
                    pass: pass + 1,
                    passes: self.pass_count,
                    unit: unit.id,
                    success,
                    estimate: estimator.estimate(ops_done),
                });
            }

            info!(pass = pass + 1, failures, "pass complete");

            if pass + 1 < self.pass_count {
                progress.pass_finished(pass + 1, self.pass_count);
                if !self.settle_delay.is_zero() {
                    thread::sleep(self.settle_delay);
                }
            }
        }

        progress.scan_finished();

        Ok(ScanOutcome {
            image,
            units,
            passes: self.pass_count,
        })
    }

    fn is_interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }
}
