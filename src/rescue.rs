/// Rescue run orchestration
///
/// Boot metadata, multi-pass scan, classification, report and archive, in
/// that order. The cooldown gate and the comment prompt are handled by the
/// caller before a run starts.

use crate::boot::BootMetadata;
use crate::config::RescueConfig;
use crate::cooldown::CooldownGate;
use crate::error::{RescueError, Result};
use crate::format::Geometry;
use crate::health::HealthSummary;
use crate::io::archive::{ArchiveBuilder, ArchiveBundle};
use crate::io::scanner::Scanner;
use crate::progress::ProgressSink;
use crate::report::RescueReport;
use chrono::Local;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

/// Everything produced by a successful run
#[derive(Debug, Clone)]
pub struct RescueOutcome {
    /// Report stored in the archive
    pub report: RescueReport,
    /// Classification the report was built from
    pub summary: HealthSummary,
    /// Written archive
    pub archive: ArchiveBundle,
    /// Geometry that was scanned
    pub geometry: Geometry,
}

/// A configured rescue engine
#[derive(Debug, Clone)]
pub struct Rescue {
    config: RescueConfig,
    interrupt: Option<Arc<AtomicBool>>,
}

impl Rescue {
    /// Create an engine from a validated configuration
    pub fn new(config: RescueConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            interrupt: None,
        })
    }

    /// Abort scanning when this flag is raised
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &RescueConfig {
        &self.config
    }

    /// Cooldown gate for the configured output directory
    pub fn cooldown_gate(&self) -> CooldownGate {
        CooldownGate::new(&self.config.output_dir, self.config.cooldown)
    }

    /// Open the source device read-only
    pub fn open_source(path: &Path) -> Result<File> {
        File::open(path).map_err(|source| RescueError::source_open(path, source))
    }

    /// Rescue the device at `source_path`
    pub fn run<P>(&self, source_path: &Path, comment: &str, progress: &mut P) -> Result<RescueOutcome>
    where
        P: ProgressSink + ?Sized,
    {
        let mut source = Self::open_source(source_path)?;
        info!(source = %source_path.display(), "source opened");
        self.run_with_source(&mut source, comment, progress)
    }

    /// Rescue from an already opened source
    pub fn run_with_source<S, P>(
        &self,
        source: &mut S,
        comment: &str,
        progress: &mut P,
    ) -> Result<RescueOutcome>
    where
        S: Read + Seek,
        P: ProgressSink + ?Sized,
    {
        let started = Local::now();
        let geometry = self.config.geometry;

        let metadata = BootMetadata::read_from(source);
        info!(serial = %metadata.serial, label = %metadata.label, "boot sector read");

        let mut scanner = Scanner::new(geometry, self.config.pass_count)
            .settle_delay(self.config.settle_delay);
        if let Some(flag) = &self.interrupt {
            scanner = scanner.interrupt(Arc::clone(flag));
        }
        let scan = scanner.scan(source, progress)?;

        let summary = HealthSummary::from_outcome(&scan);
        info!(
            stable_ok = summary.stable_ok_count(),
            unstable = summary.unstable.len(),
            stable_bad = summary.stable_bad.len(),
            health = summary.health_score(),
            "classification complete"
        );

        let report = RescueReport::new(started, metadata, &summary);
        let archive = ArchiveBuilder::new(&self.config.output_dir).build(
            &scan.image,
            &report,
            comment,
            summary.health_score(),
        )?;

        Ok(RescueOutcome {
            report,
            summary,
            archive,
            geometry,
        })
    }
}
