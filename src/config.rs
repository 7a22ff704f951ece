/// Rescue run configuration

use crate::error::{RescueError, Result};
use crate::format::constants::DEFAULT_PASS_COUNT;
use crate::format::Geometry;
use std::path::PathBuf;
use std::time::Duration;

/// Default directory archives are written to
pub const DEFAULT_OUTPUT_DIR: &str = "BAK";

/// Default minimum time between runs against one output directory
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(3 * 60);

/// Default pause between passes
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Everything a rescue run needs besides the source and comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescueConfig {
    /// Geometry of the medium
    pub geometry: Geometry,
    /// Number of full sweeps
    pub pass_count: usize,
    /// Pause between passes to let the drive settle
    pub settle_delay: Duration,
    /// Directory archives are written to
    pub output_dir: PathBuf,
    /// Minimum time since the newest archive before a new run
    pub cooldown: Duration,
}

impl RescueConfig {
    /// Configuration with the default 1.44MB geometry and two passes
    pub fn new() -> Self {
        Self {
            geometry: Geometry::floppy_1440k(),
            pass_count: DEFAULT_PASS_COUNT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            cooldown: DEFAULT_COOLDOWN,
        }
    }

    /// Set the geometry
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Set the number of passes
    pub fn with_pass_count(mut self, pass_count: usize) -> Self {
        self.pass_count = pass_count;
        self
    }

    /// Set the pause between passes
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Set the output directory
    pub fn with_output_dir<P: Into<PathBuf>>(mut self, output_dir: P) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Set the cooldown period
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Reject configurations the scanner cannot run
    pub fn validate(&self) -> Result<()> {
        if self.pass_count == 0 {
            return Err(RescueError::invalid_config("pass count must be at least 1"));
        }
        if self.geometry.unit_count() == 0 || self.geometry.unit_length() == 0 {
            return Err(RescueError::invalid_config(format!(
                "geometry has no data: {} tracks, {} heads, {} x {} byte sectors",
                self.geometry.tracks,
                self.geometry.heads,
                self.geometry.sectors_per_track,
                self.geometry.sector_size
            )));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(RescueError::invalid_config("output directory is empty"));
        }
        Ok(())
    }
}

impl Default for RescueConfig {
    fn default() -> Self {
        Self::new()
    }
}
