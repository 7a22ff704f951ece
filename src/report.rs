/// Structured rescue report
///
/// Built once after classification and serialized into the archive next to
/// the raw image.

use crate::boot::BootMetadata;
use crate::health::{HealthSummary, UnitHealth};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Timestamp format shown to humans
pub const DISPLAY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sortable timestamp format used in file names
pub const FILENAME_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Report document stored in the archive bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescueReport {
    /// When the run started, for display
    #[serde(rename = "timestamp_str")]
    pub display_timestamp: String,
    /// When the run started, file-name safe
    #[serde(rename = "filename_ts")]
    pub filename_timestamp: String,
    /// Boot sector metadata
    pub metadata: BootMetadata,
    /// Descriptors of units that read on some passes only
    #[serde(rename = "unstable_spots")]
    pub unstable: Vec<String>,
    /// Descriptors of units that never read
    #[serde(rename = "stable_bad_spots")]
    pub stable_bad: Vec<String>,
    /// Classification of every unit, track-major then head-minor
    pub disk_map: Vec<UnitHealth>,
}

impl RescueReport {
    /// Assemble the report for a classified scan
    pub fn new(started: DateTime<Local>, metadata: BootMetadata, summary: &HealthSummary) -> Self {
        Self {
            display_timestamp: started.format(DISPLAY_TIMESTAMP_FORMAT).to_string(),
            filename_timestamp: started.format(FILENAME_TIMESTAMP_FORMAT).to_string(),
            metadata,
            unstable: summary.unstable_descriptors(),
            stable_bad: summary.stable_bad_descriptors(),
            disk_map: summary.disk_map.clone(),
        }
    }

    /// Serialize as indented JSON
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        Ok(out)
    }

    /// Parse a serialized report
    pub fn from_json(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }
}
