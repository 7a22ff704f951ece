/// Boot sector metadata extraction
///
/// Reads the volume serial number and label from a FAT boot sector. This is
/// best effort: anything that cannot be read or decoded leaves the defaults
/// in place and never aborts the rescue.

use crate::format::constants::*;
use crate::io::read_at;
use serde::{Deserialize, Serialize};
use std::io::{Read, Seek};
use tracing::debug;

/// Volume identification found in the boot sector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootMetadata {
    /// Volume serial as 8 uppercase hex digits, or `UNKNOWN`
    pub serial: String,
    /// Trimmed volume label, or `NO_LABEL`
    pub label: String,
    /// Filesystem the medium is expected to carry
    #[serde(rename = "fs")]
    pub filesystem: String,
}

impl Default for BootMetadata {
    fn default() -> Self {
        Self {
            serial: UNKNOWN_SERIAL.to_string(),
            label: NO_LABEL.to_string(),
            filesystem: EXPECTED_FILESYSTEM.to_string(),
        }
    }
}

impl BootMetadata {
    /// Read the boot sector from the start of `source`
    ///
    /// Short reads and I/O errors yield the default metadata.
    pub fn read_from<S: Read + Seek>(source: &mut S) -> Self {
        let mut boot = [0u8; BOOT_SECTOR_SIZE];
        match read_at(source, 0, &mut boot) {
            Ok(read) if read == BOOT_SECTOR_SIZE => Self::parse(&boot),
            Ok(read) => {
                debug!(read, "short boot sector read, keeping default metadata");
                Self::default()
            }
            Err(err) => {
                debug!(error = %err, "boot sector unreadable, keeping default metadata");
                Self::default()
            }
        }
    }

    /// Parse a boot sector buffer
    ///
    /// Buffers shorter than a full sector yield the default metadata.
    pub fn parse(boot: &[u8]) -> Self {
        let mut metadata = Self::default();
        if boot.len() < BOOT_SECTOR_SIZE {
            return metadata;
        }

        let serial = u32::from_le_bytes([
            boot[BOOT_SERIAL_OFFSET],
            boot[BOOT_SERIAL_OFFSET + 1],
            boot[BOOT_SERIAL_OFFSET + 2],
            boot[BOOT_SERIAL_OFFSET + 3],
        ]);
        metadata.serial = format!("{:08X}", serial);

        let label = decode_label(&boot[BOOT_LABEL_OFFSET..BOOT_LABEL_OFFSET + BOOT_LABEL_LEN]);
        if !label.is_empty() {
            metadata.label = label;
        }

        metadata
    }

    /// Whether a serial number was recovered
    pub fn has_serial(&self) -> bool {
        self.serial != UNKNOWN_SERIAL
    }
}

/// Check the filesystem type field for a FAT12 marker
pub fn has_fat12_marker(boot: &[u8]) -> bool {
    boot.get(BOOT_FS_TYPE_OFFSET..BOOT_FS_TYPE_OFFSET + FAT12_MARKER.len())
        .map(|field| field == FAT12_MARKER)
        .unwrap_or(false)
}

/// Decode the label field, dropping non-ASCII bytes
fn decode_label(field: &[u8]) -> String {
    let text: String = field
        .iter()
        .filter(|b| b.is_ascii())
        .map(|&b| b as char)
        .collect();
    text.trim_matches(|c: char| c.is_ascii_whitespace() || c == '\0')
        .to_string()
}
