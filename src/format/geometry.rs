/// Physical geometry of the medium being rescued

use crate::format::constants::SECTOR_SIZE;
use crate::image::UnitId;

/// Disk geometry
///
/// A unit is one (track, head) pair; units are laid out track-major,
/// head-minor, matching how a PC floppy controller maps logical offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Tracks (cylinders) per head
    pub tracks: u8,
    /// Number of heads (sides)
    pub heads: u8,
    /// Sectors per track
    pub sectors_per_track: u8,
    /// Sector size in bytes
    pub sector_size: u16,
}

impl Geometry {
    /// Create a geometry with the given layout
    pub fn new(tracks: u8, heads: u8, sectors_per_track: u8, sector_size: u16) -> Self {
        Self {
            tracks,
            heads,
            sectors_per_track,
            sector_size,
        }
    }

    /// 3.5" HD 1.44MB (80 tracks, 2 heads, 18 sectors, 512 bytes)
    pub fn floppy_1440k() -> Self {
        Self::new(80, 2, 18, SECTOR_SIZE)
    }

    /// 3.5" DD 720K (80 tracks, 2 heads, 9 sectors, 512 bytes)
    pub fn floppy_720k() -> Self {
        Self::new(80, 2, 9, SECTOR_SIZE)
    }

    /// Bytes read per unit
    pub fn unit_length(&self) -> usize {
        self.sectors_per_track as usize * self.sector_size as usize
    }

    /// Number of (track, head) units
    pub fn unit_count(&self) -> usize {
        self.tracks as usize * self.heads as usize
    }

    /// Total image size in bytes
    pub fn total_size(&self) -> usize {
        self.unit_count() * self.unit_length()
    }

    /// Position of a unit in track-major order
    pub fn unit_index(&self, unit: UnitId) -> usize {
        unit.track as usize * self.heads as usize + unit.head as usize
    }

    /// Byte offset of a unit from the start of the medium
    pub fn unit_offset(&self, unit: UnitId) -> u64 {
        (self.unit_index(unit) * self.unit_length()) as u64
    }

    /// All units in scan order
    pub fn units(&self) -> impl Iterator<Item = UnitId> {
        let heads = self.heads;
        (0..self.tracks)
            .flat_map(move |track| (0..heads).map(move |head| UnitId::new(track, head)))
    }

    /// Total capacity in KB
    pub fn total_capacity_kb(&self) -> usize {
        self.total_size() / 1024
    }

    /// Set the number of tracks
    pub fn with_tracks(mut self, tracks: u8) -> Self {
        self.tracks = tracks;
        self
    }

    /// Set the number of heads
    pub fn with_heads(mut self, heads: u8) -> Self {
        self.heads = heads;
        self
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::floppy_1440k()
    }
}
