/// Rescued image data structures

/// Recovery unit addressing and pass results
pub mod unit;

pub use unit::{RecoveryUnit, UnitId};

use crate::format::Geometry;

/// Best-effort reconstruction of the whole medium
///
/// Starts zero-filled; each unit's bytes are written once, from the first
/// pass that read it completely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterImage {
    geometry: Geometry,
    data: Vec<u8>,
}

impl MasterImage {
    /// Create a zero-filled image for the given geometry
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            data: vec![0u8; geometry.total_size()],
        }
    }

    /// Get the geometry
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Copy a full unit read into place
    ///
    /// `data` must be exactly one unit long.
    pub fn store_unit(&mut self, unit: UnitId, data: &[u8]) {
        let length = self.geometry.unit_length();
        debug_assert_eq!(data.len(), length);
        let offset = self.geometry.unit_offset(unit) as usize;
        self.data[offset..offset + length].copy_from_slice(&data[..length]);
    }

    /// Bytes currently held for a unit
    pub fn unit_data(&self, unit: UnitId) -> &[u8] {
        let length = self.geometry.unit_length();
        let offset = self.geometry.unit_offset(unit) as usize;
        &self.data[offset..offset + length]
    }

    /// Whole image
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Image size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the image has no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
