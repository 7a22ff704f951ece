/// Disk geometry and on-disk constants

/// Format constants
pub mod constants;
/// Geometry presets
pub mod geometry;

pub use constants::*;
pub use geometry::Geometry;
