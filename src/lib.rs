/*!
# floppyrescue

A Rust library for multi-pass raw recovery of failing floppy disks.

## Features

- Multi-pass sweeps over every (track, head) unit with first-good-read-wins reconstruction
- Tri-state track health classification and a disk-wide health score
- Volume serial and label extraction from the FAT boot sector
- Content-addressed zip bundles holding the raw image and a JSON report
- Cooldown gate limiting how often a failing drive is hammered

## Quick Start

```rust,no_run
use floppyrescue::{ConsoleProgress, Rescue, RescueConfig, SourceResolver, platform_resolver};

let config = RescueConfig::new().with_pass_count(3).with_output_dir("BAK");
let rescue = Rescue::new(config)?;

// Resolve the platform's default floppy device
let source = platform_resolver().resolve(Some("auto"))?;

// Scan, classify and archive
let outcome = rescue.run(&source, "tax-1998", &mut ConsoleProgress::stdout())?;
println!("Health: {}%", outcome.summary.health_score());
println!("Archive: {}", outcome.archive.path.display());
# Ok::<(), floppyrescue::RescueError>(())
```

## Modules

- `boot`: Boot sector serial and label extraction
- `cooldown`: Minimum wait between runs
- `health`: Track health classification
- `io`: Source resolution, scanning and archive output
- `map`: Health map rendering
- `progress`: Progress estimation
- `rescue`: Run orchestration
*/

#![warn(missing_docs)]

/// Boot sector metadata
pub mod boot;
/// Run configuration
pub mod config;
/// Cooldown gate between runs
pub mod cooldown;
/// Error types and Result alias
pub mod error;
/// Disk geometry and constants
pub mod format;
/// Track health classification
pub mod health;
/// Rescued image data structures
pub mod image;
/// Source resolution, scanning and archive output
pub mod io;
/// Health map visualization
pub mod map;
/// Progress estimation and display
pub mod progress;
/// Structured rescue report
pub mod report;
/// Run orchestration
pub mod rescue;

// Re-export common types
pub use boot::BootMetadata;
pub use config::RescueConfig;
pub use cooldown::{CooldownGate, CooldownOutcome};
pub use error::{RescueError, Result};
pub use format::Geometry;
pub use health::{HealthSummary, UnitHealth, UnstableUnit};
pub use image::{MasterImage, RecoveryUnit, UnitId};
pub use io::{
    platform_resolver, ArchiveBuilder, ArchiveBundle, DeviceCandidate, ScanOutcome, Scanner,
    SourceResolver,
};
pub use progress::{
    ConsoleProgress, Estimate, NoProgress, ProgressEstimator, ProgressSink, ProgressUpdate,
};
pub use report::RescueReport;
pub use rescue::{Rescue, RescueOutcome};
