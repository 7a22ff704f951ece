/// Track health classification
///
/// Reduces each unit's pass results to one of three states and aggregates
/// the disk-wide statistics used for the report and the archive name.

use crate::image::{RecoveryUnit, UnitId};
use crate::io::scanner::ScanOutcome;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Health of a single unit across all passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitHealth {
    /// Read successfully on every pass
    StableOk,
    /// Read successfully on some passes only
    Unstable,
    /// Never read successfully
    StableBad,
}

impl UnitHealth {
    /// Classify from the number of successful passes
    pub fn classify(successes: usize, passes: usize) -> Self {
        if successes == 0 {
            UnitHealth::StableBad
        } else if successes >= passes {
            UnitHealth::StableOk
        } else {
            UnitHealth::Unstable
        }
    }

    /// Whether at least one pass recovered the unit's data
    #[inline]
    pub fn is_salvaged(&self) -> bool {
        *self != UnitHealth::StableBad
    }

    /// Name used in the serialized report
    pub fn name(&self) -> &'static str {
        match self {
            UnitHealth::StableOk => "STABLE_OK",
            UnitHealth::Unstable => "UNSTABLE",
            UnitHealth::StableBad => "STABLE_BAD",
        }
    }
}

impl fmt::Display for UnitHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A unit that read on some passes but not all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnstableUnit {
    /// Unit address
    pub id: UnitId,
    /// Successful passes
    pub successes: usize,
    /// Passes executed
    pub passes: usize,
}

impl fmt::Display for UnstableUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.id, self.successes, self.passes)
    }
}

/// Disk-wide classification result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthSummary {
    /// Passes the classification is based on
    pub passes: usize,
    /// One entry per unit, track-major then head-minor
    pub disk_map: Vec<UnitHealth>,
    /// Units that read on some passes only
    pub unstable: Vec<UnstableUnit>,
    /// Units that never read
    pub stable_bad: Vec<UnitId>,
}

impl HealthSummary {
    /// Classify every unit of a scan
    pub fn classify(units: &[RecoveryUnit], passes: usize) -> Self {
        let mut disk_map = Vec::with_capacity(units.len());
        let mut unstable = Vec::new();
        let mut stable_bad = Vec::new();

        for unit in units {
            let successes = unit.success_count();
            let health = UnitHealth::classify(successes, passes);
            match health {
                UnitHealth::StableOk => {}
                UnitHealth::Unstable => unstable.push(UnstableUnit {
                    id: unit.id,
                    successes,
                    passes,
                }),
                UnitHealth::StableBad => stable_bad.push(unit.id),
            }
            disk_map.push(health);
        }

        Self {
            passes,
            disk_map,
            unstable,
            stable_bad,
        }
    }

    /// Classify the units of a finished scan
    pub fn from_outcome(outcome: &ScanOutcome) -> Self {
        Self::classify(&outcome.units, outcome.passes)
    }

    /// Number of units classified
    pub fn total_units(&self) -> usize {
        self.disk_map.len()
    }

    /// Units with at least one good read
    pub fn salvaged_count(&self) -> usize {
        self.total_units() - self.stable_bad.len()
    }

    /// Units that read on every pass
    pub fn stable_ok_count(&self) -> usize {
        self.disk_map
            .iter()
            .filter(|&&h| h == UnitHealth::StableOk)
            .count()
    }

    /// Percentage of units that are not completely unreadable
    pub fn health_score(&self) -> u8 {
        health_score(self.salvaged_count(), self.total_units())
    }

    /// Unstable unit descriptors, e.g. `T:05 H:1 (1/2)`
    pub fn unstable_descriptors(&self) -> Vec<String> {
        self.unstable.iter().map(|u| u.to_string()).collect()
    }

    /// Unreadable unit descriptors, e.g. `T:05 H:1`
    pub fn stable_bad_descriptors(&self) -> Vec<String> {
        self.stable_bad.iter().map(|u| u.to_string()).collect()
    }
}

/// `round(100 * salvaged / total)`, rounding halves to even
pub fn health_score(salvaged: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let scaled = 100 * salvaged.min(total);
    let (quotient, remainder) = (scaled / total, scaled % total);
    let round_up = 2 * remainder > total || (2 * remainder == total && quotient % 2 == 1);
    (quotient + usize::from(round_up)) as u8
}
