/// Recovery unit data structures

use std::fmt;

/// Address of one (track, head) unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId {
    /// Physical track (cylinder) number
    pub track: u8,
    /// Physical head (side) number
    pub head: u8,
}

impl UnitId {
    /// Create a new unit address
    pub fn new(track: u8, head: u8) -> Self {
        Self { track, head }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T:{:02} H:{}", self.track, self.head)
    }
}

/// Per-unit record of which passes read the unit successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryUnit {
    /// Unit address
    pub id: UnitId,
    /// One flag per configured pass
    results: Box<[bool]>,
    /// Passes recorded so far
    passes_run: usize,
    /// Pass whose data was kept in the master image
    first_success: Option<usize>,
}

impl RecoveryUnit {
    /// Create a unit with room for `pass_count` results
    pub fn new(id: UnitId, pass_count: usize) -> Self {
        Self {
            id,
            results: vec![false; pass_count].into_boxed_slice(),
            passes_run: 0,
            first_success: None,
        }
    }

    /// Record the outcome of a 0-based pass
    ///
    /// Returns `true` when this is the unit's first successful read, i.e. the
    /// caller should copy the data into the master image.
    pub fn record(&mut self, pass: usize, success: bool) -> bool {
        debug_assert_eq!(pass, self.passes_run, "passes must be recorded in order");
        self.results[pass] = success;
        self.passes_run = pass + 1;

        if success && self.first_success.is_none() {
            self.first_success = Some(pass);
            true
        } else {
            false
        }
    }

    /// Outcomes of the passes run so far, in pass order
    pub fn results(&self) -> &[bool] {
        &self.results[..self.passes_run]
    }

    /// Number of passes recorded
    pub fn passes_run(&self) -> usize {
        self.passes_run
    }

    /// Number of successful reads
    pub fn success_count(&self) -> usize {
        self.results().iter().filter(|&&ok| ok).count()
    }

    /// 0-based pass that supplied the unit's data, if any did
    pub fn first_success(&self) -> Option<usize> {
        self.first_success
    }
}
