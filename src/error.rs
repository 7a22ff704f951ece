use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rescue operations
pub type Result<T> = std::result::Result<T, RescueError>;

/// Errors that can abort a rescue run
///
/// Per-unit read failures never surface here; they are recorded as failed
/// passes and only show up in the final classification.
#[derive(Debug, Error)]
pub enum RescueError {
    /// I/O error outside of the scan loop
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source device could not be opened at all
    #[error("Cannot open source {}: {source}", path.display())]
    SourceOpen {
        /// Path that was requested
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The source exists but the process lacks the rights to read it
    #[error("Permission denied opening {} ({hint})", path.display())]
    PermissionDenied {
        /// Path that was requested
        path: PathBuf,
        /// Platform-appropriate suggestion for gaining access
        hint: &'static str,
    },

    /// The drive stopped responding in a way that makes the pass meaningless
    #[error("Hardware error during pass {pass}: {source}")]
    Hardware {
        /// 1-based pass number
        pass: usize,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The scan was interrupted by the user; no archive was written
    #[error("Scan interrupted during pass {pass}")]
    Interrupted {
        /// 1-based pass number
        pass: usize,
    },

    /// An uncompressed file of the bundle could not be written
    #[error("Cannot write {}: {source}", path.display())]
    IntermediateWrite {
        /// File that was being written
        path: PathBuf,
        /// Intermediate files left on disk for manual recovery
        intermediates: Vec<PathBuf>,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The report could not be serialized
    #[error("Report serialization failed: {source}")]
    Serialization {
        /// Intermediate files left on disk for manual recovery
        intermediates: Vec<PathBuf>,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// The archive could not be written; intermediates are kept
    #[error("Compression failed for {}: {source}", archive.display())]
    Compression {
        /// Archive path that was being written
        archive: PathBuf,
        /// Intermediate files left on disk for manual recovery
        intermediates: Vec<PathBuf>,
        /// Underlying error
        #[source]
        source: zip::result::ZipError,
    },

    /// Configuration is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation not available on this platform
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl RescueError {
    /// Create an invalid configuration error
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        RescueError::InvalidConfig(message.into())
    }

    /// Create an unsupported operation error
    pub fn unsupported<S: Into<String>>(message: S) -> Self {
        RescueError::Unsupported(message.into())
    }

    /// Classify a failure to open the source device
    pub fn source_open<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            RescueError::PermissionDenied {
                path,
                hint: privilege_hint(),
            }
        } else {
            RescueError::SourceOpen { path, source }
        }
    }

    /// Intermediate files left behind by a failed archival step
    pub fn intermediates(&self) -> &[PathBuf] {
        match self {
            RescueError::IntermediateWrite { intermediates, .. }
            | RescueError::Serialization { intermediates, .. }
            | RescueError::Compression { intermediates, .. } => intermediates,
            _ => &[],
        }
    }

    /// Whether the scan finished but the bundle could not be written
    pub fn is_fatal_archival(&self) -> bool {
        matches!(
            self,
            RescueError::IntermediateWrite { .. }
                | RescueError::Serialization { .. }
                | RescueError::Compression { .. }
        )
    }

    /// Whether the error happened before any scanning took place
    pub fn is_fatal_open(&self) -> bool {
        matches!(
            self,
            RescueError::SourceOpen { .. } | RescueError::PermissionDenied { .. }
        )
    }
}

#[cfg(windows)]
fn privilege_hint() -> &'static str {
    "try running from an Administrator prompt"
}

#[cfg(not(windows))]
fn privilege_hint() -> &'static str {
    "try again with sudo or add your user to the disk group"
}
