//! Error type shared by the parking core.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Convenience alias used throughout the core crate.
pub type Result<T, E = ParkingError> = std::result::Result<T, E>;

/// Failures surfaced by the lot, queue, and snapshot layers.
///
/// Full lots, empty queues, and unknown plates are ordinary outcomes and are
/// reported through return values instead.
#[derive(Debug, Error)]
pub enum ParkingError {
    /// A lot was requested with room for no vehicles.
    #[error("parking lot capacity must be at least 1")]
    ZeroCapacity,
    /// The snapshot file could not be read or written.
    #[error("snapshot I/O failed for {}: {source}", path.display())]
    SnapshotIo {
        /// Snapshot location.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The snapshot exists but does not describe a valid lot and queue.
    #[error("corrupt snapshot {}: {reason}", path.display())]
    CorruptSnapshot {
        /// Snapshot location.
        path: PathBuf,
        /// What failed validation.
        reason: String,
    },
    /// The snapshot was written by a newer format revision.
    #[error("snapshot {} uses format version {found}, newest supported is {supported}", path.display())]
    UnsupportedSnapshotVersion {
        /// Snapshot location.
        path: PathBuf,
        /// Version found in the document.
        found: u32,
        /// Newest version this build understands.
        supported: u32,
    },
    /// The in-memory state could not be encoded.
    #[error("failed to encode snapshot: {0}")]
    SnapshotEncode(#[from] serde_json::Error),
}

impl ParkingError {
    /// True for failures caused by the snapshot contents rather than the environment.
    ///
    /// Callers may fall back to a fresh lot on other errors, but not on these.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::CorruptSnapshot { .. } | Self::UnsupportedSnapshotVersion { .. }
        )
    }
}
