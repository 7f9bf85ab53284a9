//! Snapshot persistence for the lot and waiting queue.

use std::{
    fs,
    io::{self, Write},
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{error::ParkingError, lot::Lot, models::Vehicle, queue::WaitingQueue, Result};

/// File name used when no snapshot path is configured.
pub const DEFAULT_SNAPSHOT_FILE: &str = "parking_data.json";

/// Newest snapshot layout this build reads and the one it writes.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized representation of a snapshot file.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotDocument {
    #[serde(default = "legacy_version")]
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
    #[serde(alias = "parking_lot")]
    lot: LotRecord,
    waiting_queue: Vec<Vehicle>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LotRecord {
    capacity: usize,
    /// Arrival order, bottom of the lane first.
    #[serde(alias = "stack")]
    entries: Vec<Vehicle>,
}

// Files written before versioning carry no `version` key.
fn legacy_version() -> u32 {
    1
}

/// Reads and writes the snapshot at a single well-known location.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Create a store backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the lot and queue, replacing any previous snapshot.
    ///
    /// The document is written to a temporary sibling file and renamed into
    /// place, so readers observe either the old or the new snapshot.
    pub fn save(&self, lot: &Lot, queue: &WaitingQueue) -> Result<()> {
        let document = SnapshotDocument {
            version: SNAPSHOT_VERSION,
            saved_at: Some(Utc::now()),
            lot: LotRecord {
                capacity: lot.capacity(),
                entries: lot.vehicles().to_vec(),
            },
            waiting_queue: queue.vehicles().cloned().collect(),
        };
        let serialised = serde_json::to_vec_pretty(&document)?;

        let parent = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;

        let mut staged = NamedTempFile::new_in(parent).map_err(|source| self.io_error(source))?;
        staged
            .write_all(&serialised)
            .and_then(|_| staged.as_file().sync_all())
            .map_err(|source| self.io_error(source))?;
        staged
            .persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;

        info!(
            path = %self.path.display(),
            parked = lot.len(),
            waiting = queue.len(),
            "Snapshot saved"
        );
        Ok(())
    }

    /// Restore the lot and queue from disk.
    ///
    /// Returns `Ok(None)` when no snapshot has been written yet.
    pub fn load(&self) -> Result<Option<(Lot, WaitingQueue)>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No snapshot present");
                return Ok(None);
            }
            Err(err) => return Err(self.io_error(err)),
        };

        let (lot, queue) = self.decode(&content)?;
        info!(
            path = %self.path.display(),
            parked = lot.len(),
            waiting = queue.len(),
            "Snapshot loaded"
        );
        Ok(Some((lot, queue)))
    }

    fn decode(&self, content: &str) -> Result<(Lot, WaitingQueue)> {
        let raw: Value = serde_json::from_str(content)
            .map_err(|err| self.corrupt(format!("invalid JSON: {err}")))?;
        if !raw.is_object() {
            return Err(self.corrupt("top level must be an object"));
        }

        match raw.get("version") {
            None => {}
            Some(version) => {
                let found = version
                    .as_u64()
                    .and_then(|value| u32::try_from(value).ok())
                    .ok_or_else(|| self.corrupt("`version` must be a non-negative integer"))?;
                if found > SNAPSHOT_VERSION {
                    return Err(ParkingError::UnsupportedSnapshotVersion {
                        path: self.path.clone(),
                        found,
                        supported: SNAPSHOT_VERSION,
                    });
                }
            }
        }

        let document: SnapshotDocument =
            serde_json::from_value(raw).map_err(|err| self.corrupt(err.to_string()))?;

        let capacity = NonZeroUsize::new(document.lot.capacity)
            .ok_or_else(|| self.corrupt("`lot.capacity` must be at least 1"))?;
        let parked = document.lot.entries.len();
        let lot = Lot::from_entries(capacity, document.lot.entries).ok_or_else(|| {
            self.corrupt(format!(
                "{parked} parked vehicles exceed capacity {}",
                capacity.get()
            ))
        })?;
        let queue = WaitingQueue::from_vehicles(document.waiting_queue);
        Ok((lot, queue))
    }

    fn io_error(&self, source: io::Error) -> ParkingError {
        ParkingError::SnapshotIo {
            path: self.path.clone(),
            source,
        }
    }

    fn corrupt(&self, reason: impl Into<String>) -> ParkingError {
        ParkingError::CorruptSnapshot {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}
