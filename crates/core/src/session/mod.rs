#![allow(missing_docs)]

//! Session context owning the lot and waiting queue.

mod models;

pub use models::{AddOutcome, Bootstrap, RemovalOutcome};

use tracing::{info, warn};

use crate::{
    lot::{Lot, LotStatus, ParkOutcome, RemoveOutcome},
    models::Vehicle,
    queue::{QueueStatus, WaitingQueue},
    save::SnapshotStore,
    Result,
};

/// One run of the simulation: a lot, its overflow queue, and the rules that
/// move vehicles between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParkingSession {
    lot: Lot,
    queue: WaitingQueue,
}

impl ParkingSession {
    /// Start a fresh session with an empty lot of the given capacity.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            lot: Lot::new(capacity)?,
            queue: WaitingQueue::new(),
        })
    }

    /// Assemble a session from existing parts.
    pub fn from_parts(lot: Lot, queue: WaitingQueue) -> Self {
        Self { lot, queue }
    }

    /// Resume from the store's snapshot, or report that a capacity is needed.
    ///
    /// Snapshot errors are returned as-is; choosing to discard a bad file is
    /// left to the caller.
    pub fn bootstrap(store: &SnapshotStore) -> Result<Bootstrap> {
        match store.load()? {
            Some((lot, queue)) => {
                info!(
                    parked = lot.len(),
                    capacity = lot.capacity(),
                    waiting = queue.len(),
                    "Session restored"
                );
                Ok(Bootstrap::Restored(Self::from_parts(lot, queue)))
            }
            None => {
                info!("No snapshot found, awaiting capacity");
                Ok(Bootstrap::AwaitingCapacity)
            }
        }
    }

    pub fn lot(&self) -> &Lot {
        &self.lot
    }

    pub fn queue(&self) -> &WaitingQueue {
        &self.queue
    }

    /// Park the vehicle, sending it to the back of the queue if the lot is full.
    pub fn add_vehicle(&mut self, plate: impl Into<String>) -> AddOutcome {
        match self.lot.park(Vehicle::new(plate)) {
            ParkOutcome::Accepted => AddOutcome::Parked,
            ParkOutcome::Rejected(vehicle) => {
                self.queue.enqueue(vehicle);
                AddOutcome::Queued {
                    position: self.queue.len(),
                }
            }
        }
    }

    /// Release a parked vehicle and fill the freed slot from the queue.
    pub fn remove_vehicle(&mut self, plate: &str) -> RemovalOutcome {
        let vehicle = match self.lot.remove(plate) {
            RemoveOutcome::Removed(vehicle) => vehicle,
            RemoveOutcome::NotFound => return RemovalOutcome::NotFound,
        };

        let promoted = match self.queue.dequeue() {
            Some(next) => match self.lot.park(next.clone()) {
                ParkOutcome::Accepted => {
                    info!(plate = %next, "Waiting vehicle moved into lot");
                    Some(next)
                }
                // Unreachable after a removal; keep the vehicle at the head of the line.
                ParkOutcome::Rejected(vehicle) => {
                    warn!(plate = %vehicle, "Freed slot unavailable, vehicle stays queued");
                    self.queue.requeue_front(vehicle);
                    None
                }
            },
            None => None,
        };

        RemovalOutcome::Removed { vehicle, promoted }
    }

    pub fn lot_status(&self) -> LotStatus {
        self.lot.status()
    }

    pub fn queue_status(&self) -> QueueStatus {
        self.queue.status()
    }

    /// Persist the session. Failures are returned to the caller.
    pub fn commit(&self, store: &SnapshotStore) -> Result<()> {
        store.save(&self.lot, &self.queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParkingError;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn overflow_is_promoted_after_removal() -> Result<()> {
        let mut session = ParkingSession::new(1)?;

        assert_eq!(session.add_vehicle("AAA"), AddOutcome::Parked);
        assert_eq!(session.add_vehicle("BBB"), AddOutcome::Queued { position: 1 });
        assert_eq!(session.lot_status().plates, ["AAA"]);
        assert_eq!(session.queue_status().plates, ["BBB"]);

        assert_eq!(
            session.remove_vehicle("AAA"),
            RemovalOutcome::Removed {
                vehicle: Vehicle::new("AAA"),
                promoted: Some(Vehicle::new("BBB")),
            }
        );
        assert_eq!(session.lot_status().plates, ["BBB"]);
        assert!(session.queue_status().plates.is_empty());
        Ok(())
    }

    #[test]
    fn queue_positions_count_up() -> Result<()> {
        let mut session = ParkingSession::new(1)?;
        session.add_vehicle("A");
        assert_eq!(session.add_vehicle("B"), AddOutcome::Queued { position: 1 });
        assert_eq!(session.add_vehicle("C"), AddOutcome::Queued { position: 2 });
        Ok(())
    }

    #[test]
    fn failed_removal_leaves_queue_alone() -> Result<()> {
        let mut session = ParkingSession::new(1)?;
        session.add_vehicle("A");
        session.add_vehicle("B");
        let before = session.clone();

        assert_eq!(session.remove_vehicle("Z"), RemovalOutcome::NotFound);
        assert_eq!(session, before);
        Ok(())
    }

    #[test]
    fn removal_without_waiters_promotes_nothing() -> Result<()> {
        let mut session = ParkingSession::new(2)?;
        session.add_vehicle("A");
        session.add_vehicle("B");

        assert_eq!(
            session.remove_vehicle("A"),
            RemovalOutcome::Removed {
                vehicle: Vehicle::new("A"),
                promoted: None,
            }
        );
        assert_eq!(session.lot_status().plates, ["B"]);
        Ok(())
    }

    #[test]
    fn fresh_run_awaits_capacity() -> Result<()> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path().join("parking_data.json"));
        assert!(matches!(
            ParkingSession::bootstrap(&store)?,
            Bootstrap::AwaitingCapacity
        ));
        Ok(())
    }

    #[test]
    fn commit_then_bootstrap_restores() -> Result<()> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path().join("parking_data.json"));
        let mut session = ParkingSession::new(2)?;
        for plate in ["A", "B", "C", "D"] {
            session.add_vehicle(plate);
        }
        session.commit(&store)?;

        match ParkingSession::bootstrap(&store)? {
            Bootstrap::Restored(restored) => assert_eq!(restored, session),
            Bootstrap::AwaitingCapacity => panic!("expected restored session"),
        }
        Ok(())
    }

    #[test]
    fn corrupt_snapshot_is_surfaced() -> Result<()> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path().join("parking_data.json"));
        fs::write(
            store.path(),
            r#"{"lot": {"capacity": "two", "entries": []}, "waiting_queue": []}"#,
        )?;

        let err = ParkingSession::bootstrap(&store).expect_err("corrupt snapshot");
        assert!(matches!(err, ParkingError::CorruptSnapshot { .. }));
        assert!(err.is_structural());
        Ok(())
    }
}
