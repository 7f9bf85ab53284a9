use crate::models::Vehicle;

use super::ParkingSession;

/// How a session starts.
#[derive(Debug)]
pub enum Bootstrap {
    /// A snapshot was found and the session is ready.
    Restored(ParkingSession),
    /// First run: a capacity must be chosen before the session exists.
    AwaitingCapacity,
}

/// Where an arriving vehicle ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Parked in the lot.
    Parked,
    /// The lot was full; the vehicle waits at this 1-based queue position.
    Queued { position: usize },
}

/// Result of a removal request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The vehicle left; `promoted` is the waiting vehicle that took its slot.
    Removed {
        vehicle: Vehicle,
        promoted: Option<Vehicle>,
    },
    /// No parked vehicle carries the plate.
    NotFound,
}
