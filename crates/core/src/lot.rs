//! Single-lane, capacity-bounded parking lot.

use std::num::NonZeroUsize;

use tracing::{debug, info};

use crate::{error::ParkingError, models::Vehicle, Result};

/// Result of trying to park a vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParkOutcome {
    /// The vehicle now occupies the top slot.
    Accepted,
    /// The lot was full; the vehicle is handed back untouched.
    Rejected(Vehicle),
}

/// Result of asking the lot to release a plate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The topmost vehicle with the plate left the lot.
    Removed(Vehicle),
    /// No parked vehicle carries the plate.
    NotFound,
}

/// Read-only view of the lot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotStatus {
    /// Plates ordered most recently parked first.
    pub plates: Vec<String>,
    /// Vehicles currently parked.
    pub occupied: usize,
    /// Total slots.
    pub capacity: usize,
}

/// Last-in/first-out lot. Only the most recently parked vehicle can leave
/// without displacing others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lot {
    capacity: NonZeroUsize,
    // Arrival order; the last element is the top of the lane.
    entries: Vec<Vehicle>,
}

impl Lot {
    /// Create an empty lot with room for `capacity` vehicles.
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or(ParkingError::ZeroCapacity)?;
        Ok(Self {
            capacity,
            entries: Vec::new(),
        })
    }

    /// Rebuild a lot from vehicles listed in arrival order.
    ///
    /// Returns `None` when more vehicles are given than the lot can hold.
    pub(crate) fn from_entries(capacity: NonZeroUsize, entries: Vec<Vehicle>) -> Option<Self> {
        (entries.len() <= capacity.get()).then_some(Self { capacity, entries })
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Number of parked vehicles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when every slot is taken.
    pub fn is_full(&self) -> bool {
        self.entries.len() == self.capacity.get()
    }

    /// True when no vehicle is parked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parked vehicles in arrival order, bottom of the lane first.
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.entries
    }

    /// Park a vehicle on top of the lane if there is room.
    pub fn park(&mut self, vehicle: Vehicle) -> ParkOutcome {
        if self.is_full() {
            debug!(plate = %vehicle, capacity = self.capacity(), "Lot full, vehicle rejected");
            return ParkOutcome::Rejected(vehicle);
        }
        info!(plate = %vehicle, "Vehicle parked");
        self.entries.push(vehicle);
        ParkOutcome::Accepted
    }

    /// Release the topmost vehicle carrying `plate`.
    ///
    /// Vehicles parked above it are moved aside and then put back, so every
    /// other vehicle keeps its position relative to the rest.
    pub fn remove(&mut self, plate: &str) -> RemoveOutcome {
        let mut held = Vec::new();
        let mut found = None;

        while let Some(top) = self.entries.pop() {
            if top.plate == plate {
                found = Some(top);
                break;
            }
            held.push(top);
        }

        // `held` has the displaced vehicles topmost-first; popping restores arrival order.
        while let Some(vehicle) = held.pop() {
            self.entries.push(vehicle);
        }

        match found {
            Some(vehicle) => {
                info!(plate = %vehicle, "Vehicle removed from lot");
                RemoveOutcome::Removed(vehicle)
            }
            None => {
                debug!(plate, "Plate not found in lot");
                RemoveOutcome::NotFound
            }
        }
    }

    /// Snapshot of the lane for display, most recently parked first.
    pub fn status(&self) -> LotStatus {
        LotStatus {
            plates: self
                .entries
                .iter()
                .rev()
                .map(|vehicle| vehicle.plate.clone())
                .collect(),
            occupied: self.entries.len(),
            capacity: self.capacity.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lot_with(capacity: usize, plates: &[&str]) -> Lot {
        let mut lot = Lot::new(capacity).expect("non-zero capacity");
        for plate in plates {
            assert_eq!(lot.park(Vehicle::new(*plate)), ParkOutcome::Accepted);
        }
        lot
    }

    fn plates(lot: &Lot) -> Vec<&str> {
        lot.vehicles().iter().map(Vehicle::plate).collect()
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(Lot::new(0), Err(ParkingError::ZeroCapacity)));
    }

    #[test]
    fn fills_exactly_at_capacity() {
        let mut lot = Lot::new(3).expect("lot");
        assert!(lot.is_empty());
        for (count, plate) in ["A", "B", "C"].into_iter().enumerate() {
            assert!(!lot.is_full());
            assert_eq!(lot.park(Vehicle::new(plate)), ParkOutcome::Accepted);
            assert_eq!(lot.len(), count + 1);
        }
        assert!(lot.is_full());

        assert_eq!(lot.remove("missing"), RemoveOutcome::NotFound);
        assert!(lot.is_full());

        assert_eq!(lot.remove("B"), RemoveOutcome::Removed(Vehicle::new("B")));
        assert!(!lot.is_full());
    }

    #[test]
    fn huge_capacity_does_not_reserve_slots() {
        let capacity = usize::MAX / 2;
        let mut lot = Lot::new(capacity).expect("lot");
        assert_eq!(lot.park(Vehicle::new("A")), ParkOutcome::Accepted);
        assert!(!lot.is_full());
        assert_eq!(lot.status().capacity, capacity);
        assert_eq!(lot.status().occupied, 1);
    }

    #[test]
    fn park_into_full_lot_hands_vehicle_back() {
        let mut lot = lot_with(2, &["A", "B"]);
        let before = lot.clone();

        let outcome = lot.park(Vehicle::new("C"));

        assert_eq!(outcome, ParkOutcome::Rejected(Vehicle::new("C")));
        assert_eq!(lot, before);
    }

    #[test]
    fn removing_unknown_plate_leaves_order_untouched() {
        let mut lot = lot_with(4, &["A", "B", "C"]);

        assert_eq!(lot.remove("Z"), RemoveOutcome::NotFound);
        assert_eq!(plates(&lot), ["A", "B", "C"]);
    }

    #[test]
    fn removing_from_empty_lot_is_not_found() {
        let mut lot = Lot::new(1).expect("lot");
        assert_eq!(lot.remove("A"), RemoveOutcome::NotFound);
        assert!(lot.is_empty());
    }

    #[test]
    fn buried_removal_preserves_order_of_displaced_vehicles() {
        let mut lot = lot_with(2, &["A", "B"]);
        assert_eq!(lot.remove("A"), RemoveOutcome::Removed(Vehicle::new("A")));
        assert_eq!(plates(&lot), ["B"]);

        let mut lot = lot_with(5, &["A", "B", "C", "D", "E"]);
        assert_eq!(lot.remove("B"), RemoveOutcome::Removed(Vehicle::new("B")));
        assert_eq!(plates(&lot), ["A", "C", "D", "E"]);
    }

    #[test]
    fn top_removal_needs_no_displacement() {
        let mut lot = lot_with(3, &["A", "B", "C"]);
        assert_eq!(lot.remove("C"), RemoveOutcome::Removed(Vehicle::new("C")));
        assert_eq!(plates(&lot), ["A", "B"]);
    }

    #[test]
    fn duplicate_plates_remove_topmost_only() {
        let mut lot = lot_with(4, &["X", "A", "X", "B"]);
        assert_eq!(lot.remove("X"), RemoveOutcome::Removed(Vehicle::new("X")));
        assert_eq!(plates(&lot), ["X", "A", "B"]);
    }

    #[test]
    fn status_lists_most_recent_first() {
        let lot = lot_with(3, &["A", "B"]);
        let status = lot.status();
        assert_eq!(status.plates, ["B", "A"]);
        assert_eq!(status.occupied, 2);
        assert_eq!(status.capacity, 3);
    }

    #[test]
    fn from_entries_enforces_capacity() {
        let capacity = NonZeroUsize::new(1).expect("non-zero");
        assert!(Lot::from_entries(capacity, vec![Vehicle::new("A"), Vehicle::new("B")]).is_none());
        let lot = Lot::from_entries(capacity, vec![Vehicle::new("A")]).expect("fits");
        assert!(lot.is_full());
    }
}
