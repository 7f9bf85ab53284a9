//! Overflow queue for vehicles that arrive at a full lot.

use std::collections::VecDeque;

use tracing::info;

use crate::models::Vehicle;

/// Read-only view of the waiting queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStatus {
    /// Plates ordered oldest arrival first.
    pub plates: Vec<String>,
    /// Vehicles currently waiting.
    pub waiting: usize,
}

/// Unbounded first-in/first-out holding area.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaitingQueue {
    pending: VecDeque<Vehicle>,
}

impl WaitingQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_vehicles(vehicles: Vec<Vehicle>) -> Self {
        Self {
            pending: vehicles.into(),
        }
    }

    /// True when nobody is waiting.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of waiting vehicles.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Waiting vehicles, next to be served first.
    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.pending.iter()
    }

    /// Add a vehicle behind everyone already waiting.
    pub fn enqueue(&mut self, vehicle: Vehicle) {
        info!(plate = %vehicle, position = self.pending.len() + 1, "Vehicle queued");
        self.pending.push_back(vehicle);
    }

    /// Take the vehicle that has waited longest.
    pub fn dequeue(&mut self) -> Option<Vehicle> {
        let vehicle = self.pending.pop_front()?;
        info!(plate = %vehicle, "Vehicle left waiting queue");
        Some(vehicle)
    }

    pub(crate) fn requeue_front(&mut self, vehicle: Vehicle) {
        self.pending.push_front(vehicle);
    }

    /// Snapshot of the queue for display, oldest arrival first.
    pub fn status(&self) -> QueueStatus {
        QueueStatus {
            plates: self
                .pending
                .iter()
                .map(|vehicle| vehicle.plate.clone())
                .collect(),
            waiting: self.pending.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dequeue_on_empty_queue_is_none() {
        let mut queue = WaitingQueue::new();
        assert_eq!(queue.dequeue(), None);
        assert!(queue.is_empty());
        assert_eq!(queue, WaitingQueue::new());
    }

    #[test]
    fn single_vehicle_round_trip() {
        let mut queue = WaitingQueue::new();
        queue.enqueue(Vehicle::new("AAA"));
        assert!(!queue.is_empty());
        assert_eq!(queue.dequeue(), Some(Vehicle::new("AAA")));
        assert!(queue.is_empty());
    }

    #[test]
    fn serves_oldest_first() {
        let mut queue = WaitingQueue::new();
        for plate in ["A", "B", "C"] {
            queue.enqueue(Vehicle::new(plate));
        }

        let status = queue.status();
        assert_eq!(status.plates, ["A", "B", "C"]);
        assert_eq!(status.waiting, 3);

        assert_eq!(queue.dequeue().map(|v| v.plate), Some("A".to_string()));
        assert_eq!(queue.status().plates, ["B", "C"]);
    }
}
