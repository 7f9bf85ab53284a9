#![warn(clippy::all, missing_docs)]

//! Core domain logic for the Parkline simulation.
//!
//! This crate hosts the single-lane lot, its overflow queue, the session
//! context tying them together, configuration handling, and the snapshot
//! persistence used by the terminal UI and any future frontends.

pub mod config;
pub mod error;
pub mod lot;
pub mod models;
pub mod queue;
pub mod save;
pub mod session;

pub use self::config::AppConfig;
pub use error::{ParkingError, Result};
pub use lot::{Lot, LotStatus, ParkOutcome, RemoveOutcome};
pub use models::Vehicle;
pub use queue::{QueueStatus, WaitingQueue};
pub use save::SnapshotStore;
pub use session::{AddOutcome, Bootstrap, ParkingSession, RemovalOutcome};
