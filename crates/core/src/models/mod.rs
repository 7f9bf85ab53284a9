//! Shared domain models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A vehicle, known only by its license plate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    /// License plate; unique by convention only.
    #[serde(alias = "number_plate")]
    pub plate: String,
}

impl Vehicle {
    /// Build a vehicle from its plate.
    pub fn new(plate: impl Into<String>) -> Self {
        Self {
            plate: plate.into(),
        }
    }

    /// Borrow the plate string.
    pub fn plate(&self) -> &str {
        &self.plate
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.plate)
    }
}
