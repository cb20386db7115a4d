//! Car aggregate.
//!
//! # Responsibility
//! - Hold one car together with its manufacturer and assigned drivers.
//! - Provide in-memory helpers for editing the driver set before persistence.
//!
//! # Invariants
//! - `id` is `None` until storage assigns one on create, immutable afterwards.
//! - `drivers` never holds two entries with the same driver id.

use super::driver::{Driver, DriverId};
use super::manufacturer::Manufacturer;
use serde::{Deserialize, Serialize};

/// Storage identifier of a car row.
pub type CarId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: Option<CarId>,
    pub model: String,
    /// Exactly one, backed by a required foreign key.
    pub manufacturer: Manufacturer,
    /// Drivers currently assigned to this car. Order carries no meaning.
    #[serde(default)]
    pub drivers: Vec<Driver>,
}

impl Car {
    /// Creates a not-yet-persisted car with no drivers.
    pub fn new(model: impl Into<String>, manufacturer: Manufacturer) -> Self {
        Self {
            id: None,
            model: model.into(),
            manufacturer,
            drivers: Vec::new(),
        }
    }

    /// Attaches a driver. Returns `false` when a driver with the same id is
    /// already attached.
    pub fn add_driver(&mut self, driver: Driver) -> bool {
        if self.has_driver(driver.id) {
            return false;
        }
        self.drivers.push(driver);
        true
    }

    /// Detaches a driver by id. Returns `false` when it was not attached.
    pub fn remove_driver(&mut self, driver_id: DriverId) -> bool {
        let before = self.drivers.len();
        self.drivers.retain(|driver| driver.id != driver_id);
        self.drivers.len() != before
    }

    pub fn has_driver(&self, driver_id: DriverId) -> bool {
        self.drivers.iter().any(|driver| driver.id == driver_id)
    }

    /// Returns attached driver ids in attachment order.
    pub fn driver_ids(&self) -> Vec<DriverId> {
        self.drivers.iter().map(|driver| driver.id).collect()
    }
}
