//! Driver record.
//!
//! Drivers are soft-deletable in storage; a deleted driver is never
//! materialized as a `Driver`, so the record carries no tombstone flag.

use serde::{Deserialize, Serialize};

/// Storage identifier of a driver row.
pub type DriverId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: DriverId,
    pub name: String,
    pub license_number: String,
}

impl Driver {
    pub fn new(id: DriverId, name: impl Into<String>, license_number: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            license_number: license_number.into(),
        }
    }
}
