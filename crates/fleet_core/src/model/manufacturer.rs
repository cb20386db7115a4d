//! Manufacturer reference record.

use serde::{Deserialize, Serialize};

/// Storage identifier of a manufacturer row.
pub type ManufacturerId = i64;

/// Car manufacturer. Reference data that core only reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manufacturer {
    pub id: ManufacturerId,
    pub name: String,
    pub country: String,
}

impl Manufacturer {
    pub fn new(id: ManufacturerId, name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            country: country.into(),
        }
    }
}
