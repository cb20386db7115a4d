//! Rental fleet domain model.
//!
//! # Responsibility
//! - Define plain records for cars, manufacturers and drivers.
//! - Keep persistence concerns (row ids, soft-delete flags) out of callers' way.
//!
//! # Invariants
//! - Identifiers are assigned by storage and never reused.
//! - Deletion is represented by soft-delete flags in storage, not hard delete.

pub mod car;
pub mod driver;
pub mod manufacturer;
