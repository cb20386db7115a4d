//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository reads never return soft-deleted rows.
//! - Repository APIs report every storage failure as `DataAccessError`.

pub mod car_repo;
