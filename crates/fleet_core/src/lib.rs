//! Core data access for the rental fleet.
//! Maps cars, manufacturers and drivers onto SQLite and owns their
//! persistence invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{ConnectionProvider, DbError, DbResult, SqliteConnectionProvider};
pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use model::car::{Car, CarId};
pub use model::driver::{Driver, DriverId};
pub use model::manufacturer::{Manufacturer, ManufacturerId};
pub use repo::car_repo::{CarRepository, DataAccessError, RepoResult, SqliteCarRepository};
pub use service::car_service::{CarService, CarServiceError, CarServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
