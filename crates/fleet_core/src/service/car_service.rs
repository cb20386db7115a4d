//! Car use-case service.
//!
//! # Responsibility
//! - Provide stable car entry points for core callers.
//! - Implement driver assignment on top of full-replace repository updates.
//!
//! # Invariants
//! - Service APIs never bypass repository persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::car::{Car, CarId};
use crate::model::driver::{Driver, DriverId};
use crate::repo::car_repo::{CarRepository, DataAccessError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CarServiceResult<T> = Result<T, CarServiceError>;

/// Service error for car use-cases.
#[derive(Debug)]
pub enum CarServiceError {
    /// Target car does not exist or is soft-deleted.
    CarNotFound(CarId),
    /// Persistence-layer failure.
    Repo(DataAccessError),
}

impl Display for CarServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CarNotFound(car_id) => write!(f, "car not found: {car_id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CarServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::CarNotFound(_) => None,
        }
    }
}

impl From<DataAccessError> for CarServiceError {
    fn from(value: DataAccessError) -> Self {
        Self::Repo(value)
    }
}

/// Use-case service wrapper for car persistence.
pub struct CarService<R: CarRepository> {
    repo: R,
}

impl<R: CarRepository> CarService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create(&self, car: Car) -> CarServiceResult<Car> {
        Ok(self.repo.create(car)?)
    }

    pub fn get(&self, id: CarId) -> CarServiceResult<Option<Car>> {
        Ok(self.repo.get(id)?)
    }

    /// Gets one live car, turning absence into `CarNotFound`.
    pub fn get_required(&self, id: CarId) -> CarServiceResult<Car> {
        self.repo.get(id)?.ok_or(CarServiceError::CarNotFound(id))
    }

    pub fn get_all(&self) -> CarServiceResult<Vec<Car>> {
        Ok(self.repo.get_all()?)
    }

    pub fn update(&self, car: Car) -> CarServiceResult<Car> {
        Ok(self.repo.update(car)?)
    }

    pub fn delete(&self, id: CarId) -> CarServiceResult<bool> {
        Ok(self.repo.delete(id)?)
    }

    pub fn get_all_by_driver(&self, driver_id: DriverId) -> CarServiceResult<Vec<Car>> {
        Ok(self.repo.get_all_by_driver(driver_id)?)
    }

    /// Attaches `driver` to `car` and persists the resulting driver set.
    ///
    /// # Contract
    /// - Attaching an already attached driver leaves the set unchanged.
    /// - Returns the car as persisted.
    pub fn add_driver_to_car(&self, driver: Driver, mut car: Car) -> CarServiceResult<Car> {
        car.add_driver(driver);
        Ok(self.repo.update(car)?)
    }

    /// Detaches the driver from `car` and persists the resulting driver set.
    pub fn remove_driver_from_car(
        &self,
        driver_id: DriverId,
        mut car: Car,
    ) -> CarServiceResult<Car> {
        car.remove_driver(driver_id);
        Ok(self.repo.update(car)?)
    }
}
