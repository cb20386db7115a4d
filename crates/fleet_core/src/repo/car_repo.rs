//! Car repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Map `cars`, `manufacturers`, `drivers` and `cars_drivers` rows to the
//!   `Car` aggregate and back.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Soft-deleted cars are invisible to every read path.
//! - Soft-deleted drivers never appear in a returned driver set, even when a
//!   join row still points at them.
//! - `create`/`update` write the car row and its join rows in one
//!   transaction; a failure leaves storage as it was before the call.
//! - Every failure surfaces as `DataAccessError` naming the attempted
//!   operation.

use crate::db::{ConnectionProvider, DbError, DbResult};
use crate::model::car::{Car, CarId};
use crate::model::driver::{Driver, DriverId};
use crate::model::manufacturer::Manufacturer;
use log::{debug, error, info};
use rusqlite::{params, Connection, OptionalExtension, Params, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const CAR_SELECT_SQL: &str = "SELECT
    c.id AS id,
    c.model AS model,
    m.id AS m_id,
    m.name AS name,
    m.country AS country
FROM cars c
INNER JOIN manufacturers m ON c.manufacturer_id = m.id";

pub type RepoResult<T> = Result<T, DataAccessError>;

/// Failure of any car persistence operation.
///
/// Carries a human-readable description of the attempted operation and,
/// when storage was reached, the underlying cause.
#[derive(Debug)]
pub struct DataAccessError {
    message: String,
    cause: Option<DbError>,
}

impl DataAccessError {
    pub fn new(message: impl Into<String>, cause: impl Into<DbError>) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    /// Error raised before any statement ran, e.g. for a car without id.
    pub fn without_cause(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&DbError> {
        self.cause.as_ref()
    }
}

impl Display for DataAccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}: {cause}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl Error for DataAccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_ref().map(|cause| cause as &(dyn Error + 'static))
    }
}

/// Repository interface for car CRUD and driver assignment.
pub trait CarRepository {
    /// Persists a new car and its driver assignments; returns it with `id` set.
    fn create(&self, car: Car) -> RepoResult<Car>;
    /// Gets one non-deleted car with manufacturer and drivers.
    fn get(&self, id: CarId) -> RepoResult<Option<Car>>;
    /// Lists every non-deleted car. Order is unspecified.
    fn get_all(&self) -> RepoResult<Vec<Car>>;
    /// Overwrites model/manufacturer of a live car and replaces its driver set.
    fn update(&self, car: Car) -> RepoResult<Car>;
    /// Soft-deletes a car. Returns whether a live row was flagged.
    fn delete(&self, id: CarId) -> RepoResult<bool>;
    /// Lists every non-deleted car currently assigned to the driver.
    fn get_all_by_driver(&self, driver_id: DriverId) -> RepoResult<Vec<Car>>;
}

/// SQLite-backed car repository acquiring one connection per operation.
pub struct SqliteCarRepository<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> SqliteCarRepository<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn insert_car(&self, car: &Car) -> DbResult<CarId> {
        let mut conn = self.provider.connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO cars (model, manufacturer_id) VALUES (?1, ?2);",
            params![car.model.as_str(), car.manufacturer.id],
        )?;
        let car_id = tx.last_insert_rowid();
        insert_drivers(&tx, car_id, &car.drivers)?;

        tx.commit()?;
        Ok(car_id)
    }

    fn rewrite_car(&self, car_id: CarId, car: &Car) -> DbResult<usize> {
        let mut conn = self.provider.connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            "UPDATE cars
             SET
                model = ?1,
                manufacturer_id = ?2
             WHERE id = ?3
               AND is_deleted = 0;",
            params![car.model.as_str(), car.manufacturer.id, car_id],
        )?;

        tx.execute("DELETE FROM cars_drivers WHERE car_id = ?1;", [car_id])?;
        insert_drivers(&tx, car_id, &car.drivers)?;

        tx.commit()?;
        Ok(changed)
    }

    fn load_car(&self, car_id: CarId) -> DbResult<Option<Car>> {
        let conn = self.provider.connection()?;
        let mut stmt = conn.prepare(&format!(
            "{CAR_SELECT_SQL}
             WHERE c.id = ?1
               AND c.is_deleted = 0;"
        ))?;

        let car = stmt.query_row([car_id], parse_car_row).optional()?;
        match car {
            Some(mut car) => {
                car.drivers = load_drivers_for_car(&conn, car_id)?;
                Ok(Some(car))
            }
            None => Ok(None),
        }
    }

    fn load_cars(&self, filter_sql: &str, params: impl Params) -> DbResult<Vec<Car>> {
        let conn = self.provider.connection()?;
        query_cars(&conn, &format!("{CAR_SELECT_SQL} {filter_sql}"), params)
    }

    fn flag_deleted(&self, car_id: CarId) -> DbResult<bool> {
        let conn = self.provider.connection()?;
        let changed = conn.execute(
            "UPDATE cars
             SET is_deleted = 1
             WHERE id = ?1
               AND is_deleted = 0;",
            [car_id],
        )?;
        Ok(changed > 0)
    }
}

impl<P: ConnectionProvider> CarRepository for SqliteCarRepository<P> {
    fn create(&self, mut car: Car) -> RepoResult<Car> {
        let started_at = Instant::now();
        match self.insert_car(&car) {
            Ok(car_id) => {
                car.id = Some(car_id);
                info!(
                    "event=car_create module=repo status=ok car_id={} driver_count={} duration_ms={}",
                    car_id,
                    car.drivers.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(car)
            }
            Err(err) => {
                log_failure("car_create", started_at, &err);
                Err(DataAccessError::new(
                    format!("couldn't create {}", describe_car(&car)),
                    err,
                ))
            }
        }
    }

    fn get(&self, id: CarId) -> RepoResult<Option<Car>> {
        let started_at = Instant::now();
        let car = self.load_car(id).map_err(|err| {
            log_failure("car_get", started_at, &err);
            DataAccessError::new(format!("couldn't get car by id {id}"), err)
        })?;
        debug!(
            "event=car_get module=repo status=ok car_id={} found={} duration_ms={}",
            id,
            car.is_some(),
            started_at.elapsed().as_millis()
        );
        Ok(car)
    }

    fn get_all(&self) -> RepoResult<Vec<Car>> {
        let started_at = Instant::now();
        let cars = self
            .load_cars("WHERE c.is_deleted = 0;", [])
            .map_err(|err| {
                log_failure("car_list", started_at, &err);
                DataAccessError::new("couldn't get all cars", err)
            })?;
        debug!(
            "event=car_list module=repo status=ok count={} duration_ms={}",
            cars.len(),
            started_at.elapsed().as_millis()
        );
        Ok(cars)
    }

    fn update(&self, car: Car) -> RepoResult<Car> {
        let Some(car_id) = car.id else {
            return Err(DataAccessError::without_cause(format!(
                "couldn't update {}: car has no id",
                describe_car(&car)
            )));
        };

        let started_at = Instant::now();
        match self.rewrite_car(car_id, &car) {
            Ok(changed) => {
                info!(
                    "event=car_update module=repo status=ok car_id={} rows_changed={} driver_count={} duration_ms={}",
                    car_id,
                    changed,
                    car.drivers.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(car)
            }
            Err(err) => {
                log_failure("car_update", started_at, &err);
                Err(DataAccessError::new(
                    format!("couldn't update {}", describe_car(&car)),
                    err,
                ))
            }
        }
    }

    fn delete(&self, id: CarId) -> RepoResult<bool> {
        let started_at = Instant::now();
        let deleted = self.flag_deleted(id).map_err(|err| {
            log_failure("car_delete", started_at, &err);
            DataAccessError::new(format!("couldn't delete car with id {id}"), err)
        })?;
        info!(
            "event=car_delete module=repo status=ok car_id={} deleted={} duration_ms={}",
            id,
            deleted,
            started_at.elapsed().as_millis()
        );
        Ok(deleted)
    }

    fn get_all_by_driver(&self, driver_id: DriverId) -> RepoResult<Vec<Car>> {
        let started_at = Instant::now();
        let cars = self
            .load_cars(
                "INNER JOIN cars_drivers cd ON cd.car_id = c.id
                 WHERE c.is_deleted = 0
                   AND cd.driver_id = ?1;",
                [driver_id],
            )
            .map_err(|err| {
                log_failure("car_list_by_driver", started_at, &err);
                DataAccessError::new(
                    format!("couldn't get all cars by driver id {driver_id}"),
                    err,
                )
            })?;
        debug!(
            "event=car_list_by_driver module=repo status=ok driver_id={} count={} duration_ms={}",
            driver_id,
            cars.len(),
            started_at.elapsed().as_millis()
        );
        Ok(cars)
    }
}

fn query_cars(conn: &Connection, sql: &str, params: impl Params) -> DbResult<Vec<Car>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut cars = Vec::new();

    while let Some(row) = rows.next()? {
        let car_id: CarId = row.get("id")?;
        let mut car = parse_car_row(row)?;
        car.drivers = load_drivers_for_car(conn, car_id)?;
        cars.push(car);
    }

    Ok(cars)
}

fn load_drivers_for_car(conn: &Connection, car_id: CarId) -> rusqlite::Result<Vec<Driver>> {
    let mut stmt = conn.prepare(
        "SELECT
            d.id AS id,
            d.name AS name,
            d.license_number AS license_number
         FROM cars_drivers cd
         INNER JOIN drivers d ON cd.driver_id = d.id
         WHERE cd.car_id = ?1
           AND d.is_deleted = 0
         ORDER BY d.id ASC;",
    )?;
    let drivers = stmt
        .query_map([car_id], parse_driver_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(drivers)
}

fn insert_drivers(conn: &Connection, car_id: CarId, drivers: &[Driver]) -> rusqlite::Result<()> {
    let mut stmt =
        conn.prepare("INSERT INTO cars_drivers (car_id, driver_id) VALUES (?1, ?2);")?;
    for driver in drivers {
        stmt.execute(params![car_id, driver.id])?;
    }
    Ok(())
}

fn parse_car_row(row: &Row<'_>) -> rusqlite::Result<Car> {
    Ok(Car {
        id: Some(row.get("id")?),
        model: row.get("model")?,
        manufacturer: parse_manufacturer_row(row)?,
        drivers: Vec::new(),
    })
}

fn parse_manufacturer_row(row: &Row<'_>) -> rusqlite::Result<Manufacturer> {
    Ok(Manufacturer {
        id: row.get("m_id")?,
        name: row.get("name")?,
        country: row.get("country")?,
    })
}

fn parse_driver_row(row: &Row<'_>) -> rusqlite::Result<Driver> {
    Ok(Driver {
        id: row.get("id")?,
        name: row.get("name")?,
        license_number: row.get("license_number")?,
    })
}

// Names stay out of this text; it ends up in error messages and logs.
fn describe_car(car: &Car) -> String {
    match car.id {
        Some(id) => format!(
            "car id={id} manufacturer_id={} driver_ids={:?}",
            car.manufacturer.id,
            car.driver_ids()
        ),
        None => format!(
            "new car manufacturer_id={} driver_ids={:?}",
            car.manufacturer.id,
            car.driver_ids()
        ),
    }
}

fn log_failure(event: &str, started_at: Instant, err: &DbError) {
    error!(
        "event={} module=repo status=error duration_ms={} error={}",
        event,
        started_at.elapsed().as_millis(),
        err
    );
}

#[cfg(test)]
mod tests {
    use super::{describe_car, DataAccessError};
    use crate::db::DbError;
    use crate::model::car::Car;
    use crate::model::driver::Driver;
    use crate::model::manufacturer::Manufacturer;
    use std::error::Error;

    #[test]
    fn data_access_error_exposes_cause_as_source() {
        let err = DataAccessError::new(
            "couldn't get car by id 3",
            DbError::MissingRequiredTable("cars"),
        );
        assert_eq!(err.message(), "couldn't get car by id 3");
        assert!(err.source().is_some());
        assert_eq!(
            err.to_string(),
            "couldn't get car by id 3: missing required table `cars`"
        );
    }

    #[test]
    fn data_access_error_without_cause_has_no_source() {
        let err = DataAccessError::without_cause("car has no id");
        assert!(err.cause().is_none());
        assert!(err.source().is_none());
        assert_eq!(err.to_string(), "car has no id");
    }

    #[test]
    fn describe_car_omits_model_and_names() {
        let mut car = Car::new("Secret Model", Manufacturer::new(4, "Acme", "Nowhere"));
        car.add_driver(Driver::new(9, "Jane", "LN-9"));

        let text = describe_car(&car);
        assert_eq!(text, "new car manufacturer_id=4 driver_ids=[9]");

        car.id = Some(12);
        assert!(describe_car(&car).starts_with("car id=12 "));
    }
}
