//! FleetFlow trip assignment engine.
//!
//! [`TripEngine`] validates, creates, advances and cancels trips over any
//! [`FleetStorage`](fleetflow_storage::FleetStorage) backend, leasing
//! vehicles and drivers as a side effect. It also carries the fleet
//! registry operations that register vehicles and drivers and move them
//! between the statuses the lifecycle does not own.

pub mod clock;
mod config;
mod engine;
mod error;
mod fleet;
pub mod fuel;
mod request;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, EngineConfig};
pub use engine::TripEngine;
pub use error::{Conflict, EngineError, Entity, ErrorKind};
pub use fuel::{FuelConfig, FuelEstimator, RouteDistance, TableFuelEstimator};
pub use request::{CreateTripRequest, DriverUpdate, VehicleUpdate};
