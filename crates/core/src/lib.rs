//! fleetflow-core: FleetFlow domain model.
//!
//! Three entities make up the domain: [`Vehicle`], [`Driver`] and [`Trip`].
//! A trip references its vehicle and driver by id only; the records
//! themselves are owned by the storage layer and resolved through it.
//!
//! The trip lifecycle is an explicit transition table (see
//! [`TripStatus::next`]) rather than an ordered list, so the set of legal
//! moves is fixed at compile time.
//!
//! This crate does no I/O.

pub mod driver;
pub mod ids;
pub mod status;
pub mod trip;
pub mod vehicle;

pub use driver::{Driver, DriverStatus};
pub use ids::{ActorId, DriverId, TripId, VehicleId};
pub use status::ParseStatusError;
pub use trip::{Milestone, Transition, Trip, TripCode, TripPriority, TripStatus, LIFECYCLE};
pub use vehicle::{Vehicle, VehicleStatus, VehicleType};
