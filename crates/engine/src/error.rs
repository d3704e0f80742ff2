use std::fmt;

use rust_decimal::Decimal;

use fleetflow_core::{DriverStatus, TripCode, TripStatus, VehicleStatus};
use fleetflow_storage::StorageError;

/// The kind of record a [`EngineError::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Vehicle,
    Driver,
    Trip,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::Vehicle => "vehicle",
            Entity::Driver => "driver",
            Entity::Trip => "trip",
        })
    }
}

/// Coarse classification used by boundary layers to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    Conflict,
    Internal,
}

/// Errors returned by engine operations.
///
/// None of these are retried by the engine. Every variant is raised before
/// the operation's snapshot commits, so a failed call leaves no writes
/// behind.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: i64 },

    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Conflict(#[from] Conflict),

    #[error(transparent)]
    Storage(StorageError),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NotFound { .. } => ErrorKind::NotFound,
            EngineError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            EngineError::Conflict(_) => ErrorKind::Conflict,
            EngineError::Storage(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        EngineError::InvalidArgument(message.into())
    }
}

impl From<StorageError> for EngineError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::VehicleNotFound { vehicle_id } => EngineError::NotFound {
                entity: Entity::Vehicle,
                id: vehicle_id.get(),
            },
            StorageError::DriverNotFound { driver_id } => EngineError::NotFound {
                entity: Entity::Driver,
                id: driver_id.get(),
            },
            StorageError::TripNotFound { trip_id } => EngineError::NotFound {
                entity: Entity::Trip,
                id: trip_id.get(),
            },
            StorageError::DuplicateTripCode { trip_code } => {
                EngineError::Conflict(Conflict::DuplicateTripCode { trip_code })
            }
            StorageError::DuplicateVehicleCode { vehicle_code } => {
                EngineError::Conflict(Conflict::DuplicateVehicleCode { vehicle_code })
            }
            StorageError::DuplicateLicenseNumber { license_number } => {
                EngineError::Conflict(Conflict::DuplicateLicenseNumber { license_number })
            }
            other => EngineError::Storage(other),
        }
    }
}

/// State-based rule violations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Conflict {
    #[error("vehicle {vehicle_code} is not available (status: {status})")]
    VehicleUnavailable {
        vehicle_code: String,
        status: VehicleStatus,
    },

    #[error(
        "vehicle capacity exceeded: cargo {cargo_kg} kg > vehicle capacity {capacity_kg} kg"
    )]
    CapacityExceeded {
        cargo_kg: Decimal,
        capacity_kg: Decimal,
    },

    #[error("driver {driver_name} is not available (status: {status})")]
    DriverUnavailable {
        driver_name: String,
        status: DriverStatus,
    },

    #[error("driver {driver_name} is already assigned to an active trip; double booking prevented")]
    DriverDoubleBooked { driver_name: String },

    #[error("vehicle {vehicle_code} is already assigned to an active trip; double booking prevented")]
    VehicleDoubleBooked { vehicle_code: String },

    #[error("trip {trip_code} is already in final state: {status}")]
    AlreadyFinal {
        trip_code: TripCode,
        status: TripStatus,
    },

    #[error("trip {trip_code} cannot be cancelled (status: {status})")]
    NotCancellable {
        trip_code: TripCode,
        status: TripStatus,
    },

    #[error("{resource} is on a trip; its status is released by the trip lifecycle")]
    ResourceOnTrip { resource: String },

    #[error("ON_TRIP is assigned by trip creation and cannot be set directly")]
    OnTripReserved,

    #[error("trip code {trip_code} is already taken")]
    DuplicateTripCode { trip_code: TripCode },

    #[error("vehicle code {vehicle_code} is already registered")]
    DuplicateVehicleCode { vehicle_code: String },

    #[error("license number {license_number} is already registered")]
    DuplicateLicenseNumber { license_number: String },

    #[error(
        "vehicle {vehicle_code} capacity {capacity_kg} kg is below the {cargo_kg} kg cargo of active trip {trip_code}"
    )]
    CapacityBelowCargo {
        vehicle_code: String,
        capacity_kg: Decimal,
        cargo_kg: Decimal,
        trip_code: TripCode,
    },
}
