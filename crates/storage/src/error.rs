use fleetflow_core::{DriverId, TripCode, TripId, VehicleId};

/// All errors that can be returned by a FleetStorage implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No vehicle record with the given id.
    #[error("vehicle not found: {vehicle_id}")]
    VehicleNotFound { vehicle_id: VehicleId },

    /// No driver record with the given id.
    #[error("driver not found: {driver_id}")]
    DriverNotFound { driver_id: DriverId },

    /// No trip record with the given id.
    #[error("trip not found: {trip_id}")]
    TripNotFound { trip_id: TripId },

    /// A trip with this code already exists. Trip codes are unique.
    #[error("duplicate trip code: {trip_code}")]
    DuplicateTripCode { trip_code: TripCode },

    /// A vehicle with this code is already registered.
    #[error("duplicate vehicle code: {vehicle_code}")]
    DuplicateVehicleCode { vehicle_code: String },

    /// A driver with this (non-empty) licence number is already registered.
    #[error("duplicate license number: {license_number}")]
    DuplicateLicenseNumber { license_number: String },

    /// A backend-specific storage error (DB connection, serialization, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}
