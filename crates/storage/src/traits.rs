use async_trait::async_trait;

use fleetflow_core::{Driver, DriverId, Trip, TripId, TripStatus, Vehicle, VehicleId};

use crate::error::StorageError;
use crate::record::{NewDriver, NewTrip, NewVehicle, TripQuery};

/// The storage trait for FleetFlow backends.
///
/// A `FleetStorage` implementation is both the Resource Store (vehicles and
/// drivers) and the Trip Store. Keeping them behind one trait lets a single
/// transaction cover a trip write together with the vehicle and driver
/// status writes it implies.
///
/// ## Snapshot Semantics
///
/// All mutating operations take `&mut Self::Snapshot`, a type representing an
/// in-progress transaction. The lifecycle is:
///
/// 1. `begin_snapshot()` -- start a transaction, returns a `Snapshot`
/// 2. Call locking reads and mutating methods with `&mut snapshot`
/// 3. `commit_snapshot(snapshot)` -- commit and consume the transaction
///    OR `abort_snapshot(snapshot)` -- roll back and consume the transaction
///
/// If a `Snapshot` is dropped without committing, the underlying transaction
/// MUST be rolled back.
///
/// ## Locking
///
/// The `*_for_update` reads lock the row until the snapshot ends
/// (`SELECT ... FOR UPDATE`). Two snapshots that lock the same vehicle or
/// driver are serialized, so an existence check made after taking the lock
/// cannot be invalidated before commit.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` to be used in axum
/// application state and across async task boundaries.
#[async_trait]
pub trait FleetStorage: Send + Sync + 'static {
    /// The snapshot (transaction) type used by this storage backend.
    type Snapshot: Send;

    // ── Snapshot lifecycle ────────────────────────────────────────────────────

    async fn begin_snapshot(&self) -> Result<Self::Snapshot, StorageError>;

    async fn commit_snapshot(&self, snapshot: Self::Snapshot) -> Result<(), StorageError>;

    async fn abort_snapshot(&self, snapshot: Self::Snapshot) -> Result<(), StorageError>;

    // ── Locking reads (within snapshot) ───────────────────────────────────────

    /// Returns `Err(StorageError::VehicleNotFound)` if the vehicle does not exist.
    async fn get_vehicle_for_update(
        &self,
        snapshot: &mut Self::Snapshot,
        vehicle_id: VehicleId,
    ) -> Result<Vehicle, StorageError>;

    /// Returns `Err(StorageError::DriverNotFound)` if the driver does not exist.
    async fn get_driver_for_update(
        &self,
        snapshot: &mut Self::Snapshot,
        driver_id: DriverId,
    ) -> Result<Driver, StorageError>;

    /// Returns `Err(StorageError::TripNotFound)` if the trip does not exist.
    async fn get_trip_for_update(
        &self,
        snapshot: &mut Self::Snapshot,
        trip_id: TripId,
    ) -> Result<Trip, StorageError>;

    /// Whether any trip referencing `vehicle_id` has a status in `statuses`.
    ///
    /// Sees the snapshot's own uncommitted writes.
    async fn has_trip_for_vehicle(
        &self,
        snapshot: &mut Self::Snapshot,
        vehicle_id: VehicleId,
        statuses: &[TripStatus],
    ) -> Result<bool, StorageError>;

    /// Whether any trip referencing `driver_id` has a status in `statuses`.
    async fn has_trip_for_driver(
        &self,
        snapshot: &mut Self::Snapshot,
        driver_id: DriverId,
        statuses: &[TripStatus],
    ) -> Result<bool, StorageError>;

    /// Trips referencing `vehicle_id` whose status is in `statuses`, as
    /// seen from inside the snapshot.
    async fn trips_for_vehicle(
        &self,
        snapshot: &mut Self::Snapshot,
        vehicle_id: VehicleId,
        statuses: &[TripStatus],
    ) -> Result<Vec<Trip>, StorageError>;

    // ── Writes (within snapshot) ──────────────────────────────────────────────

    /// Draw the next value of the trip-code sequence.
    ///
    /// Values returned to snapshots that commit are unique and strictly
    /// increasing. Starts at 1 on an empty store.
    async fn next_trip_sequence(&self, snapshot: &mut Self::Snapshot) -> Result<u64, StorageError>;

    /// Insert a trip and return it with its assigned id.
    ///
    /// Returns `Err(StorageError::DuplicateTripCode)` if the code is taken.
    async fn insert_trip(
        &self,
        snapshot: &mut Self::Snapshot,
        trip: NewTrip,
    ) -> Result<Trip, StorageError>;

    /// Overwrite an existing trip record.
    async fn update_trip(
        &self,
        snapshot: &mut Self::Snapshot,
        trip: &Trip,
    ) -> Result<(), StorageError>;

    /// Returns `Err(StorageError::DuplicateVehicleCode)` if the code is taken.
    async fn insert_vehicle(
        &self,
        snapshot: &mut Self::Snapshot,
        vehicle: NewVehicle,
    ) -> Result<Vehicle, StorageError>;

    /// Overwrite an existing vehicle record. The vehicle code is not
    /// re-checked; callers never change it.
    async fn update_vehicle(
        &self,
        snapshot: &mut Self::Snapshot,
        vehicle: &Vehicle,
    ) -> Result<(), StorageError>;

    /// Returns `Err(StorageError::DuplicateLicenseNumber)` if a non-empty
    /// licence number is already held by another driver.
    async fn insert_driver(
        &self,
        snapshot: &mut Self::Snapshot,
        driver: NewDriver,
    ) -> Result<Driver, StorageError>;

    /// Overwrite an existing driver record. Same licence rule as
    /// `insert_driver`, ignoring the driver's own record.
    async fn update_driver(
        &self,
        snapshot: &mut Self::Snapshot,
        driver: &Driver,
    ) -> Result<(), StorageError>;

    // ── Query operations (outside snapshot, committed data only) ─────────────

    async fn get_vehicle(&self, vehicle_id: VehicleId) -> Result<Vehicle, StorageError>;

    async fn get_driver(&self, driver_id: DriverId) -> Result<Driver, StorageError>;

    async fn get_trip(&self, trip_id: TripId) -> Result<Trip, StorageError>;

    /// All vehicles, ordered by id.
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, StorageError>;

    /// All drivers, ordered by id.
    async fn list_drivers(&self) -> Result<Vec<Driver>, StorageError>;

    /// All trips, most recently created first.
    async fn list_trips(&self) -> Result<Vec<Trip>, StorageError>;

    /// Trips matching every predicate set in `query`, most recently created first.
    async fn filter_trips(&self, query: &TripQuery) -> Result<Vec<Trip>, StorageError>;

    async fn count_trips(&self) -> Result<u64, StorageError>;
}
