//! In-memory `FleetStorage` backend.
//!
//! Committed data sits behind a `RwLock` so queries never wait on each
//! other. Snapshots are serialized by a single writer lock that a snapshot
//! owns for its whole lifetime; its writes are buffered and only applied to
//! the committed tables on `commit_snapshot`. Dropping or aborting a
//! snapshot discards the buffer.
//!
//! A single writer lock is a coarser version of the per-row locks a
//! database backend takes in `*_for_update`, with the same guarantee: no
//! two snapshots interleave their read-validate-write sequences.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use fleetflow_core::{Driver, DriverId, Trip, TripId, TripStatus, Vehicle, VehicleId};

use crate::error::StorageError;
use crate::record::{NewDriver, NewTrip, NewVehicle, TripQuery};
use crate::traits::FleetStorage;

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    last_vehicle_id: i64,
    last_driver_id: i64,
    last_trip_id: i64,
    trip_sequence: u64,
}

#[derive(Debug, Default)]
struct Tables {
    vehicles: BTreeMap<VehicleId, Vehicle>,
    drivers: BTreeMap<DriverId, Driver>,
    trips: BTreeMap<TripId, Trip>,
    counters: Counters,
}

/// Storage backed by process memory. Cloning shares the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    committed: Arc<RwLock<Tables>>,
    writer: Arc<Mutex<()>>,
}

/// An open transaction against [`MemoryStorage`].
pub struct MemorySnapshot {
    _writer: OwnedMutexGuard<()>,
    counters: Counters,
    vehicles: BTreeMap<VehicleId, Vehicle>,
    drivers: BTreeMap<DriverId, Driver>,
    trips: BTreeMap<TripId, Trip>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether another driver already holds `license`, as seen from inside
    /// `snapshot`. Blank licences are never considered taken.
    async fn license_taken(
        &self,
        snapshot: &MemorySnapshot,
        license: &str,
        except: Option<DriverId>,
    ) -> bool {
        let license = license.trim();
        if license.is_empty() {
            return false;
        }
        let tables = self.committed.read().await;
        tables
            .drivers
            .values()
            .filter(|d| !snapshot.drivers.contains_key(&d.id))
            .chain(snapshot.drivers.values())
            .filter(|d| Some(d.id) != except)
            .any(|d| d.license_number.trim().eq_ignore_ascii_case(license))
    }
}

fn newest_first(trips: &mut [Trip]) {
    trips.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

impl MemorySnapshot {
    /// Any trip, committed or buffered, satisfying `pred`. Buffered versions
    /// shadow their committed counterparts.
    fn any_trip(&self, tables: &Tables, pred: impl Fn(&Trip) -> bool) -> bool {
        self.visible_trips(tables).any(|t| pred(t))
    }

    fn visible_trips<'a>(&'a self, tables: &'a Tables) -> impl Iterator<Item = &'a Trip> + 'a {
        let committed = tables
            .trips
            .values()
            .map(|t| self.trips.get(&t.id).unwrap_or(t));
        let fresh = self
            .trips
            .values()
            .filter(|t| !tables.trips.contains_key(&t.id));
        committed.chain(fresh)
    }
}

#[async_trait]
impl FleetStorage for MemoryStorage {
    type Snapshot = MemorySnapshot;

    async fn begin_snapshot(&self) -> Result<MemorySnapshot, StorageError> {
        let writer = self.writer.clone().lock_owned().await;
        let counters = self.committed.read().await.counters;
        Ok(MemorySnapshot {
            _writer: writer,
            counters,
            vehicles: BTreeMap::new(),
            drivers: BTreeMap::new(),
            trips: BTreeMap::new(),
        })
    }

    async fn commit_snapshot(&self, snapshot: MemorySnapshot) -> Result<(), StorageError> {
        let mut tables = self.committed.write().await;
        tables.vehicles.extend(snapshot.vehicles);
        tables.drivers.extend(snapshot.drivers);
        tables.trips.extend(snapshot.trips);
        tables.counters = snapshot.counters;
        Ok(())
    }

    async fn abort_snapshot(&self, snapshot: MemorySnapshot) -> Result<(), StorageError> {
        drop(snapshot);
        Ok(())
    }

    async fn get_vehicle_for_update(
        &self,
        snapshot: &mut MemorySnapshot,
        vehicle_id: VehicleId,
    ) -> Result<Vehicle, StorageError> {
        if let Some(v) = snapshot.vehicles.get(&vehicle_id) {
            return Ok(v.clone());
        }
        self.get_vehicle(vehicle_id).await
    }

    async fn get_driver_for_update(
        &self,
        snapshot: &mut MemorySnapshot,
        driver_id: DriverId,
    ) -> Result<Driver, StorageError> {
        if let Some(d) = snapshot.drivers.get(&driver_id) {
            return Ok(d.clone());
        }
        self.get_driver(driver_id).await
    }

    async fn get_trip_for_update(
        &self,
        snapshot: &mut MemorySnapshot,
        trip_id: TripId,
    ) -> Result<Trip, StorageError> {
        if let Some(t) = snapshot.trips.get(&trip_id) {
            return Ok(t.clone());
        }
        self.get_trip(trip_id).await
    }

    async fn has_trip_for_vehicle(
        &self,
        snapshot: &mut MemorySnapshot,
        vehicle_id: VehicleId,
        statuses: &[TripStatus],
    ) -> Result<bool, StorageError> {
        let tables = self.committed.read().await;
        Ok(snapshot.any_trip(&tables, |t| {
            t.vehicle_id == vehicle_id && statuses.contains(&t.status)
        }))
    }

    async fn has_trip_for_driver(
        &self,
        snapshot: &mut MemorySnapshot,
        driver_id: DriverId,
        statuses: &[TripStatus],
    ) -> Result<bool, StorageError> {
        let tables = self.committed.read().await;
        Ok(snapshot.any_trip(&tables, |t| {
            t.driver_id == driver_id && statuses.contains(&t.status)
        }))
    }

    async fn trips_for_vehicle(
        &self,
        snapshot: &mut MemorySnapshot,
        vehicle_id: VehicleId,
        statuses: &[TripStatus],
    ) -> Result<Vec<Trip>, StorageError> {
        let tables = self.committed.read().await;
        Ok(snapshot
            .visible_trips(&tables)
            .filter(|t| t.vehicle_id == vehicle_id && statuses.contains(&t.status))
            .cloned()
            .collect())
    }

    async fn next_trip_sequence(&self, snapshot: &mut MemorySnapshot) -> Result<u64, StorageError> {
        snapshot.counters.trip_sequence += 1;
        Ok(snapshot.counters.trip_sequence)
    }

    async fn insert_trip(
        &self,
        snapshot: &mut MemorySnapshot,
        trip: NewTrip,
    ) -> Result<Trip, StorageError> {
        {
            let tables = self.committed.read().await;
            if snapshot.any_trip(&tables, |t| t.trip_code == trip.trip_code) {
                return Err(StorageError::DuplicateTripCode {
                    trip_code: trip.trip_code,
                });
            }
        }

        snapshot.counters.last_trip_id += 1;
        let stored = Trip {
            id: TripId(snapshot.counters.last_trip_id),
            trip_code: trip.trip_code,
            vehicle_id: trip.vehicle_id,
            driver_id: trip.driver_id,
            created_by: trip.created_by,
            origin_city: trip.origin_city,
            destination_city: trip.destination_city,
            distance_km: trip.distance_km,
            cargo_weight_kg: trip.cargo_weight_kg,
            cargo_type: trip.cargo_type,
            special_instructions: trip.special_instructions,
            status: trip.status,
            priority: trip.priority,
            scheduled_at: trip.scheduled_at,
            dispatched_at: None,
            arrived_at: None,
            delivered_at: None,
            fuel_litres: trip.fuel_litres,
            estimated_fuel_cost: trip.estimated_fuel_cost,
            actual_fuel_cost: None,
            created_at: trip.created_at,
            updated_at: trip.created_at,
        };
        snapshot.trips.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_trip(
        &self,
        snapshot: &mut MemorySnapshot,
        trip: &Trip,
    ) -> Result<(), StorageError> {
        self.get_trip_for_update(snapshot, trip.id).await?;
        snapshot.trips.insert(trip.id, trip.clone());
        Ok(())
    }

    async fn insert_vehicle(
        &self,
        snapshot: &mut MemorySnapshot,
        vehicle: NewVehicle,
    ) -> Result<Vehicle, StorageError> {
        let taken = {
            let tables = self.committed.read().await;
            tables
                .vehicles
                .values()
                .chain(snapshot.vehicles.values())
                .any(|v| v.vehicle_code.eq_ignore_ascii_case(&vehicle.vehicle_code))
        };
        if taken {
            return Err(StorageError::DuplicateVehicleCode {
                vehicle_code: vehicle.vehicle_code,
            });
        }

        snapshot.counters.last_vehicle_id += 1;
        let stored = Vehicle {
            id: VehicleId(snapshot.counters.last_vehicle_id),
            vehicle_code: vehicle.vehicle_code,
            model: vehicle.model,
            vehicle_type: vehicle.vehicle_type,
            capacity_kg: vehicle.capacity_kg,
            status: vehicle.status,
        };
        snapshot.vehicles.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_vehicle(
        &self,
        snapshot: &mut MemorySnapshot,
        vehicle: &Vehicle,
    ) -> Result<(), StorageError> {
        self.get_vehicle_for_update(snapshot, vehicle.id).await?;
        snapshot.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(())
    }

    async fn insert_driver(
        &self,
        snapshot: &mut MemorySnapshot,
        driver: NewDriver,
    ) -> Result<Driver, StorageError> {
        if self
            .license_taken(snapshot, &driver.license_number, None)
            .await
        {
            return Err(StorageError::DuplicateLicenseNumber {
                license_number: driver.license_number,
            });
        }

        snapshot.counters.last_driver_id += 1;
        let stored = Driver {
            id: DriverId(snapshot.counters.last_driver_id),
            full_name: driver.full_name,
            license_number: driver.license_number,
            status: driver.status,
            total_trips: 0,
        };
        snapshot.drivers.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_driver(
        &self,
        snapshot: &mut MemorySnapshot,
        driver: &Driver,
    ) -> Result<(), StorageError> {
        self.get_driver_for_update(snapshot, driver.id).await?;
        if self
            .license_taken(snapshot, &driver.license_number, Some(driver.id))
            .await
        {
            return Err(StorageError::DuplicateLicenseNumber {
                license_number: driver.license_number.clone(),
            });
        }
        snapshot.drivers.insert(driver.id, driver.clone());
        Ok(())
    }

    async fn get_vehicle(&self, vehicle_id: VehicleId) -> Result<Vehicle, StorageError> {
        self.committed
            .read()
            .await
            .vehicles
            .get(&vehicle_id)
            .cloned()
            .ok_or(StorageError::VehicleNotFound { vehicle_id })
    }

    async fn get_driver(&self, driver_id: DriverId) -> Result<Driver, StorageError> {
        self.committed
            .read()
            .await
            .drivers
            .get(&driver_id)
            .cloned()
            .ok_or(StorageError::DriverNotFound { driver_id })
    }

    async fn get_trip(&self, trip_id: TripId) -> Result<Trip, StorageError> {
        self.committed
            .read()
            .await
            .trips
            .get(&trip_id)
            .cloned()
            .ok_or(StorageError::TripNotFound { trip_id })
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, StorageError> {
        Ok(self.committed.read().await.vehicles.values().cloned().collect())
    }

    async fn list_drivers(&self) -> Result<Vec<Driver>, StorageError> {
        Ok(self.committed.read().await.drivers.values().cloned().collect())
    }

    async fn list_trips(&self) -> Result<Vec<Trip>, StorageError> {
        let mut trips: Vec<Trip> = self.committed.read().await.trips.values().cloned().collect();
        newest_first(&mut trips);
        Ok(trips)
    }

    async fn filter_trips(&self, query: &TripQuery) -> Result<Vec<Trip>, StorageError> {
        let tables = self.committed.read().await;
        let mut trips: Vec<Trip> = tables
            .trips
            .values()
            .filter(|t| {
                let vehicle_type = tables.vehicles.get(&t.vehicle_id).map(|v| v.vehicle_type);
                query.matches(t, vehicle_type)
            })
            .cloned()
            .collect();
        newest_first(&mut trips);
        Ok(trips)
    }

    async fn count_trips(&self) -> Result<u64, StorageError> {
        Ok(self.committed.read().await.trips.len() as u64)
    }
}
