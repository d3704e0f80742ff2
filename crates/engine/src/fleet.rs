//! Fleet registry: vehicles and drivers outside the trip lifecycle.
//!
//! ON_TRIP belongs to the trip lifecycle. Registry writes can neither set
//! it nor move a resource out of it.

use rust_decimal::Decimal;
use tracing::info;

use fleetflow_core::{
    Driver, DriverId, DriverStatus, TripStatus, Vehicle, VehicleId, VehicleStatus,
};
use fleetflow_storage::{FleetStorage, NewDriver, NewVehicle};

use crate::clock::Clock;
use crate::engine::TripEngine;
use crate::error::{Conflict, EngineError};
use crate::fuel::FuelEstimator;
use crate::request::{DriverUpdate, VehicleUpdate};

impl<S, F, C> TripEngine<S, F, C>
where
    S: FleetStorage,
    F: FuelEstimator,
    C: Clock,
{
    pub async fn register_vehicle(&self, vehicle: NewVehicle) -> Result<Vehicle, EngineError> {
        if vehicle.vehicle_code.trim().is_empty() {
            return Err(EngineError::invalid("vehicle code is required"));
        }
        if vehicle.capacity_kg <= Decimal::ZERO {
            return Err(EngineError::invalid(format!(
                "vehicle capacity must be positive, got {} kg",
                vehicle.capacity_kg
            )));
        }
        if vehicle.status == VehicleStatus::OnTrip {
            return Err(Conflict::OnTripReserved.into());
        }

        let mut snapshot = self.storage.begin_snapshot().await?;
        let outcome = self
            .storage
            .insert_vehicle(&mut snapshot, vehicle)
            .await
            .map_err(EngineError::from);
        let vehicle = self.finish(snapshot, outcome).await?;

        info!(vehicle_id = %vehicle.id, vehicle_code = %vehicle.vehicle_code, "vehicle registered");
        Ok(vehicle)
    }

    pub async fn register_driver(&self, driver: NewDriver) -> Result<Driver, EngineError> {
        if driver.full_name.trim().is_empty() {
            return Err(EngineError::invalid("driver name is required"));
        }
        if driver.status == DriverStatus::OnTrip {
            return Err(Conflict::OnTripReserved.into());
        }

        let mut snapshot = self.storage.begin_snapshot().await?;
        let outcome = self
            .storage
            .insert_driver(&mut snapshot, driver)
            .await
            .map_err(EngineError::from);
        let driver = self.finish(snapshot, outcome).await?;

        info!(driver_id = %driver.id, "driver registered");
        Ok(driver)
    }

    /// Edit a vehicle's model, type or capacity. A vehicle on an active
    /// trip cannot shrink below that trip's cargo.
    pub async fn update_vehicle(
        &self,
        vehicle_id: VehicleId,
        update: VehicleUpdate,
    ) -> Result<Vehicle, EngineError> {
        if let Some(capacity) = update.capacity_kg {
            if capacity <= Decimal::ZERO {
                return Err(EngineError::invalid(format!(
                    "vehicle capacity must be positive, got {} kg",
                    capacity
                )));
            }
        }

        let mut snapshot = self.storage.begin_snapshot().await?;
        let outcome = self.update_vehicle_in(&mut snapshot, vehicle_id, update).await;
        let vehicle = self.finish(snapshot, outcome).await?;

        info!(vehicle_id = %vehicle.id, vehicle_code = %vehicle.vehicle_code, "vehicle updated");
        Ok(vehicle)
    }

    /// Edit a driver's name or licence number.
    pub async fn update_driver(
        &self,
        driver_id: DriverId,
        update: DriverUpdate,
    ) -> Result<Driver, EngineError> {
        if matches!(&update.full_name, Some(name) if name.trim().is_empty()) {
            return Err(EngineError::invalid("driver name is required"));
        }

        let mut snapshot = self.storage.begin_snapshot().await?;
        let outcome = self.update_driver_in(&mut snapshot, driver_id, update).await;
        let driver = self.finish(snapshot, outcome).await?;

        info!(driver_id = %driver.id, "driver updated");
        Ok(driver)
    }

    pub async fn get_vehicle(&self, vehicle_id: VehicleId) -> Result<Vehicle, EngineError> {
        Ok(self.storage.get_vehicle(vehicle_id).await?)
    }

    pub async fn get_driver(&self, driver_id: DriverId) -> Result<Driver, EngineError> {
        Ok(self.storage.get_driver(driver_id).await?)
    }

    /// Vehicles ordered by id, optionally only those that can take a trip.
    pub async fn list_vehicles(&self, available_only: bool) -> Result<Vec<Vehicle>, EngineError> {
        let mut vehicles = self.storage.list_vehicles().await?;
        if available_only {
            vehicles.retain(Vehicle::is_available);
        }
        Ok(vehicles)
    }

    pub async fn list_drivers(&self, available_only: bool) -> Result<Vec<Driver>, EngineError> {
        let mut drivers = self.storage.list_drivers().await?;
        if available_only {
            drivers.retain(Driver::is_available);
        }
        Ok(drivers)
    }

    /// Move a vehicle between AVAILABLE, IN_SHOP and RETIRED.
    pub async fn set_vehicle_status(
        &self,
        vehicle_id: VehicleId,
        status: VehicleStatus,
    ) -> Result<Vehicle, EngineError> {
        if status == VehicleStatus::OnTrip {
            return Err(Conflict::OnTripReserved.into());
        }

        let mut snapshot = self.storage.begin_snapshot().await?;
        let outcome = self
            .vehicle_status_in(&mut snapshot, vehicle_id, status)
            .await;
        let vehicle = self.finish(snapshot, outcome).await?;

        info!(vehicle_id = %vehicle.id, status = %vehicle.status, "vehicle status changed");
        Ok(vehicle)
    }

    /// Move a driver between AVAILABLE, OFF_DUTY and SUSPENDED.
    pub async fn set_driver_status(
        &self,
        driver_id: DriverId,
        status: DriverStatus,
    ) -> Result<Driver, EngineError> {
        if status == DriverStatus::OnTrip {
            return Err(Conflict::OnTripReserved.into());
        }

        let mut snapshot = self.storage.begin_snapshot().await?;
        let outcome = self.driver_status_in(&mut snapshot, driver_id, status).await;
        let driver = self.finish(snapshot, outcome).await?;

        info!(driver_id = %driver.id, status = %driver.status, "driver status changed");
        Ok(driver)
    }

    async fn update_vehicle_in(
        &self,
        snap: &mut S::Snapshot,
        vehicle_id: VehicleId,
        update: VehicleUpdate,
    ) -> Result<Vehicle, EngineError> {
        let mut vehicle = self.storage.get_vehicle_for_update(snap, vehicle_id).await?;
        if let Some(capacity) = update.capacity_kg {
            let active = self
                .storage
                .trips_for_vehicle(snap, vehicle_id, &TripStatus::ACTIVE)
                .await?;
            if let Some(trip) = active.into_iter().find(|t| t.cargo_weight_kg > capacity) {
                return Err(Conflict::CapacityBelowCargo {
                    vehicle_code: vehicle.vehicle_code,
                    capacity_kg: capacity,
                    cargo_kg: trip.cargo_weight_kg,
                    trip_code: trip.trip_code,
                }
                .into());
            }
            vehicle.capacity_kg = capacity;
        }
        if let Some(model) = update.model {
            vehicle.model = model;
        }
        if let Some(vehicle_type) = update.vehicle_type {
            vehicle.vehicle_type = vehicle_type;
        }
        self.storage.update_vehicle(snap, &vehicle).await?;
        Ok(vehicle)
    }

    async fn update_driver_in(
        &self,
        snap: &mut S::Snapshot,
        driver_id: DriverId,
        update: DriverUpdate,
    ) -> Result<Driver, EngineError> {
        let mut driver = self.storage.get_driver_for_update(snap, driver_id).await?;
        if let Some(name) = update.full_name {
            driver.full_name = name;
        }
        if let Some(license) = update.license_number {
            driver.license_number = license;
        }
        self.storage.update_driver(snap, &driver).await?;
        Ok(driver)
    }

    async fn vehicle_status_in(
        &self,
        snap: &mut S::Snapshot,
        vehicle_id: VehicleId,
        status: VehicleStatus,
    ) -> Result<Vehicle, EngineError> {
        let mut vehicle = self.storage.get_vehicle_for_update(snap, vehicle_id).await?;
        if vehicle.status == VehicleStatus::OnTrip {
            return Err(Conflict::ResourceOnTrip {
                resource: format!("vehicle {}", vehicle.vehicle_code),
            }
            .into());
        }
        vehicle.status = status;
        self.storage.update_vehicle(snap, &vehicle).await?;
        Ok(vehicle)
    }

    async fn driver_status_in(
        &self,
        snap: &mut S::Snapshot,
        driver_id: DriverId,
        status: DriverStatus,
    ) -> Result<Driver, EngineError> {
        let mut driver = self.storage.get_driver_for_update(snap, driver_id).await?;
        if driver.status == DriverStatus::OnTrip {
            return Err(Conflict::ResourceOnTrip {
                resource: format!("driver {}", driver.full_name),
            }
            .into());
        }
        driver.status = status;
        self.storage.update_driver(snap, &driver).await?;
        Ok(driver)
    }
}
