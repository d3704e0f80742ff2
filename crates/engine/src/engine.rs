//! The trip assignment engine.
//!
//! Every mutating operation runs inside one storage snapshot. Rows are
//! locked in a fixed order (trip, then vehicle, then driver) and all
//! checks happen after the locks are taken, so the double-booking checks
//! and the status flips that follow them cannot interleave with another
//! operation on the same vehicle or driver. A failed check aborts the
//! snapshot before anything is written.

use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use time::OffsetDateTime;
use tracing::{info, warn};

use fleetflow_core::{
    ActorId, DriverStatus, Trip, TripCode, TripId, TripStatus, VehicleStatus,
};
use fleetflow_storage::{FleetStorage, NewTrip, StorageError, TripQuery};

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{Conflict, EngineError};
use crate::fuel::{FuelEstimator, TableFuelEstimator};
use crate::request::CreateTripRequest;

pub struct TripEngine<S, F = TableFuelEstimator, C = SystemClock> {
    pub(crate) storage: Arc<S>,
    fuel: F,
    clock: C,
    config: EngineConfig,
}

impl<S, F> TripEngine<S, F, SystemClock>
where
    S: FleetStorage,
    F: FuelEstimator,
{
    pub fn new(storage: Arc<S>, fuel: F, config: EngineConfig) -> Self {
        Self::with_clock(storage, fuel, SystemClock, config)
    }
}

impl<S, F, C> TripEngine<S, F, C>
where
    S: FleetStorage,
    F: FuelEstimator,
    C: Clock,
{
    pub fn with_clock(storage: Arc<S>, fuel: F, clock: C, config: EngineConfig) -> Self {
        Self {
            storage,
            fuel,
            clock,
            config,
        }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Commit the snapshot if `outcome` succeeded, abort it otherwise.
    pub(crate) async fn finish<T>(
        &self,
        snapshot: S::Snapshot,
        outcome: Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        match outcome {
            Ok(value) => {
                self.storage.commit_snapshot(snapshot).await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = self.storage.abort_snapshot(snapshot).await {
                    warn!(error = %abort_err, "failed to abort snapshot");
                }
                Err(e)
            }
        }
    }

    // ── createTrip ──────────────────────────────────────────────────────────

    /// Validate `request` and create a SCHEDULED trip, leasing its vehicle
    /// and driver.
    ///
    /// Checks run in a fixed order and the first failure is returned:
    ///
    /// 1. vehicle exists
    /// 2. vehicle is AVAILABLE
    /// 3. cargo fits the vehicle's capacity
    /// 4. driver exists
    /// 5. driver is AVAILABLE
    /// 6. driver has no active trip
    /// 7. vehicle has no active trip
    /// 8. origin and destination differ (ignoring case)
    /// 9. `scheduled_at` is strictly after now
    ///
    /// Request-shape checks (blank cities, non-positive weight) run before
    /// step 1.
    pub async fn create_trip(
        &self,
        request: CreateTripRequest,
        actor: ActorId,
    ) -> Result<Trip, EngineError> {
        request.check_shape()?;

        let mut snapshot = self.storage.begin_snapshot().await?;
        let outcome = self.create_in(&mut snapshot, request, actor).await;
        let trip = self.finish(snapshot, outcome).await?;

        info!(
            trip_code = %trip.trip_code,
            trip_id = %trip.id,
            vehicle_id = %trip.vehicle_id,
            driver_id = %trip.driver_id,
            actor = %actor,
            "trip created"
        );
        Ok(trip)
    }

    async fn create_in(
        &self,
        snap: &mut S::Snapshot,
        req: CreateTripRequest,
        actor: ActorId,
    ) -> Result<Trip, EngineError> {
        let mut vehicle = self
            .storage
            .get_vehicle_for_update(snap, req.vehicle_id)
            .await?;
        if vehicle.status != VehicleStatus::Available {
            return Err(Conflict::VehicleUnavailable {
                vehicle_code: vehicle.vehicle_code,
                status: vehicle.status,
            }
            .into());
        }
        if req.cargo_weight_kg > vehicle.capacity_kg {
            return Err(Conflict::CapacityExceeded {
                cargo_kg: req.cargo_weight_kg,
                capacity_kg: vehicle.capacity_kg,
            }
            .into());
        }

        let mut driver = self
            .storage
            .get_driver_for_update(snap, req.driver_id)
            .await?;
        if driver.status != DriverStatus::Available {
            return Err(Conflict::DriverUnavailable {
                driver_name: driver.full_name,
                status: driver.status,
            }
            .into());
        }
        if self
            .storage
            .has_trip_for_driver(snap, driver.id, &TripStatus::ACTIVE)
            .await?
        {
            return Err(Conflict::DriverDoubleBooked {
                driver_name: driver.full_name,
            }
            .into());
        }
        if self
            .storage
            .has_trip_for_vehicle(snap, vehicle.id, &TripStatus::ACTIVE)
            .await?
        {
            return Err(Conflict::VehicleDoubleBooked {
                vehicle_code: vehicle.vehicle_code,
            }
            .into());
        }

        // Cities are stored trimmed, so compare them the same way.
        let origin_city = req.origin_city.trim().to_string();
        let destination_city = req.destination_city.trim().to_string();
        if origin_city.to_lowercase() == destination_city.to_lowercase() {
            return Err(EngineError::invalid(format!(
                "origin and destination cannot be the same: {}",
                origin_city
            )));
        }

        let now = self.clock.now();
        if req.scheduled_at <= now {
            return Err(EngineError::invalid(format!(
                "scheduled time {} must be in the future",
                fmt_instant(req.scheduled_at)
            )));
        }

        let distance_km = self
            .fuel
            .estimate_distance(&origin_city, &destination_city);
        let (fuel_litres, estimated_fuel_cost) = self
            .fuel
            .estimate_fuel(distance_km, req.cargo_weight_kg)
            .and_then(|litres| Some((litres, self.fuel_cost(litres)?)))
            .ok_or_else(|| {
                EngineError::invalid(format!(
                    "fuel estimate overflows for {} kg over {} km",
                    req.cargo_weight_kg, distance_km
                ))
            })?;

        let sequence = self.storage.next_trip_sequence(snap).await?;
        let trip = self
            .storage
            .insert_trip(
                snap,
                NewTrip {
                    trip_code: TripCode::from_sequence(sequence),
                    vehicle_id: vehicle.id,
                    driver_id: driver.id,
                    created_by: actor,
                    origin_city,
                    destination_city,
                    distance_km,
                    cargo_weight_kg: req.cargo_weight_kg,
                    cargo_type: req.cargo_type,
                    special_instructions: req.special_instructions,
                    status: TripStatus::Scheduled,
                    priority: req.priority,
                    scheduled_at: req.scheduled_at,
                    fuel_litres,
                    estimated_fuel_cost,
                    created_at: now,
                },
            )
            .await?;

        vehicle.status = VehicleStatus::OnTrip;
        self.storage.update_vehicle(snap, &vehicle).await?;
        driver.status = DriverStatus::OnTrip;
        self.storage.update_driver(snap, &driver).await?;

        Ok(trip)
    }

    /// `litres * price`, rounded half-up to 2 places. `None` on overflow.
    fn fuel_cost(&self, litres: Decimal) -> Option<Decimal> {
        let cost = litres.checked_mul(self.config.fuel_price_per_litre)?;
        Some(cost.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    // ── advanceStatus ───────────────────────────────────────────────────────

    /// Move a trip one step along the lifecycle. Delivery releases the
    /// vehicle and driver and credits the driver with a completed trip.
    pub async fn advance_status(&self, trip_id: TripId, actor: ActorId) -> Result<Trip, EngineError> {
        let mut snapshot = self.storage.begin_snapshot().await?;
        let outcome = self.advance_in(&mut snapshot, trip_id).await;
        let trip = self.finish(snapshot, outcome).await?;

        info!(
            trip_code = %trip.trip_code,
            status = %trip.status,
            actor = %actor,
            "trip advanced"
        );
        Ok(trip)
    }

    async fn advance_in(&self, snap: &mut S::Snapshot, trip_id: TripId) -> Result<Trip, EngineError> {
        let mut trip = self.storage.get_trip_for_update(snap, trip_id).await?;
        let transition = trip.status.next().ok_or_else(|| Conflict::AlreadyFinal {
            trip_code: trip.trip_code.clone(),
            status: trip.status,
        })?;

        trip.apply(transition, self.clock.now());
        self.storage.update_trip(snap, &trip).await?;
        if trip.status == TripStatus::Delivered {
            self.release(snap, &trip, true).await?;
        }
        Ok(trip)
    }

    // ── cancelTrip ──────────────────────────────────────────────────────────

    /// Cancel a trip that is not yet delivered or cancelled, releasing its
    /// vehicle and driver.
    pub async fn cancel_trip(&self, trip_id: TripId, actor: ActorId) -> Result<(), EngineError> {
        let mut snapshot = self.storage.begin_snapshot().await?;
        let outcome = self.cancel_in(&mut snapshot, trip_id).await;
        let trip = self.finish(snapshot, outcome).await?;

        info!(trip_code = %trip.trip_code, actor = %actor, "trip cancelled");
        Ok(())
    }

    async fn cancel_in(&self, snap: &mut S::Snapshot, trip_id: TripId) -> Result<Trip, EngineError> {
        let mut trip = self.storage.get_trip_for_update(snap, trip_id).await?;
        if trip.status.is_terminal() {
            return Err(Conflict::NotCancellable {
                trip_code: trip.trip_code,
                status: trip.status,
            }
            .into());
        }

        trip.cancel(self.clock.now());
        self.storage.update_trip(snap, &trip).await?;
        self.release(snap, &trip, false).await?;
        Ok(trip)
    }

    /// Return a trip's vehicle and driver to AVAILABLE.
    ///
    /// Only resources still ON_TRIP are flipped; anything else was moved
    /// by someone else and is left alone.
    async fn release(
        &self,
        snap: &mut S::Snapshot,
        trip: &Trip,
        delivered: bool,
    ) -> Result<(), StorageError> {
        let mut vehicle = self
            .storage
            .get_vehicle_for_update(snap, trip.vehicle_id)
            .await?;
        if vehicle.status == VehicleStatus::OnTrip {
            vehicle.status = VehicleStatus::Available;
            self.storage.update_vehicle(snap, &vehicle).await?;
        } else {
            warn!(
                trip_code = %trip.trip_code,
                vehicle_id = %vehicle.id,
                status = %vehicle.status,
                "vehicle not on trip at release; leaving status unchanged"
            );
        }

        let mut driver = self
            .storage
            .get_driver_for_update(snap, trip.driver_id)
            .await?;
        let mut changed = false;
        if delivered {
            driver.total_trips = driver.total_trips.saturating_add(1);
            changed = true;
        }
        if driver.status == DriverStatus::OnTrip {
            driver.status = DriverStatus::Available;
            changed = true;
        } else {
            warn!(
                trip_code = %trip.trip_code,
                driver_id = %driver.id,
                status = %driver.status,
                "driver not on trip at release; leaving status unchanged"
            );
        }
        if changed {
            self.storage.update_driver(snap, &driver).await?;
        }
        Ok(())
    }

    // ── Reads ───────────────────────────────────────────────────────────────

    pub async fn get_trip(&self, trip_id: TripId) -> Result<Trip, EngineError> {
        Ok(self.storage.get_trip(trip_id).await?)
    }

    /// All trips, most recently created first.
    pub async fn list_trips(&self) -> Result<Vec<Trip>, EngineError> {
        Ok(self.storage.list_trips().await?)
    }

    /// Trips matching every predicate set in `query`. An empty query is the
    /// same as [`list_trips`](Self::list_trips).
    pub async fn filter_trips(&self, query: &TripQuery) -> Result<Vec<Trip>, EngineError> {
        if query.is_empty() {
            return self.list_trips().await;
        }
        Ok(self.storage.filter_trips(query).await?)
    }
}

fn fmt_instant(at: OffsetDateTime) -> String {
    at.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| at.to_string())
}
