use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use fleetflow_core::{
    ActorId, DriverId, DriverStatus, Trip, TripCode, TripPriority, TripStatus, VehicleId,
    VehicleStatus, VehicleType,
};

/// A trip about to be inserted. The backend assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrip {
    pub trip_code: TripCode,
    pub vehicle_id: VehicleId,
    pub driver_id: DriverId,
    pub created_by: ActorId,
    pub origin_city: String,
    pub destination_city: String,
    pub distance_km: Decimal,
    pub cargo_weight_kg: Decimal,
    pub cargo_type: Option<String>,
    pub special_instructions: Option<String>,
    pub status: TripStatus,
    pub priority: TripPriority,
    pub scheduled_at: OffsetDateTime,
    pub fuel_litres: Decimal,
    pub estimated_fuel_cost: Decimal,
    pub created_at: OffsetDateTime,
}

/// A vehicle about to be registered. The backend assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVehicle {
    pub vehicle_code: String,
    #[serde(default)]
    pub model: String,
    pub vehicle_type: VehicleType,
    pub capacity_kg: Decimal,
    #[serde(default = "default_vehicle_status")]
    pub status: VehicleStatus,
}

fn default_vehicle_status() -> VehicleStatus {
    VehicleStatus::Available
}

/// A driver about to be registered. The backend assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDriver {
    pub full_name: String,
    #[serde(default)]
    pub license_number: String,
    #[serde(default = "default_driver_status")]
    pub status: DriverStatus,
}

fn default_driver_status() -> DriverStatus {
    DriverStatus::Available
}

/// Optional predicates for `filter_trips`, combined by intersection.
///
/// `vehicle_type` is a join predicate: it matches against the type of the
/// vehicle the trip references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripQuery {
    pub status: Option<TripStatus>,
    pub priority: Option<TripPriority>,
    pub vehicle_type: Option<VehicleType>,
    /// Case-insensitive substring over trip code, origin and destination.
    pub search: Option<String>,
}

impl TripQuery {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.vehicle_type.is_none()
            && self.search.as_deref().map_or(true, |s| s.trim().is_empty())
    }

    /// Evaluate the query against a trip whose vehicle has `vehicle_type`
    /// (`None` when the vehicle record could not be resolved).
    pub fn matches(&self, trip: &Trip, vehicle_type: Option<VehicleType>) -> bool {
        if let Some(status) = self.status {
            if trip.status != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if trip.priority != priority {
                return false;
            }
        }
        if let Some(wanted) = self.vehicle_type {
            if vehicle_type != Some(wanted) {
                return false;
            }
        }
        match &self.search {
            Some(needle) => trip.matches_search(needle),
            None => true,
        }
    }
}
