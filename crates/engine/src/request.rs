use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use fleetflow_core::{DriverId, TripPriority, VehicleId, VehicleType};

use crate::error::EngineError;

/// Input to [`TripEngine::create_trip`](crate::TripEngine::create_trip).
///
/// Field names follow the JSON body accepted at the HTTP boundary
/// (`vehicleId`, `origin`, `cargoWeightKg`, ...). The longer
/// `originCity` / `destinationCity` / `specialInstructions` spellings are
/// accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripRequest {
    pub vehicle_id: VehicleId,
    pub driver_id: DriverId,
    #[serde(rename = "origin", alias = "originCity")]
    pub origin_city: String,
    #[serde(rename = "destination", alias = "destinationCity")]
    pub destination_city: String,
    pub cargo_weight_kg: Decimal,
    #[serde(default)]
    pub cargo_type: Option<String>,
    #[serde(default, rename = "instructions", alias = "specialInstructions")]
    pub special_instructions: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_at: OffsetDateTime,
    #[serde(default)]
    pub priority: TripPriority,
}

impl CreateTripRequest {
    /// Checks that need no stored state. Runs before any record is read.
    pub(crate) fn check_shape(&self) -> Result<(), EngineError> {
        if self.origin_city.trim().is_empty() {
            return Err(EngineError::invalid("origin city is required"));
        }
        if self.destination_city.trim().is_empty() {
            return Err(EngineError::invalid("destination city is required"));
        }
        if self.cargo_weight_kg <= Decimal::ZERO {
            return Err(EngineError::invalid(format!(
                "cargo weight must be positive, got {} kg",
                self.cargo_weight_kg
            )));
        }
        Ok(())
    }
}

/// Editable vehicle details for [`TripEngine::update_vehicle`](crate::TripEngine::update_vehicle).
/// Absent fields keep their current value. There is no status field: status
/// moves through the trip lifecycle and the status setters only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleUpdate {
    pub model: Option<String>,
    pub vehicle_type: Option<VehicleType>,
    pub capacity_kg: Option<Decimal>,
}

/// Editable driver details for [`TripEngine::update_driver`](crate::TripEngine::update_driver).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverUpdate {
    pub full_name: Option<String>,
    pub license_number: Option<String>,
}
