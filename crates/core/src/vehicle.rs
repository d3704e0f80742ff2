use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::VehicleId;
use crate::status::{parse_keyword, ParseStatusError};

/// A vehicle in the fleet.
///
/// `status` is shared between the fleet registry (maintenance, retirement)
/// and the trip engine, which alone moves a vehicle into and out of
/// [`VehicleStatus::OnTrip`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub vehicle_code: String,
    pub model: String,
    pub vehicle_type: VehicleType,
    /// Maximum cargo mass in kilograms.
    pub capacity_kg: Decimal,
    pub status: VehicleStatus,
}

impl Vehicle {
    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Available,
    OnTrip,
    InShop,
    Retired,
}

const VEHICLE_STATUSES: &[(&str, VehicleStatus)] = &[
    ("AVAILABLE", VehicleStatus::Available),
    ("ON_TRIP", VehicleStatus::OnTrip),
    ("IN_SHOP", VehicleStatus::InShop),
    ("RETIRED", VehicleStatus::Retired),
];

impl VehicleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleStatus::Available => "AVAILABLE",
            VehicleStatus::OnTrip => "ON_TRIP",
            VehicleStatus::InShop => "IN_SHOP",
            VehicleStatus::Retired => "RETIRED",
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_keyword(s, VEHICLE_STATUSES, "vehicle status")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    Truck,
    Van,
    Bus,
    Pickup,
}

const VEHICLE_TYPES: &[(&str, VehicleType)] = &[
    ("TRUCK", VehicleType::Truck),
    ("VAN", VehicleType::Van),
    ("BUS", VehicleType::Bus),
    ("PICKUP", VehicleType::Pickup),
];

impl VehicleType {
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleType::Truck => "TRUCK",
            VehicleType::Van => "VAN",
            VehicleType::Bus => "BUS",
            VehicleType::Pickup => "PICKUP",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleType {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_keyword(s, VEHICLE_TYPES, "vehicle type")
    }
}
