use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ids::DriverId;
use crate::status::{parse_keyword, ParseStatusError};

/// A driver who can be assigned to trips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub full_name: String,
    pub license_number: String,
    pub status: DriverStatus,
    /// Number of delivered trips. Only ever incremented.
    pub total_trips: u32,
}

impl Driver {
    pub fn is_available(&self) -> bool {
        self.status == DriverStatus::Available
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverStatus {
    Available,
    OnTrip,
    OffDuty,
    Suspended,
}

const DRIVER_STATUSES: &[(&str, DriverStatus)] = &[
    ("AVAILABLE", DriverStatus::Available),
    ("ON_TRIP", DriverStatus::OnTrip),
    ("OFF_DUTY", DriverStatus::OffDuty),
    ("SUSPENDED", DriverStatus::Suspended),
];

impl DriverStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DriverStatus::Available => "AVAILABLE",
            DriverStatus::OnTrip => "ON_TRIP",
            DriverStatus::OffDuty => "OFF_DUTY",
            DriverStatus::Suspended => "SUSPENDED",
        }
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_keyword(s, DRIVER_STATUSES, "driver status")
    }
}
