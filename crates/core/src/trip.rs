//! Trips and the trip lifecycle.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::{ActorId, DriverId, TripId, VehicleId};
use crate::status::{parse_keyword, ParseStatusError};

/// A delivery trip.
///
/// `vehicle_id` and `driver_id` are references resolved through storage;
/// a trip never owns the vehicle or driver records. Trips are never
/// deleted, only moved to [`TripStatus::Cancelled`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
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
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub dispatched_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub arrived_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub delivered_at: Option<OffsetDateTime>,
    pub fuel_litres: Decimal,
    pub estimated_fuel_cost: Decimal,
    /// Filled in by post-trip reconciliation; never set by the engine.
    pub actual_fuel_cost: Option<Decimal>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Trip {
    /// Move the trip along `transition`, stamping the milestone it records.
    ///
    /// The caller is responsible for having looked `transition` up from the
    /// trip's current status.
    pub fn apply(&mut self, transition: &Transition, now: OffsetDateTime) {
        debug_assert_eq!(self.status, transition.from);
        self.status = transition.to;
        match transition.stamps {
            Milestone::Dispatched => self.dispatched_at = Some(now),
            Milestone::Arrived => self.arrived_at = Some(now),
            Milestone::Delivered => self.delivered_at = Some(now),
        }
        self.updated_at = now;
    }

    pub fn cancel(&mut self, now: OffsetDateTime) {
        self.status = TripStatus::Cancelled;
        self.updated_at = now;
    }

    /// Case-insensitive substring match over the trip code and both cities.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [
            self.trip_code.as_str(),
            self.origin_city.as_str(),
            self.destination_city.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Human-readable trip code, e.g. `TRP-007`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripCode(String);

impl TripCode {
    /// Format a store sequence number as `TRP-%03d`.
    pub fn from_sequence(sequence: u64) -> Self {
        TripCode(format!("TRP-{:03}", sequence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TripCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Lifecycle ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Scheduled,
    Dispatched,
    InTransit,
    Delivered,
    Cancelled,
    Delayed,
}

/// The per-transition timestamp a lifecycle step records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    Dispatched,
    Arrived,
    Delivered,
}

/// One forward step of the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: TripStatus,
    pub to: TripStatus,
    pub stamps: Milestone,
}

/// Every legal forward transition. Cancellation is handled separately
/// because it is reachable from any non-terminal status.
pub const LIFECYCLE: &[Transition] = &[
    Transition {
        from: TripStatus::Scheduled,
        to: TripStatus::Dispatched,
        stamps: Milestone::Dispatched,
    },
    Transition {
        from: TripStatus::Dispatched,
        to: TripStatus::InTransit,
        stamps: Milestone::Arrived,
    },
    Transition {
        from: TripStatus::InTransit,
        to: TripStatus::Delivered,
        stamps: Milestone::Delivered,
    },
];

const TRIP_STATUSES: &[(&str, TripStatus)] = &[
    ("SCHEDULED", TripStatus::Scheduled),
    ("DISPATCHED", TripStatus::Dispatched),
    ("IN_TRANSIT", TripStatus::InTransit),
    ("DELIVERED", TripStatus::Delivered),
    ("CANCELLED", TripStatus::Cancelled),
    ("DELAYED", TripStatus::Delayed),
];

impl TripStatus {
    /// Statuses under which a trip holds its vehicle and driver.
    pub const ACTIVE: [TripStatus; 3] = [
        TripStatus::Scheduled,
        TripStatus::Dispatched,
        TripStatus::InTransit,
    ];

    /// The forward transition out of this status, if there is one.
    pub fn next(self) -> Option<&'static Transition> {
        LIFECYCLE.iter().find(|t| t.from == self)
    }

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    /// Delivered and cancelled trips can never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, TripStatus::Delivered | TripStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TripStatus::Scheduled => "SCHEDULED",
            TripStatus::Dispatched => "DISPATCHED",
            TripStatus::InTransit => "IN_TRANSIT",
            TripStatus::Delivered => "DELIVERED",
            TripStatus::Cancelled => "CANCELLED",
            TripStatus::Delayed => "DELAYED",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_keyword(s, TRIP_STATUSES, "trip status")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripPriority {
    #[default]
    Normal,
    High,
    Urgent,
}

const TRIP_PRIORITIES: &[(&str, TripPriority)] = &[
    ("NORMAL", TripPriority::Normal),
    ("HIGH", TripPriority::High),
    ("URGENT", TripPriority::Urgent),
];

impl TripPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            TripPriority::Normal => "NORMAL",
            TripPriority::High => "HIGH",
            TripPriority::Urgent => "URGENT",
        }
    }
}

impl fmt::Display for TripPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripPriority {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_keyword(s, TRIP_PRIORITIES, "trip priority")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn scheduled_trip() -> Trip {
        let created = datetime!(2025-03-01 08:00 UTC);
        Trip {
            id: TripId(1),
            trip_code: TripCode::from_sequence(1),
            vehicle_id: VehicleId(10),
            driver_id: DriverId(20),
            created_by: ActorId(1),
            origin_city: "Mumbai".to_string(),
            destination_city: "Pune".to_string(),
            distance_km: Decimal::new(150, 0),
            cargo_weight_kg: Decimal::new(800, 0),
            cargo_type: None,
            special_instructions: None,
            status: TripStatus::Scheduled,
            priority: TripPriority::Normal,
            scheduled_at: datetime!(2025-03-02 08:00 UTC),
            dispatched_at: None,
            arrived_at: None,
            delivered_at: None,
            fuel_litres: Decimal::new(1875, 2),
            estimated_fuel_cost: Decimal::new(178125, 2),
            actual_fuel_cost: None,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn trip_code_pads_to_three_digits() {
        assert_eq!(TripCode::from_sequence(7).as_str(), "TRP-007");
        assert_eq!(TripCode::from_sequence(1234).as_str(), "TRP-1234");
    }

    #[test]
    fn lifecycle_walks_forward_to_delivered() {
        let mut status = TripStatus::Scheduled;
        let mut seen = vec![status];
        while let Some(t) = status.next() {
            status = t.to;
            seen.push(status);
        }
        assert_eq!(
            seen,
            vec![
                TripStatus::Scheduled,
                TripStatus::Dispatched,
                TripStatus::InTransit,
                TripStatus::Delivered,
            ]
        );
    }

    #[test]
    fn side_and_terminal_states_have_no_forward_transition() {
        assert!(TripStatus::Delivered.next().is_none());
        assert!(TripStatus::Cancelled.next().is_none());
        assert!(TripStatus::Delayed.next().is_none());
    }

    #[test]
    fn active_and_terminal_sets_are_disjoint() {
        for (_, status) in TRIP_STATUSES {
            assert!(!(status.is_active() && status.is_terminal()), "{status}");
        }
        assert!(!TripStatus::Delayed.is_active());
        assert!(!TripStatus::Delayed.is_terminal());
    }

    #[test]
    fn apply_stamps_the_matching_timestamp() {
        let mut trip = scheduled_trip();
        let now = datetime!(2025-03-02 09:30 UTC);

        trip.apply(TripStatus::Scheduled.next().unwrap(), now);
        assert_eq!(trip.status, TripStatus::Dispatched);
        assert_eq!(trip.dispatched_at, Some(now));
        assert_eq!(trip.arrived_at, None);

        trip.apply(TripStatus::Dispatched.next().unwrap(), now);
        assert_eq!(trip.arrived_at, Some(now));

        trip.apply(TripStatus::InTransit.next().unwrap(), now);
        assert_eq!(trip.status, TripStatus::Delivered);
        assert_eq!(trip.delivered_at, Some(now));
        assert_eq!(trip.updated_at, now);
    }

    #[test]
    fn search_matches_code_and_cities_ignoring_case() {
        let trip = scheduled_trip();
        assert!(trip.matches_search("trp-001"));
        assert!(trip.matches_search("MUM"));
        assert!(trip.matches_search("pune"));
        assert!(!trip.matches_search("delhi"));
        assert!(trip.matches_search("  "));
    }

    #[test]
    fn trip_serializes_timestamps_as_rfc3339() {
        let json = serde_json::to_value(scheduled_trip()).unwrap();
        assert_eq!(json["scheduled_at"], "2025-03-02T08:00:00Z");
        assert_eq!(json["dispatched_at"], serde_json::Value::Null);
        assert_eq!(json["status"], "SCHEDULED");
        assert_eq!(json["trip_code"], "TRP-001");
    }

    #[test]
    fn priority_defaults_to_normal() {
        assert_eq!(TripPriority::default(), TripPriority::Normal);
        assert_eq!("urgent".parse::<TripPriority>().unwrap(), TripPriority::Urgent);
    }
}
