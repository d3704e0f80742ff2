//! Typed record identifiers.
//!
//! All ids are backed by `i64` (the width of a database identity column)
//! and serialize as bare JSON numbers.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }
    };
}

record_id!(
    /// Identity of a [`crate::Vehicle`].
    VehicleId
);
record_id!(
    /// Identity of a [`crate::Driver`].
    DriverId
);
record_id!(
    /// Identity of a [`crate::Trip`].
    TripId
);
record_id!(
    /// The authenticated user performing an operation.
    ActorId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&VehicleId(7)).unwrap();
        assert_eq!(json, "7");
        let back: DriverId = serde_json::from_str("42").unwrap();
        assert_eq!(back, DriverId(42));
    }

    #[test]
    fn display_is_the_raw_number() {
        assert_eq!(TripId(12).to_string(), "12");
    }
}
