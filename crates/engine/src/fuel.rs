//! Distance and fuel estimation.
//!
//! The engine only sees the [`FuelEstimator`] trait. [`TableFuelEstimator`]
//! is a static implementation driven by a city-pair distance table.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

pub trait FuelEstimator: Send + Sync + 'static {
    /// Road distance in kilometres between two cities.
    fn estimate_distance(&self, origin: &str, destination: &str) -> Decimal;

    /// Litres of fuel needed to haul `cargo_weight_kg` over `distance_km`.
    /// `None` when the result does not fit in a `Decimal`.
    fn estimate_fuel(&self, distance_km: Decimal, cargo_weight_kg: Decimal) -> Option<Decimal>;
}

/// One entry of the distance table. Direction does not matter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDistance {
    pub from: String,
    pub to: String,
    pub distance_km: Decimal,
}

/// `[fuel]` section of the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelConfig {
    /// Unladen fuel economy.
    pub km_per_litre: Decimal,
    /// Extra consumption per tonne of cargo, as a fraction (0.05 = +5%/t).
    pub load_factor_per_tonne: Decimal,
    /// Used for city pairs missing from `routes`.
    pub default_distance_km: Decimal,
    pub routes: Vec<RouteDistance>,
}

impl Default for FuelConfig {
    fn default() -> Self {
        Self {
            km_per_litre: Decimal::new(4, 0),
            load_factor_per_tonne: Decimal::new(5, 2),
            default_distance_km: Decimal::new(250, 0),
            routes: Vec::new(),
        }
    }
}

/// Table-driven estimator.
///
/// `litres = distance / km_per_litre * (1 + cargo_tonnes * load_factor)`,
/// rounded half-up to two decimals.
#[derive(Debug, Clone)]
pub struct TableFuelEstimator {
    km_per_litre: Decimal,
    load_factor_per_tonne: Decimal,
    default_distance_km: Decimal,
    distances: HashMap<(String, String), Decimal>,
}

fn route_key(a: &str, b: &str) -> (String, String) {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl TableFuelEstimator {
    pub fn from_config(config: &FuelConfig) -> Result<Self, ConfigError> {
        if config.km_per_litre <= Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "fuel.km_per_litre must be positive, got {}",
                config.km_per_litre
            )));
        }
        if config.load_factor_per_tonne < Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "fuel.load_factor_per_tonne must not be negative, got {}",
                config.load_factor_per_tonne
            )));
        }
        if config.default_distance_km <= Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "fuel.default_distance_km must be positive, got {}",
                config.default_distance_km
            )));
        }

        let mut distances = HashMap::new();
        for route in &config.routes {
            if route.distance_km <= Decimal::ZERO {
                return Err(ConfigError::Invalid(format!(
                    "route {} - {} has non-positive distance {}",
                    route.from, route.to, route.distance_km
                )));
            }
            distances.insert(route_key(&route.from, &route.to), route.distance_km);
        }

        Ok(Self {
            km_per_litre: config.km_per_litre,
            load_factor_per_tonne: config.load_factor_per_tonne,
            default_distance_km: config.default_distance_km,
            distances,
        })
    }
}

impl Default for TableFuelEstimator {
    fn default() -> Self {
        let config = FuelConfig::default();
        Self {
            km_per_litre: config.km_per_litre,
            load_factor_per_tonne: config.load_factor_per_tonne,
            default_distance_km: config.default_distance_km,
            distances: HashMap::new(),
        }
    }
}

impl FuelEstimator for TableFuelEstimator {
    fn estimate_distance(&self, origin: &str, destination: &str) -> Decimal {
        self.distances
            .get(&route_key(origin, destination))
            .copied()
            .unwrap_or(self.default_distance_km)
    }

    fn estimate_fuel(&self, distance_km: Decimal, cargo_weight_kg: Decimal) -> Option<Decimal> {
        let tonnes = cargo_weight_kg.checked_div(Decimal::ONE_THOUSAND)?;
        let load = Decimal::ONE.checked_add(tonnes.checked_mul(self.load_factor_per_tonne)?)?;
        let litres = distance_km
            .checked_div(self.km_per_litre)?
            .checked_mul(load)?;
        Some(litres.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> TableFuelEstimator {
        TableFuelEstimator::from_config(&FuelConfig {
            routes: vec![RouteDistance {
                from: "Mumbai".to_string(),
                to: "Pune".to_string(),
                distance_km: Decimal::new(150, 0),
            }],
            ..FuelConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn distance_lookup_ignores_case_and_direction() {
        let e = estimator();
        assert_eq!(e.estimate_distance("mumbai", "PUNE"), Decimal::new(150, 0));
        assert_eq!(e.estimate_distance("Pune", "Mumbai"), Decimal::new(150, 0));
    }

    #[test]
    fn unknown_route_uses_default_distance() {
        let e = estimator();
        assert_eq!(e.estimate_distance("Delhi", "Agra"), Decimal::new(250, 0));
    }

    #[test]
    fn fuel_scales_with_cargo() {
        let e = estimator();
        // 150 km / 4 km/l = 37.5 l unladen; 2 t at 5%/t adds 10%.
        assert_eq!(
            e.estimate_fuel(Decimal::new(150, 0), Decimal::ZERO),
            Some(Decimal::new(3750, 2))
        );
        assert_eq!(
            e.estimate_fuel(Decimal::new(150, 0), Decimal::new(2000, 0)),
            Some(Decimal::new(4125, 2))
        );
    }

    #[test]
    fn fuel_rounds_half_up_to_two_places() {
        let e = estimator();
        // 0.05 km / 4 = 0.0125 -> 0.01; 0.1 km / 4 = 0.025 -> 0.03
        assert_eq!(
            e.estimate_fuel(Decimal::new(5, 2), Decimal::ZERO),
            Some(Decimal::new(1, 2))
        );
        assert_eq!(
            e.estimate_fuel(Decimal::new(1, 1), Decimal::ZERO),
            Some(Decimal::new(3, 2))
        );
    }

    #[test]
    fn overflowing_load_yields_none() {
        let e = TableFuelEstimator::from_config(&FuelConfig {
            km_per_litre: Decimal::new(1, 3),
            load_factor_per_tonne: Decimal::new(1000, 0),
            ..FuelConfig::default()
        })
        .unwrap();
        assert_eq!(e.estimate_fuel(Decimal::new(2000, 0), Decimal::MAX), None);
    }

    #[test]
    fn zero_economy_rejected() {
        let err = TableFuelEstimator::from_config(&FuelConfig {
            km_per_litre: Decimal::ZERO,
            ..FuelConfig::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("km_per_litre"));
    }
}
