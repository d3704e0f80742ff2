use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors raised while validating engine or estimator settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// `[engine]` section of the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Unit price used for the estimated fuel cost of a trip.
    pub fuel_price_per_litre: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fuel_price_per_litre: Decimal::new(95, 0),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fuel_price_per_litre < Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "engine.fuel_price_per_litre must not be negative, got {}",
                self.fuel_price_per_litre
            )));
        }
        Ok(())
    }
}
