//! `fleetflow.toml` configuration file.
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [engine]
//! fuel_price_per_litre = 95
//!
//! [fuel]
//! km_per_litre = 4
//! load_factor_per_tonne = "0.05"
//! default_distance_km = 250
//!
//! [[fuel.routes]]
//! from = "Mumbai"
//! to = "Pune"
//! distance_km = 150
//!
//! [[vehicles]]
//! vehicle_code = "TRK-001"
//! vehicle_type = "TRUCK"
//! capacity_kg = 1000
//!
//! [[drivers]]
//! full_name = "Alice Rao"
//! ```
//!
//! Every section is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use fleetflow_engine::{ConfigError, EngineConfig, FuelConfig, TableFuelEstimator};
use fleetflow_storage::{NewDriver, NewVehicle};

pub(crate) const CONFIG_ENV: &str = "FLEETFLOW_CONFIG";
pub(crate) const PORT_ENV: &str = "FLEETFLOW_PORT";

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigFileError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error(transparent)]
    Invalid(#[from] ConfigError),

    #[error("invalid FLEETFLOW_PORT value '{0}'")]
    Port(String),
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct FleetConfig {
    pub(crate) server: ServerConfig,
    pub(crate) engine: EngineConfig,
    pub(crate) fuel: FuelConfig,
    /// Vehicles registered at startup.
    pub(crate) vehicles: Vec<NewVehicle>,
    /// Drivers registered at startup.
    pub(crate) drivers: Vec<NewDriver>,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ServerConfig {
    pub(crate) port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

impl FleetConfig {
    /// Load from `path`, or return defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, ConfigFileError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: FleetConfig = toml::from_str(&text).map_err(|source| ConfigFileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        TableFuelEstimator::from_config(&self.fuel)?;
        Ok(())
    }

    /// `--port` wins, then `FLEETFLOW_PORT`, then the file.
    pub(crate) fn resolve_port(
        &self,
        flag: Option<u16>,
        env: Option<&str>,
    ) -> Result<u16, ConfigFileError> {
        if let Some(port) = flag {
            return Ok(port);
        }
        match env.map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigFileError::Port(raw.to_string())),
            None => Ok(self.server.port),
        }
    }
}

/// `--config` wins over `FLEETFLOW_CONFIG`.
pub(crate) fn config_path(flag: Option<PathBuf>) -> Option<PathBuf> {
    flag.or_else(|| {
        std::env::var_os(CONFIG_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    })
}
