//! Application state shared across request handlers.

use fleetflow_engine::{TableFuelEstimator, TripEngine};
use fleetflow_storage::MemoryStorage;

pub(crate) type Engine = TripEngine<MemoryStorage, TableFuelEstimator>;

pub(crate) struct AppState {
    pub(crate) engine: Engine,
}
