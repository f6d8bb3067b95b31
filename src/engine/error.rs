use std::fmt;

use crate::config::ConfigError;
use crate::flow::FlowError;
use crate::roadnet::RoadNetError;
use crate::shortest_path::RouterError;

/// Top-level error type surfaced by [`crate::engine::Engine`]. Wraps every
/// module-level error via `From` so `Engine::step`/`Engine::load_config`
/// present callers with one type (spec §7).
#[derive(Debug)]
pub enum EngineError {
    Config(ConfigError),
    RoadNet(RoadNetError),
    Router(RouterError),
    Flow(FlowError),
    UnknownVehicle(String),
    UnknownDrivable(String),
    /// `runtime-precondition`: e.g. `set_phase` without `rlTrafficLight`.
    Precondition(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Config(e) => write!(f, "config error: {}", e),
            EngineError::RoadNet(e) => write!(f, "road network error: {}", e),
            EngineError::Router(e) => write!(f, "routing error: {}", e),
            EngineError::Flow(e) => write!(f, "flow error: {}", e),
            EngineError::UnknownVehicle(id) => write!(f, "unknown vehicle id '{}'", id),
            EngineError::UnknownDrivable(id) => write!(f, "unknown drivable id '{}'", id),
            EngineError::Precondition(msg) => write!(f, "precondition violated: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        EngineError::Config(e)
    }
}
impl From<RoadNetError> for EngineError {
    fn from(e: RoadNetError) -> Self {
        EngineError::RoadNet(e)
    }
}
impl From<RouterError> for EngineError {
    fn from(e: RouterError) -> Self {
        EngineError::Router(e)
    }
}
impl From<FlowError> for EngineError {
    fn from(e: FlowError) -> Self {
        EngineError::Flow(e)
    }
}
