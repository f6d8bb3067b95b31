use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::log_main;
use crate::verbose::{VerboseLevel, EVENT_STEP};

#[derive(Debug, Clone)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    MissingField(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "failed to read config file: {}", msg),
            ConfigError::Parse(msg) => write!(f, "failed to parse config file: {}", msg),
            ConfigError::MissingField(field) => write!(f, "config is missing required field '{}'", field),
        }
    }
}

impl std::error::Error for ConfigError {}

fn default_true() -> bool {
    true
}

/// Construction-time engine configuration (spec §6). Matches the
/// `engineConfig.json` shape of the original implementation; JSON field
/// names are camelCase to stay compatible with that format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    pub interval: f64,
    pub seed: u64,
    pub dir: String,
    pub roadnet_file: String,
    pub flow_file: String,
    #[serde(default)]
    pub rl_traffic_light: bool,
    #[serde(default = "default_true")]
    pub lane_change: bool,
    #[serde(default)]
    pub save_replay: bool,
    #[serde(default)]
    pub roadnet_log_file: Option<String>,
    #[serde(default)]
    pub replay_log_file: Option<String>,
    #[serde(default)]
    pub thread_num: Option<usize>,
    #[serde(default)]
    pub verbose: VerboseLevelConfig,
}

/// Wire-friendly mirror of [`crate::verbose::VerboseLevel`]; `serde`
/// doesn't need to know about the engine's internal `repr(u8)` enum.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerboseLevelConfig {
    #[default]
    None,
    Main,
    Additional,
    Detailed,
    All,
}

impl From<VerboseLevelConfig> for VerboseLevel {
    fn from(v: VerboseLevelConfig) -> Self {
        match v {
            VerboseLevelConfig::None => VerboseLevel::None,
            VerboseLevelConfig::Main => VerboseLevel::Main,
            VerboseLevelConfig::Additional => VerboseLevel::Additional,
            VerboseLevelConfig::Detailed => VerboseLevel::Detailed,
            VerboseLevelConfig::All => VerboseLevel::All,
        }
    }
}

pub struct SimulationConfigBuilder {
    config: SimulationConfig,
}

impl SimulationConfig {
    pub fn new(dir: impl Into<String>, roadnet_file: impl Into<String>, flow_file: impl Into<String>) -> SimulationConfigBuilder {
        SimulationConfigBuilder {
            config: SimulationConfig {
                interval: 1.0,
                seed: 0,
                dir: dir.into(),
                roadnet_file: roadnet_file.into(),
                flow_file: flow_file.into(),
                rl_traffic_light: false,
                lane_change: true,
                save_replay: false,
                roadnet_log_file: None,
                replay_log_file: None,
                thread_num: None,
                verbose: VerboseLevelConfig::None,
            },
        }
    }

    pub fn from_json(path: impl AsRef<Path>) -> Result<SimulationConfig, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Worker thread count, resolved per spec §10.4: `available_parallelism() - 1`,
    /// floored at 1, when `thread_num` isn't set.
    pub fn resolved_thread_num(&self) -> usize {
        self.thread_num.unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(2).saturating_sub(1).max(1))
    }

    /// Emits the `interval` warning from spec §6 through the logging layer.
    /// Never fatal — always returns successfully.
    pub fn validate(&self) {
        if !(0.2..=1.5).contains(&self.interval) {
            log_main!(EVENT_STEP, "configured interval is outside the recommended [0.2, 1.5] range", interval = self.interval);
        }
    }

    pub fn roadnet_path(&self) -> String {
        format!("{}/{}", self.dir.trim_end_matches('/'), self.roadnet_file)
    }

    pub fn flow_path(&self) -> String {
        format!("{}/{}", self.dir.trim_end_matches('/'), self.flow_file)
    }
}

impl SimulationConfigBuilder {
    pub fn with_interval(mut self, interval: f64) -> Self {
        self.config.interval = interval;
        self
    }
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }
    pub fn with_rl_traffic_light(mut self, rl_traffic_light: bool) -> Self {
        self.config.rl_traffic_light = rl_traffic_light;
        self
    }
    pub fn with_lane_change(mut self, lane_change: bool) -> Self {
        self.config.lane_change = lane_change;
        self
    }
    pub fn with_save_replay(mut self, save_replay: bool) -> Self {
        self.config.save_replay = save_replay;
        self
    }
    pub fn with_thread_num(mut self, thread_num: usize) -> Self {
        self.config.thread_num = Some(thread_num);
        self
    }
    pub fn with_verbose(mut self, verbose: VerboseLevelConfig) -> Self {
        self.config.verbose = verbose;
        self
    }
    pub fn build(self) -> SimulationConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thread_num_floors_at_one() {
        let config = SimulationConfig::new("sim", "roadnet.json", "flow.json").with_thread_num(0).build();
        assert_eq!(config.resolved_thread_num(), 0);
    }

    #[test]
    fn test_unset_thread_num_resolves_via_available_parallelism() {
        let config = SimulationConfig::new("sim", "roadnet.json", "flow.json").build();
        assert!(config.resolved_thread_num() >= 1);
    }

    #[test]
    fn test_paths_join_dir() {
        let config = SimulationConfig::new("sim", "roadnet.json", "flow.json").build();
        assert_eq!(config.roadnet_path(), "sim/roadnet.json");
        assert_eq!(config.flow_path(), "sim/flow.json");
    }

    #[test]
    fn test_deserializes_from_json() {
        let json = r#"{"interval":1.0,"seed":42,"dir":"sim","roadnetFile":"roadnet.json","flowFile":"flow.json"}"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.seed, 42);
        assert!(config.lane_change);
    }
}
