//! Layered configuration: built-in defaults, then an optional TOML file, then
//! `COURTMATE_` environment variables (`COURTMATE_SCHEDULING__HORIZON_DAYS=7`).

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::schedule::{SchedulingConfig, ScoringWeights};

pub const DEFAULT_CONFIG_FILE: &str = "courtmate.toml";
const ENV_PREFIX: &str = "COURTMATE_";

/// CSV files seeding the in-memory store; missing files are skipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    pub availability: Option<PathBuf>,
    pub busy_events: Option<PathBuf>,
    pub profiles: Option<PathBuf>,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            availability: Some(PathBuf::from("availability.csv")),
            busy_events: Some(PathBuf::from("busy_events.csv")),
            profiles: Some(PathBuf::from("profiles.csv")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default level for this crate's targets when RUST_LOG is unset
    pub log_level: String,
    pub port: u16,
    /// Required in the X-Admin-Password header of upload requests; uploads are disabled when unset
    pub admin_password: Option<String>,
    pub data: DataPaths,
    pub scheduling: SchedulingConfig,
    pub weights: ScoringWeights,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            port: 8080,
            admin_password: None,
            data: DataPaths::default(),
            scheduling: SchedulingConfig::default(),
            weights: ScoringWeights::default(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or from `courtmate.toml` when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
