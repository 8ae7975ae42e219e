use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use regex::Regex;

use crate::driver::DriverConfig;
use crate::error::ReassignError;
use crate::throttle::ThrottleSource;

pub const DEFAULT_KAFKA_HOME: &str = "/usr/share/kafka";
pub const KAFKA_SERVER_CONFIG: &str = "config/server.properties";
pub const DEFAULT_THROTTLE_FILE: &str = "throttle.json";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ReassignConfig {
    /// Root of the Kafka installation; the reassign script lives under `bin/`.
    pub kafka_home: PathBuf,
    /// ZooKeeper connection string. Read from the broker config when unset.
    pub zookeeper: Option<String>,
    pub retry_after_secs: u64,
    /// Explicit throttle schedule, e.g. `10000,20000`.
    pub throttle: Option<String>,
    /// Schedule file used when no explicit throttle is given.
    pub throttle_file: PathBuf,
}

impl Default for ReassignConfig {
    fn default() -> Self {
        Self {
            kafka_home: PathBuf::from(DEFAULT_KAFKA_HOME),
            zookeeper: None,
            retry_after_secs: crate::driver::DEFAULT_RETRY_AFTER.as_secs(),
            throttle: None,
            throttle_file: PathBuf::from(DEFAULT_THROTTLE_FILE),
        }
    }
}

impl ReassignConfig {
    /// Layers an optional config file and `REASSIGN_*` environment variables
    /// over the defaults.
    pub fn load(config_path: Option<&Path>) -> Result<ReassignConfig> {
        let mut settings = config::Config::builder();
        if let Some(path) = config_path {
            settings = settings.add_source(config::File::from(path));
        }
        let config = settings
            .add_source(config::Environment::with_prefix("REASSIGN"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry_after_secs == 0 {
            return Err(anyhow::anyhow!("retry interval cannot be 0"));
        }
        if let Some(throttle) = &self.throttle {
            throttle.parse::<crate::throttle::ThrottleSchedule>()?;
        }
        Ok(())
    }

    pub fn retry_after(&self) -> Duration {
        Duration::from_secs(self.retry_after_secs)
    }

    pub fn throttle_source(&self) -> Result<ThrottleSource> {
        Ok(match &self.throttle {
            Some(list) => ThrottleSource::Explicit(list.parse()?),
            None => ThrottleSource::file(&self.throttle_file),
        })
    }

    pub fn driver_config(&self, label: &str) -> DriverConfig {
        DriverConfig {
            retry_after: self.retry_after(),
            label: label.to_string(),
        }
    }

    /// The configured ZooKeeper URL, or the `zookeeper.connect` entry of the
    /// broker config under `kafka_home`.
    pub fn resolve_zookeeper(&self) -> std::result::Result<String, ReassignError> {
        if let Some(url) = &self.zookeeper {
            return Ok(url.clone());
        }

        let config_file = self.kafka_home.join(KAFKA_SERVER_CONFIG);
        let not_found = |error_msg: String| ReassignError::Config {
            file_path: config_file.display().to_string(),
            error_msg,
        };
        if !config_file.is_file() {
            tracing::info!(path = %config_file.display(), "config file does not exist");
            return Err(not_found("no zookeeper URL given".to_string()));
        }

        tracing::info!(path = %config_file.display(), "reading");
        let contents = std::fs::read_to_string(&config_file).map_err(|e| not_found(e.to_string()))?;
        zookeeper_connect(&contents)
            .ok_or_else(|| not_found("no zookeeper.connect entry".to_string()))
    }
}

fn zookeeper_connect(properties: &str) -> Option<String> {
    let pattern = Regex::new(r"^zookeeper\.connect=(.*)$").ok()?;
    properties
        .lines()
        .find_map(|line| pattern.captures(line))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}
