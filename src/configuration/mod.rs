use serde::Deserialize;
use std::fs;
use std::path::Path;

mod error;
mod lock;

use crate::lock::LockConfig;
use crate::store;
pub use error::Error;
pub use lock::{create_granule, create_lock};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub lock: LockConfig,
    #[serde(default)]
    pub store: store::Config,
    #[serde(default)]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub tracing: Option<TracingConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TracingConfig {
    pub endpoint: String,
    pub sampling_rate: f64,
}

impl Configuration {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let config_str = fs::read_to_string(path)?;
        Self::load_from_str(&config_str)
    }

    pub fn load_from_str(slice: &str) -> Result<Self, Error> {
        let config: Configuration = toml::from_str(slice)?;

        if config.lock.timeout == 0 {
            return Err(Error::InvalidValue(
                "Lock timeout must be at least 1 second".to_string(),
            ));
        }

        Ok(config)
    }
}
