use std::sync::Arc;

use serde::Deserialize;

use crate::store;
use crate::store::{AddStore, CasStore, Error};

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub enum Config {
    #[default]
    #[serde(rename = "memory")]
    Memory,
    #[serde(rename = "redis")]
    Redis(store::redis::BackendConfig),
}

impl Config {
    pub fn to_add_store(&self) -> Result<Arc<dyn AddStore>, Error> {
        match self {
            Config::Redis(config) => Ok(Arc::new(store::redis::Backend::new(config)?)),
            Config::Memory => Ok(Arc::new(store::memory::Backend::new())),
        }
    }

    pub fn to_cas_store(&self) -> Result<Arc<dyn CasStore>, Error> {
        match self {
            Config::Redis(config) => Ok(Arc::new(store::redis::Backend::new(config)?)),
            Config::Memory => Ok(Arc::new(store::memory::Backend::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::redis::BackendConfig;

    #[test]
    fn test_memory_backend() {
        let store = Config::Memory.to_add_store().unwrap();
        assert!(format!("{store:?}").starts_with("Backend { store:"));

        let store = Config::Memory.to_cas_store().unwrap();
        assert!(format!("{store:?}").starts_with("Backend { store:"));
    }

    #[test]
    fn test_redis_backend() {
        let config = Config::Redis(BackendConfig {
            url: "redis://localhost:6379/0".to_string(),
        });

        let store = config.to_cas_store().unwrap();
        assert!(format!("{store:?}").starts_with("Backend { client:"));

        let store = config.to_add_store().unwrap();
        assert!(format!("{store:?}").starts_with("Backend { client:"));
    }

    #[test]
    fn test_invalid_redis_url() {
        let config = Config::Redis(BackendConfig {
            url: "localhost".to_string(),
        });

        let err = config.to_add_store().unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
    }
}
