use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::store::{AddStore, CasStore, Error};

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BackendConfig {
    pub url: String,
}

#[derive(Debug)]
pub struct Backend {
    client: redis::Client,
}

impl Backend {
    pub fn new(config: &BackendConfig) -> Result<Self, Error> {
        info!("Using Redis lock store");
        let client = redis::Client::open(config.url.as_str())?;
        Ok(Backend { client })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, Error> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: u64) -> Result<bool, Error> {
        let mut conn = self.get_connection().await?;
        let created: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl)
            .query_async(&mut conn)
            .await?;
        Ok(created.is_some())
    }

    async fn read(&self, key: &str) -> Result<Option<String>, Error> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        let mut conn = self.get_connection().await?;
        let _: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl AddStore for Backend {
    async fn add(&self, key: &str, value: &str, ttl: u64) -> Result<bool, Error> {
        self.set_if_absent(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        self.read(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.remove(key).await
    }
}

#[async_trait]
impl CasStore for Backend {
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: u64) -> Result<bool, Error> {
        self.set_if_absent(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        self.read(key).await
    }

    async fn get_set(&self, key: &str, value: &str) -> Result<Option<String>, Error> {
        let mut conn = self.get_connection().await?;
        let previous: Option<String> = redis::cmd("GETSET")
            .arg(key)
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(previous)
    }

    async fn expire(&self, key: &str, ttl: u64) -> Result<(), Error> {
        let mut conn = self.get_connection().await?;
        let _: i64 = redis::cmd("EXPIRE")
            .arg(key)
            .arg(ttl)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<i64, Error> {
        let mut conn = self.get_connection().await?;
        let ttl: i64 = redis::cmd("TTL").arg(key).query_async(&mut conn).await?;
        Ok(ttl)
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.remove(key).await
    }
}
