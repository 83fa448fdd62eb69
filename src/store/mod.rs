use async_trait::async_trait;
use std::fmt::Debug;

mod config;
mod error;
pub mod memory;
pub mod redis;

pub use config::Config;
pub use error::Error;

/// Contract for stores whose native primitive is "create only if absent, with a TTL".
///
/// This is the protocol spoken by Memcached-style caches (`ADD`/`GET`/`DELETE`).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AddStore: Debug + Send + Sync {
    /// Create `key` holding `value` for `ttl` seconds, unless it already exists
    ///
    /// # Returns
    ///
    /// * `Ok(true)` if the key was created
    /// * `Ok(false)` if a live value is already stored under the key
    /// * `Err(Error)` if the store could not be reached
    async fn add(&self, key: &str, value: &str, ttl: u64) -> Result<bool, Error>;

    /// Read the value stored under `key`, `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Remove `key`, missing keys are ignored
    async fn delete(&self, key: &str) -> Result<(), Error>;
}

/// Contract for stores exposing read, compare-and-swap and TTL primitives
/// (`SETNX`/`GET`/`GETSET`/`EXPIRE`/`TTL`/`DEL`, as in Redis).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CasStore: Debug + Send + Sync {
    /// Set `key` to `value` with a TTL of `ttl` seconds, only if it does not exist
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: u64) -> Result<bool, Error>;

    /// Read the value stored under `key`, `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Atomically replace the value of `key`, returning the previous one.
    ///
    /// Like Redis `GETSET`, the replaced key loses any TTL it had.
    async fn get_set(&self, key: &str, value: &str) -> Result<Option<String>, Error>;

    /// Set a TTL of `ttl` seconds on `key`
    async fn expire(&self, key: &str, ttl: u64) -> Result<(), Error>;

    /// Remaining time to live of `key`, in seconds
    ///
    /// # Returns
    ///
    /// * `-2` if the key does not exist
    /// * `-1` if the key exists without expiry
    /// * the remaining seconds otherwise
    async fn ttl(&self, key: &str) -> Result<i64, Error>;

    /// Remove `key`, missing keys are ignored
    async fn delete(&self, key: &str) -> Result<(), Error>;
}
