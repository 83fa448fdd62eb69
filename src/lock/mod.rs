use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

mod add;
mod cas;
mod config;
mod error;
mod granule;

pub use add::AddLock;
pub use cas::CasLock;
pub use config::{LockConfig, Strategy};
pub use error::Error;
pub use granule::Granule;

/// A distributed lock backend.
///
/// Mutual exclusion is enforced by the atomic primitive of the underlying
/// store, never by bookkeeping local to this process.
#[async_trait]
pub trait Lock: Debug + Send + Sync {
    /// Try to take ownership of `key`, polling until the acquisition budget elapses
    ///
    /// # Arguments
    ///
    /// * `key` - The resource to lock, before prefixing
    /// * `acquire_timeout` - The acquisition budget, `None` selects the configured default.
    ///   A zero budget still performs exactly one attempt.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` if the lock was acquired
    /// * `Ok(false)` if the budget elapsed without success
    ///
    /// # Errors
    ///
    /// * `Error::Store` if the store could not be reached, transport failures are not retried
    async fn acquire(&self, key: &str, acquire_timeout: Option<Duration>) -> Result<bool, Error>;

    /// Best-effort removal of the lock record for `key`.
    ///
    /// Releasing a missing, expired or foreign record is not an error.
    async fn release(&self, key: &str) -> Result<(), Error>;

    /// Reap stale lock records, returning how many were removed.
    ///
    /// Expiry is delegated to the store, so current backends always return `0`.
    async fn clear(&self) -> u64;
}
