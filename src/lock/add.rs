use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{self, Instant};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::lock::{Error, Lock, LockConfig, Strategy};
use crate::metrics_provider::METRICS_PROVIDER;
use crate::store::AddStore;

/// Lock backend for stores offering an atomic "add if absent" primitive.
///
/// The record holds an owner token unique to this instance, which is checked
/// before deleting the record on release. Dead locks are freed by the store's
/// own TTL expiry.
#[derive(Debug)]
pub struct AddLock {
    store: Arc<dyn AddStore>,
    config: LockConfig,
    token: String,
}

impl AddLock {
    pub fn new(store: Arc<dyn AddStore>, config: LockConfig) -> Self {
        let token = Uuid::new_v4().simple().to_string();
        info!("Using add-based lock backend with owner token {token}");
        AddLock {
            store,
            config,
            token,
        }
    }

    /// The value this instance writes into the records it owns
    pub fn token(&self) -> &str {
        &self.token
    }
}

#[async_trait]
impl Lock for AddLock {
    #[instrument(skip(self))]
    async fn acquire(&self, key: &str, acquire_timeout: Option<Duration>) -> Result<bool, Error> {
        let key = self.config.key(key);
        let budget = self.config.acquire_budget(acquire_timeout);
        let started = Instant::now();

        loop {
            if self
                .store
                .add(&key, &self.token, self.config.timeout)
                .await?
            {
                debug!("Acquired lock");
                METRICS_PROVIDER.record_acquire(Strategy::Add.as_str(), true, started.elapsed());
                return Ok(true);
            }

            time::sleep(self.config.retry_interval()).await;
            if started.elapsed() >= budget {
                break;
            }
            debug!("Lock busy, retrying");
        }

        debug!("Acquisition budget of {budget:?} exhausted");
        METRICS_PROVIDER.record_acquire(Strategy::Add.as_str(), false, started.elapsed());
        Ok(false)
    }

    #[instrument(skip(self))]
    async fn release(&self, key: &str) -> Result<(), Error> {
        let key = self.config.key(key);

        // Not atomic: the lease may expire and be taken by another owner
        // between the read and the delete.
        let owned = self.store.get(&key).await?.as_deref() == Some(self.token.as_str());
        if owned {
            self.store.delete(&key).await?;
            debug!("Released lock");
        } else {
            debug!("Lock record not owned by this instance, skipping release");
        }

        METRICS_PROVIDER.record_release(Strategy::Add.as_str(), owned);
        Ok(())
    }

    async fn clear(&self) -> u64 {
        0
    }
}
