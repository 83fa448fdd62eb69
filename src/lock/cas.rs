use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::{self, Instant};
use tracing::{debug, info, instrument};

use crate::lock::{Error, Lock, LockConfig, Strategy};
use crate::metrics_provider::METRICS_PROVIDER;
use crate::store::CasStore;

/// Lock backend for stores offering read, compare-and-swap and TTL primitives.
///
/// The record holds the Unix timestamp at which the lease ends. A record whose
/// timestamp is in the past is taken over even if the store has not expired
/// it yet. Records carry no owner identity.
#[derive(Debug)]
pub struct CasLock {
    store: Arc<dyn CasStore>,
    config: LockConfig,
}

/// Whether a stored lease end lies strictly in the past.
///
/// Absent or unparseable values cannot describe a live lease and count as expired.
fn is_expired(value: Option<&str>) -> bool {
    let now = Utc::now().timestamp();
    value
        .and_then(|value| value.trim().parse::<i64>().ok())
        .is_none_or(|lease_end| lease_end < now)
}

impl CasLock {
    pub fn new(store: Arc<dyn CasStore>, config: LockConfig) -> Self {
        info!("Using CAS-based lock backend");
        CasLock { store, config }
    }

    fn lease_end(&self) -> i64 {
        let lease = i64::try_from(self.config.timeout).unwrap_or(i64::MAX);
        Utc::now().timestamp().saturating_add(lease)
    }

    async fn try_acquire(&self, key: &str) -> Result<bool, Error> {
        let candidate = self.lease_end().to_string();

        if self
            .store
            .set_nx_ex(key, &candidate, self.config.timeout)
            .await?
        {
            return Ok(true);
        }

        let current = self.store.get(key).await?;
        if !is_expired(current.as_deref()) {
            return Ok(false);
        }

        // Only the caller whose swap replaced a still-expired value wins
        let previous = self.store.get_set(key, &candidate).await?;
        if !is_expired(previous.as_deref()) {
            debug!("Lost the takeover race for an expired lock");
            return Ok(false);
        }

        self.store.expire(key, self.config.timeout).await?;
        info!("Took over expired lock (lease ended at {current:?})");
        METRICS_PROVIDER.lock_takeover_total.inc();
        Ok(true)
    }
}

#[async_trait]
impl Lock for CasLock {
    #[instrument(skip(self))]
    async fn acquire(&self, key: &str, acquire_timeout: Option<Duration>) -> Result<bool, Error> {
        let key = self.config.key(key);
        let budget = self.config.acquire_budget(acquire_timeout);
        let started = Instant::now();

        loop {
            if self.try_acquire(&key).await? {
                debug!("Acquired lock");
                METRICS_PROVIDER.record_acquire(Strategy::Cas.as_str(), true, started.elapsed());
                return Ok(true);
            }

            time::sleep(self.config.retry_interval()).await;
            if started.elapsed() >= budget {
                break;
            }
            debug!("Lock busy, retrying");
        }

        debug!("Acquisition budget of {budget:?} exhausted");
        METRICS_PROVIDER.record_acquire(Strategy::Cas.as_str(), false, started.elapsed());
        Ok(false)
    }

    /// Deletes the record whenever the store reports a nonzero TTL.
    ///
    /// There is no ownership check: any caller releases a live record,
    /// including one held by another process.
    #[instrument(skip(self))]
    async fn release(&self, key: &str) -> Result<(), Error> {
        let key = self.config.key(key);

        let deleted = self.store.ttl(&key).await? != 0;
        if deleted {
            self.store.delete(&key).await?;
            debug!("Released lock");
        } else {
            debug!("Lock record about to expire, skipping release");
        }

        METRICS_PROVIDER.record_release(Strategy::Cas.as_str(), deleted);
        Ok(())
    }

    async fn clear(&self) -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{self, memory, MockCasStore};

    fn config() -> LockConfig {
        LockConfig {
            strategy: Strategy::Cas,
            timeout: 10,
            retry_wait: 1_000,
            ..LockConfig::default()
        }
    }

    fn past() -> String {
        (Utc::now().timestamp() - 10).to_string()
    }

    fn future() -> String {
        (Utc::now().timestamp() + 60).to_string()
    }

    #[test]
    fn test_is_expired() {
        assert!(is_expired(None));
        assert!(is_expired(Some("not a timestamp")));
        assert!(is_expired(Some(&past())));
        assert!(!is_expired(Some(&future())));
        assert!(!is_expired(Some(&format!(" {} ", future()))));
    }

    #[tokio::test]
    async fn test_acquire_writes_lease_end() {
        let store = memory::Backend::new();
        let lock = CasLock::new(Arc::new(store.clone()), config());

        let before = Utc::now().timestamp();
        assert_eq!(lock.acquire("job", Some(Duration::ZERO)).await, Ok(true));

        let value = CasStore::get(&store, "job").await.unwrap().unwrap();
        let lease_end: i64 = value.parse().unwrap();
        assert!(lease_end >= before + 10);
        assert!(lease_end <= Utc::now().timestamp() + 10);
        assert_eq!(store.ttl("job").await, Ok(10));
    }

    #[tokio::test]
    async fn test_takeover_reapplies_ttl() {
        let store = memory::Backend::new();
        store.set("job", &past(), Some(30)).await;

        let lock = CasLock::new(Arc::new(store.clone()), config());
        assert_eq!(lock.acquire("job", Some(Duration::ZERO)).await, Ok(true));

        let value = CasStore::get(&store, "job").await.unwrap().unwrap();
        assert!(!is_expired(Some(&value)));
        assert_eq!(store.ttl("job").await, Ok(10));
    }

    #[tokio::test]
    async fn test_takeover_of_vanished_record() {
        let mut store = MockCasStore::new();
        store.expect_set_nx_ex().times(1).returning(|_, _, _| Ok(false));
        store.expect_get().times(1).returning(|_| Ok(None));
        store.expect_get_set().times(1).returning(|_, _| Ok(None));
        store.expect_expire().times(1).returning(|_, _| Ok(()));

        let lock = CasLock::new(Arc::new(store), config());
        assert_eq!(lock.acquire("job", Some(Duration::ZERO)).await, Ok(true));
    }

    #[tokio::test]
    async fn test_lost_takeover_race() {
        let mut store = MockCasStore::new();
        store.expect_set_nx_ex().times(1).returning(|_, _, _| Ok(false));
        store.expect_get().times(1).returning(|_| Ok(Some(past())));
        store
            .expect_get_set()
            .times(1)
            .returning(|_, _| Ok(Some(future())));
        store.expect_expire().times(0);

        let lock = CasLock::new(Arc::new(store), config());
        assert_eq!(lock.acquire("job", Some(Duration::ZERO)).await, Ok(false));
    }

    #[tokio::test]
    async fn test_live_record_is_not_swapped() {
        let mut store = MockCasStore::new();
        store.expect_set_nx_ex().times(1).returning(|_, _, _| Ok(false));
        store.expect_get().times(1).returning(|_| Ok(Some(future())));
        store.expect_get_set().times(0);

        let lock = CasLock::new(Arc::new(store), config());
        assert_eq!(lock.acquire("job", Some(Duration::ZERO)).await, Ok(false));
    }

    #[tokio::test]
    async fn test_store_error_is_not_retried() {
        let mut store = MockCasStore::new();
        store.expect_set_nx_ex().times(1).returning(|_, _, _| Ok(false));
        store
            .expect_get()
            .times(1)
            .returning(|_| Err(store::Error::Backend("timeout".to_string())));

        let lock = CasLock::new(Arc::new(store), config());
        assert_eq!(
            lock.acquire("job", Some(Duration::from_secs(5))).await,
            Err(Error::Store(store::Error::Backend("timeout".to_string())))
        );
    }

    #[tokio::test]
    async fn test_release_skips_record_without_remaining_ttl() {
        let mut store = MockCasStore::new();
        store.expect_ttl().times(1).returning(|_| Ok(0));
        store.expect_delete().times(0);

        let lock = CasLock::new(Arc::new(store), config());
        assert_eq!(lock.release("job").await, Ok(()));
    }

    #[tokio::test]
    async fn test_release_deletes_for_any_nonzero_ttl() {
        for ttl in [-2, -1, 1, 30] {
            let mut store = MockCasStore::new();
            store.expect_ttl().times(1).returning(move |_| Ok(ttl));
            store.expect_delete().times(1).returning(|_| Ok(()));

            let lock = CasLock::new(Arc::new(store), config());
            assert_eq!(lock.release("job").await, Ok(()));
        }
    }

    #[tokio::test]
    async fn test_clear_is_a_noop() {
        let lock = CasLock::new(Arc::new(memory::Backend::new()), config());
        assert_eq!(lock.clear().await, 0);
    }
}
