use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::info;

use crate::store::{AddStore, CasStore, Error};

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: &str, ttl: Option<u64>) -> Self {
        Entry {
            value: value.to_string(),
            expires_at: ttl.map(|ttl| Instant::now() + Duration::from_secs(ttl)),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expiry| expiry > now)
    }
}

/// In-process store with lazy TTL expiry.
///
/// Clones share the same underlying map, so every clone observes the same
/// records. Useful for tests and for coordinating tasks of a single process.
#[derive(Clone, Debug, Default)]
pub struct Backend {
    store: Arc<Mutex<HashMap<String, Entry>>>,
    counter: Arc<AtomicUsize>,
}

impl Backend {
    pub fn new() -> Self {
        info!("Using in-memory lock store");
        Backend {
            store: Arc::new(Mutex::new(HashMap::new())),
            counter: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Unconditionally store `value` under `key`, with an optional TTL in seconds
    pub async fn set(&self, key: &str, value: &str, ttl: Option<u64>) {
        let mut store = self.entries().await;
        store.insert(key.to_string(), Entry::new(value, ttl));
    }

    async fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        let count = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut store = self.store.lock().await;

        if count % 1000 == 0 {
            let now = Instant::now();
            store.retain(|_, entry| entry.is_live(now));
        }

        store
    }

    async fn create(&self, key: &str, value: &str, ttl: u64) -> bool {
        let mut store = self.entries().await;
        if store.get(key).is_some_and(|entry| entry.is_live(Instant::now())) {
            return false;
        }

        store.insert(key.to_string(), Entry::new(value, Some(ttl)));
        true
    }

    async fn read(&self, key: &str) -> Option<String> {
        let store = self.entries().await;
        store
            .get(key)
            .filter(|entry| entry.is_live(Instant::now()))
            .map(|entry| entry.value.clone())
    }

    async fn remove(&self, key: &str) {
        self.entries().await.remove(key);
    }
}

#[async_trait]
impl AddStore for Backend {
    async fn add(&self, key: &str, value: &str, ttl: u64) -> Result<bool, Error> {
        Ok(self.create(key, value, ttl).await)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.read(key).await)
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.remove(key).await;
        Ok(())
    }
}

#[async_trait]
impl CasStore for Backend {
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: u64) -> Result<bool, Error> {
        Ok(self.create(key, value, ttl).await)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.read(key).await)
    }

    async fn get_set(&self, key: &str, value: &str) -> Result<Option<String>, Error> {
        let mut store = self.entries().await;
        let previous = store
            .insert(key.to_string(), Entry::new(value, None))
            .filter(|entry| entry.is_live(Instant::now()))
            .map(|entry| entry.value);

        Ok(previous)
    }

    async fn expire(&self, key: &str, ttl: u64) -> Result<(), Error> {
        let mut store = self.entries().await;
        let now = Instant::now();
        if let Some(entry) = store.get_mut(key).filter(|entry| entry.is_live(now)) {
            entry.expires_at = Some(now + Duration::from_secs(ttl));
        }

        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<i64, Error> {
        let store = self.entries().await;
        let now = Instant::now();

        let ttl = match store.get(key).filter(|entry| entry.is_live(now)) {
            None => -2,
            Some(Entry {
                expires_at: None, ..
            }) => -1,
            Some(Entry {
                expires_at: Some(expiry),
                ..
            }) => {
                // rounded to the nearest second, like Redis
                let remaining = expiry.duration_since(now).as_millis() + 500;
                i64::try_from(remaining / 1000).unwrap_or(i64::MAX)
            }
        };

        Ok(ttl)
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.remove(key).await;
        Ok(())
    }
}
