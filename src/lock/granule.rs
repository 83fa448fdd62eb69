use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::{instrument, warn};

use crate::lock::{Error, Lock};

/// Releases `key` from a spawned task when the critical section is dropped
/// before reaching its own release.
struct ReleaseGuard {
    lock: Option<Arc<dyn Lock>>,
    key: String,
}

impl ReleaseGuard {
    fn new(lock: Arc<dyn Lock>, key: &str) -> Self {
        ReleaseGuard {
            lock: Some(lock),
            key: key.to_string(),
        }
    }

    fn disarm(&mut self) {
        self.lock = None;
    }
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        let Some(lock) = self.lock.take() else {
            return;
        };

        let Ok(runtime) = Handle::try_current() else {
            warn!("No runtime to release lock {}, letting it expire", self.key);
            return;
        };

        let key = std::mem::take(&mut self.key);
        runtime.spawn(async move {
            if let Err(err) = lock.release(&key).await {
                warn!("Failed to release lock {key} after cancellation: {err}");
            }
        });
    }
}

/// Runs units of work while holding a lock, releasing it on every exit path.
#[derive(Clone, Debug)]
pub struct Granule {
    lock: Arc<dyn Lock>,
}

impl Granule {
    pub fn new(lock: Arc<dyn Lock>) -> Self {
        Granule { lock }
    }

    /// The backend used to acquire and release locks
    pub fn lock(&self) -> &Arc<dyn Lock> {
        &self.lock
    }

    /// Acquire `key`, run `work`, then release `key`
    ///
    /// The release happens exactly once whatever the outcome: success, failed
    /// acquisition, store error, or a panic inside `work` (resumed after the
    /// release). If the returned future is dropped early, the release is
    /// spawned onto the current runtime instead.
    ///
    /// # Arguments
    ///
    /// * `key` - The resource to lock
    /// * `work` - The critical section
    /// * `acquire_timeout` - The acquisition budget, `None` selects the configured default
    ///
    /// # Returns
    ///
    /// * `Ok(T)` with the value produced by `work`
    ///
    /// # Errors
    ///
    /// * `Error::AcquireFailed` if the lock could not be acquired within the budget
    /// * `Error::Store` if the store failed while acquiring or releasing
    #[instrument(skip(self, work))]
    pub async fn granule<F, Fut, T>(
        &self,
        key: &str,
        work: F,
        acquire_timeout: Option<Duration>,
    ) -> Result<T, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let started = Instant::now();
        let mut guard = ReleaseGuard::new(self.lock.clone(), key);

        let outcome = match self.lock.acquire(key, acquire_timeout).await {
            Ok(true) => AssertUnwindSafe(async move { work().await })
                .catch_unwind()
                .await
                .map(Ok),
            Ok(false) => Ok(Err(Error::AcquireFailed {
                key: key.to_string(),
                elapsed: started.elapsed(),
            })),
            Err(err) => Ok(Err(err)),
        };

        let released = self.lock.release(key).await;
        guard.disarm();

        let result = match outcome {
            Ok(result) => result,
            Err(payload) => {
                if let Err(err) = released {
                    warn!("Failed to release lock after a panic in the critical section: {err}");
                }
                panic::resume_unwind(payload);
            }
        };

        match (result, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) | (Err(err), Ok(())) => Err(err),
            (Err(err), Err(release_err)) => {
                warn!("Failed to release lock: {release_err}");
                Err(err)
            }
        }
    }

    /// Alias of [`Granule::granule`]
    pub async fn synchronized<F, Fut, T>(
        &self,
        key: &str,
        work: F,
        acquire_timeout: Option<Duration>,
    ) -> Result<T, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.granule(key, work, acquire_timeout).await
    }
}
