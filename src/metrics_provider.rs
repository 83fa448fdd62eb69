use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry,
};
use prometheus::{
    Encoder, Histogram, IntCounter, IntCounterVec, Registry as PrometheusRegistry, TextEncoder,
};
use tracing::error;

pub static METRICS_PROVIDER: LazyLock<MetricsProvider> =
    LazyLock::new(|| MetricsProvider::new().expect("Unable to create metrics provider"));

#[derive(Debug)]
pub enum Error {
    Initialization(String),
    Encoding(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Initialization(err) => write!(f, "Metrics initialization error: {err}"),
            Error::Encoding(err) => write!(f, "Metrics encoding error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

pub struct MetricsProvider {
    registry: PrometheusRegistry,
    pub lock_acquire_total: IntCounterVec,
    pub lock_acquire_duration: Histogram,
    pub lock_takeover_total: IntCounter,
    pub lock_release_total: IntCounterVec,
}

impl MetricsProvider {
    pub fn new() -> Result<Self, Error> {
        let registry = PrometheusRegistry::new();

        let lock_acquire_total = register_int_counter_vec_with_registry!(
            "lock_acquire_total",
            "Total number of lock acquisitions, by strategy and outcome.",
            &["strategy", "result"],
            &registry
        )
        .map_err(|error| {
            error!("Unable to create lock_acquire_total metric: {error}");
            Error::Initialization(String::from("Unable to create lock_acquire_total metric"))
        })?;

        let lock_acquire_duration = register_histogram_with_registry!(
            "lock_acquire_duration_seconds",
            "Time spent polling for a lock, in seconds.",
            &registry
        )
        .map_err(|error| {
            error!("Unable to create lock_acquire_duration metric: {error}");
            Error::Initialization(String::from(
                "Unable to create lock_acquire_duration metric",
            ))
        })?;

        let lock_takeover_total = register_int_counter_with_registry!(
            "lock_takeover_total",
            "Total number of expired lock records taken over.",
            &registry
        )
        .map_err(|error| {
            error!("Unable to create lock_takeover_total metric: {error}");
            Error::Initialization(String::from("Unable to create lock_takeover_total metric"))
        })?;

        let lock_release_total = register_int_counter_vec_with_registry!(
            "lock_release_total",
            "Total number of lock releases, by strategy and outcome.",
            &["strategy", "result"],
            &registry
        )
        .map_err(|error| {
            error!("Unable to create lock_release_total metric: {error}");
            Error::Initialization(String::from("Unable to create lock_release_total metric"))
        })?;

        Ok(Self {
            registry,
            lock_acquire_total,
            lock_acquire_duration,
            lock_takeover_total,
            lock_release_total,
        })
    }

    pub fn record_acquire(&self, strategy: &str, acquired: bool, elapsed: Duration) {
        let result = if acquired { "acquired" } else { "timeout" };
        self.lock_acquire_total
            .with_label_values(&[strategy, result])
            .inc();
        self.lock_acquire_duration.observe(elapsed.as_secs_f64());
    }

    pub fn record_release(&self, strategy: &str, deleted: bool) {
        let result = if deleted { "deleted" } else { "skipped" };
        self.lock_release_total
            .with_label_values(&[strategy, result])
            .inc();
    }

    pub fn gather(&self) -> Result<String, Error> {
        let mut buffer = vec![];
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|error| Error::Encoding(format!("Unable to encode metrics: {error}")))?;
        String::from_utf8(buffer).map_err(|error| Error::Encoding(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather() {
        let provider = MetricsProvider::new().unwrap();
        provider
            .lock_acquire_total
            .with_label_values(&["cas", "acquired"])
            .inc();
        provider.lock_takeover_total.inc();
        provider.lock_acquire_duration.observe(0.25);

        let text = provider.gather().unwrap();
        assert!(text.contains("lock_acquire_total{"));
        assert!(text.contains(r#"result="acquired""#));
        assert!(text.contains(r#"strategy="cas""#));
        assert!(text.contains("lock_takeover_total 1"));
        assert!(text.contains("lock_acquire_duration_seconds_count 1"));
    }

    #[test]
    fn test_record_helpers() {
        let provider = MetricsProvider::new().unwrap();
        provider.record_acquire("add", false, Duration::from_millis(300));
        provider.record_release("add", false);
        provider.record_release("add", true);

        assert_eq!(
            provider
                .lock_acquire_total
                .with_label_values(&["add", "timeout"])
                .get(),
            1
        );
        assert_eq!(
            provider
                .lock_release_total
                .with_label_values(&["add", "skipped"])
                .get(),
            1
        );
        assert_eq!(provider.lock_acquire_duration.get_sample_count(), 1);
    }
}
