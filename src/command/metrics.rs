use crate::command;
use simple_lock::metrics_provider::METRICS_PROVIDER;

/// Renders the lock metrics collected by this process
pub fn render() -> Result<String, command::Error> {
    Ok(METRICS_PROVIDER.gather()?)
}

pub fn report() -> Result<(), command::Error> {
    eprint!("{}", render()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_lock::lock::{AddLock, Lock, LockConfig};
    use simple_lock::store::memory;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_render_includes_lock_activity() {
        let lock = AddLock::new(Arc::new(memory::Backend::new()), LockConfig::default());
        assert_eq!(lock.acquire("job", Some(Duration::ZERO)).await, Ok(true));
        lock.release("job").await.unwrap();

        let text = render().unwrap();
        assert!(text.contains("lock_acquire_total{"));
        assert!(text.contains("lock_release_total{"));
        assert!(text.contains(r#"result="deleted""#));
        assert!(text.contains(r#"strategy="add""#));
        assert!(text.contains("lock_acquire_duration_seconds_count"));
    }
}
