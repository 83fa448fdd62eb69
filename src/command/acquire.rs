use crate::command;
use argh::FromArgs;
use simple_lock::lock::{self, Lock};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "acquire",
    description = "Acquire a lock and leave it held until its lease ends"
)]
pub struct Options {
    #[argh(positional)]
    /// the resource to lock
    pub key: String,
    #[argh(option, short = 't')]
    /// how long to keep retrying, in seconds, defaults to the configured `max_timeout`
    pub timeout: Option<u64>,
}

pub struct Command {
    lock: Arc<dyn Lock>,
    key: String,
    timeout: Option<Duration>,
}

impl Command {
    pub fn new(options: &Options, lock: Arc<dyn Lock>) -> Self {
        Self {
            lock,
            key: options.key.clone(),
            timeout: options.timeout.map(Duration::from_secs),
        }
    }

    pub async fn run(&self) -> Result<(), command::Error> {
        let started = Instant::now();

        if self.lock.acquire(&self.key, self.timeout).await? {
            info!("Lock {} acquired", self.key);
            println!("acquired");
            Ok(())
        } else {
            Err(lock::Error::AcquireFailed {
                key: self.key.clone(),
                elapsed: started.elapsed(),
            }
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_lock::lock::{AddLock, LockConfig};
    use simple_lock::store::memory;

    #[tokio::test]
    async fn test_acquire_command() {
        let lock: Arc<dyn Lock> = Arc::new(AddLock::new(
            Arc::new(memory::Backend::new()),
            LockConfig::default(),
        ));
        let options = Options {
            key: "job".to_string(),
            timeout: Some(0),
        };

        let command = Command::new(&options, lock);
        assert!(command.run().await.is_ok());

        let result = command.run().await;
        assert!(matches!(
            result,
            Err(command::Error::Lock(lock::Error::AcquireFailed { ref key, .. })) if key == "job"
        ));
    }
}
