use crate::command;
use argh::FromArgs;
use simple_lock::lock::Lock;
use std::sync::Arc;
use tracing::info;

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "release",
    description = "Release a lock (add strategy: only records written by this process are removed)"
)]
pub struct Options {
    #[argh(positional)]
    /// the resource to unlock
    pub key: String,
}

pub struct Command {
    lock: Arc<dyn Lock>,
    key: String,
}

impl Command {
    pub fn new(options: &Options, lock: Arc<dyn Lock>) -> Self {
        Self {
            lock,
            key: options.key.clone(),
        }
    }

    pub async fn run(&self) -> Result<(), command::Error> {
        self.lock.release(&self.key).await?;
        info!("Lock {} released", self.key);
        Ok(())
    }
}
