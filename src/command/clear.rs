use argh::FromArgs;
use simple_lock::lock::Lock;
use std::sync::Arc;

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "clear",
    description = "Reap dead locks and print how many were removed"
)]
pub struct Options {}

pub struct Command {
    lock: Arc<dyn Lock>,
}

impl Command {
    pub fn new(lock: Arc<dyn Lock>) -> Self {
        Self { lock }
    }

    pub async fn run(&self) -> u64 {
        let reaped = self.lock.clear().await;
        println!("{reaped}");
        reaped
    }
}
