use crate::command;
use argh::FromArgs;
use simple_lock::lock::Granule;
use std::process::ExitStatus;
use std::time::Duration;
use tracing::{info, warn};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "run",
    description = "Run a program while holding a lock"
)]
pub struct Options {
    #[argh(positional)]
    /// the resource to lock
    pub key: String,
    #[argh(option, short = 't')]
    /// how long to keep retrying, in seconds, defaults to the configured `max_timeout`
    pub timeout: Option<u64>,
    #[argh(positional, greedy)]
    /// the program to run, followed by its arguments
    pub command: Vec<String>,
}

pub struct Command {
    granule: Granule,
    key: String,
    timeout: Option<Duration>,
    program: String,
    args: Vec<String>,
}

impl Command {
    pub fn new(options: &Options, granule: Granule) -> Result<Self, command::Error> {
        let Some((program, args)) = options.command.split_first() else {
            return Err(command::Error::InvalidArguments(
                "missing program to run".to_string(),
            ));
        };

        Ok(Self {
            granule,
            key: options.key.clone(),
            timeout: options.timeout.map(Duration::from_secs),
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    /// Runs the program inside the critical section and returns its exit code
    pub async fn run(&self) -> Result<i32, command::Error> {
        let status: ExitStatus = self
            .granule
            .granule(
                &self.key,
                || async {
                    info!("Running {} under lock {}", self.program, self.key);
                    tokio::process::Command::new(&self.program)
                        .args(&self.args)
                        .status()
                        .await
                },
                self.timeout,
            )
            .await??;

        if let Some(code) = status.code() {
            Ok(code)
        } else {
            warn!("{} terminated by a signal", self.program);
            Ok(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_lock::lock::{AddLock, LockConfig};
    use simple_lock::store::memory;
    use std::sync::Arc;

    fn granule() -> Granule {
        Granule::new(Arc::new(AddLock::new(
            Arc::new(memory::Backend::new()),
            LockConfig::default(),
        )))
    }

    fn options(command: &[&str]) -> Options {
        Options {
            key: "job".to_string(),
            timeout: Some(0),
            command: command.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_missing_program() {
        let result = Command::new(&options(&[]), granule());
        assert!(matches!(result, Err(command::Error::InvalidArguments(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_code_is_forwarded() {
        let command = Command::new(&options(&["sh", "-c", "exit 3"]), granule()).unwrap();
        assert_eq!(command.run().await.unwrap(), 3);

        let command = Command::new(&options(&["true"]), granule()).unwrap();
        assert_eq!(command.run().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_program() {
        let command =
            Command::new(&options(&["/nonexistent/simple-lock-program"]), granule()).unwrap();
        assert!(matches!(command.run().await, Err(command::Error::IO(_))));
    }
}
