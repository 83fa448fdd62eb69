use simple_lock::{configuration, lock, metrics_provider};
use std::{fmt, io};

#[derive(Debug)]
pub enum Error {
    IO(io::Error),
    Configuration(configuration::Error),
    Lock(lock::Error),
    InvalidArguments(String),
    Metrics(metrics_provider::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::IO(err) => write!(f, "IO error: {err}"),
            Error::Configuration(err) => {
                write!(f, "Configuration error: ")?;
                write!(f, "{err}")
            }
            Error::Lock(err) => {
                write!(f, "Lock error: ")?;
                write!(f, "{err}")
            }
            Error::InvalidArguments(err) => write!(f, "Invalid arguments: {err}"),
            Error::Metrics(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::IO(err)
    }
}

impl From<configuration::Error> for Error {
    fn from(err: configuration::Error) -> Self {
        Error::Configuration(err)
    }
}

impl From<lock::Error> for Error {
    fn from(err: lock::Error) -> Self {
        Error::Lock(err)
    }
}

impl From<metrics_provider::Error> for Error {
    fn from(err: metrics_provider::Error) -> Self {
        Error::Metrics(err)
    }
}
