use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::store;

#[derive(Debug, PartialEq)]
pub enum Error {
    AcquireFailed { key: String, elapsed: Duration },
    Store(store::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::AcquireFailed { key, elapsed } => {
                write!(
                    f,
                    "Acquire lock key {key} timeout after {}ms",
                    elapsed.as_millis()
                )
            }
            Error::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<store::Error> for Error {
    fn from(error: store::Error) -> Self {
        debug!("Lock store error: {error}");
        Error::Store(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = Error::AcquireFailed {
            key: "job:42".to_string(),
            elapsed: Duration::from_millis(300),
        };
        assert_eq!(
            format!("{error}"),
            "Acquire lock key job:42 timeout after 300ms"
        );

        let error: Error = store::Error::Backend("down".to_string()).into();
        assert_eq!(format!("{error}"), "Store error: down");
    }
}
