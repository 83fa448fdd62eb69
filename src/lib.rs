#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod configuration;
pub mod lock;
pub mod metrics_provider;
pub mod middleware;
pub mod store;

pub use lock::{AddLock, CasLock, Granule, Lock};
