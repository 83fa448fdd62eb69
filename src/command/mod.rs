pub mod acquire;
pub mod clear;
mod error;
pub mod metrics;
pub mod release;
pub mod run;

pub use error::Error;
