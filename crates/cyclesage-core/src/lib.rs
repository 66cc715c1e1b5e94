//! CycleSage Core — shared error type, configuration and data directories.

pub mod config;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use config::{CycleSageConfig, DataPaths, Endpoint};
pub use error::{Error, Result};
