//! Logging setup.
//!
//! The engine only emits through the `log` facade; this module wires
//! `env_logger` as the backend for binaries.

mod init;

pub use init::{init_logging, LoggingConfig};
