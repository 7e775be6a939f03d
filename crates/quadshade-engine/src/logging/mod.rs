//! Logging utilities.
//!
//! This module centralizes logger initialization. Library code only uses the
//! `log` facade; the `env_logger` backend is installed by `init_logging`.

mod init;

pub use init::{init_logging, LoggingConfig};
