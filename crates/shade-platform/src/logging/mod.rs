//! Logging utilities.
//!
//! Everything in this crate logs through the `log` facade. Binaries install the
//! `env_logger` backend once, early in `main`; [`crate::windowless_main!`] does
//! this automatically.

mod init;

pub use init::{LoggingConfig, init_logging, is_initialized};
