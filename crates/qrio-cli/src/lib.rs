//! QRio CLI library
//!
//! Hosts a [`qrio_peripheral::PeripheralController`] outside of a mobile UI:
//! either advertising a single session until interrupted, or answering host
//! method calls over stdin/stdout.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::{Cli, Commands};
pub use commands::CommandDispatcher;
pub use config::AppConfig;
pub use error::{CliError, Result};
