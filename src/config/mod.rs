//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, limits, etc.)
//! - The library `Config` struct and logging option enums
//! - CLI option types and parsing

mod cli;
mod constants;
mod types;

pub use cli::{Cli, Command, CommonArgs};
pub use constants::*;
pub use types::{Config, LogFormat, LogLevel};
