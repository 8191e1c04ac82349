//! Command-line options.
//!
//! Parsed with `clap` and converted into the library [`Config`].

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::constants::{
    DB_PATH, DEFAULT_LISTEN_ADDR, DEFAULT_MAX_CONCURRENCY, DEFAULT_TIMEOUT_SECS,
};
use crate::config::types::{Config, LogFormat, LogLevel};

/// Command-line interface.
///
/// # Examples
///
/// ```bash
/// # Serve the JSON API
/// tls_checker serve --listen 0.0.0.0:8080
///
/// # Scan a list of URLs once and exit
/// tls_checker scan urls.txt --max-concurrency 50
///
/// # List URLs found in a codebase
/// tls_checker discover --codebase-root ./web/modules
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "tls_checker",
    about = "Checks TLS certificates for batches of URLs and stores the verdicts."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP service
    Serve {
        /// Address to bind
        #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
        listen: SocketAddr,
    },
    /// Scan URLs read from a file (one per line) or stdin (`-`)
    Scan {
        #[arg(value_parser)]
        file: PathBuf,
    },
    /// Print URLs discovered in the configured codebase
    Discover,
}

/// Options shared by every subcommand.
#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Database path (SQLite file)
    #[arg(long, global = true, value_parser, default_value = DB_PATH)]
    pub db_path: PathBuf,

    /// Maximum number of targets scanned concurrently
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrency: usize,

    /// Network timeout in seconds for DNS, connect and handshake
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// PEM file with additional trust anchors
    #[arg(long, global = true, env = "TLS_CHECKER_CA_BUNDLE")]
    pub ca_bundle: Option<PathBuf>,

    /// Do not trust the bundled Mozilla root set
    #[arg(long, global = true)]
    pub no_default_roots: bool,

    /// Directory searched for URLs by `discover` and the urls-to-scan endpoint
    #[arg(long, global = true, env = "TLS_CHECKER_CODEBASE_ROOT")]
    pub codebase_root: Option<PathBuf>,
}

impl Cli {
    /// Builds the library configuration from the parsed arguments.
    pub fn to_config(&self) -> Config {
        let mut config = Config {
            log_level: self.common.log_level.clone(),
            log_format: self.common.log_format.clone(),
            db_path: self.common.db_path.clone(),
            max_concurrency: self.common.max_concurrency,
            timeout_seconds: self.common.timeout_seconds,
            ca_bundle: self.common.ca_bundle.clone(),
            use_default_roots: !self.common.no_default_roots,
            codebase_root: self.common.codebase_root.clone(),
            ..Default::default()
        };
        if let Command::Serve { listen } = &self.command {
            config.listen_addr = *listen;
        }
        config
    }
}
