//! Logger initialization.
//!
//! The library only logs through the `log` facade; the binary installs
//! `env_logger` here with either colored plain output or one JSON object per line.

use std::io::{IsTerminal, Write};

use crate::config::LogFormat;
use crate::error_handling::InitializationError;
use colored::*;
use log::LevelFilter;

/// Initializes the logger with the specified level and format.
///
/// Plain output is `time LEVEL module: message`, colored when stderr is a
/// terminal. JSON output is one object per line and carries a `batch_id`
/// field for records about a specific batch.
///
/// The logger reads from the `RUST_LOG` environment variable by default, but
/// the provided `level` parameter will override it. This allows developers to
/// use `RUST_LOG=debug` for quick debugging while still supporting explicit
/// CLI control via `--log-level`.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if logger initialization fails.
///
/// # Examples
///
/// ```bash
/// # Use RUST_LOG for quick debugging (no CLI args needed)
/// RUST_LOG=debug tls_checker scan urls.txt
///
/// # Override with CLI args (takes precedence)
/// RUST_LOG=debug tls_checker scan urls.txt --log-level info
///
/// # Per-module filtering via RUST_LOG
/// RUST_LOG=tls_checker=debug,rustls=warn tls_checker serve
/// ```
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    // Color only when a person is watching stderr
    colored::control::set_override(std::io::stderr().is_terminal());

    // Read from RUST_LOG environment variable first, then override with CLI arg
    let mut builder = env_logger::Builder::from_default_env();

    builder.filter_level(level);
    builder.filter_module("sqlx", LevelFilter::Info);
    builder.filter_module("hyper", LevelFilter::Info);
    // rustls logs every failed handshake at warn; scan verdicts already cover those
    builder.filter_module("rustls", LevelFilter::Error);
    builder.filter_module("tls_checker", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                let line = json_line(
                    chrono::Utc::now().timestamp_millis(),
                    record.level(),
                    record.target(),
                    &record.args().to_string(),
                );
                writeln!(buf, "{line}")
            });
        }
        LogFormat::Plain => {
            builder.format(|buf, record| {
                let level = record.level();
                let level_tag = format!("{level:<5}");
                let colored_level = match level {
                    log::Level::Error => level_tag.red().bold(),
                    log::Level::Warn => level_tag.yellow(),
                    log::Level::Info => level_tag.green(),
                    log::Level::Debug => level_tag.blue(),
                    log::Level::Trace => level_tag.dimmed(),
                };
                writeln!(
                    buf,
                    "{} {} {}: {}",
                    chrono::Local::now().format("%H:%M:%S%.3f"),
                    colored_level,
                    short_target(record.target()).cyan(),
                    record.args()
                )
            });
        }
    }

    // try_init() reports a second installation as an error instead of panicking
    builder.try_init().map_err(InitializationError::from)?;

    Ok(())
}

/// Drops the crate prefix from this crate's own module paths
/// (`tls_checker::scanner::worker` becomes `scanner::worker`).
fn short_target(target: &str) -> &str {
    target
        .strip_prefix("tls_checker::")
        .filter(|rest| !rest.is_empty())
        .unwrap_or(target)
}

/// One JSON object per record, with the batch id lifted into its own field
/// when the message names one.
fn json_line(ts_ms: i64, level: log::Level, target: &str, msg: &str) -> String {
    let mut line = serde_json::json!({
        "ts": ts_ms,
        "level": level.as_str(),
        "target": short_target(target),
        "msg": msg,
    });
    if let Some(batch_id) = batch_id_in(msg) {
        line["batch_id"] = serde_json::Value::from(batch_id);
    }
    line.to_string()
}

/// First `batch_<millis>_<seq>` token in a message.
fn batch_id_in(msg: &str) -> Option<&str> {
    msg.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .find(|word| {
            word.strip_prefix("batch_").is_some_and(|rest| {
                !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit() || b == b'_')
            })
        })
}
