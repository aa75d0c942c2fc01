// src/logging.rs

//! Logging setup for `dagrun` using `tracing` + `tracing-subscriber`.
//!
//! The library itself only emits events; embedding programs call
//! [`init_logging`] (or install their own subscriber).
//!
//! Priority for determining the log level:
//! 1. an explicit [`LogLevel`] (e.g. from `[log].level` in the config file)
//! 2. `DAGRUN_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`

use std::str::FromStr;

use tracing_subscriber::fmt;

use crate::errors::{DagRunError, Result};

/// Environment variable consulted when no explicit level is given.
pub const LOG_ENV_VAR: &str = "DAGRUN_LOG";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!(
                "invalid log level: {other} (expected error, warn, info, debug or trace)"
            )),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Resolve the effective level without installing anything.
pub fn effective_level(explicit: Option<LogLevel>) -> tracing::Level {
    match explicit {
        Some(lvl) => lvl.into(),
        None => std::env::var(LOG_ENV_VAR)
            .ok()
            .and_then(|s| s.parse::<LogLevel>().ok())
            .map(tracing::Level::from)
            .unwrap_or(tracing::Level::INFO),
    }
}

/// Initialise the global logging subscriber.
///
/// Logs go to stderr. Fails if a global subscriber is already installed.
pub fn init_logging(level: Option<LogLevel>) -> Result<()> {
    fmt()
        .with_max_level(effective_level(level))
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| DagRunError::Other(anyhow::anyhow!("installing tracing subscriber: {e}")))
}
