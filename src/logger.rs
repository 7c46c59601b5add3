//! Initializes `tracing` for the application.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::{config, Result};

// Module names whose events pass the default filter.
const MODULE_WHITELIST: &[&str] = &["neurobagel_api", "tower_http"];

// Keeps the non-blocking writer flushing until the process exits.
static NONBLOCKING_WORK_GUARD_KEEP: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum LogLevel {
    /// The "off" level.
    #[serde(rename = "off")]
    Off,
    /// The "trace" level.
    #[serde(rename = "trace")]
    Trace,
    /// The "debug" level.
    #[serde(rename = "debug")]
    Debug,
    /// The "info" level.
    #[serde(rename = "info")]
    #[default]
    Info,
    /// The "warn" level.
    #[serde(rename = "warn")]
    Warn,
    /// The "error" level.
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum Format {
    #[serde(rename = "compact")]
    #[default]
    Compact,
    #[serde(rename = "pretty")]
    Pretty,
    #[serde(rename = "json")]
    Json,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Off => "off",
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
        .fmt(f)
    }
}

/// Builds the filter directive used when `RUST_LOG` is not set.
#[must_use]
pub fn default_filter(config: &config::Logger) -> String {
    config.override_filter.clone().unwrap_or_else(|| {
        MODULE_WHITELIST
            .iter()
            .map(|m| format!("{}={}", m, config.level))
            .collect::<Vec<_>>()
            .join(",")
    })
}

/// Initializes the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Calling this more than once is
/// harmless: only the first subscriber is installed.
///
/// # Errors
///
/// Returns an error when the filter directive cannot be parsed.
pub fn init(config: &config::Logger) -> Result<()> {
    if !config.enable {
        return Ok(());
    }

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter(config))?,
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
    let _ = NONBLOCKING_WORK_GUARD_KEEP.set(guard);

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        Format::Compact => fmt::layer()
            .compact()
            .with_ansi(true)
            .with_writer(non_blocking)
            .boxed(),
        Format::Pretty => fmt::layer()
            .pretty()
            .with_ansi(true)
            .with_writer(non_blocking)
            .boxed(),
        Format::Json => fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(non_blocking)
            .boxed(),
    };

    if let Err(err) = tracing_subscriber::registry()
        .with(layer.with_filter(env_filter))
        .try_init()
    {
        eprintln!("tracing subscriber already installed: {err}");
    }
    Ok(())
}
