//! Tracing subscriber setup.
//!
//! The library itself only emits `tracing` events. Applications that do not
//! install their own subscriber can call [`init_tracing`].
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `RUST_LOG` | Filter directives, overrides `logging.level`; invalid values are ignored with a warning | unset |
//! | `APN_LOGGING__LEVEL` | Filter used when `RUST_LOG` is unset | `info` |
//! | `APN_LOGGING__JSON` | Emit JSON lines | `false` |

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

/// Result type for telemetry operations
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Telemetry-specific error type
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Invalid log filter '{0}'")]
    Filter(String),
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Where the active log filter came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSource {
    /// `RUST_LOG` directives
    RustLog,
    /// `logging.level`, with `RUST_LOG` unset
    Config,
    /// `logging.level`, because `RUST_LOG` failed to parse with this error
    InvalidRustLog(String),
}

/// Build the filter: `RUST_LOG` when set and valid, the configured level otherwise
pub fn env_filter(config: &LogConfig) -> TelemetryResult<(EnvFilter, FilterSource)> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    build_filter(rust_log.as_deref(), config)
}

/// Build the filter from explicit `RUST_LOG` directives.
///
/// Empty directives count as unset. Invalid ones fall back to
/// `config.level` and report why through [`FilterSource::InvalidRustLog`].
pub fn build_filter(
    rust_log: Option<&str>,
    config: &LogConfig,
) -> TelemetryResult<(EnvFilter, FilterSource)> {
    let mut source = FilterSource::Config;

    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return Ok((filter, FilterSource::RustLog)),
            Err(e) => source = FilterSource::InvalidRustLog(e.to_string()),
        }
    }

    let filter = EnvFilter::try_new(&config.level)
        .map_err(|_| TelemetryError::Filter(config.level.clone()))?;
    Ok((filter, source))
}

/// Install the global tracing subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init_tracing(config: &LogConfig) -> TelemetryResult<()> {
    let (filter, source) = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    result.map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    if let FilterSource::InvalidRustLog(error) = &source {
        tracing::warn!(
            error = %error,
            level = %config.level,
            "Ignoring invalid RUST_LOG, using configured level"
        );
    }
    tracing::info!(level = %config.level, json = config.json, source = ?source, "Tracing initialized");
    Ok(())
}
