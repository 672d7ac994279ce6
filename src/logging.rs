//! Logging initialization
//!
//! [`init_tracing`] installs a global subscriber with an `EnvFilter` (`RUST_LOG` wins
//! over the configured level), a compact or JSON console layer, and optionally a
//! plain-text log file that is truncated at start.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::types::*;

/// Where and how log events are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    /// Level or filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines on the console instead of compact text
    pub json: bool,
    /// Also write plain-text events to this file
    pub file: Option<PathBuf>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

/// Build the event filter for `options`
pub fn env_filter(options: &LogOptions) -> ReconcileResult<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(options.level.trim()))
        .map_err(|e| {
            ReconcileError::Config(format!("invalid log level '{}': {}", options.level, e))
        })
}

/// Initialize the global tracing subscriber.
///
/// Fails if the log file cannot be created or a global subscriber is already set.
pub fn init_tracing(options: &LogOptions) -> ReconcileResult<()> {
    let filter = env_filter(options)?;

    let file_layer = match &options.file {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                ReconcileError::Config(format!("cannot create log file {}: {}", path.display(), e))
            })?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let (json_layer, compact_layer) = if options.json {
        (Some(fmt::layer().json().with_current_span(true)), None)
    } else {
        (None, Some(fmt::layer().with_target(false).compact()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(compact_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ReconcileError::Config(format!("logging already initialized: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = LogOptions::default();
        assert_eq!(options.level, "info");
        assert!(!options.json);
        assert!(options.file.is_none());
    }

    #[test]
    fn test_filter_directives() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let options = LogOptions {
            level: "price_reconciler=debug,warn".to_string(),
            ..LogOptions::default()
        };
        assert!(env_filter(&options).is_ok());

        let options = LogOptions {
            level: "price_reconciler=[".to_string(),
            ..LogOptions::default()
        };
        assert!(matches!(env_filter(&options), Err(ReconcileError::Config(_))));
    }
}
