//! Tracing subscriber initialisation.
//!
//! `RUST_LOG` selects the filter (default `info`); `PDPSYNC_LOG_JSON=true`
//! switches to newline-delimited JSON output.

use pdpsync_domain::{PdpError, Result};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";
const JSON_ENV: &str = "PDPSYNC_LOG_JSON";

/// Output format of the global subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// Format requested through `PDPSYNC_LOG_JSON`.
    pub fn from_env() -> Self {
        match std::env::var(JSON_ENV) {
            Ok(value) if matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on") => {
                Self::Json
            }
            _ => Self::Pretty,
        }
    }
}

/// Install the global subscriber.
///
/// # Errors
/// Returns `PdpError::Internal` when a global subscriber is already set.
pub fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    };
    installed.map_err(|e| PdpError::Internal(format!("failed to install tracing subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_initialisation_is_an_error() {
        let first = init_tracing(LogFormat::Pretty);
        let second = init_tracing(LogFormat::Json);

        // Another test may have installed the subscriber first.
        assert!(first.is_ok() || second.is_err());
        assert!(matches!(second, Err(PdpError::Internal(_))));
    }
}
