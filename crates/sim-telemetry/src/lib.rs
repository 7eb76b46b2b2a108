//! # Simulator Telemetry
//!
//! Logging bootstrap for the gossip simulator binaries: a `tracing`
//! registry with an `EnvFilter` and either a human-readable or a JSON
//! formatting layer.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sim_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // Application code here
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SIM_SERVICE_NAME` | `gossip-sim` | Service name in the startup record |
//! | `SIM_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directive |
//! | `SIM_CONSOLE_OUTPUT` | `true` | Write records to stderr |
//! | `SIM_JSON_LOGS` | `false` | JSON formatted records |

mod config;
mod tracing_setup;

pub use config::TelemetryConfig;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to install subscriber: {0}")]
    SubscriberInit(String),
}

/// Install the global subscriber.
///
/// Returns a guard to hold for the lifetime of the application. Fails if a
/// global subscriber is already installed.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    tracing_setup::init_tracing(&config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_rejected() {
        let config = TelemetryConfig {
            log_level: "gossip_engine=notalevel".to_string(),
            ..TelemetryConfig::default()
        };

        assert!(matches!(
            tracing_setup::env_filter(&config),
            Err(TelemetryError::Filter(_))
        ));
    }

    #[test]
    fn test_valid_filter_directive() {
        let config = TelemetryConfig {
            log_level: "info,gossip_engine=debug".to_string(),
            ..TelemetryConfig::default()
        };
        assert!(tracing_setup::env_filter(&config).is_ok());
    }
}
