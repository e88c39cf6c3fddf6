//! # Observability Infrastructure
//!
//! Structured logging for the SMTP credentials tooling.

pub mod logging;

pub use logging::log_config_info;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Returns `Ok` without
/// doing anything when a subscriber is already installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| {
            Error::config_with_source(
                format!("Invalid log level '{}'", config.log_level),
                Box::new(e),
            )
        })?,
    };

    // A subscriber installed earlier (integration tests) stays in place.
    let registry = tracing_subscriber::registry().with(env_filter);
    if config.json_logging {
        let _ = registry.with(fmt::layer().json().with_current_span(true)).try_init();
    } else {
        let _ = registry.with(fmt::layer().with_target(false)).try_init();
    }
    Ok(())
}

// The init_logging test lives in tests/observability.rs: it installs a global
// subscriber, which would conflict with `tracing_test::traced_test` unit tests
// sharing the lib test binary.
