//! # Structured Logging
//!
//! Span macros and startup logging built on the tracing ecosystem.
//!
//! Every migration runs inside a `migration` span carrying a random
//! `operation_id`, so the debug and warn events of one load can be grouped
//! in JSON output.

/// Create a tracing span for one migration or record load.
///
/// ```rust,ignore
/// let span = migration_span!("load_record", path = %path.display());
/// ```
#[macro_export]
macro_rules! migration_span {
    ($operation:expr) => {
        tracing::info_span!(
            "migration",
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($operation:expr, $($field:tt)*) => {
        tracing::info_span!(
            "migration",
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Log configuration at startup
pub fn log_config_info(config: &crate::config::AppConfig) {
    tracing::info!(
        store_backend = %config.store.backend,
        max_attempts = config.migration.max_attempts,
        subject = %config.migration.subject,
        persist_migrated = config.migration.persist_migrated,
        "SMTP credentials configuration"
    );
}
