//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - JSON-formatted log files
//! - Configurable log levels
//! - Local file logging with rotation
//! - Human-readable console output on stderr
//!
//! # Example
//!
//! ```no_run
//! use inkguard::logging::init_logging;
//! use inkguard::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log the successful completion of a pipeline stage
///
/// # Example
///
/// ```no_run
/// use inkguard::log_stage_complete;
/// use inkguard::domain::Stage;
/// use std::time::Duration;
///
/// log_stage_complete!(Stage::Ocr, Duration::from_millis(850));
/// ```
#[macro_export]
macro_rules! log_stage_complete {
    ($stage:expr, $duration:expr) => {
        tracing::debug!(
            stage = %$stage,
            duration_ms = $duration.as_millis(),
            "Stage completed"
        );
    };
}

/// Log a failed pipeline stage
///
/// # Example
///
/// ```no_run
/// use inkguard::log_stage_failed;
/// use inkguard::domain::{ErrorType, Stage};
///
/// log_stage_failed!(Stage::Redaction, ErrorType::RedactionFailure, "disk full");
/// ```
#[macro_export]
macro_rules! log_stage_failed {
    ($stage:expr, $error_type:expr, $message:expr) => {
        tracing::warn!(
            stage = %$stage,
            error_type = %$error_type,
            message = %$message,
            "Stage failed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use inkguard::log_error_with_context;
/// use inkguard::domain::InkguardError;
///
/// let error = InkguardError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = %$context,
            "Error occurred"
        );
    };
}

/// Log progress through a batch
///
/// # Example
///
/// ```no_run
/// use inkguard::log_batch_processing;
///
/// log_batch_processing!(3, 12);
/// ```
#[macro_export]
macro_rules! log_batch_processing {
    ($current:expr, $total:expr) => {
        tracing::debug!(
            current = $current,
            total = $total,
            progress_pct = ($current as f64 / $total as f64 * 100.0),
            "Processing batch"
        );
    };
}
