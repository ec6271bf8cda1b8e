//! Configuration management for Inkguard.
//!
//! # Overview
//!
//! Inkguard uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Default values for every setting
//! - `INKGUARD_*` environment overrides
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use inkguard::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("inkguard.toml")?;
//!
//! println!("OCR threshold: {}", config.ocr.min_confidence);
//! println!("Output directory: {}", config.output.directory.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - `[input]` - Accepted formats and size limit
//! - `[preprocessing]` - Image enhancement steps
//! - `[ocr]` - Engine fallback order and acceptance threshold
//! - `[detection]` - Pattern library, enabled types, confidence floors
//! - `[output]` - Result directory and redaction
//! - `[batch]` - Parallelism
//! - `[audit]` - Hashed audit trail
//! - [`LoggingConfig`] - Local JSON log files
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [ocr]
//! min_confidence = 0.3
//!
//! [[ocr.backends]]
//! kind = "tesseract"
//! lang = "eng"
//!
//! [output]
//! directory = "${INKGUARD_RESULTS}"
//! enable_redaction = true
//! redaction_method = "blur"
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, load_config_or_default, parse_config};
pub use schema::{ApplicationConfig, InkguardConfig, LoggingConfig, LOG_LEVELS};
