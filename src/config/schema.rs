//! Configuration schema definitions
//!
//! The top-level [`InkguardConfig`] is assembled from each subsystem's own
//! section type. Every section has defaults, so an empty file (or no file at
//! all) is a valid configuration.

use crate::audit::AuditConfig;
use crate::detection::DetectionConfig;
use crate::ocr::OcrConfig;
use crate::output::OutputConfig;
use crate::pipeline::{BatchConfig, InputConfig};
use crate::preprocessing::PreprocessingConfig;
use serde::{Deserialize, Serialize};

/// Valid log levels
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure for Inkguard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InkguardConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Input validation settings
    #[serde(default)]
    pub input: InputConfig,

    /// Image enhancement settings
    #[serde(default)]
    pub preprocessing: PreprocessingConfig,

    /// OCR engines and acceptance threshold
    #[serde(default)]
    pub ocr: OcrConfig,

    /// PII detection settings
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Result documents and redaction
    #[serde(default)]
    pub output: OutputConfig,

    /// Batch processing settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Audit trail settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl InkguardConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.input.validate().map_err(|e| e.to_string())?;
        self.preprocessing.validate().map_err(|e| e.to_string())?;
        self.ocr.validate().map_err(|e| e.to_string())?;
        self.detection.validate().map_err(|e| e.to_string())?;
        self.output.validate().map_err(|e| e.to_string())?;
        self.batch.validate().map_err(|e| e.to_string())?;
        self.audit_validate()?;
        self.logging.validate()?;
        Ok(())
    }

    fn audit_validate(&self) -> Result<(), String> {
        if self.audit.enabled && self.audit.log_path.as_os_str().is_empty() {
            return Err("audit.log_path is required when audit.enabled = true".to_string());
        }
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            ));
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path is required when local_enabled = true".to_string());
        }
        Ok(())
    }
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PiiType;
    use crate::ocr::BackendConfig;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: InkguardConfig = toml::from_str("").unwrap();
        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.input.accepted_formats, vec!["jpeg"]);
        assert_eq!(config.ocr.min_confidence, 0.3);
        assert!(!config.audit.enabled);
        assert!(!config.logging.local_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config_parses() {
        let toml_content = r#"
[application]
log_level = "debug"

[input]
accepted_formats = ["jpeg", "png"]
max_file_size_mb = 20

[preprocessing]
enabled = true
median_radius = 2

[ocr]
min_confidence = 0.4

[[ocr.backends]]
kind = "tesseract"
lang = "eng"
psm = 4

[[ocr.backends]]
kind = "command"
name = "easyocr"
program = "python3"
args = ["easyocr_sidecar.py", "{image}"]

[detection]
enabled_types = ["name", "ssn"]

[detection.min_confidence]
ssn = 0.8

[output]
directory = "results"
enable_redaction = true
redaction_method = "pixelate"

[batch]
parallelism = 3

[audit]
enabled = false

[logging]
local_rotation = "hourly"
"#;

        let config: InkguardConfig = toml::from_str(toml_content).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.ocr.backends.len(), 2);
        assert!(matches!(config.ocr.backends[1], BackendConfig::Command(_)));
        assert!(config.detection.is_enabled(PiiType::Ssn));
        assert!(!config.detection.is_enabled(PiiType::Phone));
        assert_eq!(config.detection.min_confidence.ssn, 0.8);
        assert_eq!(config.batch.parallelism, 3);
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = InkguardConfig::default();
        config.application.log_level = "verbose".to_string();
        assert!(config.validate().unwrap_err().contains("Invalid log_level"));
    }

    #[test]
    fn test_invalid_rotation() {
        let mut config = InkguardConfig::default();
        config.logging.local_rotation = "weekly".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_section_errors_surface() {
        let mut config = InkguardConfig::default();
        config.ocr.min_confidence = 2.0;
        assert!(config.validate().unwrap_err().contains("ocr.min_confidence"));
    }
}
