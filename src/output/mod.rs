//! Result documents and redacted images

pub mod json;
pub mod redaction;

pub use json::{render_json, save_results, ConfidenceStats, PiiSummary, ResultDocument};
pub use redaction::{redacted_file_name, GridRedactor, ImageRedactor};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// How detected PII is obscured in the redacted image
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum RedactionMethod {
    /// Solid black rectangle
    #[default]
    BlackBox,
    /// Gaussian blur of the region
    Blur,
    /// Coarse pixel blocks
    Pixelate,
}

impl RedactionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BlackBox => "black_box",
            Self::Blur => "blur",
            Self::Pixelate => "pixelate",
        }
    }
}

impl fmt::Display for RedactionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where result documents and redacted images are written
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    #[serde(default)]
    pub enable_redaction: bool,

    #[serde(default)]
    pub redaction_method: RedactionMethod,

    #[serde(default = "default_pretty_json")]
    pub pretty_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            enable_redaction: false,
            redaction_method: RedactionMethod::default(),
            pretty_json: default_pretty_json(),
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("output")
}

fn default_pretty_json() -> bool {
    true
}

impl OutputConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.directory.as_os_str().is_empty() {
            anyhow::bail!("output.directory cannot be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction_method_wire_names() {
        assert_eq!(
            serde_json::to_string(&RedactionMethod::BlackBox).unwrap(),
            "\"black_box\""
        );
        let parsed: RedactionMethod = serde_json::from_str("\"pixelate\"").unwrap();
        assert_eq!(parsed, RedactionMethod::Pixelate);
        assert_eq!(RedactionMethod::Blur.to_string(), "blur");
    }

    #[test]
    fn test_output_config_defaults() {
        let config: OutputConfig = toml::from_str("").unwrap();
        assert_eq!(config.directory, PathBuf::from("output"));
        assert!(!config.enable_redaction);
        assert_eq!(config.redaction_method, RedactionMethod::BlackBox);
        assert!(config.pretty_json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_directory_rejected() {
        let config = OutputConfig {
            directory: PathBuf::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
