//! Input, batch and per-call pipeline settings

use crate::output::{OutputConfig, RedactionMethod};
use anyhow::Result;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Input validation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Image formats accepted after content sniffing, by extension name
    #[serde(default = "default_accepted_formats")]
    pub accepted_formats: Vec<String>,

    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            accepted_formats: default_accepted_formats(),
            max_file_size_mb: default_max_file_size_mb(),
        }
    }
}

fn default_accepted_formats() -> Vec<String> {
    vec!["jpeg".to_string()]
}

fn default_max_file_size_mb() -> u64 {
    50
}

impl InputConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.accepted_formats.is_empty() {
            anyhow::bail!("input.accepted_formats cannot be empty");
        }
        for name in &self.accepted_formats {
            if ImageFormat::from_extension(name).is_none() {
                anyhow::bail!("input.accepted_formats: unknown image format '{name}'");
            }
        }
        if self.max_file_size_mb == 0 {
            anyhow::bail!("input.max_file_size_mb must be greater than 0");
        }
        Ok(())
    }

    /// Resolved formats; unknown names are skipped
    pub fn formats(&self) -> Vec<ImageFormat> {
        self.accepted_formats
            .iter()
            .filter_map(|name| ImageFormat::from_extension(name))
            .collect()
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

/// Batch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Images processed concurrently
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
        }
    }
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8))
        .unwrap_or(4)
}

impl BatchConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.parallelism == 0 || self.parallelism > 64 {
            anyhow::bail!(
                "batch.parallelism must be between 1 and 64, got {}",
                self.parallelism
            );
        }
        Ok(())
    }
}

/// Per-call options for `process_image`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessOptions {
    pub enable_redaction: bool,
    pub redaction_method: RedactionMethod,
    /// Where the redacted image goes; the configured output directory when unset
    pub output_dir: Option<PathBuf>,
}

impl ProcessOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options matching the `[output]` configuration section
    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            enable_redaction: config.enable_redaction,
            redaction_method: config.redaction_method,
            output_dir: Some(config.directory.clone()),
        }
    }

    /// Request a redacted image
    pub fn with_redaction(mut self, method: RedactionMethod) -> Self {
        self.enable_redaction = true;
        self.redaction_method = method;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_defaults() {
        let config = InputConfig::default();
        assert_eq!(config.formats(), vec![ImageFormat::Jpeg]);
        assert_eq!(config.max_file_size_bytes(), 50 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_format_rejected() {
        let config = InputConfig {
            accepted_formats: vec!["jpeg".to_string(), "docx".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_batch_parallelism_bounds() {
        assert!(BatchConfig { parallelism: 0 }.validate().is_err());
        assert!(BatchConfig { parallelism: 4 }.validate().is_ok());
        assert!(BatchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_process_options_builders() {
        let options = ProcessOptions::new()
            .with_redaction(RedactionMethod::Blur)
            .with_output_dir("/tmp/out");
        assert!(options.enable_redaction);
        assert_eq!(options.redaction_method, RedactionMethod::Blur);
        assert_eq!(options.output_dir, Some(PathBuf::from("/tmp/out")));

        let from_config = ProcessOptions::from_config(&OutputConfig::default());
        assert!(!from_config.enable_redaction);
        assert_eq!(from_config.output_dir, Some(PathBuf::from("output")));
    }
}
