//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Inkguard configuration file and the pattern library it points at.

use crate::config::load_config;
use crate::detection::PiiDetector;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading also validates
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let detector = match PiiDetector::new(config.detection.clone()) {
            Ok(d) => {
                println!("✅ Pattern library compiled");
                d
            }
            Err(e) => {
                println!("❌ Pattern library failed to compile");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let engines: Vec<&str> = config.ocr.backends.iter().map(|b| b.name()).collect();
        let enabled: Vec<&str> = config
            .detection
            .enabled_types
            .iter()
            .map(|t| t.as_str())
            .collect();

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Accepted Formats: {:?}", config.input.accepted_formats);
        println!("  Max File Size: {} MB", config.input.max_file_size_mb);
        println!("  Preprocessing: {}", config.preprocessing.enabled);
        println!("  OCR Engines: {}", engines.join(" -> "));
        println!("  OCR Min Confidence: {}", config.ocr.min_confidence);
        match &config.detection.pattern_library {
            Some(path) => println!("  Pattern Library: {}", path.display()),
            None => println!("  Pattern Library: built-in"),
        }
        println!("  Patterns: {}", detector.library().all_patterns().len());
        println!("  PII Types: {}", enabled.join(", "));
        println!("  Output Directory: {}", config.output.directory.display());
        println!(
            "  Redaction: {} ({})",
            config.output.enable_redaction, config.output.redaction_method
        );
        println!("  Batch Parallelism: {}", config.batch.parallelism);
        if config.audit.enabled {
            println!("  Audit Log: {}", config.audit.log_path.display());
        } else {
            println!("  Audit Log: disabled");
        }
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_valid_file_exits_zero() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[ocr]\nmin_confidence = 0.4").unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_missing_file_exits_two() {
        let code = ValidateArgs {}
            .execute("does-not-exist-inkguard.toml")
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
