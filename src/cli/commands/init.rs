//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "inkguard.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Inkguard configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, Self::sample_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Install tesseract or configure another OCR backend");
                println!("  3. Validate configuration: inkguard validate-config");
                println!("  4. Process a scan: inkguard process scan.jpg --redact");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5)
            }
        }
    }

    /// Commented sample configuration with every default spelled out
    pub fn sample_config() -> &'static str {
        r#"# Inkguard Configuration File
# OCR for scanned handwritten documents with PII detection

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Input Validation
# ============================================================================
[input]
# Formats accepted after content sniffing
accepted_formats = ["jpeg"]

# Largest accepted file
max_file_size_mb = 50

# ============================================================================
# Image Preprocessing
# ============================================================================
[preprocessing]
# A failed enhancement falls back to the original image
enabled = true
equalize_contrast = true
denoise = true
median_radius = 1
deskew = true

# ============================================================================
# OCR
# ============================================================================
[ocr]
# Readings below this confidence count as failed attempts
min_confidence = 0.3

# Engines are tried in order until one is accepted
[[ocr.backends]]
kind = "tesseract"
lang = "eng"
psm = 6
oem = 3
# binary_path = "/usr/local/bin/tesseract"

# Any program printing {"text": "...", "confidence": 0.0-1.0} on stdout
# [[ocr.backends]]
# kind = "command"
# name = "easyocr"
# program = "python3"
# args = ["easyocr_sidecar.py", "{image}"]

# ============================================================================
# PII Detection
# ============================================================================
[detection]
# Custom pattern library (built-in patterns when unset)
# pattern_library = "patterns/pii_patterns.toml"

enabled_types = ["name", "address", "phone", "medical_id", "ssn"]

# Characters searched on each side of a match for context keywords
context_window_chars = 50

# Tokens before a name that may hold a label such as "Patient:"
label_window_tokens = 3

[detection.min_confidence]
name = 0.7
address = 0.6
phone = 0.6
medical_id = 0.5
ssn = 0.6

# ============================================================================
# Output
# ============================================================================
[output]
directory = "output"
pretty_json = true

# Write redacted_<name>.jpg next to the results
enable_redaction = false

# black_box | blur | pixelate
redaction_method = "black_box"

# ============================================================================
# Batch Processing
# ============================================================================
[batch]
parallelism = 4

# ============================================================================
# Audit Trail
# ============================================================================
[audit]
# One line per image; matched values are stored as SHA-256 hashes
enabled = false
log_path = "logs/audit.jsonl"
json_format = true

# ============================================================================
# Logging
# ============================================================================
[logging]
local_enabled = false
local_path = "logs"

# daily | hourly | never
local_rotation = "daily"
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InkguardConfig;
    use tempfile::TempDir;

    #[test]
    fn test_sample_config_parses_and_validates() {
        let config: InkguardConfig = toml::from_str(InitArgs::sample_config()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.ocr.backends.len(), 1);
        assert_eq!(config.detection.enabled_types.len(), 5);
    }

    #[tokio::test]
    async fn test_refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("inkguard.toml");
        fs::write(&path, "# existing").unwrap();

        let args = InitArgs {
            output: path.to_string_lossy().to_string(),
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "# existing");

        let args = InitArgs { force: true, ..args };
        assert_eq!(args.execute().await.unwrap(), 0);
        assert!(fs::read_to_string(&path).unwrap().contains("[ocr]"));
    }
}
