//! OCR configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Placeholder replaced by the temporary image path in command arguments
pub const IMAGE_PLACEHOLDER: &str = "{image}";

/// OCR engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Readings below this confidence count as failed attempts
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Engines in fallback order
    #[serde(default = "default_backends")]
    pub backends: Vec<BackendConfig>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            backends: default_backends(),
        }
    }
}

fn default_min_confidence() -> f64 {
    0.3
}

fn default_backends() -> Vec<BackendConfig> {
    vec![BackendConfig::Tesseract(TesseractSettings::default())]
}

/// One entry of `[[ocr.backends]]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Tesseract command-line engine
    Tesseract(TesseractSettings),
    /// Any program that prints `{"text": ..., "confidence": ...}` JSON
    Command(CommandSettings),
}

impl BackendConfig {
    /// Engine name reported in metadata
    pub fn name(&self) -> &str {
        match self {
            Self::Tesseract(settings) => settings.name.as_deref().unwrap_or("tesseract"),
            Self::Command(settings) => &settings.name,
        }
    }
}

/// Tesseract CLI settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TesseractSettings {
    /// Engine name override
    #[serde(default)]
    pub name: Option<String>,

    /// Path to the binary; `tesseract` on PATH when unset
    #[serde(default)]
    pub binary_path: Option<String>,

    #[serde(default = "default_lang")]
    pub lang: String,

    /// Page segmentation mode
    #[serde(default = "default_psm")]
    pub psm: u8,

    /// OCR engine mode
    #[serde(default = "default_oem")]
    pub oem: u8,

    /// Exported as TESSDATA_PREFIX when set
    #[serde(default)]
    pub tessdata_path: Option<String>,

    /// Words at or below this confidence (0-100) are dropped
    #[serde(default = "default_min_word_confidence")]
    pub min_word_confidence: f64,
}

impl Default for TesseractSettings {
    fn default() -> Self {
        Self {
            name: None,
            binary_path: None,
            lang: default_lang(),
            psm: default_psm(),
            oem: default_oem(),
            tessdata_path: None,
            min_word_confidence: default_min_word_confidence(),
        }
    }
}

fn default_lang() -> String {
    "eng".to_string()
}

fn default_psm() -> u8 {
    6
}

fn default_oem() -> u8 {
    3
}

fn default_min_word_confidence() -> f64 {
    30.0
}

/// External command engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSettings {
    /// Engine name reported in metadata
    pub name: String,

    /// Program to run
    pub program: String,

    /// Arguments; `{image}` is replaced by the image path, which is appended
    /// when no argument contains the placeholder
    #[serde(default)]
    pub args: Vec<String>,
}

impl OcrConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            anyhow::bail!(
                "ocr.min_confidence must be between 0.0 and 1.0, got {}",
                self.min_confidence
            );
        }

        if self.backends.is_empty() {
            anyhow::bail!("At least one OCR backend must be configured");
        }

        let mut names = HashSet::new();
        for backend in &self.backends {
            if !names.insert(backend.name()) {
                anyhow::bail!("Duplicate OCR backend name: {}", backend.name());
            }
            match backend {
                BackendConfig::Tesseract(settings) => {
                    if settings.lang.trim().is_empty() {
                        anyhow::bail!("Tesseract lang cannot be empty");
                    }
                    if settings.psm > 13 {
                        anyhow::bail!("Tesseract psm must be 0-13, got {}", settings.psm);
                    }
                    if settings.oem > 3 {
                        anyhow::bail!("Tesseract oem must be 0-3, got {}", settings.oem);
                    }
                }
                BackendConfig::Command(settings) => {
                    if settings.program.trim().is_empty() {
                        anyhow::bail!("OCR command backend '{}' has no program", settings.name);
                    }
                    if settings.name.trim().is_empty() {
                        anyhow::bail!("OCR command backend name cannot be empty");
                    }
                }
            }
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("INKGUARD_OCR_MIN_CONFIDENCE") {
            self.min_confidence = val
                .parse()
                .context("Invalid INKGUARD_OCR_MIN_CONFIDENCE value")?;
        }

        if let Ok(val) = std::env::var("INKGUARD_OCR_TESSERACT_PATH") {
            for backend in &mut self.backends {
                if let BackendConfig::Tesseract(settings) = backend {
                    settings.binary_path = Some(val.clone());
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OcrConfig::default();
        assert_eq!(config.min_confidence, 0.3);
        assert_eq!(config.backends.len(), 1);
        assert_eq!(config.backends[0].name(), "tesseract");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_tagged_backends() {
        let config: OcrConfig = toml::from_str(
            r#"
            min_confidence = 0.4

            [[backends]]
            kind = "tesseract"
            psm = 4

            [[backends]]
            kind = "command"
            name = "easyocr"
            program = "python3"
            args = ["easyocr_sidecar.py", "{image}"]
            "#,
        )
        .unwrap();

        assert_eq!(config.backends.len(), 2);
        assert!(matches!(
            &config.backends[0],
            BackendConfig::Tesseract(s) if s.psm == 4 && s.lang == "eng"
        ));
        assert_eq!(config.backends[1].name(), "easyocr");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let config = OcrConfig {
            min_confidence: 0.3,
            backends: vec![
                BackendConfig::Tesseract(TesseractSettings::default()),
                BackendConfig::Tesseract(TesseractSettings::default()),
            ],
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_min_confidence_rejected() {
        let config = OcrConfig {
            min_confidence: 1.2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_backends_rejected() {
        let config = OcrConfig {
            min_confidence: 0.3,
            backends: Vec::new(),
        };
        assert!(config.validate().is_err());
    }
}
