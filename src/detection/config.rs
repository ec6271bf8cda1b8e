//! PII detection configuration

use crate::domain::PiiType;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Minimum confidence a candidate needs to be reported, per category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceFloors {
    #[serde(default = "default_name_floor")]
    pub name: f64,
    #[serde(default = "default_address_floor")]
    pub address: f64,
    #[serde(default = "default_phone_floor")]
    pub phone: f64,
    #[serde(default = "default_medical_id_floor")]
    pub medical_id: f64,
    #[serde(default = "default_ssn_floor")]
    pub ssn: f64,
}

impl ConfidenceFloors {
    pub fn for_type(&self, pii_type: PiiType) -> f64 {
        match pii_type {
            PiiType::Name => self.name,
            PiiType::Address => self.address,
            PiiType::Phone => self.phone,
            PiiType::MedicalId => self.medical_id,
            PiiType::Ssn => self.ssn,
        }
    }

    pub fn set(&mut self, pii_type: PiiType, value: f64) {
        match pii_type {
            PiiType::Name => self.name = value,
            PiiType::Address => self.address = value,
            PiiType::Phone => self.phone = value,
            PiiType::MedicalId => self.medical_id = value,
            PiiType::Ssn => self.ssn = value,
        }
    }
}

impl Default for ConfidenceFloors {
    fn default() -> Self {
        Self {
            name: default_name_floor(),
            address: default_address_floor(),
            phone: default_phone_floor(),
            medical_id: default_medical_id_floor(),
            ssn: default_ssn_floor(),
        }
    }
}

fn default_name_floor() -> f64 {
    0.7
}

fn default_address_floor() -> f64 {
    0.6
}

fn default_phone_floor() -> f64 {
    0.6
}

fn default_medical_id_floor() -> f64 {
    0.5
}

fn default_ssn_floor() -> f64 {
    0.6
}

/// PII detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Custom pattern library TOML file; the embedded library is used when unset
    #[serde(default)]
    pub pattern_library: Option<PathBuf>,

    /// Characters inspected on each side of a candidate for context cues
    #[serde(default = "default_context_window_chars")]
    pub context_window_chars: usize,

    /// Tokens before a bare identifier searched for a medical-record label
    #[serde(default = "default_label_window_tokens")]
    pub label_window_tokens: usize,

    /// Categories to detect
    #[serde(default = "default_enabled_types")]
    pub enabled_types: Vec<PiiType>,

    /// Per-category acceptance floors
    #[serde(default)]
    pub min_confidence: ConfidenceFloors,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            pattern_library: None,
            context_window_chars: default_context_window_chars(),
            label_window_tokens: default_label_window_tokens(),
            enabled_types: default_enabled_types(),
            min_confidence: ConfidenceFloors::default(),
        }
    }
}

fn default_context_window_chars() -> usize {
    50
}

fn default_label_window_tokens() -> usize {
    3
}

fn default_enabled_types() -> Vec<PiiType> {
    PiiType::ALL.to_vec()
}

impl DetectionConfig {
    /// Whether a category is enabled
    pub fn is_enabled(&self, pii_type: PiiType) -> bool {
        self.enabled_types.contains(&pii_type)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(ref path) = self.pattern_library {
            if !path.exists() {
                anyhow::bail!("Pattern library file not found: {}", path.display());
            }
            if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                anyhow::bail!("Pattern library must be a TOML file: {}", path.display());
            }
        }

        for pii_type in PiiType::ALL {
            let floor = self.min_confidence.for_type(pii_type);
            if !(0.0..=1.0).contains(&floor) {
                anyhow::bail!(
                    "min_confidence.{} must be between 0.0 and 1.0, got {}",
                    pii_type,
                    floor
                );
            }
        }

        if self.enabled_types.is_empty() {
            anyhow::bail!("enabled_types must list at least one PII type");
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("INKGUARD_DETECTION_PATTERN_LIBRARY") {
            self.pattern_library = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("INKGUARD_DETECTION_CONTEXT_WINDOW_CHARS") {
            self.context_window_chars = val
                .parse()
                .context("Invalid INKGUARD_DETECTION_CONTEXT_WINDOW_CHARS value")?;
        }

        if let Ok(val) = std::env::var("INKGUARD_DETECTION_ENABLED_TYPES") {
            self.enabled_types = val
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.parse::<PiiType>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("Invalid INKGUARD_DETECTION_ENABLED_TYPES value")?;
        }

        for pii_type in PiiType::ALL {
            let var = format!(
                "INKGUARD_DETECTION_MIN_CONFIDENCE_{}",
                pii_type.as_str().to_uppercase()
            );
            if let Ok(val) = std::env::var(&var) {
                let floor: f64 = val.parse().with_context(|| format!("Invalid {var} value"))?;
                self.min_confidence.set(pii_type, floor);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_floors() {
        let floors = ConfidenceFloors::default();
        assert_eq!(floors.for_type(PiiType::Name), 0.7);
        assert_eq!(floors.for_type(PiiType::Address), 0.6);
        assert_eq!(floors.for_type(PiiType::Phone), 0.6);
        assert_eq!(floors.for_type(PiiType::MedicalId), 0.5);
        assert_eq!(floors.for_type(PiiType::Ssn), 0.6);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = DetectionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.enabled_types.len(), 5);
        assert_eq!(config.context_window_chars, 50);
        assert_eq!(config.label_window_tokens, 3);
    }

    #[test]
    fn test_invalid_floor_rejected() {
        let mut config = DetectionConfig::default();
        config.min_confidence.set(PiiType::Phone, 1.5);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_confidence.phone"));
    }

    #[test]
    fn test_missing_pattern_library_rejected() {
        let config = DetectionConfig {
            pattern_library: Some(PathBuf::from("/nonexistent/patterns.toml")),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: DetectionConfig = toml::from_str(
            r#"
            enabled_types = ["ssn", "medical_id"]

            [min_confidence]
            ssn = 0.9
            "#,
        )
        .unwrap();

        assert!(config.is_enabled(PiiType::Ssn));
        assert!(!config.is_enabled(PiiType::Name));
        assert_eq!(config.min_confidence.ssn, 0.9);
        assert_eq!(config.min_confidence.name, 0.7);
    }
}
