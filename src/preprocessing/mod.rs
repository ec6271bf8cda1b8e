//! Image enhancement ahead of OCR
//!
//! Enhancement is best-effort: the pipeline falls back to the original image
//! when an [`ImageEnhancer`] fails.

pub mod enhancer;

pub use enhancer::DocumentEnhancer;

use crate::domain::PreprocessingError;
use anyhow::Result;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Enhanced image plus the operations that produced it
#[derive(Debug, Clone)]
pub struct Enhancement {
    pub image: DynamicImage,
    pub operations: Vec<String>,
}

/// Improves a scanned page for OCR
pub trait ImageEnhancer: Send + Sync {
    fn improve(&self, image: &DynamicImage) -> Result<Enhancement, PreprocessingError>;
}

/// Preprocessing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Disable to hand the decoded image to OCR untouched
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Global histogram equalization
    #[serde(default = "default_true")]
    pub equalize_contrast: bool,

    /// Median filter to remove speckle noise
    #[serde(default = "default_true")]
    pub denoise: bool,

    #[serde(default = "default_median_radius")]
    pub median_radius: u32,

    /// Straighten pages scanned at an angle
    #[serde(default = "default_true")]
    pub deskew: bool,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            equalize_contrast: true,
            denoise: true,
            median_radius: default_median_radius(),
            deskew: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_median_radius() -> u32 {
    1
}

impl PreprocessingConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.median_radius > 5 {
            anyhow::bail!(
                "preprocessing.median_radius must be 5 or less, got {}",
                self.median_radius
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PreprocessingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.median_radius, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_large_radius_rejected() {
        let config = PreprocessingConfig {
            median_radius: 9,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
