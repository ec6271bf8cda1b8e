//! Multi-engine OCR adapter with ordered fallback

use super::{build_backends, OcrBackend, OcrConfig, OcrReading};
use crate::domain::{catch_fault, OcrError};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Record of one engine attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineAttempt {
    pub engine: String,
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub duration_seconds: f64,
}

impl EngineAttempt {
    pub fn accepted(engine: impl Into<String>, confidence: f64, duration_seconds: f64) -> Self {
        Self {
            engine: engine.into(),
            accepted: true,
            confidence: Some(confidence),
            reason: None,
            duration_seconds,
        }
    }

    pub fn failed(
        engine: impl Into<String>,
        reason: impl Into<String>,
        duration_seconds: f64,
    ) -> Self {
        Self {
            engine: engine.into(),
            accepted: false,
            confidence: None,
            reason: Some(reason.into()),
            duration_seconds,
        }
    }
}

/// Accepted reading plus how it was obtained
#[derive(Debug, Clone, PartialEq)]
pub struct OcrExtraction {
    pub text: String,
    /// Exactly what the accepting engine reported
    pub confidence: f64,
    pub engine_used: String,
    /// True when an engine other than the first produced the reading
    pub fallback_used: bool,
    /// Every attempt in order, the accepted one last
    pub attempts: Vec<EngineAttempt>,
}

impl OcrExtraction {
    /// Names of the engines tried, in order
    pub fn engines_tried(&self) -> Vec<String> {
        self.attempts.iter().map(|a| a.engine.clone()).collect()
    }
}

/// Tries OCR engines in order until one produces an acceptable reading.
///
/// An attempt fails when the engine returns an error or panics, returns
/// blank text, or reports a confidence outside `[0, 1]` or below
/// `min_confidence`. Each engine is tried at most once per call.
pub struct OcrEngineAdapter {
    backends: Vec<Arc<dyn OcrBackend>>,
    min_confidence: f64,
}

impl OcrEngineAdapter {
    /// Create an adapter over engines in fallback order
    pub fn new(backends: Vec<Arc<dyn OcrBackend>>, min_confidence: f64) -> Self {
        Self {
            backends,
            min_confidence,
        }
    }

    /// Create an adapter from the `[ocr]` configuration section
    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(build_backends(config), config.min_confidence)
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    pub fn engine_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Extract text from `image`, falling back through the engines in order
    pub fn extract_with_confidence(&self, image: &DynamicImage) -> Result<OcrExtraction, OcrError> {
        if self.backends.is_empty() {
            return Err(OcrError::NoBackends);
        }

        let mut attempts = Vec::with_capacity(self.backends.len());

        for (position, backend) in self.backends.iter().enumerate() {
            let engine = backend.name().to_string();
            let started = Instant::now();
            let outcome = self.attempt(backend.as_ref(), image);
            let elapsed = started.elapsed().as_secs_f64();

            match outcome {
                Ok(reading) => {
                    tracing::info!(
                        engine = %engine,
                        confidence = reading.confidence,
                        text_length = reading.text.chars().count(),
                        fallback_used = position > 0,
                        "OCR reading accepted"
                    );
                    attempts.push(EngineAttempt::accepted(&engine, reading.confidence, elapsed));
                    return Ok(OcrExtraction {
                        text: reading.text,
                        confidence: reading.confidence,
                        engine_used: engine,
                        fallback_used: position > 0,
                        attempts,
                    });
                }
                Err(reason) => {
                    tracing::warn!(engine = %engine, reason = %reason, "OCR attempt failed");
                    attempts.push(EngineAttempt::failed(&engine, reason, elapsed));
                }
            }
        }

        Err(OcrError::AllBackendsFailed { attempts })
    }

    fn attempt(&self, backend: &dyn OcrBackend, image: &DynamicImage) -> Result<OcrReading, String> {
        let reading = catch_fault(|| backend.extract(image))?.map_err(|e| e.to_string())?;

        if reading.text.trim().is_empty() {
            return Err("empty text".to_string());
        }
        if !(0.0..=1.0).contains(&reading.confidence) {
            return Err(format!("confidence {} outside [0, 1]", reading.confidence));
        }
        if reading.confidence < self.min_confidence {
            return Err(format!(
                "confidence {:.2} below minimum {:.2}",
                reading.confidence, self.min_confidence
            ));
        }

        Ok(reading)
    }
}

impl std::fmt::Debug for OcrEngineAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrEngineAdapter")
            .field("backends", &self.engine_names())
            .field("min_confidence", &self.min_confidence)
            .finish()
    }
}
