//! OCR engines and the multi-engine fallback adapter
//!
//! Engines implement [`OcrBackend`]. The [`OcrEngineAdapter`] tries them in
//! configured order and returns the first acceptable reading.

pub mod adapter;
pub mod command;
pub mod config;
pub mod tesseract;

pub use adapter::{EngineAttempt, OcrEngineAdapter, OcrExtraction};
pub use command::CommandBackend;
pub use config::{BackendConfig, CommandSettings, OcrConfig, TesseractSettings};
pub use tesseract::TesseractBackend;

use crate::domain::BackendError;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Text and overall confidence produced by one engine
#[derive(Debug, Clone, PartialEq)]
pub struct OcrReading {
    pub text: String,
    /// Expected in `[0, 1]`; the adapter rejects anything else
    pub confidence: f64,
}

impl OcrReading {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// An OCR engine
pub trait OcrBackend: Send + Sync {
    /// Engine name reported as `engine_used`
    fn name(&self) -> &str;

    /// Recognize the text in `image`
    fn extract(&self, image: &DynamicImage) -> Result<OcrReading, BackendError>;
}

/// Build the configured engines in fallback order
pub fn build_backends(config: &OcrConfig) -> Vec<Arc<dyn OcrBackend>> {
    config
        .backends
        .iter()
        .map(|backend| -> Arc<dyn OcrBackend> {
            match backend {
                BackendConfig::Tesseract(settings) => {
                    Arc::new(TesseractBackend::new(settings.clone()))
                }
                BackendConfig::Command(settings) => Arc::new(CommandBackend::new(settings.clone())),
            }
        })
        .collect()
}

/// Image written to the temp directory for an external engine, removed on drop
pub(crate) struct TempImage {
    path: PathBuf,
}

impl TempImage {
    pub(crate) fn write(image: &DynamicImage, engine: &str) -> Result<Self, BackendError> {
        let path = std::env::temp_dir().join(format!(
            "inkguard_{engine}_{}.png",
            uuid::Uuid::new_v4().simple()
        ));
        image
            .save(&path)
            .map_err(|e| BackendError::Io(format!("Failed to write temporary image: {e}")))?;
        Ok(Self { path })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempImage {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::debug!(path = %self.path.display(), error = %e, "Failed to remove temporary image");
        }
    }
}

/// Map a spawn failure onto the backend error taxonomy
pub(crate) fn spawn_error(program: &str, err: std::io::Error) -> BackendError {
    if err.kind() == std::io::ErrorKind::NotFound {
        BackendError::Unavailable(format!("{program} not found"))
    } else {
        BackendError::Execution(format!("Failed to run {program}: {err}"))
    }
}
