//! Domain error types
//!
//! This module defines the error hierarchy for Inkguard. Library errors are
//! domain-specific and don't expose third-party types; collaborator failures
//! are mapped onto the pipeline's [`ErrorType`](crate::domain::ErrorType)
//! taxonomy by the orchestrator.

use crate::ocr::EngineAttempt;
use thiserror::Error;

/// Main Inkguard error type
#[derive(Debug, Error)]
pub enum InkguardError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// OCR errors
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Image enhancement errors
    #[error("Preprocessing error: {0}")]
    Preprocessing(#[from] PreprocessingError),

    /// Redaction rendering errors
    #[error("Redaction error: {0}")]
    Redaction(#[from] RedactionError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

/// Failure of the OCR engine adapter as a whole
#[derive(Debug, Error)]
pub enum OcrError {
    /// The adapter was built without any backend
    #[error("No OCR backends configured")]
    NoBackends,

    /// Every backend was tried once and none produced an acceptable reading
    #[error("All {} OCR backends failed: {}", .attempts.len(), summarize_attempts(.attempts))]
    AllBackendsFailed { attempts: Vec<EngineAttempt> },
}

impl OcrError {
    /// Attempts made before giving up (empty for `NoBackends`)
    pub fn attempts(&self) -> &[EngineAttempt] {
        match self {
            Self::NoBackends => &[],
            Self::AllBackendsFailed { attempts } => attempts,
        }
    }
}

fn summarize_attempts(attempts: &[EngineAttempt]) -> String {
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.engine, a.reason.as_deref().unwrap_or("accepted")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure of a single OCR backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// The engine binary or service is not available
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    /// The engine ran but exited unsuccessfully
    #[error("Engine execution failed: {0}")]
    Execution(String),

    /// The engine output could not be interpreted
    #[error("Invalid engine output: {0}")]
    InvalidOutput(String),

    /// Temporary file handling failed
    #[error("I/O error: {0}")]
    Io(String),
}

/// Failure of an image enhancer
#[derive(Debug, Error)]
pub enum PreprocessingError {
    /// Image dimensions are unusable for enhancement
    #[error("Unsupported image dimensions: {width}x{height}")]
    UnsupportedDimensions { width: u32, height: u32 },

    /// Enhancement step failed
    #[error("Enhancement failed: {0}")]
    Failed(String),
}

/// Failure of a redaction renderer
#[derive(Debug, Error)]
pub enum RedactionError {
    /// The output location could not be prepared
    #[error("Cannot prepare output location {path}: {message}")]
    OutputLocation { path: String, message: String },

    /// Encoding or writing the image failed
    #[error("Failed to write redacted image: {0}")]
    Write(String),

    /// Rendering failed
    #[error("Rendering failed: {0}")]
    Render(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for InkguardError {
    fn from(err: std::io::Error) -> Self {
        InkguardError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for InkguardError {
    fn from(err: serde_json::Error) -> Self {
        InkguardError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for InkguardError {
    fn from(err: toml::de::Error) -> Self {
        InkguardError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Io(err.to_string())
    }
}

impl From<image::ImageError> for RedactionError {
    fn from(err: image::ImageError) -> Self {
        RedactionError::Write(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inkguard_error_display() {
        let err = InkguardError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_variant_messages() {
        let cases = [
            InkguardError::Configuration("a".to_string()),
            InkguardError::Ocr(OcrError::NoBackends),
            InkguardError::Preprocessing(PreprocessingError::Failed("b".to_string())),
            InkguardError::Redaction(RedactionError::Write("c".to_string())),
            InkguardError::Validation("d".to_string()),
            InkguardError::Serialization("e".to_string()),
            InkguardError::Io("f".to_string()),
        ];
        for err in cases {
            let prefix = match &err {
                InkguardError::Configuration(_) => "Configuration error",
                InkguardError::Ocr(_) => "OCR error",
                InkguardError::Preprocessing(_) => "Preprocessing error",
                InkguardError::Redaction(_) => "Redaction error",
                InkguardError::Validation(_) => "Validation error",
                InkguardError::Serialization(_) => "Serialization error",
                InkguardError::Io(_) => "I/O error",
            };
            assert!(err.to_string().starts_with(prefix), "{err}");
        }
    }

    #[test]
    fn test_ocr_error_conversion() {
        let err: InkguardError = OcrError::NoBackends.into();
        assert!(matches!(err, InkguardError::Ocr(_)));
        assert_eq!(err.to_string(), "OCR error: No OCR backends configured");
    }

    #[test]
    fn test_all_backends_failed_lists_engines() {
        let err = OcrError::AllBackendsFailed {
            attempts: vec![
                EngineAttempt::failed("tesseract", "binary not found", 0.0),
                EngineAttempt::failed("easyocr", "confidence 0.12 below minimum 0.30", 0.4),
            ],
        };
        let message = err.to_string();
        assert!(message.starts_with("All 2 OCR backends failed"));
        assert!(message.contains("tesseract: binary not found"));
        assert!(message.contains("easyocr: confidence 0.12"));
        assert_eq!(err.attempts().len(), 2);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: InkguardError = io_err.into();
        assert!(matches!(err, InkguardError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: InkguardError = json_err.into();
        assert!(matches!(err, InkguardError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: InkguardError = toml_err.into();
        assert!(matches!(err, InkguardError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_preprocessing_error_display() {
        let err = PreprocessingError::UnsupportedDimensions {
            width: 0,
            height: 10,
        };
        assert_eq!(err.to_string(), "Unsupported image dimensions: 0x10");
    }

    #[test]
    fn test_errors_implement_std_error() {
        let _: &dyn std::error::Error = &InkguardError::Validation("x".to_string());
        let _: &dyn std::error::Error = &BackendError::Execution("x".to_string());
        let _: &dyn std::error::Error = &RedactionError::Render("x".to_string());
    }
}
