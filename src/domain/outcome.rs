//! Pipeline outcome types
//!
//! `process_image` returns exactly one [`ProcessOutcome`]: either a
//! [`PiiResult`] (the run completed, possibly with recoverable stage failures)
//! or an [`ErrorResult`] (a fatal stage failed). Both serialize to the JSON
//! documents consumed by downstream tooling.

use crate::domain::metadata::{ProcessingMetadata, Stage};
use crate::domain::pii::{PiiMatch, PiiType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Closed taxonomy of pipeline failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    /// Input is not in an accepted image format
    InvalidInputFormat,
    /// Input is missing, unreadable, oversized or cannot be decoded
    UnreadableFile,
    /// Every OCR backend failed or produced an unacceptable reading
    #[serde(rename = "OCRFailure")]
    OcrFailure,
    /// Image enhancement failed; the original image was used instead
    PreprocessingFailure,
    /// The redacted image could not be rendered or written
    RedactionFailure,
    /// A result document could not be serialized or written
    SerializationFailure,
    /// A stage with no fallback crashed, or a batch worker stopped before
    /// producing an outcome
    WorkerFailure,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInputFormat => "InvalidInputFormat",
            Self::UnreadableFile => "UnreadableFile",
            Self::OcrFailure => "OCRFailure",
            Self::PreprocessingFailure => "PreprocessingFailure",
            Self::RedactionFailure => "RedactionFailure",
            Self::SerializationFailure => "SerializationFailure",
            Self::WorkerFailure => "WorkerFailure",
        }
    }

    /// Whether the pipeline keeps going after this failure
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PreprocessingFailure | Self::RedactionFailure)
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful run: cleaned text, the PII found in it, and stage metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiiResult {
    /// Cleaned OCR text that match positions refer to
    pub original_text: String,

    /// Non-overlapping matches sorted by `start_pos`
    pub pii_matches: Vec<PiiMatch>,

    pub processing_metadata: ProcessingMetadata,

    /// Present only when redaction was requested and succeeded
    #[serde(default)]
    pub redacted_image_path: Option<PathBuf>,
}

impl PiiResult {
    pub fn has_pii(&self) -> bool {
        !self.pii_matches.is_empty()
    }

    /// Matches of one category, in position order
    pub fn matches_of(&self, pii_type: PiiType) -> impl Iterator<Item = &PiiMatch> {
        self.pii_matches
            .iter()
            .filter(move |m| m.pii_type() == pii_type)
    }

    /// Match count per category
    pub fn counts_by_type(&self) -> BTreeMap<PiiType, usize> {
        let mut counts = BTreeMap::new();
        for m in &self.pii_matches {
            *counts.entry(m.pii_type()).or_insert(0) += 1;
        }
        counts
    }
}

/// Fatal run: what failed, where, and the metadata gathered up to that point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResult {
    pub error_type: ErrorType,
    pub error_message: String,
    pub stage: Stage,

    /// Context such as file size, detected format or per-engine errors
    #[serde(default)]
    pub diagnostic_info: BTreeMap<String, Value>,

    pub processing_metadata: ProcessingMetadata,
}

impl ErrorResult {
    pub fn new(
        error_type: ErrorType,
        error_message: impl Into<String>,
        stage: Stage,
        processing_metadata: ProcessingMetadata,
    ) -> Self {
        Self {
            error_type,
            error_message: error_message.into(),
            stage,
            diagnostic_info: BTreeMap::new(),
            processing_metadata,
        }
    }

    /// Replace the diagnostic map
    pub fn with_diagnostics(mut self, diagnostic_info: BTreeMap<String, Value>) -> Self {
        self.diagnostic_info = diagnostic_info;
        self
    }

    /// Add a single diagnostic entry
    pub fn with_diagnostic(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.diagnostic_info.insert(key.into(), value.into());
        self
    }
}

/// Result of processing one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProcessOutcome {
    Success(PiiResult),
    Failure(ErrorResult),
}

impl ProcessOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn as_success(&self) -> Option<&PiiResult> {
        match self {
            Self::Success(result) => Some(result),
            Self::Failure(_) => None,
        }
    }

    pub fn as_failure(&self) -> Option<&ErrorResult> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error),
        }
    }

    pub fn metadata(&self) -> &ProcessingMetadata {
        match self {
            Self::Success(result) => &result.processing_metadata,
            Self::Failure(error) => &error.processing_metadata,
        }
    }
}

impl From<PiiResult> for ProcessOutcome {
    fn from(result: PiiResult) -> Self {
        Self::Success(result)
    }
}

impl From<ErrorResult> for ProcessOutcome {
    fn from(error: ErrorResult) -> Self {
        Self::Failure(error)
    }
}
