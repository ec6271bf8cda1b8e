//! Per-stage processing metadata
//!
//! Every planned pipeline stage gets exactly one [`StageRecord`] keyed by its
//! wire name. Records carry a status, a duration, free-form stage fields and,
//! for failed stages, the error that was contained.

use crate::domain::outcome::ErrorType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    InputValidation,
    Preprocessing,
    Ocr,
    Cleaning,
    PiiDetection,
    Output,
    Redaction,
}

impl Stage {
    /// Stages that always run, in order. Redaction is appended on request.
    pub const CORE: [Stage; 6] = [
        Stage::InputValidation,
        Stage::Preprocessing,
        Stage::Ocr,
        Stage::Cleaning,
        Stage::PiiDetection,
        Stage::Output,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputValidation => "input_validation",
            Self::Preprocessing => "preprocessing",
            Self::Ocr => "ocr",
            Self::Cleaning => "cleaning",
            Self::PiiDetection => "pii_detection",
            Self::Output => "output",
            Self::Redaction => "redaction",
        }
    }

    /// Planned stages for a run
    pub fn plan(enable_redaction: bool) -> Vec<Stage> {
        let mut stages = Self::CORE.to_vec();
        if enable_redaction {
            stages.push(Stage::Redaction);
        }
        stages
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Succeeded,
    Failed,
    NotAttempted,
}

/// Error descriptor embedded in a failed stage record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageError {
    pub error_type: ErrorType,
    pub message: String,
}

/// Timing, status and stage-specific fields for one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub status: StageStatus,
    pub success: bool,
    pub duration_seconds: f64,

    /// Stage-specific values such as `engine_used` or `matches_found`
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StageError>,
}

impl StageRecord {
    /// Record for a stage that completed
    pub fn succeeded(duration: Duration) -> Self {
        Self {
            status: StageStatus::Succeeded,
            success: true,
            duration_seconds: duration.as_secs_f64(),
            fields: BTreeMap::new(),
            error: None,
        }
    }

    /// Record for a stage whose failure was contained
    pub fn failed(duration: Duration, error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Failed,
            success: false,
            duration_seconds: duration.as_secs_f64(),
            fields: BTreeMap::new(),
            error: Some(StageError {
                error_type,
                message: message.into(),
            }),
        }
    }

    /// Record for a stage skipped after a fatal failure
    pub fn not_attempted() -> Self {
        Self {
            status: StageStatus::NotAttempted,
            success: false,
            duration_seconds: 0.0,
            fields: BTreeMap::new(),
            error: None,
        }
    }

    /// Attach a stage-specific field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Look up a stage-specific field
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Run-level metadata plus one record per planned stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    pub input_file: String,
    pub pipeline_version: String,
    pub run_id: Uuid,
    pub total_duration_seconds: f64,

    #[serde(flatten)]
    pub stages: BTreeMap<String, StageRecord>,
}

impl ProcessingMetadata {
    /// Create metadata for a new run
    pub fn new(input_file: impl Into<String>) -> Self {
        Self {
            input_file: input_file.into(),
            pipeline_version: env!("CARGO_PKG_VERSION").to_string(),
            run_id: Uuid::new_v4(),
            total_duration_seconds: 0.0,
            stages: BTreeMap::new(),
        }
    }

    /// Store the record for a stage, replacing any previous one
    pub fn record(&mut self, stage: Stage, record: StageRecord) {
        self.stages.insert(stage.as_str().to_string(), record);
    }

    /// Record for a stage, if one was stored
    pub fn stage(&self, stage: Stage) -> Option<&StageRecord> {
        self.stages.get(stage.as_str())
    }

    /// Mark every planned stage without a record as not attempted
    pub fn fill_not_attempted(&mut self, planned: &[Stage]) {
        for stage in planned {
            self.stages
                .entry(stage.as_str().to_string())
                .or_insert_with(StageRecord::not_attempted);
        }
    }

    pub fn set_total_duration(&mut self, duration: Duration) {
        self.total_duration_seconds = duration.as_secs_f64();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_plan() {
        assert_eq!(Stage::plan(false).len(), 6);
        let with_redaction = Stage::plan(true);
        assert_eq!(with_redaction.len(), 7);
        assert_eq!(with_redaction.last(), Some(&Stage::Redaction));
    }

    #[test]
    fn test_fill_not_attempted_keeps_existing() {
        let mut metadata = ProcessingMetadata::new("scan.jpg");
        metadata.record(
            Stage::InputValidation,
            StageRecord::succeeded(Duration::from_millis(5)),
        );
        metadata.fill_not_attempted(&Stage::plan(false));

        assert_eq!(metadata.stages.len(), 6);
        assert_eq!(
            metadata.stage(Stage::InputValidation).unwrap().status,
            StageStatus::Succeeded
        );
        assert_eq!(
            metadata.stage(Stage::Output).unwrap().status,
            StageStatus::NotAttempted
        );
    }

    #[test]
    fn test_metadata_json_is_keyed_by_stage_name() {
        let mut metadata = ProcessingMetadata::new("scan.jpg");
        metadata.record(
            Stage::Ocr,
            StageRecord::succeeded(Duration::from_millis(250))
                .with_field("engine_used", "tesseract")
                .with_field("confidence_score", 0.87),
        );

        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value["ocr"]["status"], "succeeded");
        assert_eq!(value["ocr"]["success"], true);
        assert_eq!(value["ocr"]["engine_used"], "tesseract");
        assert!(value["ocr"].get("error").is_none());
        assert_eq!(value["input_file"], "scan.jpg");
    }

    #[test]
    fn test_failed_record_carries_error() {
        let record = StageRecord::failed(
            Duration::from_millis(1),
            ErrorType::PreprocessingFailure,
            "enhancer crashed",
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["error"]["error_type"], "PreprocessingFailure");
        assert_eq!(value["error"]["message"], "enhancer crashed");
    }
}
