//! JSON result documents
//!
//! A document is the serialized [`ProcessOutcome`] plus `success`,
//! `generated_at` and, for successful runs, a `pii_summary`. Summaries carry
//! counts and confidences only, never matched text.

use crate::domain::{InkguardError, PiiMatch, ProcessOutcome, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Confidence statistics over a set of matches
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

/// Per-type counts and confidence statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PiiSummary {
    pub total_matches: usize,
    pub by_type: BTreeMap<String, usize>,
    pub confidence_stats: ConfidenceStats,
}

impl PiiSummary {
    pub fn from_matches(matches: &[PiiMatch]) -> Self {
        if matches.is_empty() {
            return Self::default();
        }

        let mut by_type = BTreeMap::new();
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for m in matches {
            *by_type.entry(m.pii_type().as_str().to_string()).or_insert(0) += 1;
            sum += m.confidence();
            min = min.min(m.confidence());
            max = max.max(m.confidence());
        }

        Self {
            total_matches: matches.len(),
            by_type,
            confidence_stats: ConfidenceStats {
                average: sum / matches.len() as f64,
                min,
                max,
            },
        }
    }
}

/// Serialized form of one pipeline run
#[derive(Debug, Serialize)]
pub struct ResultDocument<'a> {
    pub success: bool,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pii_summary: Option<PiiSummary>,
    #[serde(flatten)]
    pub outcome: &'a ProcessOutcome,
}

impl<'a> ResultDocument<'a> {
    pub fn new(outcome: &'a ProcessOutcome) -> Self {
        Self {
            success: outcome.is_success(),
            generated_at: Utc::now(),
            pii_summary: outcome
                .as_success()
                .map(|result| PiiSummary::from_matches(&result.pii_matches)),
            outcome,
        }
    }
}

/// Render an outcome as a JSON document
pub fn render_json(outcome: &ProcessOutcome, pretty: bool) -> Result<String> {
    let document = ResultDocument::new(outcome);
    let rendered = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    Ok(rendered)
}

/// Write `<output_dir>/<input stem>_results.json` and return its path.
///
/// Any failure is reported as [`InkguardError::Serialization`].
pub fn save_results(outcome: &ProcessOutcome, output_dir: &Path, pretty: bool) -> Result<PathBuf> {
    let stem = Path::new(&outcome.metadata().input_file)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    let path = output_dir.join(format!("{stem}_results.json"));

    let json = render_json(outcome, pretty)?;

    fs::create_dir_all(output_dir).map_err(|e| {
        InkguardError::Serialization(format!(
            "Cannot create output directory {}: {e}",
            output_dir.display()
        ))
    })?;
    fs::write(&path, json).map_err(|e| {
        InkguardError::Serialization(format!("Cannot write {}: {e}", path.display()))
    })?;

    tracing::info!(path = %path.display(), "Saved result document");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorResult, ErrorType, PiiResult, PiiType, ProcessingMetadata, Stage};
    use tempfile::TempDir;

    fn success() -> ProcessOutcome {
        PiiResult {
            original_text: "Call (555) 123-4567 or 555-987-6543, SSN 123-45-6789".to_string(),
            pii_matches: vec![
                PiiMatch::new("(555) 123-4567", PiiType::Phone, 0.9, 5, 19),
                PiiMatch::new("555-987-6543", PiiType::Phone, 0.7, 23, 35),
                PiiMatch::new("123-45-6789", PiiType::Ssn, 0.95, 41, 52),
            ],
            processing_metadata: ProcessingMetadata::new("scans/intake form.jpg"),
            redacted_image_path: None,
        }
        .into()
    }

    #[test]
    fn test_summary_counts_and_stats() {
        let outcome = success();
        let summary = PiiSummary::from_matches(&outcome.as_success().unwrap().pii_matches);

        assert_eq!(summary.total_matches, 3);
        assert_eq!(summary.by_type["phone"], 2);
        assert_eq!(summary.by_type["ssn"], 1);
        assert!((summary.confidence_stats.average - 0.85).abs() < 1e-9);
        assert_eq!(summary.confidence_stats.min, 0.7);
        assert_eq!(summary.confidence_stats.max, 0.95);
    }

    #[test]
    fn test_empty_summary() {
        let summary = PiiSummary::from_matches(&[]);
        assert_eq!(summary.total_matches, 0);
        assert!(summary.by_type.is_empty());
        assert_eq!(summary.confidence_stats, ConfidenceStats::default());
    }

    #[test]
    fn test_success_document_shape() {
        let json = render_json(&success(), false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["success"], true);
        assert!(value["generated_at"].is_string());
        assert_eq!(value["pii_summary"]["total_matches"], 3);
        assert_eq!(value["pii_matches"][0]["pii_type"], "phone");
        assert!(value["original_text"].is_string());
    }

    #[test]
    fn test_error_document_shape() {
        let outcome: ProcessOutcome = ErrorResult::new(
            ErrorType::OcrFailure,
            "All 2 OCR backends failed",
            Stage::Ocr,
            ProcessingMetadata::new("a.jpg"),
        )
        .into();

        let json = render_json(&outcome, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["success"], false);
        assert_eq!(value["error_type"], "OCRFailure");
        assert_eq!(value["stage"], "ocr");
        assert!(value.get("pii_summary").is_none());
    }

    #[test]
    fn test_save_results_names_file_after_input() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested");

        let path = save_results(&success(), &out, true).unwrap();
        assert_eq!(path, out.join("intake form_results.json"));

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["pii_matches"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_save_results_unwritable_location() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let err = save_results(&success(), &blocker, true).unwrap_err();
        assert!(matches!(err, InkguardError::Serialization(_)));
    }
}
