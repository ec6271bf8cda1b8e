//! Batch summary and reporting

use crate::domain::ProcessOutcome;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Summary of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Number of images submitted
    pub total_images: usize,

    /// Images that produced a `PiiResult`
    pub succeeded: usize,

    /// Images that produced an `ErrorResult`
    pub failed: usize,

    /// Failure counts keyed by error type
    pub failures_by_type: BTreeMap<String, usize>,

    /// PII matches across all successful images
    pub pii_found: usize,

    /// Match counts keyed by PII type
    pub pii_by_type: BTreeMap<String, usize>,

    /// Successful images with at least one recoverable stage failure
    pub degraded: usize,

    pub redacted_images: usize,

    /// Wall-clock duration of the batch
    pub duration: Duration,
}

impl BatchSummary {
    /// Tally the outcomes of a finished batch
    pub fn from_outcomes<'a>(
        outcomes: impl IntoIterator<Item = &'a ProcessOutcome>,
        duration: Duration,
    ) -> Self {
        let mut summary = Self {
            duration,
            ..Default::default()
        };

        for outcome in outcomes {
            summary.total_images += 1;
            match outcome {
                ProcessOutcome::Success(result) => {
                    summary.succeeded += 1;
                    summary.pii_found += result.pii_matches.len();
                    for (pii_type, count) in result.counts_by_type() {
                        *summary
                            .pii_by_type
                            .entry(pii_type.as_str().to_string())
                            .or_insert(0) += count;
                    }
                    if result.redacted_image_path.is_some() {
                        summary.redacted_images += 1;
                    }
                    if result
                        .processing_metadata
                        .stages
                        .values()
                        .any(|record| record.error.is_some())
                    {
                        summary.degraded += 1;
                    }
                }
                ProcessOutcome::Failure(failure) => {
                    summary.failed += 1;
                    *summary
                        .failures_by_type
                        .entry(failure.error_type.to_string())
                        .or_insert(0) += 1;
                }
            }
        }

        summary
    }

    /// Check if every image succeeded
    pub fn is_successful(&self) -> bool {
        self.failed == 0
    }

    /// Get success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_images == 0 {
            return 100.0;
        }
        (self.succeeded as f64 / self.total_images as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            total_images = self.total_images,
            succeeded = self.succeeded,
            failed = self.failed,
            degraded = self.degraded,
            pii_found = self.pii_found,
            redacted_images = self.redacted_images,
            duration_secs = self.duration.as_secs_f64(),
            success_rate = format!("{:.2}%", self.success_rate()),
            "Batch completed"
        );

        if !self.failures_by_type.is_empty() {
            for (error_type, count) in &self.failures_by_type {
                tracing::warn!(error_type = %error_type, count, "Batch failures");
            }
        }
    }
}

/// Outcomes of a batch in input order, plus the summary
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub outcomes: Vec<(PathBuf, ProcessOutcome)>,
    pub summary: BatchSummary,
}

impl BatchReport {
    pub fn new(outcomes: Vec<(PathBuf, ProcessOutcome)>, duration: Duration) -> Self {
        let summary = BatchSummary::from_outcomes(outcomes.iter().map(|(_, o)| o), duration);
        Self { outcomes, summary }
    }
}
