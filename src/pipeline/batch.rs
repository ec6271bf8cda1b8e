//! Concurrent processing of many images
//!
//! Each image runs on tokio's blocking pool; at most `parallelism` run at
//! once and the report keeps input order. One image failing, or its worker
//! dying, never affects the others.

use super::config::ProcessOptions;
use super::orchestrator::PipelineOrchestrator;
use super::summary::BatchReport;
use crate::domain::{ErrorResult, ErrorType, ProcessOutcome, ProcessingMetadata, Stage};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Runs a shared orchestrator over a list of images
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    orchestrator: Arc<PipelineOrchestrator>,
    parallelism: usize,
}

impl BatchProcessor {
    pub fn new(orchestrator: Arc<PipelineOrchestrator>, parallelism: usize) -> Self {
        Self {
            orchestrator,
            parallelism: parallelism.max(1),
        }
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Process every image and report outcomes in input order
    pub async fn process_all(&self, paths: Vec<PathBuf>, options: &ProcessOptions) -> BatchReport {
        let started = Instant::now();
        let total = paths.len();

        tracing::info!(
            images = total,
            parallelism = self.parallelism,
            "Starting batch"
        );

        let outcomes: Vec<(PathBuf, ProcessOutcome)> = stream::iter(paths.into_iter().enumerate())
            .map(|(index, path)| {
                let orchestrator = Arc::clone(&self.orchestrator);
                let options = options.clone();
                async move {
                    let worker_path = path.clone();
                    let joined = tokio::task::spawn_blocking(move || {
                        orchestrator.process_image(&worker_path, &options)
                    })
                    .await;

                    crate::log_batch_processing!(index + 1, total);

                    let outcome = joined.unwrap_or_else(|e| worker_failure(&path, &e));
                    (path, outcome)
                }
            })
            .buffered(self.parallelism)
            .collect()
            .await;

        let report = BatchReport::new(outcomes, started.elapsed());
        report.summary.log_summary();
        report
    }
}

/// Outcome for an image whose worker ended without producing one. Nothing
/// is known about how far it got, so it is reported against the first stage.
fn worker_failure(path: &std::path::Path, error: &tokio::task::JoinError) -> ProcessOutcome {
    let mut metadata = ProcessingMetadata::new(path.display().to_string());
    metadata.fill_not_attempted(&Stage::CORE);

    tracing::error!(path = %path.display(), error = %error, "Batch worker failed");

    ErrorResult::new(
        ErrorType::WorkerFailure,
        format!("Worker stopped before producing a result: {error}"),
        Stage::InputValidation,
        metadata,
    )
    .with_diagnostic("cancelled", error.is_cancelled())
    .into()
}
