//! Batch command implementation
//!
//! Processes many images concurrently and prints per-image results followed
//! by a summary.

use super::process::{build_options, print_outcome, results_dir};
use crate::config::load_config_or_default;
use crate::output::{save_results, RedactionMethod};
use crate::pipeline::{BatchProcessor, PipelineOrchestrator};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the batch command
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Scanned images to process
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Images processed concurrently (overrides batch.parallelism)
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Write a redacted copy of each image
    #[arg(long)]
    pub redact: bool,

    /// Redaction method (defaults to the configured one)
    #[arg(long, value_enum)]
    pub redaction_method: Option<RedactionMethod>,

    /// Directory for redacted images and saved results
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Save a result document per image
    #[arg(long)]
    pub save: bool,
}

impl BatchArgs {
    /// Execute the batch command
    ///
    /// Exit codes: 0 when every image produced a result, 1 when any image
    /// produced an error result, 2 on configuration errors.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config_or_default(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        let orchestrator = match PipelineOrchestrator::new(&config) {
            Ok(o) => Arc::new(o),
            Err(e) => {
                eprintln!("❌ Failed to initialize pipeline: {e:#}");
                return Ok(2);
            }
        };

        let parallelism = self.parallel.unwrap_or(config.batch.parallelism);
        let options = build_options(
            &config,
            self.redact,
            self.redaction_method,
            self.output_dir.as_deref(),
        );

        println!(
            "📄 Processing {} images ({} at a time)",
            self.images.len(),
            parallelism.max(1)
        );
        println!();

        let processor = BatchProcessor::new(orchestrator, parallelism);
        let report = processor.process_all(self.images.clone(), &options).await;

        let dir = results_dir(&options, &config);
        for (path, outcome) in &report.outcomes {
            print_outcome(path, outcome);
            if self.save {
                match save_results(outcome, &dir, config.output.pretty_json) {
                    Ok(saved) => println!("   💾 {}", saved.display()),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to save results");
                        println!("   ⚠️  Could not save results: {e}");
                    }
                }
            }
        }

        let summary = &report.summary;
        println!();
        println!("📊 Batch Summary");
        println!("   Images: {}", summary.total_images);
        println!("   Succeeded: {}", summary.succeeded);
        println!("   Failed: {}", summary.failed);
        if summary.degraded > 0 {
            println!("   Degraded: {}", summary.degraded);
        }
        println!("   PII found: {}", summary.pii_found);
        for (pii_type, count) in &summary.pii_by_type {
            println!("     {pii_type}: {count}");
        }
        if summary.redacted_images > 0 {
            println!("   Redacted images: {}", summary.redacted_images);
        }
        for (error_type, count) in &summary.failures_by_type {
            println!("   {error_type}: {count}");
        }
        println!("   Success rate: {:.1}%", summary.success_rate());
        println!("   Duration: {:.2}s", summary.duration.as_secs_f64());

        Ok(if summary.is_successful() { 0 } else { 1 })
    }
}
