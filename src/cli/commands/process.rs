//! Process command implementation
//!
//! Runs a single image through the pipeline and reports the outcome.

use crate::config::{load_config_or_default, InkguardConfig};
use crate::domain::ProcessOutcome;
use crate::output::{render_json, save_results, RedactionMethod};
use crate::pipeline::{PipelineOrchestrator, ProcessOptions};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Arguments for the process command
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Scanned image to process
    pub image: PathBuf,

    /// Write a redacted copy of the image
    #[arg(long)]
    pub redact: bool,

    /// Redaction method (defaults to the configured one)
    #[arg(long, value_enum)]
    pub redaction_method: Option<RedactionMethod>,

    /// Directory for redacted images and saved results
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Print the result document as JSON instead of a summary
    #[arg(long)]
    pub json: bool,

    /// Save the result document to the output directory
    #[arg(long)]
    pub save: bool,
}

impl ProcessArgs {
    /// Execute the process command
    ///
    /// Exit codes: 0 when the image produced a result, 1 when it produced an
    /// error result, 2 on configuration errors.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(image = %self.image.display(), "Processing image");

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

        let options = self.options(&config);
        let image = self.image.clone();
        let worker_options = options.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            orchestrator.process_image(&image, &worker_options)
        })
        .await?;

        if self.json {
            println!("{}", render_json(&outcome, config.output.pretty_json)?);
        } else {
            print_outcome(&self.image, &outcome);
        }

        if self.save {
            let dir = results_dir(&options, &config);
            let path = save_results(&outcome, &dir, config.output.pretty_json)?;
            if !self.json {
                println!("💾 Results saved: {}", path.display());
            }
        }

        Ok(if outcome.is_success() { 0 } else { 1 })
    }

    /// Per-call options: the `[output]` section, overridden by flags
    pub fn options(&self, config: &InkguardConfig) -> ProcessOptions {
        build_options(
            config,
            self.redact,
            self.redaction_method,
            self.output_dir.as_deref(),
        )
    }
}

pub(crate) fn build_options(
    config: &InkguardConfig,
    redact: bool,
    method: Option<RedactionMethod>,
    output_dir: Option<&Path>,
) -> ProcessOptions {
    let mut options = ProcessOptions::from_config(&config.output);
    if redact {
        options.enable_redaction = true;
    }
    if let Some(method) = method {
        options.redaction_method = method;
    }
    if let Some(dir) = output_dir {
        options.output_dir = Some(dir.to_path_buf());
    }
    options
}

pub(crate) fn results_dir(options: &ProcessOptions, config: &InkguardConfig) -> PathBuf {
    options
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output.directory.clone())
}

/// Human-readable report of one outcome
pub(crate) fn print_outcome(image: &Path, outcome: &ProcessOutcome) {
    match outcome {
        ProcessOutcome::Success(result) => {
            println!("✅ {}", image.display());
            println!(
                "   Duration: {:.2}s",
                result.processing_metadata.total_duration_seconds
            );

            if result.pii_matches.is_empty() {
                println!("   No PII detected");
            } else {
                println!("   PII found: {}", result.pii_matches.len());
                for m in &result.pii_matches {
                    println!(
                        "   - [{}] {:?} (confidence {:.2}, chars {}..{})",
                        m.pii_type(),
                        m.text(),
                        m.confidence(),
                        m.start_pos(),
                        m.end_pos()
                    );
                }
            }

            for (stage, record) in &result.processing_metadata.stages {
                if let Some(error) = &record.error {
                    println!("   ⚠️  {stage} degraded: {}", error.message);
                }
            }

            if let Some(path) = &result.redacted_image_path {
                println!("   🖍  Redacted image: {}", path.display());
            }
        }
        ProcessOutcome::Failure(failure) => {
            println!("❌ {}", image.display());
            println!(
                "   {} at stage {}: {}",
                failure.error_type, failure.stage, failure.error_message
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(redact: bool, method: Option<RedactionMethod>, dir: Option<&str>) -> ProcessArgs {
        ProcessArgs {
            image: PathBuf::from("scan.jpg"),
            redact,
            redaction_method: method,
            output_dir: dir.map(PathBuf::from),
            json: false,
            save: false,
        }
    }

    #[test]
    fn test_options_follow_config_by_default() {
        let mut config = InkguardConfig::default();
        config.output.enable_redaction = true;
        config.output.redaction_method = RedactionMethod::Pixelate;

        let options = args(false, None, None).options(&config);
        assert!(options.enable_redaction);
        assert_eq!(options.redaction_method, RedactionMethod::Pixelate);
        assert_eq!(results_dir(&options, &config), PathBuf::from("output"));
    }

    #[test]
    fn test_flags_override_config() {
        let config = InkguardConfig::default();
        let options = args(true, Some(RedactionMethod::Blur), Some("/tmp/x")).options(&config);
        assert!(options.enable_redaction);
        assert_eq!(options.redaction_method, RedactionMethod::Blur);
        assert_eq!(results_dir(&options, &config), PathBuf::from("/tmp/x"));
    }
}
