//! Single-image pipeline
//!
//! `input_validation -> preprocessing -> ocr -> cleaning -> pii_detection ->
//! output [-> redaction]`, each stage attempted at most once. Input
//! validation, OCR and detection failures end the run with an
//! [`ErrorResult`]; every other failure is recorded in the stage's metadata
//! and the run continues.

use super::config::{InputConfig, ProcessOptions};
use crate::audit::AuditLogger;
use crate::cleaning::{OcrTextCleaner, TextCleaner};
use crate::config::InkguardConfig;
use crate::detection::PiiDetector;
use crate::domain::{
    catch_fault, ErrorResult, ErrorType, OcrError, PiiMatch, PiiResult, ProcessOutcome,
    ProcessingMetadata, Stage, StageRecord,
};
use crate::ocr::{OcrEngineAdapter, OcrExtraction};
use crate::output::{redacted_file_name, GridRedactor, ImageRedactor, OutputConfig, PiiSummary};
use crate::preprocessing::{DocumentEnhancer, ImageEnhancer};
use anyhow::Context;
use image::{DynamicImage, ImageReader};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Failure that ends the run
#[derive(Debug)]
struct Fatal {
    stage: Stage,
    error_type: ErrorType,
    message: String,
    diagnostics: BTreeMap<String, Value>,
}

impl Fatal {
    fn new(stage: Stage, error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            stage,
            error_type,
            message: message.into(),
            diagnostics: BTreeMap::new(),
        }
    }

    fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.diagnostics.insert(key.to_string(), value.into());
        self
    }
}

/// What a completed run hands to result assembly
struct Completed {
    text: String,
    matches: Vec<PiiMatch>,
    redacted_image_path: Option<PathBuf>,
}

/// Decoded input plus what was learned validating it
struct ValidatedInput {
    image: DynamicImage,
    size_bytes: u64,
    format: String,
}

/// Runs one image through every stage and reports a [`ProcessOutcome`].
///
/// Holds only immutable settings and shared collaborators, so a single
/// orchestrator can serve concurrent calls.
pub struct PipelineOrchestrator {
    input: InputConfig,
    output: OutputConfig,
    enhancer: Arc<dyn ImageEnhancer>,
    ocr: Arc<OcrEngineAdapter>,
    cleaner: Arc<dyn TextCleaner>,
    detector: Arc<PiiDetector>,
    redactor: Arc<dyn ImageRedactor>,
    audit: Option<Arc<AuditLogger>>,
}

/// Builder for [`PipelineOrchestrator`] with default collaborators
pub struct PipelineBuilder {
    input: InputConfig,
    output: OutputConfig,
    enhancer: Arc<dyn ImageEnhancer>,
    ocr: OcrEngineAdapter,
    cleaner: Arc<dyn TextCleaner>,
    detector: PiiDetector,
    redactor: Arc<dyn ImageRedactor>,
    audit: Option<Arc<AuditLogger>>,
}

impl PipelineBuilder {
    pub fn input_config(mut self, input: InputConfig) -> Self {
        self.input = input;
        self
    }

    pub fn output_config(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    pub fn enhancer(mut self, enhancer: Arc<dyn ImageEnhancer>) -> Self {
        self.enhancer = enhancer;
        self
    }

    pub fn cleaner(mut self, cleaner: Arc<dyn TextCleaner>) -> Self {
        self.cleaner = cleaner;
        self
    }

    pub fn redactor(mut self, redactor: Arc<dyn ImageRedactor>) -> Self {
        self.redactor = redactor;
        self
    }

    pub fn audit_logger(mut self, audit: Arc<AuditLogger>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn build(self) -> PipelineOrchestrator {
        PipelineOrchestrator {
            input: self.input,
            output: self.output,
            enhancer: self.enhancer,
            ocr: Arc::new(self.ocr),
            cleaner: self.cleaner,
            detector: Arc::new(self.detector),
            redactor: self.redactor,
            audit: self.audit,
        }
    }
}

impl PipelineOrchestrator {
    /// Start from an OCR adapter and detector; everything else has defaults
    pub fn builder(ocr: OcrEngineAdapter, detector: PiiDetector) -> PipelineBuilder {
        PipelineBuilder {
            input: InputConfig::default(),
            output: OutputConfig::default(),
            enhancer: Arc::new(DocumentEnhancer::default()),
            ocr,
            cleaner: Arc::new(OcrTextCleaner::new()),
            detector,
            redactor: Arc::new(GridRedactor::new()),
            audit: None,
        }
    }

    /// Build the full pipeline from configuration
    pub fn new(config: &InkguardConfig) -> anyhow::Result<Self> {
        let detector =
            PiiDetector::new(config.detection.clone()).context("Failed to load PII detector")?;
        let ocr = OcrEngineAdapter::from_config(&config.ocr);

        let mut builder = Self::builder(ocr, detector)
            .input_config(config.input.clone())
            .output_config(config.output.clone())
            .enhancer(Arc::new(DocumentEnhancer::new(config.preprocessing.clone())));

        if config.audit.enabled {
            let audit = AuditLogger::from_config(&config.audit)
                .context("Failed to initialize audit logger")?;
            builder = builder.audit_logger(Arc::new(audit));
        }

        let orchestrator = builder.build();
        tracing::info!(
            engines = ?orchestrator.ocr.engine_names(),
            patterns = orchestrator.detector.library().all_patterns().len(),
            audit = orchestrator.audit.is_some(),
            "Pipeline initialized"
        );
        Ok(orchestrator)
    }

    pub fn output_config(&self) -> &OutputConfig {
        &self.output
    }

    pub fn detector(&self) -> &PiiDetector {
        &self.detector
    }

    /// Process one image. Never panics and never returns early without an
    /// outcome: every exit is a [`PiiResult`] or an [`ErrorResult`].
    pub fn process_image(&self, path: &Path, options: &ProcessOptions) -> ProcessOutcome {
        let started = Instant::now();
        let planned = Stage::plan(options.enable_redaction);
        let mut metadata = ProcessingMetadata::new(path.display().to_string());

        tracing::info!(
            run_id = %metadata.run_id,
            input = %path.display(),
            redaction = options.enable_redaction,
            "Processing image"
        );

        let run = self.run_stages(path, options, &mut metadata);

        metadata.fill_not_attempted(&planned);
        metadata.set_total_duration(started.elapsed());

        let outcome: ProcessOutcome = match run {
            Ok(completed) => {
                tracing::info!(
                    run_id = %metadata.run_id,
                    matches = completed.matches.len(),
                    duration_secs = metadata.total_duration_seconds,
                    "Image processed"
                );
                PiiResult {
                    original_text: completed.text,
                    pii_matches: completed.matches,
                    processing_metadata: metadata,
                    redacted_image_path: completed.redacted_image_path,
                }
                .into()
            }
            Err(fatal) => {
                crate::log_error_with_context!(
                    &fatal.message,
                    format!("{} failed at stage {}", metadata.input_file, fatal.stage)
                );
                ErrorResult::new(fatal.error_type, fatal.message, fatal.stage, metadata)
                    .with_diagnostics(fatal.diagnostics)
                    .into()
            }
        };

        if let Some(audit) = &self.audit {
            if let Err(e) = audit.log_outcome(&outcome) {
                tracing::warn!(error = %e, "Failed to write audit entry");
            }
        }

        outcome
    }

    fn run_stages(
        &self,
        path: &Path,
        options: &ProcessOptions,
        metadata: &mut ProcessingMetadata,
    ) -> Result<Completed, Fatal> {
        let original = self.input_validation(path, metadata)?;
        let enhanced = self.preprocessing(&original, metadata);
        let extraction = self.ocr_stage(enhanced.as_ref().unwrap_or(&original), metadata)?;
        let text = self.cleaning(&extraction.text, metadata);
        let matches = self.pii_detection(&text, metadata)?;
        self.output_assembly(&matches, metadata);

        let redacted_image_path = if options.enable_redaction {
            self.redaction(path, &original, &matches, &text, options, metadata)
        } else {
            None
        };

        Ok(Completed {
            text,
            matches,
            redacted_image_path,
        })
    }

    fn input_validation(
        &self,
        path: &Path,
        metadata: &mut ProcessingMetadata,
    ) -> Result<DynamicImage, Fatal> {
        let stage = Stage::InputValidation;
        let started = Instant::now();
        let result = catch_fault(|| self.load_input(path))
            .unwrap_or_else(|panic| Err(Fatal::new(stage, ErrorType::UnreadableFile, panic)));
        let elapsed = started.elapsed();

        match result {
            Ok(input) => {
                metadata.record(
                    stage,
                    StageRecord::succeeded(elapsed)
                        .with_field("file_size_bytes", input.size_bytes)
                        .with_field("format", input.format)
                        .with_field("width", input.image.width())
                        .with_field("height", input.image.height()),
                );
                crate::log_stage_complete!(stage, elapsed);
                Ok(input.image)
            }
            Err(fatal) => {
                metadata.record(
                    stage,
                    StageRecord::failed(elapsed, fatal.error_type, &fatal.message),
                );
                crate::log_stage_failed!(stage, fatal.error_type, &fatal.message);
                Err(fatal)
            }
        }
    }

    fn load_input(&self, path: &Path) -> Result<ValidatedInput, Fatal> {
        let stage = Stage::InputValidation;
        let path_str = path.display().to_string();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let file_meta = fs::metadata(path).map_err(|e| {
            Fatal::new(stage, ErrorType::UnreadableFile, format!("Cannot read {path_str}: {e}"))
                .with("path", path_str.clone())
                .with("os_error", e.to_string())
        })?;

        if !file_meta.is_file() {
            return Err(Fatal::new(
                stage,
                ErrorType::UnreadableFile,
                format!("{path_str} is not a regular file"),
            )
            .with("path", path_str));
        }

        let size_bytes = file_meta.len();
        if size_bytes > self.input.max_file_size_bytes() {
            return Err(Fatal::new(
                stage,
                ErrorType::UnreadableFile,
                format!(
                    "{path_str} is {size_bytes} bytes, above the {} MB limit",
                    self.input.max_file_size_mb
                ),
            )
            .with("path", path_str)
            .with("file_size_bytes", size_bytes)
            .with("max_file_size_mb", self.input.max_file_size_mb));
        }

        let reader = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| {
                Fatal::new(stage, ErrorType::UnreadableFile, format!("Cannot open {path_str}: {e}"))
                    .with("path", path_str.clone())
                    .with("file_size_bytes", size_bytes)
                    .with("os_error", e.to_string())
            })?;

        let detected = reader.format();
        let format_name = detected
            .map(|f| format!("{f:?}").to_lowercase())
            .unwrap_or_else(|| "unknown".to_string());

        if !detected.is_some_and(|f| self.input.formats().contains(&f)) {
            return Err(Fatal::new(
                stage,
                ErrorType::InvalidInputFormat,
                format!(
                    "Unsupported image format '{format_name}', expected one of: {}",
                    self.input.accepted_formats.join(", ")
                ),
            )
            .with("path", path_str)
            .with("file_size_bytes", size_bytes)
            .with("detected_format", format_name)
            .with("extension", extension));
        }

        let image = reader.decode().map_err(|e| {
            Fatal::new(
                stage,
                ErrorType::UnreadableFile,
                format!("Cannot decode {path_str}: {e}"),
            )
            .with("path", path_str.clone())
            .with("file_size_bytes", size_bytes)
            .with("detected_format", format_name.clone())
        })?;

        Ok(ValidatedInput {
            image,
            size_bytes,
            format: format_name,
        })
    }

    /// Enhanced image, or `None` when the original should be used
    fn preprocessing(
        &self,
        image: &DynamicImage,
        metadata: &mut ProcessingMetadata,
    ) -> Option<DynamicImage> {
        let stage = Stage::Preprocessing;
        let started = Instant::now();
        let result = catch_fault(|| self.enhancer.improve(image))
            .and_then(|r| r.map_err(|e| e.to_string()));
        let elapsed = started.elapsed();

        match result {
            Ok(enhancement) => {
                metadata.record(
                    stage,
                    StageRecord::succeeded(elapsed).with_field("operations", enhancement.operations),
                );
                crate::log_stage_complete!(stage, elapsed);
                Some(enhancement.image)
            }
            Err(message) => {
                metadata.record(
                    stage,
                    StageRecord::failed(elapsed, ErrorType::PreprocessingFailure, &message)
                        .with_field("fallback", "original_image"),
                );
                crate::log_stage_failed!(stage, ErrorType::PreprocessingFailure, &message);
                None
            }
        }
    }

    fn ocr_stage(
        &self,
        image: &DynamicImage,
        metadata: &mut ProcessingMetadata,
    ) -> Result<OcrExtraction, Fatal> {
        let stage = Stage::Ocr;
        let started = Instant::now();
        let result = catch_fault(|| self.ocr.extract_with_confidence(image));
        let elapsed = started.elapsed();

        let error = match result {
            Ok(Ok(extraction)) => {
                metadata.record(
                    stage,
                    StageRecord::succeeded(elapsed)
                        .with_field("engine_used", extraction.engine_used.clone())
                        .with_field("engines_tried", extraction.engines_tried())
                        .with_field("fallback_used", extraction.fallback_used)
                        .with_field("confidence_score", extraction.confidence)
                        .with_field("text_length", extraction.text.chars().count())
                        .with_field("attempts", attempts_value(&extraction)),
                );
                crate::log_stage_complete!(stage, elapsed);
                return Ok(extraction);
            }
            Ok(Err(e)) => ocr_fatal(&e),
            Err(panic) => Fatal::new(stage, ErrorType::OcrFailure, panic),
        };

        let engines_tried = error
            .diagnostics
            .get("engines_tried")
            .cloned()
            .unwrap_or_else(|| json!([]));
        metadata.record(
            stage,
            StageRecord::failed(elapsed, error.error_type, &error.message)
                .with_field("engines_tried", engines_tried),
        );
        crate::log_stage_failed!(stage, error.error_type, &error.message);
        Err(error.with("min_confidence", self.ocr.min_confidence()))
    }

    /// Cleaned text; the raw OCR text if the cleaner crashes
    fn cleaning(&self, raw: &str, metadata: &mut ProcessingMetadata) -> String {
        let stage = Stage::Cleaning;
        let started = Instant::now();
        let result = catch_fault(|| self.cleaner.clean(raw));
        let elapsed = started.elapsed();

        match result {
            Ok(cleaned) => {
                metadata.record(
                    stage,
                    StageRecord::succeeded(elapsed)
                        .with_field("original_length", raw.chars().count())
                        .with_field("text_length", cleaned.text.chars().count())
                        .with_field("quality_score", cleaned.quality.quality_score)
                        .with_field("steps", cleaned.steps),
                );
                crate::log_stage_complete!(stage, elapsed);
                cleaned.text
            }
            Err(panic) => {
                metadata.record(
                    stage,
                    StageRecord::failed(elapsed, ErrorType::WorkerFailure, &panic)
                        .with_field("fallback", "raw_text"),
                );
                crate::log_stage_failed!(stage, ErrorType::WorkerFailure, &panic);
                raw.to_string()
            }
        }
    }

    fn pii_detection(
        &self,
        text: &str,
        metadata: &mut ProcessingMetadata,
    ) -> Result<Vec<PiiMatch>, Fatal> {
        let stage = Stage::PiiDetection;
        let started = Instant::now();
        let result = catch_fault(|| self.detector.detect_all_pii(text));
        let elapsed = started.elapsed();

        match result {
            Ok(matches) => {
                let mut types: Vec<&str> = matches.iter().map(|m| m.pii_type().as_str()).collect();
                types.sort_unstable();
                types.dedup();

                metadata.record(
                    stage,
                    StageRecord::succeeded(elapsed)
                        .with_field("matches_found", matches.len())
                        .with_field("types_detected", types),
                );
                crate::log_stage_complete!(stage, elapsed);
                Ok(matches)
            }
            Err(panic) => {
                // an empty list here would claim the page holds no PII
                metadata.record(
                    stage,
                    StageRecord::failed(elapsed, ErrorType::WorkerFailure, &panic),
                );
                crate::log_stage_failed!(stage, ErrorType::WorkerFailure, &panic);
                Err(Fatal::new(stage, ErrorType::WorkerFailure, panic)
                    .with("text_length", text.chars().count()))
            }
        }
    }

    fn output_assembly(&self, matches: &[PiiMatch], metadata: &mut ProcessingMetadata) {
        let stage = Stage::Output;
        let started = Instant::now();
        let result = catch_fault(|| PiiSummary::from_matches(matches));
        let elapsed = started.elapsed();

        match result {
            Ok(summary) => {
                metadata.record(
                    stage,
                    StageRecord::succeeded(elapsed)
                        .with_field("total_matches", summary.total_matches)
                        .with_field("by_type", json!(summary.by_type)),
                );
                crate::log_stage_complete!(stage, elapsed);
            }
            Err(panic) => {
                metadata.record(
                    stage,
                    StageRecord::failed(elapsed, ErrorType::WorkerFailure, &panic),
                );
                crate::log_stage_failed!(stage, ErrorType::WorkerFailure, &panic);
            }
        }
    }

    fn redaction(
        &self,
        path: &Path,
        original: &DynamicImage,
        matches: &[PiiMatch],
        text: &str,
        options: &ProcessOptions,
        metadata: &mut ProcessingMetadata,
    ) -> Option<PathBuf> {
        let stage = Stage::Redaction;
        let output_dir = options
            .output_dir
            .clone()
            .unwrap_or_else(|| self.output.directory.clone());
        let output_path = output_dir.join(redacted_file_name(path));
        let method = options.redaction_method;

        let started = Instant::now();
        let result = catch_fault(|| {
            self.redactor
                .render_redacted(original, matches, text, method, &output_path)
        })
        .and_then(|r| r.map_err(|e| e.to_string()));
        let elapsed = started.elapsed();

        match result {
            Ok(written) => {
                metadata.record(
                    stage,
                    StageRecord::succeeded(elapsed)
                        .with_field("method", method.as_str())
                        .with_field("output_path", written.display().to_string())
                        .with_field("pii_redacted", matches.len()),
                );
                crate::log_stage_complete!(stage, elapsed);
                Some(written)
            }
            Err(message) => {
                metadata.record(
                    stage,
                    StageRecord::failed(elapsed, ErrorType::RedactionFailure, &message)
                        .with_field("method", method.as_str())
                        .with_field("output_path", output_path.display().to_string()),
                );
                crate::log_stage_failed!(stage, ErrorType::RedactionFailure, &message);
                None
            }
        }
    }
}

impl std::fmt::Debug for PipelineOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("ocr", &self.ocr)
            .field("audit", &self.audit.is_some())
            .finish()
    }
}

fn attempts_value(extraction: &OcrExtraction) -> Value {
    serde_json::to_value(&extraction.attempts).unwrap_or(Value::Null)
}

fn ocr_fatal(error: &OcrError) -> Fatal {
    let attempts = error.attempts();
    let engines: Vec<&str> = attempts.iter().map(|a| a.engine.as_str()).collect();
    let backend_errors: BTreeMap<&str, &str> = attempts
        .iter()
        .map(|a| (a.engine.as_str(), a.reason.as_deref().unwrap_or("")))
        .collect();

    Fatal::new(Stage::Ocr, ErrorType::OcrFailure, error.to_string())
        .with("engines_tried", json!(engines))
        .with("backend_errors", json!(backend_errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BackendError, PiiType, PreprocessingError, StageStatus};
    use crate::ocr::{OcrBackend, OcrReading};
    use crate::preprocessing::Enhancement;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    struct ScriptedOcr {
        name: &'static str,
        reading: Option<(&'static str, f64)>,
    }

    impl OcrBackend for ScriptedOcr {
        fn name(&self) -> &str {
            self.name
        }

        fn extract(&self, _image: &DynamicImage) -> Result<OcrReading, BackendError> {
            self.reading
                .map(|(text, confidence)| OcrReading::new(text, confidence))
                .ok_or_else(|| BackendError::Unavailable(format!("{} not installed", self.name)))
        }
    }

    struct BrokenEnhancer;

    impl ImageEnhancer for BrokenEnhancer {
        fn improve(&self, _image: &DynamicImage) -> Result<Enhancement, PreprocessingError> {
            Err(PreprocessingError::Failed("deskew diverged".to_string()))
        }
    }

    struct PanickingCleaner;

    impl TextCleaner for PanickingCleaner {
        fn clean(&self, _raw: &str) -> crate::cleaning::CleanedText {
            panic!("cleaner bug")
        }
    }

    fn write_jpeg(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        RgbImage::from_pixel(120, 80, Rgb([240, 240, 240]))
            .save(&path)
            .unwrap();
        path
    }

    fn orchestrator(reading: Option<(&'static str, f64)>) -> PipelineBuilder {
        let ocr = OcrEngineAdapter::new(
            vec![Arc::new(ScriptedOcr {
                name: "scripted",
                reading,
            })],
            0.3,
        );
        PipelineOrchestrator::builder(ocr, PiiDetector::with_defaults().unwrap())
    }

    #[test]
    fn test_successful_run_records_every_stage() {
        let dir = TempDir::new().unwrap();
        let image = write_jpeg(&dir, "form.jpg");
        let pipeline = orchestrator(Some(("Phone: (555) 123-4567", 0.9))).build();

        let outcome = pipeline.process_image(&image, &ProcessOptions::new());
        let result = outcome.as_success().expect("expected success");

        assert_eq!(result.original_text, "Phone: (555) 123-4567");
        assert_eq!(result.pii_matches.len(), 1);
        assert_eq!(result.pii_matches[0].pii_type(), PiiType::Phone);
        assert!(result.redacted_image_path.is_none());

        let metadata = &result.processing_metadata;
        for stage in Stage::CORE {
            let record = metadata.stage(stage).unwrap();
            assert!(record.success, "stage {stage} should succeed");
        }
        assert!(metadata.stage(Stage::Redaction).is_none());
        let ocr = metadata.stage(Stage::Ocr).unwrap();
        assert_eq!(ocr.field("engine_used"), Some(&json!("scripted")));
        assert_eq!(ocr.field("fallback_used"), Some(&json!(false)));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let pipeline = orchestrator(Some(("text", 0.9))).build();
        let outcome = pipeline.process_image(Path::new("/nonexistent/scan.jpg"), &ProcessOptions::new());

        let failure = outcome.as_failure().expect("expected failure");
        assert_eq!(failure.error_type, ErrorType::UnreadableFile);
        assert_eq!(failure.stage, Stage::InputValidation);
        assert!(failure.diagnostic_info.contains_key("os_error"));

        let metadata = &failure.processing_metadata;
        assert_eq!(
            metadata.stage(Stage::Ocr).unwrap().status,
            StageStatus::NotAttempted
        );
    }

    #[test]
    fn test_png_rejected_by_content() {
        let dir = TempDir::new().unwrap();
        // extension says jpeg, content is png
        let path = dir.path().join("disguised.jpg");
        RgbImage::new(8, 8)
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();

        let outcome = orchestrator(Some(("text", 0.9)))
            .build()
            .process_image(&path, &ProcessOptions::new());
        let failure = outcome.as_failure().unwrap();

        assert_eq!(failure.error_type, ErrorType::InvalidInputFormat);
        assert_eq!(failure.diagnostic_info["detected_format"], "png");
        assert_eq!(failure.diagnostic_info["extension"], "jpg");
    }

    #[test]
    fn test_oversized_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("huge.jpg");
        fs::write(&path, vec![0u8; 2 * 1024 * 1024]).unwrap();

        let outcome = orchestrator(Some(("text", 0.9)))
            .input_config(InputConfig {
                max_file_size_mb: 1,
                ..Default::default()
            })
            .build()
            .process_image(&path, &ProcessOptions::new());

        let failure = outcome.as_failure().unwrap();
        assert_eq!(failure.error_type, ErrorType::UnreadableFile);
        assert_eq!(failure.diagnostic_info["file_size_bytes"], 2 * 1024 * 1024);
    }

    #[test]
    fn test_preprocessing_failure_is_recoverable() {
        let dir = TempDir::new().unwrap();
        let image = write_jpeg(&dir, "form.jpg");
        let pipeline = orchestrator(Some(("SSN: 123-45-6789", 0.8)))
            .enhancer(Arc::new(BrokenEnhancer))
            .build();

        let outcome = pipeline.process_image(&image, &ProcessOptions::new());
        let result = outcome.as_success().unwrap();

        let pre = result.processing_metadata.stage(Stage::Preprocessing).unwrap();
        assert!(!pre.success);
        assert_eq!(
            pre.error.as_ref().unwrap().error_type,
            ErrorType::PreprocessingFailure
        );
        assert!(result.processing_metadata.stage(Stage::Ocr).unwrap().success);
        assert_eq!(result.pii_matches[0].pii_type(), PiiType::Ssn);
    }

    #[test]
    fn test_ocr_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let image = write_jpeg(&dir, "form.jpg");
        let pipeline = orchestrator(None).build();

        let outcome = pipeline.process_image(&image, &ProcessOptions::new());
        let failure = outcome.as_failure().unwrap();

        assert_eq!(failure.error_type, ErrorType::OcrFailure);
        assert_eq!(failure.stage, Stage::Ocr);
        assert_eq!(failure.diagnostic_info["engines_tried"], json!(["scripted"]));
        assert!(failure.diagnostic_info["backend_errors"]["scripted"]
            .as_str()
            .unwrap()
            .contains("not installed"));

        let metadata = &failure.processing_metadata;
        assert!(metadata.stage(Stage::Preprocessing).unwrap().success);
        assert_eq!(
            metadata.stage(Stage::Cleaning).unwrap().status,
            StageStatus::NotAttempted
        );
        assert!(metadata.total_duration_seconds >= 0.0);
    }

    #[test]
    fn test_cleaner_panic_falls_back_to_raw_text() {
        let dir = TempDir::new().unwrap();
        let image = write_jpeg(&dir, "form.jpg");
        let pipeline = orchestrator(Some(("MRN: 00123456", 0.9)))
            .cleaner(Arc::new(PanickingCleaner))
            .build();

        let outcome = pipeline.process_image(&image, &ProcessOptions::new());
        let result = outcome.as_success().unwrap();

        assert_eq!(result.original_text, "MRN: 00123456");
        let cleaning = result.processing_metadata.stage(Stage::Cleaning).unwrap();
        assert!(!cleaning.success);
        assert!(cleaning
            .error
            .as_ref()
            .unwrap()
            .message
            .contains("cleaner bug"));
    }

    #[test]
    fn test_redaction_writes_image() {
        let dir = TempDir::new().unwrap();
        let image = write_jpeg(&dir, "intake.jpg");
        let out = dir.path().join("redacted");
        let pipeline = orchestrator(Some(("SSN: 123-45-6789", 0.8))).build();

        let options = ProcessOptions::new()
            .with_redaction(crate::output::RedactionMethod::BlackBox)
            .with_output_dir(&out);
        let outcome = pipeline.process_image(&image, &options);
        let result = outcome.as_success().unwrap();

        assert_eq!(
            result.redacted_image_path,
            Some(out.join("redacted_intake.jpg"))
        );
        assert!(out.join("redacted_intake.jpg").exists());
        let record = result.processing_metadata.stage(Stage::Redaction).unwrap();
        assert_eq!(record.field("method"), Some(&json!("black_box")));
    }
}
