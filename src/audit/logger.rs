//! Audit logger for processed images

use super::AuditConfig;
use crate::domain::{PiiMatch, ProcessOutcome, Stage};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

/// Audit log entry
#[derive(Debug, Serialize)]
struct AuditLogEntry {
    timestamp: String,
    run_id: Uuid,
    input_file: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    ocr_engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_type: Option<String>,
    total_duration_seconds: f64,
    detections_count: usize,
    detections: Vec<AuditDetection>,
}

/// Audit detection entry (with hashed PII)
#[derive(Debug, Serialize)]
struct AuditDetection {
    pii_type: String,
    confidence: f64,
    start_pos: usize,
    end_pos: usize,
    /// SHA-256 hash of the matched text (never log plaintext PII)
    value_hash: String,
}

/// Appends one entry per processed image to the audit log
pub struct AuditLogger {
    log_path: PathBuf,
    json_format: bool,
    enabled: bool,
    // batch workers share one logger
    write_lock: Mutex<()>,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(log_path: PathBuf, json_format: bool, enabled: bool) -> Result<Self> {
        if enabled {
            if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create audit log directory: {}", parent.display())
                })?;
            }
        }

        Ok(Self {
            log_path,
            json_format,
            enabled,
            write_lock: Mutex::new(()),
        })
    }

    /// Create an audit logger from the `[audit]` configuration section
    pub fn from_config(config: &AuditConfig) -> Result<Self> {
        Self::new(config.log_path.clone(), config.json_format, config.enabled)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record the outcome of one image
    pub fn log_outcome(&self, outcome: &ProcessOutcome) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let metadata = outcome.metadata();
        let ocr_engine = metadata
            .stage(Stage::Ocr)
            .and_then(|record| record.field("engine_used"))
            .and_then(|value| value.as_str())
            .map(str::to_string);

        let detections: Vec<AuditDetection> = outcome
            .as_success()
            .map(|result| {
                result
                    .pii_matches
                    .iter()
                    .map(|m| self.create_audit_detection(m))
                    .collect()
            })
            .unwrap_or_default();

        let entry = AuditLogEntry {
            timestamp: Utc::now().to_rfc3339(),
            run_id: metadata.run_id,
            input_file: metadata.input_file.clone(),
            success: outcome.is_success(),
            ocr_engine,
            error_type: outcome
                .as_failure()
                .map(|failure| failure.error_type.to_string()),
            total_duration_seconds: metadata.total_duration_seconds,
            detections_count: detections.len(),
            detections,
        };

        self.write_entry(&entry)
    }

    fn create_audit_detection(&self, m: &PiiMatch) -> AuditDetection {
        AuditDetection {
            pii_type: m.pii_type().to_string(),
            confidence: m.confidence(),
            start_pos: m.start_pos(),
            end_pos: m.end_pos(),
            value_hash: hash_pii_value(m.text()),
        }
    }

    /// Write an audit entry to the log file
    fn write_entry(&self, entry: &AuditLogEntry) -> Result<()> {
        let line = if self.json_format {
            serde_json::to_string(entry).context("Failed to serialize audit entry")?
        } else {
            format!(
                "[{}] Run: {} | File: {} | Success: {} | Engine: {} | Detections: {} | Time: {:.3}s",
                entry.timestamp,
                entry.run_id,
                entry.input_file,
                entry.success,
                entry.ocr_engine.as_deref().unwrap_or("-"),
                entry.detections_count,
                entry.total_duration_seconds
            )
        };

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("Audit log lock poisoned"))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open audit log: {}", self.log_path.display()))?;

        writeln!(file, "{line}").context("Failed to write audit entry")?;
        Ok(())
    }
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger")
            .field("log_path", &self.log_path)
            .field("json_format", &self.json_format)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Hash a PII value using SHA-256
pub fn hash_pii_value(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    format!("{result:x}")
}
