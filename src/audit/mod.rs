//! Audit trail for processed images
//!
//! One entry per image with hashed detections. Matched text never reaches
//! the audit log in plaintext.

pub mod logger;

pub use logger::AuditLogger;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Audit settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,

    /// JSON lines when true, one plain-text line per image otherwise
    #[serde(default = "default_json_format")]
    pub json_format: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: default_log_path(),
            json_format: default_json_format(),
        }
    }
}

fn default_log_path() -> PathBuf {
    PathBuf::from("logs/audit.jsonl")
}

fn default_json_format() -> bool {
    true
}
