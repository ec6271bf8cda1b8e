//! Domain models and types for Inkguard.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **PII model** ([`PiiType`], [`PiiMatch`])
//! - **Stage metadata** ([`Stage`], [`StageRecord`], [`ProcessingMetadata`])
//! - **Outcomes** ([`PiiResult`], [`ErrorResult`], [`ProcessOutcome`], [`ErrorType`])
//! - **Error types** ([`InkguardError`], [`OcrError`], [`BackendError`])
//! - **Result type alias** ([`Result`])
//!
//! # Outcomes
//!
//! Processing an image never returns `Err`. Fatal stage failures are carried
//! as data:
//!
//! ```rust
//! use inkguard::domain::{ErrorResult, ErrorType, ProcessOutcome, ProcessingMetadata, Stage};
//!
//! let outcome = ProcessOutcome::from(ErrorResult::new(
//!     ErrorType::UnreadableFile,
//!     "File not found: scan.jpg",
//!     Stage::InputValidation,
//!     ProcessingMetadata::new("scan.jpg"),
//! ));
//! assert!(!outcome.is_success());
//! ```

pub mod errors;
pub mod fault;
pub mod metadata;
pub mod outcome;
pub mod pii;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{BackendError, InkguardError, OcrError, PreprocessingError, RedactionError};
pub use fault::catch_fault;
pub use metadata::{ProcessingMetadata, Stage, StageError, StageRecord, StageStatus};
pub use outcome::{ErrorResult, ErrorType, PiiResult, ProcessOutcome};
pub use pii::{clamp_confidence, PiiMatch, PiiType};
pub use result::Result;
