//! PII detection
//!
//! Turns cleaned OCR text into classified, non-overlapping, position-accurate
//! PII spans:
//!
//! 1. [`PatternLibrary`] proposes scored candidates per category.
//! 2. [`PiiDetector`] drops candidates below the category (or rule) floor.
//! 3. [`resolve_overlaps`] keeps the best-ranked candidate wherever spans
//!    collide and returns the survivors in text order.
//!
//! ```rust
//! use inkguard::detection::PiiDetector;
//! use inkguard::domain::PiiType;
//!
//! let detector = PiiDetector::with_defaults().unwrap();
//! let matches = detector.detect_all_pii("SSN: 123-45-6789");
//! assert_eq!(matches[0].pii_type(), PiiType::Ssn);
//! ```

pub mod config;
pub mod detector;
pub mod patterns;
pub mod resolve;

pub use config::{ConfidenceFloors, DetectionConfig};
pub use detector::PiiDetector;
pub use patterns::{Candidate, ContextSettings, PatternLibrary};
pub use resolve::resolve_overlaps;
