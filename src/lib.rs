// Inkguard - OCR and PII detection for scanned handwritten documents
// Copyright (c) 2025 Inkguard Contributors
// Licensed under the MIT License

//! # Inkguard - OCR with PII detection
//!
//! Inkguard extracts text from scanned handwritten documents (clinical
//! notes, intake forms) and flags personally identifiable information in it.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Validating** scanned images by size and sniffed content type
//! - **Enhancing** pages before OCR (contrast, denoise, deskew)
//! - **Extracting** text through an ordered list of OCR engines with fallback
//! - **Detecting** names, addresses, phone numbers, medical IDs and SSNs
//! - **Redacting** detected PII from a copy of the image
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`pipeline`] - Per-image orchestration with stage containment, batches
//! - [`detection`] - Pattern library and PII detector
//! - [`ocr`] - OCR engine adapter and shipped backends
//! - [`preprocessing`] - Image enhancement
//! - [`cleaning`] - OCR text cleanup and quality scoring
//! - [`output`] - JSON result documents and image redaction
//! - [`audit`] - Hashed audit trail
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use inkguard::config::load_config_or_default;
//! use inkguard::pipeline::{PipelineOrchestrator, ProcessOptions};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = load_config_or_default("inkguard.toml")?;
//! let pipeline = PipelineOrchestrator::new(&config)?;
//!
//! let outcome = pipeline.process_image(Path::new("scan.jpg"), &ProcessOptions::new());
//! match outcome.as_success() {
//!     Some(result) => println!("{} PII matches", result.pii_matches.len()),
//!     None => println!("processing failed"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Detection Only
//!
//! ```rust
//! use inkguard::detection::PiiDetector;
//! use inkguard::domain::PiiType;
//!
//! let detector = PiiDetector::with_defaults().unwrap();
//! let matches = detector.detect_all_pii("SSN: 123-45-6789");
//! assert!(matches.iter().any(|m| m.pii_type() == PiiType::Ssn));
//! ```
//!
//! ## Error Handling
//!
//! Library setup returns [`domain::InkguardError`]. Processing an image never
//! returns an error: fatal stage failures come back as
//! [`domain::ErrorResult`] inside a [`domain::ProcessOutcome`].
//!
//! ## Logging
//!
//! Inkguard uses structured logging with the `tracing` crate. Matched PII
//! text is never logged.

pub mod audit;
pub mod cli;
pub mod cleaning;
pub mod config;
pub mod detection;
pub mod domain;
pub mod logging;
pub mod ocr;
pub mod output;
pub mod pipeline;
pub mod preprocessing;
