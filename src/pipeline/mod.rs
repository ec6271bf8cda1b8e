//! Pipeline orchestration
//!
//! [`PipelineOrchestrator`] runs a single image through every stage and
//! never lets a fault escape; [`BatchProcessor`] fans a list of images out
//! over the blocking pool.

pub mod batch;
pub mod config;
pub mod orchestrator;
pub mod summary;

pub use batch::BatchProcessor;
pub use config::{BatchConfig, InputConfig, ProcessOptions};
pub use orchestrator::{PipelineBuilder, PipelineOrchestrator};
pub use summary::{BatchReport, BatchSummary};
