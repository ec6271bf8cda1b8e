//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Inkguard using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Inkguard - OCR with PII detection for scanned handwritten documents
#[derive(Parser, Debug)]
#[command(name = "inkguard")]
#[command(version, about, long_about = None)]
#[command(author = "Inkguard Contributors")]
pub struct Cli {
    /// Path to configuration file (defaults are used when it does not exist)
    #[arg(short, long, default_value = "inkguard.toml", env = "INKGUARD_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "INKGUARD_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract text from one image and detect PII
    Process(commands::process::ProcessArgs),

    /// Process several images concurrently
    Batch(commands::batch::BatchArgs),

    /// Validate configuration file and pattern library
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
