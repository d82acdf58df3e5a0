//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for docveil using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Docveil - DOCX de-identification tool
#[derive(Parser, Debug)]
#[command(name = "docveil")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "docveil.toml", env = "DOCVEIL_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "DOCVEIL_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Anonymize a document, writing the rewritten copy and reports
    Anonymize(commands::anonymize::AnonymizeArgs),

    /// Parse a document and print its blocks and detections as JSON
    Inspect(commands::inspect::InspectArgs),

    /// Replace surrogates in a document with their originals from a ledger
    Deanonymize(commands::deanonymize::DeanonymizeArgs),

    /// Validate the configuration file and pattern catalogue
    Validate(commands::validate::ValidateArgs),
}
