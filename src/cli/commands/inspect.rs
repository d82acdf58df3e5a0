//! Inspect command implementation
//!
//! Dry-run view of a document: blocks and merged rule detections as JSON,
//! with nothing written.

use crate::anonymization::AnonymizationEngine;
use crate::config::DocveilConfig;
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Input DOCX file
    pub input: PathBuf,

    /// Pattern catalogue override
    #[arg(long)]
    pub patterns: Option<PathBuf>,

    /// Print compact JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,
}

impl InspectArgs {
    /// Execute the inspect command
    pub fn execute(&self, mut config: DocveilConfig) -> anyhow::Result<i32> {
        if let Some(patterns) = &self.patterns {
            config.patterns_path = Some(patterns.clone());
        }
        // no document is modified, so the recognizer is never needed here
        config.nlp.endpoint = None;

        let engine = AnonymizationEngine::new(config).context("Failed to build engine")?;
        let (blocks, detections) = engine
            .inspect_document(&self.input)
            .with_context(|| format!("Failed to inspect {}", self.input.display()))?;

        let report = serde_json::json!({
            "document": self.input.display().to_string(),
            "total_blocks": blocks.len(),
            "total_detections": detections.len(),
            "blocks": blocks,
            "detections": detections,
        });
        if self.compact {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Ok(0)
    }
}
