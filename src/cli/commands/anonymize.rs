//! Anonymize command implementation

use crate::anonymization::{AnonymizationEngine, RunPaths};
use crate::config::DocveilConfig;
use crate::domain::errors::DocveilError;
use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use tokio::sync::watch;

/// Arguments for the anonymize command
#[derive(Args, Debug)]
pub struct AnonymizeArgs {
    /// Input DOCX file
    pub input: PathBuf,

    /// Output DOCX path (defaults to `anonymized.docx` beside the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Excel summary path (defaults to `report.xlsx` beside the output)
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Change ledger path (defaults to `ledger.json` beside the output)
    #[arg(long)]
    pub ledger: Option<PathBuf>,

    /// Pattern catalogue override
    #[arg(long)]
    pub patterns: Option<PathBuf>,

    /// NLP endpoint override
    #[arg(long)]
    pub nlp_endpoint: Option<String>,

    /// Disable the yellow replacement highlight
    #[arg(long)]
    pub no_highlight: bool,

    /// Keep `docProps/core.xml` author metadata untouched
    #[arg(long)]
    pub keep_metadata: bool,
}

impl AnonymizeArgs {
    /// Execute the anonymize command
    pub async fn execute(
        &self,
        mut config: DocveilConfig,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        if let Some(patterns) = &self.patterns {
            config.patterns_path = Some(patterns.clone());
        }
        if let Some(endpoint) = &self.nlp_endpoint {
            config.nlp.endpoint = Some(endpoint.clone());
        }
        if self.no_highlight {
            config.highlight_replacements = false;
        }
        if self.keep_metadata {
            config.anonymize_metadata = false;
        }

        let output = self
            .output
            .clone()
            .unwrap_or_else(|| sibling(&self.input, "anonymized.docx"));
        let reports = RunPaths {
            summary: config
                .reports
                .generate_excel_report
                .then(|| self.summary.clone().unwrap_or_else(|| sibling(&output, "report.xlsx"))),
            ledger: config
                .reports
                .generate_json_ledger
                .then(|| self.ledger.clone().unwrap_or_else(|| sibling(&output, "ledger.json"))),
        };

        let engine = AnonymizationEngine::new(config).context("Failed to build engine")?;
        match engine
            .anonymize_document(&self.input, &output, &reports, shutdown)
            .await
        {
            Ok(summary) => {
                println!("✅ Anonymized {}", self.input.display());
                println!("   Output:        {}", output.display());
                println!("   Blocks:        {}", summary.total_blocks);
                println!(
                    "   Detections:    {} rule, {} nlp",
                    summary.rule_detections, summary.nlp_detections
                );
                println!(
                    "   Replacements:  {} applied, {} skipped, {} via header/footer sweep",
                    summary.applied, summary.skipped, summary.sweep_replacements
                );
                if summary.warnings > 0 {
                    println!("   ⚠️  {} warning(s) recorded in the ledger", summary.warnings);
                }
                println!("   Took:          {} ms", summary.duration_ms);
                Ok(0)
            }
            Err(DocveilError::Cancelled) => {
                println!("⚠️  Run cancelled; no outputs were written");
                Ok(130)
            }
            Err(e @ DocveilError::Document(_)) => {
                eprintln!("❌ {e}");
                Ok(3)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn sibling(path: &Path, name: &str) -> PathBuf {
    path.parent()
        .map(|dir| dir.join(name))
        .unwrap_or_else(|| PathBuf::from(name))
}
