//! Deanonymize command implementation
//!
//! Applies a ledger's `uuid → original` mapping back onto a document.

use crate::anonymization::deanonymize_document;
use clap::Args;
use std::path::{Path, PathBuf};

/// Arguments for the deanonymize command
#[derive(Args, Debug)]
pub struct DeanonymizeArgs {
    /// Anonymized DOCX file
    pub input: PathBuf,

    /// Change ledger produced by the anonymize run
    #[arg(long)]
    pub ledger: PathBuf,

    /// Output DOCX path (defaults to `deanonymized.docx` beside the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl DeanonymizeArgs {
    /// Execute the deanonymize command
    pub fn execute(&self) -> anyhow::Result<i32> {
        let output = self.output.clone().unwrap_or_else(|| {
            self.input
                .parent()
                .map(|dir| dir.join("deanonymized.docx"))
                .unwrap_or_else(|| Path::new("deanonymized.docx").to_path_buf())
        });

        let restored = deanonymize_document(&self.input, &self.ledger, &output)?;
        println!("✅ Restored {restored} occurrence(s)");
        println!("   Output: {}", output.display());
        Ok(0)
    }
}
