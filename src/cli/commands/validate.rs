//! Validate command implementation
//!
//! Validates the configuration file and the pattern catalogue, reporting
//! invalid regex rows with their row numbers.

use crate::anonymization::PatternStore;
use crate::config::load_config;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Pattern catalogue override
    #[arg(long)]
    pub patterns: Option<PathBuf>,
}

impl ValidateArgs {
    /// Execute the validate command
    pub fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        println!("🔍 Validating configuration: {config_path}");

        let config = if std::path::Path::new(config_path).exists() {
            match load_config(config_path) {
                Ok(c) => {
                    println!("✅ Configuration is valid");
                    c
                }
                Err(e) => {
                    println!("❌ {e}");
                    return Ok(2);
                }
            }
        } else {
            println!("ℹ️  No configuration file; using built-in defaults");
            crate::config::DocveilConfig::default()
        };

        let patterns_path = self.patterns.clone().or(config.patterns_path.clone());
        let store = match &patterns_path {
            Some(path) => {
                println!("🔍 Validating pattern catalogue: {}", path.display());
                PatternStore::from_path(path)
            }
            None => {
                println!("🔍 Validating embedded pattern catalogue");
                PatternStore::default_patterns()
            }
        };

        match store {
            Ok(store) => {
                println!("✅ {} rule(s) compiled", store.len());
                if store.warnings().is_empty() {
                    Ok(0)
                } else {
                    for warning in store.warnings() {
                        println!(
                            "⚠️  row {}: {} ({})",
                            warning.row, warning.error, warning.pattern
                        );
                    }
                    println!("❌ {} invalid rule(s) would be skipped", store.warnings().len());
                    Ok(2)
                }
            }
            Err(e) => {
                println!("❌ {e}");
                Ok(2)
            }
        }
    }
}
