//! Configuration schema types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration, mapped from the TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocveilConfig {
    /// Pattern catalogue location; the embedded catalogue is used when absent
    #[serde(default)]
    pub patterns_path: Option<PathBuf>,

    /// Visually mark every byte written by the applier
    #[serde(default = "default_true")]
    pub highlight_replacements: bool,

    /// Scrub author identities from `docProps/core.xml`
    #[serde(default = "default_true")]
    pub anonymize_metadata: bool,

    /// NLP recognizer settings
    #[serde(default)]
    pub nlp: NlpConfig,

    /// Report artefact toggles
    #[serde(default)]
    pub reports: ReportsConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DocveilConfig {
    /// Validates the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.nlp.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

impl Default for DocveilConfig {
    fn default() -> Self {
        Self {
            patterns_path: None,
            highlight_replacements: true,
            anonymize_metadata: true,
            nlp: NlpConfig::default(),
            reports: ReportsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// NLP recognizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NlpConfig {
    /// Endpoint URL; NLP detection is disabled when absent
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Per-call timeout in milliseconds
    #[serde(default = "default_nlp_timeout_ms")]
    pub timeout_ms: u64,

    /// Concurrent per-block calls
    #[serde(default = "default_nlp_concurrency")]
    pub concurrency: usize,
}

impl NlpConfig {
    fn validate(&self) -> Result<(), String> {
        if self.timeout_ms == 0 {
            return Err("nlp.timeout_ms must be greater than zero".to_string());
        }
        if self.concurrency == 0 {
            return Err("nlp.concurrency must be at least 1".to_string());
        }
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!(
                    "nlp.endpoint '{endpoint}' must be an http(s) URL"
                ));
            }
        }
        Ok(())
    }
}

impl Default for NlpConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: default_nlp_timeout_ms(),
            concurrency: default_nlp_concurrency(),
        }
    }
}

/// Report artefact toggles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    /// Excel summary workbook (one row per replacement occurrence)
    #[serde(default = "default_true")]
    pub generate_excel_report: bool,

    /// Structured JSON change ledger
    #[serde(default = "default_true")]
    pub generate_json_ledger: bool,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            generate_excel_report: true,
            generate_json_ledger: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory receiving rotated JSON log files; console-only when absent
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&self.level.as_str()) {
            return Err(format!(
                "invalid logging.level '{}': must be one of {}",
                self.level,
                valid.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_nlp_timeout_ms() -> u64 {
    30_000
}

fn default_nlp_concurrency() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DocveilConfig::default();
        assert!(config.highlight_replacements);
        assert!(config.anonymize_metadata);
        assert!(config.reports.generate_excel_report);
        assert!(config.reports.generate_json_ledger);
        assert_eq!(config.nlp.timeout_ms, 30_000);
        assert_eq!(config.nlp.concurrency, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_toml() {
        let config: DocveilConfig = toml::from_str("").unwrap();
        assert!(config.highlight_replacements);
        assert!(config.nlp.endpoint.is_none());
    }

    #[test]
    fn test_full_toml() {
        let toml_str = r#"
            patterns_path = "patterns/sensitive_patterns.csv"
            highlight_replacements = false

            [nlp]
            endpoint = "http://localhost:8003/detect"
            timeout_ms = 5000
            concurrency = 8

            [reports]
            generate_excel_report = false

            [logging]
            level = "debug"
        "#;
        let config: DocveilConfig = toml::from_str(toml_str).unwrap();
        assert!(!config.highlight_replacements);
        assert_eq!(config.nlp.timeout_ms, 5000);
        assert!(!config.reports.generate_excel_report);
        assert!(config.reports.generate_json_ledger);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = DocveilConfig::default();
        config.nlp.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = DocveilConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = DocveilConfig::default();
        config.nlp.endpoint = Some("not-a-url".to_string());
        assert!(config.validate().is_err());
    }
}
