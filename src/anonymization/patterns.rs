//! Pattern catalogue
//!
//! Loads the rule catalogue from a tabular CSV source with a header row of
//! `category, pattern, confidence, description`. Unknown extra columns are
//! ignored, rows with an empty pattern are skipped, and rows whose regex
//! fails to compile are reported with their row number and dropped so the
//! run can continue. Rules are case-sensitive unless a pattern opts out
//! with an inline `(?i)` flag.

use crate::domain::errors::{DocveilError, Result};
use regex::Regex;
use serde::Serialize;
use std::path::Path;

/// One compiled detection rule
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub category: String,
    pub regex: Regex,
    pub confidence: f64,
    pub description: String,
    /// 1-based row in the catalogue (header row is 1)
    pub row: usize,
}

/// A catalogue row that was skipped during loading
#[derive(Debug, Clone, Serialize)]
pub struct PatternWarning {
    pub row: usize,
    pub pattern: String,
    pub error: String,
}

/// Ordered, compiled rule catalogue
#[derive(Debug, Clone, Default)]
pub struct PatternStore {
    rules: Vec<PatternRule>,
    warnings: Vec<PatternWarning>,
}

impl PatternStore {
    /// Load a catalogue from a CSV file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            DocveilError::Pattern(format!(
                "failed to read pattern catalogue {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_csv(&content)
    }

    /// Load a catalogue from CSV content
    pub fn from_csv(content: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| DocveilError::Pattern(format!("invalid catalogue header: {e}")))?
            .clone();
        let col = |name: &str| headers.iter().position(|h| h.trim() == name);
        let category_idx = col("category")
            .ok_or_else(|| DocveilError::Pattern("missing 'category' column".to_string()))?;
        let pattern_idx = col("pattern")
            .ok_or_else(|| DocveilError::Pattern("missing 'pattern' column".to_string()))?;
        let confidence_idx = col("confidence");
        let description_idx = col("description");

        let mut rules = Vec::new();
        let mut warnings = Vec::new();

        for (i, record) in reader.records().enumerate() {
            let row = i + 2;
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    warnings.push(PatternWarning {
                        row,
                        pattern: String::new(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let pattern = record.get(pattern_idx).unwrap_or("").trim();
            if pattern.is_empty() {
                continue;
            }
            let category = record
                .get(category_idx)
                .unwrap_or("unknown")
                .trim()
                .to_lowercase();
            let confidence = confidence_idx
                .and_then(|idx| record.get(idx))
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(0.5)
                .clamp(0.0, 1.0);
            let description = description_idx
                .and_then(|idx| record.get(idx))
                .unwrap_or("")
                .trim()
                .to_string();

            match Regex::new(pattern) {
                Ok(regex) => rules.push(PatternRule {
                    category,
                    regex,
                    confidence,
                    description,
                    row,
                }),
                Err(e) => {
                    tracing::warn!(row, pattern, error = %e, "Skipping invalid pattern rule");
                    warnings.push(PatternWarning {
                        row,
                        pattern: pattern.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(Self { rules, warnings })
    }

    /// Built-in catalogue embedded at compile time
    pub fn default_patterns() -> Result<Self> {
        Self::from_csv(include_str!("../../patterns/sensitive_patterns.csv"))
    }

    /// Compiled rules, in catalogue order
    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Rows skipped during loading
    pub fn warnings(&self) -> &[PatternWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_catalogue() {
        let csv = "category,pattern,confidence,description\n\
                   inn,\"\\b\\d{10}\\b\",0.85,Tax number\n\
                   email,\"[a-z]+@[a-z]+\\.[a-z]{2,}\",0.95,Email\n";
        let store = PatternStore::from_csv(csv).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.rules()[0].category, "inn");
        assert_eq!(store.rules()[0].row, 2);
        assert!(store.rules()[1].regex.is_match("user@example.com"));
    }

    #[test]
    fn test_invalid_regex_row_skipped_with_warning() {
        let csv = "category,pattern,confidence,description\n\
                   bad,\"([unclosed\",0.9,Broken\n\
                   inn,\"\\d{10}\",0.85,Tax number\n";
        let store = PatternStore::from_csv(csv).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.warnings().len(), 1);
        assert_eq!(store.warnings()[0].row, 2);
    }

    #[test]
    fn test_empty_pattern_rows_skipped_silently() {
        let csv = "category,pattern,confidence,description\n\
                   inn,,0.85,No pattern\n";
        let store = PatternStore::from_csv(csv).unwrap();
        assert!(store.is_empty());
        assert!(store.warnings().is_empty());
    }

    #[test]
    fn test_extra_columns_ignored_and_defaults_applied() {
        let csv = "category,pattern,note,extra\n\
                   phone,\"\\d{3}-\\d{4}\",hello,world\n";
        let store = PatternStore::from_csv(csv).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.rules()[0].confidence, 0.5);
        assert_eq!(store.rules()[0].description, "");
    }

    #[test]
    fn test_default_patterns_compile() {
        let store = PatternStore::default_patterns().unwrap();
        assert!(!store.is_empty());
        assert!(store.warnings().is_empty());
    }
}
