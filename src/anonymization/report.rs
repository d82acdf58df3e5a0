//! Run reporting
//!
//! Two artefacts are produced from the applied plans: an Excel summary
//! workbook with one row per replacement occurrence, and a structured
//! change ledger carrying counts, warnings and the deduplicated
//! replacement table. The summary may repeat an `original_value`; the
//! ledger deduplicates by `(original_value, category)`.

use crate::domain::errors::{DocveilError, Result};
use crate::domain::models::{DetectionSource, ReplacementPlan, RunWarning, SkippedPlan};
use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

const LEDGER_VERSION: &str = "1.0";

/// One row of the tabular summary
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub index: usize,
    pub original_value: String,
    pub uuid: String,
    pub category: String,
    pub method: String,
    pub confidence: f64,
}

/// One deduplicated replacement in the change ledger
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub original_value: String,
    pub uuid: String,
    pub category: String,
    pub method: String,
    pub confidence: f64,
    pub source: DetectionSource,
}

/// Structured change ledger for one run
#[derive(Debug, Clone, Serialize)]
pub struct ChangeLedger {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub total_replacements: usize,
    pub counts_by_category: BTreeMap<String, usize>,
    pub replacements: Vec<LedgerEntry>,
    pub skipped: Vec<SkippedPlan>,
    pub warnings: Vec<RunWarning>,
}

/// Builds and writes the run artefacts
pub struct ReportBuilder;

impl ReportBuilder {
    /// Summary rows in application order, 1-based index
    pub fn summary(applied: &[ReplacementPlan]) -> Vec<SummaryRow> {
        applied
            .iter()
            .enumerate()
            .map(|(i, plan)| SummaryRow {
                index: i + 1,
                original_value: plan.detection.original_value.clone(),
                uuid: plan.uuid.clone(),
                category: plan.detection.category.clone(),
                method: plan.detection.method.clone(),
                confidence: plan.detection.confidence,
            })
            .collect()
    }

    /// Build the ledger from the applied and skipped plans
    pub fn ledger(
        applied: &[ReplacementPlan],
        skipped: Vec<SkippedPlan>,
        warnings: Vec<RunWarning>,
    ) -> ChangeLedger {
        let mut counts_by_category: BTreeMap<String, usize> = BTreeMap::new();
        for plan in applied {
            *counts_by_category
                .entry(plan.detection.category.clone())
                .or_insert(0) += 1;
        }

        let mut seen: std::collections::HashSet<(String, String)> = std::collections::HashSet::new();
        let mut replacements = Vec::new();
        for plan in applied {
            let key = (
                plan.detection.original_value.clone(),
                plan.detection.category.clone(),
            );
            if !seen.insert(key) {
                continue;
            }
            replacements.push(LedgerEntry {
                original_value: plan.detection.original_value.clone(),
                uuid: plan.uuid.clone(),
                category: plan.detection.category.clone(),
                method: plan.detection.method.clone(),
                confidence: plan.detection.confidence,
                source: plan.detection.source,
            });
        }

        ChangeLedger {
            version: LEDGER_VERSION.to_string(),
            generated_at: Utc::now(),
            total_replacements: applied.len(),
            counts_by_category,
            replacements,
            skipped,
            warnings,
        }
    }

    /// Write the summary as an Excel workbook. Partial files are removed
    /// on failure.
    pub fn write_summary(path: &Path, rows: &[SummaryRow]) -> Result<()> {
        if let Err(e) = Self::write_workbook(path, rows) {
            let _ = std::fs::remove_file(path);
            return Err(e);
        }
        Ok(())
    }

    fn write_workbook(path: &Path, rows: &[SummaryRow]) -> Result<()> {
        let xlsx = |e: rust_xlsxwriter::XlsxError| DocveilError::Output(e.to_string());

        let mut workbook = Workbook::new();
        let header_fmt = Format::new().set_bold();

        let sheet = workbook.add_worksheet();
        sheet.set_name("Replacements").map_err(xlsx)?;

        let headers = [
            "index",
            "original_value",
            "uuid",
            "category",
            "method",
            "confidence",
        ];
        for (col, header) in headers.iter().enumerate() {
            sheet
                .write_string_with_format(0, col as u16, *header, &header_fmt)
                .map_err(xlsx)?;
        }

        for (i, row) in rows.iter().enumerate() {
            let r = (i + 1) as u32;
            sheet.write_number(r, 0, row.index as f64).map_err(xlsx)?;
            sheet
                .write_string(r, 1, &row.original_value)
                .map_err(xlsx)?;
            sheet.write_string(r, 2, &row.uuid).map_err(xlsx)?;
            sheet.write_string(r, 3, &row.category).map_err(xlsx)?;
            sheet.write_string(r, 4, &row.method).map_err(xlsx)?;
            sheet.write_number(r, 5, row.confidence).map_err(xlsx)?;
        }

        sheet.set_column_width(1, 30).map_err(xlsx)?;
        sheet.set_column_width(2, 38).map_err(xlsx)?;
        sheet.set_column_width(3, 18).map_err(xlsx)?;

        workbook
            .save(path)
            .map_err(|e| DocveilError::Output(format!("{}: {e}", path.display())))?;
        Ok(())
    }

    /// Write the ledger as pretty JSON. Partial files are removed on failure.
    pub fn write_ledger(path: &Path, ledger: &ChangeLedger) -> Result<()> {
        let json = serde_json::to_string_pretty(ledger)?;
        if let Err(e) = std::fs::write(path, json) {
            let _ = std::fs::remove_file(path);
            return Err(DocveilError::Output(format!("{}: {e}", path.display())));
        }
        Ok(())
    }
}
