//! Anonymization engine
//!
//! Orchestrates one document run: parse, block extraction, rule and NLP
//! detection, merge, surrogate enrichment, application, metadata scrub,
//! serialisation and reporting. The pipeline is sequential; only the
//! per-block NLP calls fan out, bounded by the configured concurrency,
//! with per-call timeouts and per-block failure isolation. A cancellation
//! signal is honoured at every component boundary, before any output is
//! written; the source document is never modified in place.

use crate::adapters::nlp::{recognizer_from_config, EntityRecognizer};
use crate::anonymization::applier::{replace_all_in_element, Applier, ApplyOutcome};
use crate::anonymization::blocks::BlockBuilder;
use crate::anonymization::detector::RuleDetector;
use crate::anonymization::merge::DetectionMerger;
use crate::anonymization::metadata::scrub_core_properties;
use crate::anonymization::patterns::PatternStore;
use crate::anonymization::report::ReportBuilder;
use crate::anonymization::surrogate::SurrogateMapper;
use crate::config::DocveilConfig;
use crate::docx::package::DocxPackage;
use crate::docx::part::DocumentModel;
use crate::docx::text::char_index_of;
use crate::domain::errors::{DocveilError, Result};
use crate::domain::models::{
    Block, Detection, DetectionSource, ReplacementPlan, RunWarning, Span,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;

/// Where to write the optional report artefacts
#[derive(Debug, Clone, Default)]
pub struct RunPaths {
    pub summary: Option<PathBuf>,
    pub ledger: Option<PathBuf>,
}

/// Aggregate statistics of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total_blocks: usize,
    pub rule_detections: usize,
    pub nlp_detections: usize,
    pub planned: usize,
    pub applied: usize,
    pub skipped: usize,
    pub sweep_replacements: usize,
    pub metadata_replacements: usize,
    pub warnings: usize,
    pub duration_ms: u64,
}

/// A caller-supplied replacement entry for selective application
#[derive(Debug, Clone, Deserialize)]
pub struct PlanInput {
    pub block_id: String,
    pub original_value: String,
    pub span: Span,
    pub category: String,
    #[serde(default)]
    pub uuid: Option<String>,
}

/// Main anonymization engine
pub struct AnonymizationEngine {
    config: DocveilConfig,
    patterns: Arc<PatternStore>,
    recognizer: Option<Arc<dyn EntityRecognizer>>,
    surrogates: Arc<SurrogateMapper>,
}

impl AnonymizationEngine {
    /// Create a new engine from configuration
    pub fn new(config: DocveilConfig) -> Result<Self> {
        config.validate().map_err(DocveilError::Configuration)?;

        let patterns = match &config.patterns_path {
            Some(path) => PatternStore::from_path(path)?,
            None => PatternStore::default_patterns()?,
        };
        let recognizer = recognizer_from_config(&config.nlp)?;

        Ok(Self {
            config,
            patterns: Arc::new(patterns),
            recognizer,
            surrogates: Arc::new(SurrogateMapper::new()),
        })
    }

    /// Replace the pattern catalogue
    pub fn with_patterns(mut self, patterns: PatternStore) -> Self {
        self.patterns = Arc::new(patterns);
        self
    }

    /// Replace the entity recognizer
    pub fn with_recognizer(mut self, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// The process-wide surrogate mapper, shared across documents
    pub fn surrogates(&self) -> &Arc<SurrogateMapper> {
        &self.surrogates
    }

    /// Run the full pipeline on one document
    pub async fn anonymize_document(
        &self,
        input: &Path,
        output: &Path,
        reports: &RunPaths,
        shutdown: watch::Receiver<bool>,
    ) -> Result<RunSummary> {
        let started = Instant::now();
        check_cancelled(&shutdown)?;

        let package = DocxPackage::open(input)?;
        let mut model = DocumentModel::parse(package)?;
        let blocks = BlockBuilder::build(&model);
        tracing::info!(
            input = %input.display(),
            blocks = blocks.len(),
            "Document parsed"
        );
        check_cancelled(&shutdown)?;

        let mut warnings: Vec<RunWarning> = self
            .patterns
            .warnings()
            .iter()
            .map(|w| {
                RunWarning::new(
                    "invalid_pattern",
                    format!("catalogue row {}: {}", w.row, w.error),
                )
            })
            .collect();

        let detector = RuleDetector::new(self.patterns.clone());
        let mut detections = detector.detect(&blocks);
        let rule_count = detections.len();

        let mut nlp_count = 0usize;
        if let Some(recognizer) = &self.recognizer {
            let (nlp_detections, nlp_warnings) =
                self.run_nlp(recognizer.clone(), &blocks, &shutdown).await;
            nlp_count = nlp_detections.len();
            detections.extend(nlp_detections);
            warnings.extend(nlp_warnings);
        }
        check_cancelled(&shutdown)?;

        let merged = DetectionMerger::merge(&blocks, detections);
        let plans = self.enrich(&blocks, merged);
        tracing::info!(
            rule = rule_count,
            nlp = nlp_count,
            planned = plans.len(),
            "Detections merged"
        );
        check_cancelled(&shutdown)?;

        let applier = Applier::new(self.config.highlight_replacements);
        let outcome = applier.apply(&mut model, &plans);

        let mut package = model.into_package();
        let metadata_plans = if self.config.anonymize_metadata {
            scrub_core_properties(&mut package, &self.surrogates)
        } else {
            Vec::new()
        };
        check_cancelled(&shutdown)?;

        package.save(output)?;
        self.write_reports(reports, &outcome, &metadata_plans, warnings.clone())?;

        let summary = RunSummary {
            total_blocks: blocks.len(),
            rule_detections: rule_count,
            nlp_detections: nlp_count,
            planned: plans.len(),
            applied: outcome.applied.len(),
            skipped: outcome.skipped.len(),
            sweep_replacements: outcome.sweep_replacements,
            metadata_replacements: metadata_plans.len(),
            warnings: warnings.len(),
            duration_ms: started.elapsed().as_millis() as u64,
        };
        tracing::info!(
            applied = summary.applied,
            skipped = summary.skipped,
            sweep = summary.sweep_replacements,
            duration_ms = summary.duration_ms,
            "Anonymization complete"
        );
        Ok(summary)
    }

    /// Parse a document and report its blocks and rule detections without
    /// modifying anything
    pub fn inspect_document(&self, input: &Path) -> Result<(Vec<Block>, Vec<Detection>)> {
        let package = DocxPackage::open(input)?;
        let model = DocumentModel::parse(package)?;
        let blocks = BlockBuilder::build(&model);
        let detector = RuleDetector::new(self.patterns.clone());
        let detections = DetectionMerger::merge(&blocks, detector.detect(&blocks));
        Ok((blocks, detections))
    }

    /// Apply a caller-supplied replacement table instead of running
    /// detection. Entries referencing unknown blocks are skipped.
    pub fn apply_replacement_table(
        &self,
        input: &Path,
        output: &Path,
        items: Vec<PlanInput>,
    ) -> Result<RunSummary> {
        let started = Instant::now();
        let package = DocxPackage::open(input)?;
        let mut model = DocumentModel::parse(package)?;
        let blocks = BlockBuilder::build(&model);
        let by_id: HashMap<&str, &Block> =
            blocks.iter().map(|b| (b.block_id.as_str(), b)).collect();

        let mut plans = Vec::new();
        let mut warnings = Vec::new();
        for item in items {
            let Some(block) = by_id.get(item.block_id.as_str()) else {
                warnings.push(RunWarning::new(
                    "unknown_block",
                    format!("replacement table references unknown block {}", item.block_id),
                ));
                continue;
            };
            let uuid = item
                .uuid
                .unwrap_or_else(|| self.surrogates.uuid_for(&item.original_value, &item.category));
            plans.push(ReplacementPlan {
                detection: Detection {
                    block_id: item.block_id,
                    category: item.category,
                    original_value: item.original_value,
                    span: item.span,
                    confidence: 1.0,
                    source: DetectionSource::Rule,
                    method: "selected".to_string(),
                },
                uuid,
                element: block.element,
            });
        }

        let applier = Applier::new(self.config.highlight_replacements);
        let outcome = applier.apply(&mut model, &plans);
        let package = model.into_package();
        package.save(output)?;

        Ok(RunSummary {
            total_blocks: blocks.len(),
            rule_detections: 0,
            nlp_detections: 0,
            planned: plans.len(),
            applied: outcome.applied.len(),
            skipped: outcome.skipped.len(),
            sweep_replacements: outcome.sweep_replacements,
            metadata_replacements: 0,
            warnings: warnings.len(),
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn enrich(&self, blocks: &[Block], merged: Vec<Detection>) -> Vec<ReplacementPlan> {
        let by_id: HashMap<&str, &Block> =
            blocks.iter().map(|b| (b.block_id.as_str(), b)).collect();
        merged
            .into_iter()
            .filter_map(|detection| {
                let block = by_id.get(detection.block_id.as_str())?;
                let uuid = self
                    .surrogates
                    .uuid_for(&detection.original_value, &detection.category);
                Some(ReplacementPlan {
                    uuid,
                    element: block.element,
                    detection,
                })
            })
            .collect()
    }

    /// Fan the per-block NLP calls out over a bounded task set. A failed
    /// or timed-out call costs only that block's NLP detections.
    async fn run_nlp(
        &self,
        recognizer: Arc<dyn EntityRecognizer>,
        blocks: &[Block],
        shutdown: &watch::Receiver<bool>,
    ) -> (Vec<Detection>, Vec<RunWarning>) {
        let semaphore = Arc::new(Semaphore::new(self.config.nlp.concurrency.max(1)));
        let timeout_ms = self.config.nlp.timeout_ms;
        let mut tasks = JoinSet::new();

        for block in blocks {
            let recognizer = recognizer.clone();
            let semaphore = semaphore.clone();
            let block_id = block.block_id.clone();
            let kind = block.kind;
            let text = block.text.clone();
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(p) => p,
                    Err(_) => return (block_id, Err("semaphore closed".to_string())),
                };
                let call = recognizer.recognize(&block_id, kind, &text);
                match tokio::time::timeout(Duration::from_millis(timeout_ms), call).await {
                    Ok(Ok(detections)) => (block_id, Ok(detections)),
                    Ok(Err(e)) => (block_id, Err(e.to_string())),
                    Err(_) => (block_id, Err(format!("timed out after {timeout_ms} ms"))),
                }
            });
        }

        let by_id: HashMap<&str, &Block> =
            blocks.iter().map(|b| (b.block_id.as_str(), b)).collect();
        let mut detections = Vec::new();
        let mut warnings = Vec::new();
        let mut failed_blocks = 0usize;
        let mut dropped = 0usize;

        while let Some(joined) = tasks.join_next().await {
            if check_cancelled(shutdown).is_err() {
                tasks.abort_all();
                break;
            }
            match joined {
                Ok((block_id, Ok(found))) => {
                    for detection in found {
                        match sanitize_nlp_detection(detection, by_id.get(block_id.as_str())) {
                            Some(d) => detections.push(d),
                            None => dropped += 1,
                        }
                    }
                }
                Ok((block_id, Err(reason))) => {
                    tracing::warn!(block_id = %block_id, reason = %reason, "NLP call failed");
                    failed_blocks += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "NLP task aborted");
                    failed_blocks += 1;
                }
            }
        }

        if failed_blocks > 0 {
            warnings.push(RunWarning::new(
                "nlp_unavailable",
                format!(
                    "NLP endpoint {} failed for {failed_blocks} block(s); those blocks kept rule-only detections",
                    recognizer.endpoint()
                ),
            ));
        }
        if dropped > 0 {
            warnings.push(RunWarning::new(
                "nlp_bad_payload",
                format!("{dropped} NLP detection(s) did not match their block text and were dropped"),
            ));
        }
        (detections, warnings)
    }

    fn write_reports(
        &self,
        paths: &RunPaths,
        outcome: &ApplyOutcome,
        metadata_plans: &[ReplacementPlan],
        warnings: Vec<RunWarning>,
    ) -> Result<()> {
        if self.config.reports.generate_excel_report {
            if let Some(path) = &paths.summary {
                let rows = ReportBuilder::summary(&outcome.applied);
                ReportBuilder::write_summary(path, &rows)?;
            }
        }
        if self.config.reports.generate_json_ledger {
            if let Some(path) = &paths.ledger {
                let mut ledgered = outcome.applied.clone();
                ledgered.extend_from_slice(metadata_plans);
                let ledger =
                    ReportBuilder::ledger(&ledgered, outcome.skipped.clone(), warnings);
                ReportBuilder::write_ledger(path, &ledger)?;
            }
        }
        Ok(())
    }
}

/// Reverse a previous run: load a ledger and replace each surrogate with
/// its original across every paragraph, table and SDT element.
pub fn deanonymize_document(input: &Path, ledger_path: &Path, output: &Path) -> Result<usize> {
    #[derive(Deserialize)]
    struct LedgerFile {
        #[serde(default)]
        replacements: Vec<LedgerPair>,
    }
    #[derive(Deserialize)]
    struct LedgerPair {
        uuid: String,
        original_value: String,
    }

    let content = std::fs::read_to_string(ledger_path)
        .map_err(|e| DocveilError::Io(format!("{}: {e}", ledger_path.display())))?;
    let ledger: LedgerFile = serde_json::from_str(&content)?;

    let package = DocxPackage::open(input)?;
    let mut model = DocumentModel::parse(package)?;
    let mut count = 0usize;

    for part_idx in 0..model.parts().len() {
        let segments: Vec<usize> = model
            .part(part_idx)
            .map(|p| p.slots().map(|(i, _, _)| i).collect())
            .unwrap_or_default();
        for segment in segments {
            for pair in &ledger.replacements {
                let Some(xml) = model
                    .part(part_idx)
                    .and_then(|p| p.slot_xml(segment))
                    .map(str::to_string)
                else {
                    continue;
                };
                let (new_xml, replaced) =
                    replace_all_in_element(&xml, &pair.uuid, &pair.original_value, false);
                if replaced > 0 {
                    if let Some(part) = model.part_mut(part_idx) {
                        part.set_slot_xml(segment, new_xml);
                    }
                    count += replaced;
                }
            }
        }
    }

    model.into_package().save(output)?;
    Ok(count)
}

fn check_cancelled(shutdown: &watch::Receiver<bool>) -> Result<()> {
    if *shutdown.borrow() {
        return Err(DocveilError::Cancelled);
    }
    Ok(())
}

/// Validate an NLP detection against its block: the span must address the
/// reported value over the block's normalised text. A detection whose
/// span is stale is re-anchored by search; one that cannot be anchored is
/// dropped.
fn sanitize_nlp_detection(mut detection: Detection, block: Option<&&Block>) -> Option<Detection> {
    let block = block?;
    let text = &block.text;
    let width = text.chars().count();

    if detection.original_value.is_empty() {
        if detection.span.is_empty() || detection.span.end > width {
            return None;
        }
        detection.original_value = text
            .chars()
            .skip(detection.span.start)
            .take(detection.span.len())
            .collect();
        return Some(detection);
    }

    let span_ok = detection.span.end <= width
        && text
            .chars()
            .skip(detection.span.start)
            .take(detection.span.len())
            .eq(detection.original_value.chars());
    if span_ok {
        return Some(detection);
    }

    let start = char_index_of(text, &detection.original_value)?;
    detection.span = Span::new(start, start + detection.original_value.chars().count());
    Some(detection)
}
