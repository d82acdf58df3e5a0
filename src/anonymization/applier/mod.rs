//! Formatting-preserving replacement application
//!
//! Groups plans by block, applies them within each block in descending
//! span order (left spans stay valid while the right side changes), and
//! dispatches on the element kind. A final sweep revisits every header
//! and footer paragraph with the full `original → uuid` table, because
//! section headers repeat on every page and the same literal may appear
//! in elements the per-block traversal did not address.

mod paragraph;
mod sdt;
mod table;

pub(crate) use self::paragraph::{replace_all_in_element, replace_in_element};

use self::table::TableApply;
use crate::docx::part::{DocumentModel, PartKind, SlotKind};
use crate::domain::models::{ElementId, ReplacementPlan, SkipReason, SkippedPlan};
use std::collections::HashSet;

/// Result of one application pass
#[derive(Debug, Default)]
pub struct ApplyOutcome {
    /// Plans written into the document, in application order
    pub applied: Vec<ReplacementPlan>,
    /// Plans recorded as skipped with their reason
    pub skipped: Vec<SkippedPlan>,
    /// Extra replacements made by the header/footer sweep
    pub sweep_replacements: usize,
}

/// Writes replacement plans into the document model
pub struct Applier {
    highlight: bool,
}

impl Applier {
    pub fn new(highlight: bool) -> Self {
        Self { highlight }
    }

    /// Apply every plan, then run the header/footer fallback sweep.
    /// Per-replacement failures are soft: the plan is recorded as skipped
    /// and the run continues.
    pub fn apply(&self, model: &mut DocumentModel, plans: &[ReplacementPlan]) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();
        // (part, segment, original) pairs already written, so the sweep
        // does not revisit them
        let mut applied_targets: HashSet<(usize, usize, String)> = HashSet::new();

        for group in group_by_block(plans) {
            let mut ordered = group;
            ordered.sort_by(|a, b| b.detection.span.start.cmp(&a.detection.span.start));

            let before = outcome.applied.len();
            for plan in ordered {
                self.apply_one(model, plan, &mut outcome, &mut applied_targets);
            }
            // replacements are applied right-to-left; the visible order
            // follows span order
            outcome.applied[before..].sort_by_key(|p| p.detection.span.start);
        }

        outcome.sweep_replacements = self.fallback_sweep(model, plans, &applied_targets);
        outcome
    }

    fn apply_one(
        &self,
        model: &mut DocumentModel,
        plan: &ReplacementPlan,
        outcome: &mut ApplyOutcome,
        applied_targets: &mut HashSet<(usize, usize, String)>,
    ) {
        let part_idx = plan.element.part();
        let segment = plan.element.segment();
        let Some(xml) = model
            .part(part_idx)
            .and_then(|p| p.slot_xml(segment))
            .map(str::to_string)
        else {
            outcome.skipped.push(skip(plan, SkipReason::TextNotFound));
            return;
        };

        let original = &plan.detection.original_value;
        let result = match plan.element {
            ElementId::Paragraph { .. } => replace_in_element(
                &xml,
                original,
                &plan.uuid,
                Some(plan.detection.span),
                self.highlight,
            )
            .ok_or(SkipReason::TextNotFound),
            ElementId::Table { .. } => match table::apply_to_table(&xml, plan, self.highlight) {
                TableApply::Applied(new_xml) => Ok(new_xml),
                TableApply::Skipped(reason) => Err(reason),
            },
            ElementId::Sdt { .. } => {
                sdt::apply_to_sdt(&xml, plan, self.highlight).ok_or(SkipReason::TextNotFound)
            }
        };

        match result {
            Ok(new_xml) => {
                if let Some(part) = model.part_mut(part_idx) {
                    part.set_slot_xml(segment, new_xml);
                }
                applied_targets.insert((part_idx, segment, original.clone()));
                outcome.applied.push(plan.clone());
            }
            Err(reason) => {
                tracing::warn!(
                    block_id = %plan.detection.block_id,
                    original = %original,
                    reason = ?reason,
                    "Replacement skipped"
                );
                outcome.skipped.push(skip(plan, reason));
            }
        }
    }

    /// Revisit every header/footer paragraph with each not-yet-applied
    /// `(original → uuid)` pair. Re-running over an already rewritten
    /// paragraph is idempotent because the surrogate differs from the
    /// original.
    fn fallback_sweep(
        &self,
        model: &mut DocumentModel,
        plans: &[ReplacementPlan],
        applied_targets: &HashSet<(usize, usize, String)>,
    ) -> usize {
        let mut pairs: Vec<(String, String)> = Vec::new();
        for plan in plans {
            let pair = (plan.detection.original_value.clone(), plan.uuid.clone());
            // a literal contained in its own surrogate would corrupt
            // insertions made by the main pass
            if pair.1.contains(&pair.0) {
                continue;
            }
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
        if pairs.is_empty() {
            return 0;
        }

        let hf_parts: Vec<usize> = model
            .parts()
            .iter()
            .enumerate()
            .filter(|(_, p)| matches!(p.kind, PartKind::Header(_) | PartKind::Footer(_)))
            .map(|(i, _)| i)
            .collect();

        let mut count = 0usize;
        for part_idx in hf_parts {
            let segments: Vec<usize> = model
                .part(part_idx)
                .map(|p| {
                    p.slots()
                        .filter(|(_, kind, _)| *kind == SlotKind::Paragraph)
                        .map(|(i, _, _)| i)
                        .collect()
                })
                .unwrap_or_default();

            for segment in segments {
                for (original, uuid) in &pairs {
                    if applied_targets.contains(&(part_idx, segment, original.clone())) {
                        continue;
                    }
                    let Some(xml) = model
                        .part(part_idx)
                        .and_then(|p| p.slot_xml(segment))
                        .map(str::to_string)
                    else {
                        continue;
                    };
                    let (new_xml, replaced) =
                        replace_all_in_element(&xml, original, uuid, self.highlight);
                    if replaced > 0 {
                        if let Some(part) = model.part_mut(part_idx) {
                            part.set_slot_xml(segment, new_xml);
                        }
                        count += replaced;
                    }
                }
            }
        }
        count
    }
}

fn skip(plan: &ReplacementPlan, reason: SkipReason) -> SkippedPlan {
    SkippedPlan {
        block_id: plan.detection.block_id.clone(),
        original_value: plan.detection.original_value.clone(),
        uuid: plan.uuid.clone(),
        reason,
    }
}

/// Group plans by block id, preserving first-seen block order
fn group_by_block(plans: &[ReplacementPlan]) -> Vec<Vec<&ReplacementPlan>> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: std::collections::HashMap<&str, Vec<&ReplacementPlan>> =
        std::collections::HashMap::new();
    for plan in plans {
        let id = plan.detection.block_id.as_str();
        if !groups.contains_key(id) {
            order.push(id);
        }
        groups.entry(id).or_default().push(plan);
    }
    order
        .into_iter()
        .filter_map(|id| groups.remove(id))
        .collect()
}
