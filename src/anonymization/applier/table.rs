//! Table replacement
//!
//! Rebuilds the same `" | "` / `"\n"` projection the block builder
//! published, locates the cell owning the plan's span, and runs the
//! paragraph routine inside that cell. Detections are produced per block
//! text, so a span that straddles a cell separator cannot be applied and
//! is skipped with a structured warning.

use crate::anonymization::applier::paragraph::replace_in_element;
use crate::anonymization::blocks::project_table;
use crate::docx::text::element_ranges;
use crate::domain::models::{ReplacementPlan, SkipReason};

/// Outcome of routing one plan into a table slot
pub(crate) enum TableApply {
    Applied(String),
    Skipped(SkipReason),
}

pub(crate) fn apply_to_table(xml: &str, plan: &ReplacementPlan, highlight: bool) -> TableApply {
    let projection = project_table(xml);
    let span = plan.detection.span;

    let cell = match projection.cell_at(span.start) {
        Some(c) => c.clone(),
        None => return TableApply::Skipped(SkipReason::TextNotFound),
    };
    if span.end > cell.end {
        return TableApply::Skipped(SkipReason::CellBoundary);
    }

    let original = &plan.detection.original_value;
    let cell_xml = &xml[cell.range.clone()];
    let mut new_cell = cell_xml.to_string();
    let mut replaced = false;

    // rewrite every cell paragraph that carries the literal; reverse order
    // keeps the remaining paragraph ranges valid
    for pr in element_ranges(cell_xml, b"p").into_iter().rev() {
        if let Some(new_para) =
            replace_in_element(&cell_xml[pr.clone()], original, &plan.uuid, None, highlight)
        {
            new_cell.replace_range(pr, &new_para);
            replaced = true;
        }
    }

    if !replaced {
        return TableApply::Skipped(SkipReason::TextNotFound);
    }

    let mut new_table = xml.to_string();
    new_table.replace_range(cell.range, &new_cell);
    TableApply::Applied(new_table)
}
