//! SDT replacement
//!
//! Structured document tags distribute their visible text across nested
//! text nodes. The walk is the same in-order `w:t` scan used for
//! paragraphs: the first node carrying the literal is rewritten in place,
//! and a literal split across nodes falls back to the shared splice.

use crate::anonymization::applier::paragraph::replace_in_element;
use crate::domain::models::ReplacementPlan;

pub(crate) fn apply_to_sdt(xml: &str, plan: &ReplacementPlan, highlight: bool) -> Option<String> {
    replace_in_element(
        xml,
        &plan.detection.original_value,
        &plan.uuid,
        Some(plan.detection.span),
        highlight,
    )
}
