//! Detection merging
//!
//! Unions rule and NLP detections per block and resolves overlaps into a
//! pairwise-disjoint set. When a rule detection overlaps an NLP detection
//! the NLP one wins; same-source overlaps are resolved by confidence, then
//! span width, then method tag. The ranking is applied in one greedy pass,
//! so any two surviving detections of a block have disjoint spans.

use crate::domain::models::{Block, Detection, DetectionSource};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Resolves overlapping detections into the final replacement set
pub struct DetectionMerger;

impl DetectionMerger {
    /// Merge all detections, returning them ordered by block traversal
    /// order and ascending span start within each block.
    pub fn merge(blocks: &[Block], detections: Vec<Detection>) -> Vec<Detection> {
        let block_order: HashMap<&str, usize> = blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.block_id.as_str(), i))
            .collect();

        let mut per_block: HashMap<String, Vec<Detection>> = HashMap::new();
        for d in detections {
            per_block.entry(d.block_id.clone()).or_default().push(d);
        }

        let mut merged = Vec::new();
        let mut block_ids: Vec<String> = per_block.keys().cloned().collect();
        block_ids.sort_by_key(|id| block_order.get(id.as_str()).copied().unwrap_or(usize::MAX));

        for id in block_ids {
            let mut candidates = per_block.remove(&id).unwrap_or_default();
            candidates.sort_by(rank);

            let mut accepted: Vec<Detection> = Vec::new();
            for candidate in candidates {
                if accepted.iter().any(|a| a.span.intersects(&candidate.span)) {
                    continue;
                }
                accepted.push(candidate);
            }
            accepted.sort_by_key(|d| d.span.start);
            merged.extend(accepted);
        }
        merged
    }
}

/// NLP before rule, then higher confidence, then wider span, then the
/// lexicographically smaller method tag
fn rank(a: &Detection, b: &Detection) -> Ordering {
    source_rank(a.source)
        .cmp(&source_rank(b.source))
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| b.span.len().cmp(&a.span.len()))
        .then_with(|| a.method.cmp(&b.method))
}

fn source_rank(source: DetectionSource) -> u8 {
    match source {
        DetectionSource::Nlp => 0,
        DetectionSource::Rule => 1,
    }
}
