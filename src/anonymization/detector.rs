//! Rule-based detection
//!
//! Scans every block's text with the loaded catalogue. Rules run
//! independently; overlapping matches all survive this layer and are
//! resolved by the merger.

use crate::anonymization::patterns::PatternStore;
use crate::domain::models::{Block, Detection, DetectionSource, Span};
use std::sync::Arc;

/// Regex detector over the pattern catalogue
pub struct RuleDetector {
    store: Arc<PatternStore>,
}

impl RuleDetector {
    pub fn new(store: Arc<PatternStore>) -> Self {
        Self { store }
    }

    /// All rule matches within one block
    pub fn detect_block(&self, block: &Block) -> Vec<Detection> {
        let mut detections = Vec::new();
        for rule in self.store.rules() {
            for m in rule.regex.find_iter(&block.text) {
                detections.push(Detection {
                    block_id: block.block_id.clone(),
                    category: rule.category.clone(),
                    original_value: m.as_str().to_string(),
                    span: byte_to_char_span(&block.text, m.start(), m.end()),
                    confidence: rule.confidence,
                    source: DetectionSource::Rule,
                    method: "regex".to_string(),
                });
            }
        }
        detections
    }

    /// Rule matches across all blocks, in block order
    pub fn detect(&self, blocks: &[Block]) -> Vec<Detection> {
        blocks.iter().flat_map(|b| self.detect_block(b)).collect()
    }
}

/// Convert a regex byte range into a code-point span
fn byte_to_char_span(text: &str, start: usize, end: usize) -> Span {
    let char_start = text[..start].chars().count();
    let char_end = char_start + text[start..end].chars().count();
    Span::new(char_start, char_end)
}
