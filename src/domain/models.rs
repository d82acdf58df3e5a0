//! Core data model for the anonymization pipeline
//!
//! Blocks, detections and replacement plans are immutable once produced;
//! the parsed document model is mutated only by the applier.

use serde::{Deserialize, Serialize};

/// Half-open `[start, end)` interval in code points over a block's
/// normalised text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Width of the span in code points
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True when the span covers nothing
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// True when the two spans share at least one position
    pub fn intersects(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Kind of structural element a block was cut from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    Table,
    Header,
    Footer,
    HeaderSdt,
    FooterSdt,
}

impl BlockKind {
    /// Wire label used in block ids and the NLP protocol
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Table => "table",
            Self::Header => "header",
            Self::Footer => "footer",
            Self::HeaderSdt => "header_sdt",
            Self::FooterSdt => "footer_sdt",
        }
    }
}

/// Arena index of the structural element that produced a block
///
/// `part` and `segment` resolve against the parsed document model
/// (`docx::part::DocumentModel`). Keeping an index instead of a borrowed
/// node removes the lifetime cycle between detections and the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum ElementId {
    Paragraph { part: usize, segment: usize },
    Table { part: usize, segment: usize },
    Sdt { part: usize, segment: usize },
}

impl ElementId {
    /// Index of the owning part
    pub fn part(&self) -> usize {
        match self {
            Self::Paragraph { part, .. } | Self::Table { part, .. } | Self::Sdt { part, .. } => {
                *part
            }
        }
    }

    /// Index of the element slot within its part
    pub fn segment(&self) -> usize {
        match self {
            Self::Paragraph { segment, .. }
            | Self::Table { segment, .. }
            | Self::Sdt { segment, .. } => *segment,
        }
    }
}

/// A unit of text extracted from the document together with a handle back
/// to its source element
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    /// Unique within one document; the format encodes the origin
    /// (`paragraph_3`, `table_0`, `header_0_1`, `footer_sdt_0_0`, ...)
    pub block_id: String,
    /// Normalised plain-text projection of the element
    pub text: String,
    /// Element kind
    pub kind: BlockKind,
    /// Arena handle of the originating element
    pub element: ElementId,
}

/// Where a detection came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    Rule,
    Nlp,
}

impl DetectionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::Nlp => "nlp",
        }
    }
}

/// A located sensitive span within one block's text
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub block_id: String,
    /// Free-form category label (`person_name`, `inn`, `organization`, ...)
    pub category: String,
    /// Exactly `block.text[span.start..span.end]` at merge time
    pub original_value: String,
    pub span: Span,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    pub source: DetectionSource,
    /// Tag of the matcher variant (`regex`, recognizer-specific tags, ...)
    pub method: String,
}

/// A detection enriched with its surrogate and element handle, ready to
/// be applied
#[derive(Debug, Clone)]
pub struct ReplacementPlan {
    pub detection: Detection,
    /// Canonical hyphenated v5 UUID surrogate
    pub uuid: String,
    /// Inherited from the originating block
    pub element: ElementId,
}

/// Why a plan could not be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The element's recomputed text no longer contains the literal
    TextNotFound,
    /// The span straddles a table cell boundary
    CellBoundary,
}

/// Record of a plan that was skipped instead of applied
#[derive(Debug, Clone, Serialize)]
pub struct SkippedPlan {
    pub block_id: String,
    pub original_value: String,
    pub uuid: String,
    pub reason: SkipReason,
}

/// Warning surfaced into the run ledger
#[derive(Debug, Clone, Serialize)]
pub struct RunWarning {
    /// Stable machine-readable code (`invalid_pattern`, `nlp_unavailable`, ...)
    pub code: String,
    pub message: String,
}

impl RunWarning {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
