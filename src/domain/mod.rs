//! Core domain types
//!
//! Error hierarchy and the data model shared by every pipeline stage.

pub mod errors;
pub mod models;

pub use errors::{DocumentError, DocveilError, NlpError, Result};
pub use models::{
    Block, BlockKind, Detection, DetectionSource, ElementId, ReplacementPlan, RunWarning,
    SkipReason, SkippedPlan, Span,
};
