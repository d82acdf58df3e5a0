//! Anonymization pipeline
//!
//! The core of the crate: block extraction ([`blocks`]), the rule
//! catalogue and detector ([`patterns`], [`detector`]), overlap
//! resolution ([`merge`]), deterministic surrogates ([`surrogate`]), the
//! formatting-preserving applier ([`applier`]), run reporting
//! ([`report`]) and the orchestrating engine ([`engine`]).

pub mod applier;
pub mod blocks;
pub mod detector;
pub mod engine;
pub mod merge;
pub mod metadata;
pub mod patterns;
pub mod report;
pub mod surrogate;

pub use applier::{Applier, ApplyOutcome};
pub use blocks::BlockBuilder;
pub use detector::RuleDetector;
pub use engine::{deanonymize_document, AnonymizationEngine, PlanInput, RunPaths, RunSummary};
pub use merge::DetectionMerger;
pub use patterns::PatternStore;
pub use report::{ChangeLedger, ReportBuilder, SummaryRow};
pub use surrogate::SurrogateMapper;
