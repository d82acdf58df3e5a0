// Docveil - DOCX De-identification Pipeline
// Copyright (c) 2026 Docveil Contributors
// Licensed under the MIT License

//! # Docveil - DOCX de-identification
//!
//! Docveil locates sensitive spans in Office Open XML word-processing
//! documents and replaces them in place with deterministic version-5 UUID
//! surrogates, preserving paragraph structure, tables, headers/footers
//! and per-run formatting.
//!
//! ## Architecture
//!
//! The pipeline runs `document → blocks → detections → plans → document′`:
//!
//! - [`docx`] - container I/O and the WordprocessingML element arena
//! - [`anonymization`] - block builder, detectors, merger, surrogate
//!   mapper, applier, reports and the orchestrating engine
//! - [`adapters`] - the external NLP entity recognizer
//! - [`config`] - configuration schema and loader
//! - [`domain`] - core types and the error hierarchy
//! - [`logging`] - structured logging setup
//! - [`cli`] - command-line interface
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use docveil::anonymization::{AnonymizationEngine, RunPaths};
//! use docveil::config::DocveilConfig;
//! use docveil::domain::Result;
//! use std::path::Path;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let engine = AnonymizationEngine::new(DocveilConfig::default())?;
//!     let (_tx, shutdown) = watch::channel(false);
//!     let summary = engine
//!         .anonymize_document(
//!             Path::new("contract.docx"),
//!             Path::new("anonymized.docx"),
//!             &RunPaths::default(),
//!             shutdown,
//!         )
//!         .await?;
//!     println!("replaced {} span(s)", summary.applied);
//!     Ok(())
//! }
//! ```
//!
//! Surrogates are a pure function of `(original, category)`, so the same
//! token maps to the same identifier across documents and runs; the
//! change ledger written next to the output is sufficient to reverse a
//! run with [`anonymization::deanonymize_document`].

pub mod adapters;
pub mod anonymization;
pub mod cli;
pub mod config;
pub mod docx;
pub mod domain;
pub mod logging;
