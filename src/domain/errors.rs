//! Domain error types
//!
//! Error hierarchy for the anonymization pipeline. All errors are
//! domain-specific and don't expose third-party types.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, DocveilError>;

/// Main docveil error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum DocveilError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input document errors (corrupt archive, malformed XML, missing parts)
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// NLP recognizer errors
    #[error("NLP error: {0}")]
    Nlp(#[from] NlpError),

    /// Pattern catalogue errors
    #[error("Pattern error: {0}")]
    Pattern(String),

    /// Output artefact errors (document, summary, ledger)
    #[error("Output error: {0}")]
    Output(String),

    /// Run aborted by a cancellation signal
    #[error("Run cancelled")]
    Cancelled,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Input-document errors
///
/// Raised while reading the OOXML container or parsing WordprocessingML
/// parts. These fail the run before any output is written.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Archive cannot be opened or read
    #[error("Unreadable archive: {0}")]
    UnreadableArchive(String),

    /// A required part is absent from the container
    #[error("Missing document part: {0}")]
    MissingPart(String),

    /// A part is not valid UTF-8 / XML
    #[error("Malformed XML in {part}: {detail}")]
    MalformedXml { part: String, detail: String },
}

/// NLP recognizer errors
///
/// Per-block soft failures: the engine downgrades these to run warnings
/// and continues with rule-only detections for the affected block.
#[derive(Debug, Error)]
pub enum NlpError {
    /// The per-call timeout expired
    #[error("request to {endpoint} timed out after {timeout_ms} ms")]
    Timeout { endpoint: String, timeout_ms: u64 },

    /// Transport-level failure (connection refused, DNS, TLS)
    #[error("transport failure: {0}")]
    Transport(String),

    /// The response body could not be decoded or is inconsistent
    #[error("bad payload: {0}")]
    Payload(String),

    /// The recognizer answered but reported failure
    #[error("recognizer rejected the request: {0}")]
    Rejected(String),
}

impl From<std::io::Error> for DocveilError {
    fn from(err: std::io::Error) -> Self {
        DocveilError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DocveilError {
    fn from(err: serde_json::Error) -> Self {
        DocveilError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for DocveilError {
    fn from(err: toml::de::Error) -> Self {
        DocveilError::Configuration(format!("TOML parse error: {err}"))
    }
}
