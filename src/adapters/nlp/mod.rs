//! NLP entity recognizer adapter
//!
//! The free-form entity recognizer is an external collaborator specified
//! only by its per-block contract: one block's text in, zero or more
//! detections with spans over that same text out. Any implementation of
//! [`EntityRecognizer`] honouring the contract is acceptable; the shipped
//! one speaks JSON over HTTP.

pub mod http;
pub mod models;

use crate::config::NlpConfig;
use crate::domain::errors::{DocveilError, NlpError, Result};
use crate::domain::models::{BlockKind, Detection};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub use http::HttpEntityRecognizer;

/// Per-block entity detection contract
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    /// Detect entities in one block's text. Returned spans are zero-based
    /// half-open code-point intervals over `text`.
    async fn recognize(
        &self,
        block_id: &str,
        block_kind: BlockKind,
        text: &str,
    ) -> std::result::Result<Vec<Detection>, NlpError>;

    /// Human-readable endpoint identity, used in warnings
    fn endpoint(&self) -> &str;
}

/// Build a recognizer from configuration; `None` when no endpoint is
/// configured, which disables NLP detection for the run.
pub fn recognizer_from_config(config: &NlpConfig) -> Result<Option<Arc<dyn EntityRecognizer>>> {
    let Some(endpoint) = &config.endpoint else {
        return Ok(None);
    };
    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
        return Err(DocveilError::Configuration(format!(
            "unsupported NLP endpoint '{endpoint}': expected an http(s) URL"
        )));
    }
    let recognizer =
        HttpEntityRecognizer::new(endpoint.clone(), Duration::from_millis(config.timeout_ms))?;
    Ok(Some(Arc::new(recognizer)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_endpoint_disables_recognizer() {
        let config = NlpConfig::default();
        assert!(recognizer_from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_http_endpoint_builds_recognizer() {
        let config = NlpConfig {
            endpoint: Some("http://localhost:8003/analyze".to_string()),
            ..Default::default()
        };
        let recognizer = recognizer_from_config(&config).unwrap().unwrap();
        assert_eq!(recognizer.endpoint(), "http://localhost:8003/analyze");
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let config = NlpConfig {
            endpoint: Some("ftp://nowhere".to_string()),
            ..Default::default()
        };
        assert!(recognizer_from_config(&config).is_err());
    }
}
