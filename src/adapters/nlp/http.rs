//! HTTP entity recognizer
//!
//! Speaks the per-block detection protocol against a remote NLP service.
//! Every call submits exactly one block, which keeps the returned spans
//! local to that block's text and the element behind it.

use super::models::{NlpRequest, NlpRequestBlock, NlpResponse};
use super::EntityRecognizer;
use crate::domain::errors::NlpError;
use crate::domain::models::{BlockKind, Detection, DetectionSource, Span};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Recognizer backed by an HTTP endpoint
pub struct HttpEntityRecognizer {
    endpoint: String,
    timeout_ms: u64,
    client: reqwest::Client,
}

impl HttpEntityRecognizer {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, NlpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NlpError::Transport(e.to_string()))?;
        Ok(Self {
            endpoint,
            timeout_ms: timeout.as_millis() as u64,
            client,
        })
    }
}

#[async_trait]
impl EntityRecognizer for HttpEntityRecognizer {
    async fn recognize(
        &self,
        block_id: &str,
        block_kind: BlockKind,
        text: &str,
    ) -> Result<Vec<Detection>, NlpError> {
        let request = NlpRequest {
            blocks: vec![NlpRequestBlock {
                content: text.to_string(),
                block_id: block_id.to_string(),
                block_type: block_kind.as_str().to_string(),
            }],
            options: HashMap::new(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NlpError::Timeout {
                        endpoint: self.endpoint.clone(),
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    NlpError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NlpError::Rejected(format!("HTTP {status}")));
        }

        let payload: NlpResponse = response
            .json()
            .await
            .map_err(|e| NlpError::Payload(e.to_string()))?;
        if !payload.success {
            return Err(NlpError::Rejected(
                payload.error.unwrap_or_else(|| "unspecified failure".to_string()),
            ));
        }

        Ok(payload
            .detections
            .into_iter()
            .map(|entity| Detection {
                block_id: block_id.to_string(),
                category: entity.category.to_lowercase(),
                original_value: entity.original_value,
                span: Span::new(entity.position.start, entity.position.end),
                confidence: entity.confidence.clamp(0.0, 1.0),
                source: DetectionSource::Nlp,
                method: entity.method,
            })
            .collect())
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
