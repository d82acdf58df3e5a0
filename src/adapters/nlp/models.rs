//! NLP recognizer wire models
//!
//! Request and response shapes of the per-block detection protocol.
//! Positions are zero-based half-open intervals over the submitted
//! content.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Detection request: a list of blocks plus an options map
#[derive(Debug, Clone, Serialize)]
pub struct NlpRequest {
    pub blocks: Vec<NlpRequestBlock>,
    #[serde(default)]
    pub options: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NlpRequestBlock {
    pub content: String,
    pub block_id: String,
    pub block_type: String,
}

/// Detection response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct NlpResponse {
    pub success: bool,
    #[serde(default)]
    pub detections: Vec<NlpEntity>,
    #[serde(default)]
    pub total_detections: usize,
    #[serde(default)]
    pub blocks_processed: usize,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NlpEntity {
    pub category: String,
    pub original_value: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    pub position: NlpPosition,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub block_id: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NlpPosition {
    pub start: usize,
    pub end: usize,
}

fn default_confidence() -> f64 {
    0.5
}

fn default_method() -> String {
    "ner".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_deserialization_with_defaults() {
        let json = r#"{
            "success": true,
            "detections": [{
                "category": "person_name",
                "original_value": "Иван Петров",
                "confidence": 0.8,
                "position": {"start": 0, "end": 11},
                "method": "ner",
                "block_id": "paragraph_0"
            }],
            "total_detections": 1,
            "blocks_processed": 1
        }"#;
        let response: NlpResponse = serde_json::from_str(json).unwrap();
        assert!(response.success);
        assert_eq!(response.detections.len(), 1);
        assert_eq!(response.detections[0].position.end, 11);
    }

    #[test]
    fn test_missing_optional_fields() {
        let json = r#"{
            "success": true,
            "detections": [{
                "category": "org",
                "original_value": "x",
                "position": {"start": 0, "end": 1}
            }]
        }"#;
        let response: NlpResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.detections[0].method, "ner");
        assert_eq!(response.detections[0].confidence, 0.5);
    }

    #[test]
    fn test_request_serialization() {
        let request = NlpRequest {
            blocks: vec![NlpRequestBlock {
                content: "текст".to_string(),
                block_id: "paragraph_3".to_string(),
                block_type: "paragraph".to_string(),
            }],
            options: HashMap::new(),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"block_id\":\"paragraph_3\""));
        assert!(json.contains("\"block_type\":\"paragraph\""));
    }
}
