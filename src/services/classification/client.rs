// Remote Classifier Client
// Thin wrapper over the inference endpoint. One request per call, no
// batching, no internal retries; retry policy lives in the cold-start
// manager one layer up.

use reqwest::Client;
use serde_json::Value;
use std::time::Instant;
use tracing::debug;

use crate::models::ClassificationResult;
use crate::services::config::ClassifierConfig;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("inference API error: {status} - {body}")]
    Api { status: u16, body: String },
    #[error("unexpected response shape: {0}")]
    Malformed(String),
}

pub struct InferenceClient {
    client: Client,
    config: ClassifierConfig,
}

impl InferenceClient {
    pub fn new(config: ClassifierConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify one sentence against one model. The input is truncated to
    /// the configured word budget before sending.
    pub async fn classify(
        &self,
        model_id: &str,
        sentence: &str,
    ) -> Result<Vec<ClassificationResult>, ClassifierError> {
        let input = truncate_to_budget(sentence, self.config.token_budget);
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), model_id);

        let start = Instant::now();
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_token))
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "inputs": input }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| ClassifierError::Malformed(e.to_string()))?;
        let results = parse_results(&value)?;

        debug!(
            model = model_id,
            latency_ms = start.elapsed().as_millis() as i64,
            results = results.len(),
            "classification call completed"
        );
        Ok(results)
    }
}

/// Keep at most `budget` whitespace-delimited words.
pub fn truncate_to_budget(text: &str, budget: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= budget {
        text.trim().to_string()
    } else {
        words[..budget].join(" ")
    }
}

/// Parse an inference response into ranked results.
///
/// Hate-speech models return a flat array of label/score objects; the
/// language-identification model wraps them in one more array level. Both
/// shapes are accepted; entries that fail to deserialize are skipped rather
/// than failing the whole call.
pub fn parse_results(value: &Value) -> Result<Vec<ClassificationResult>, ClassifierError> {
    let top = value
        .as_array()
        .ok_or_else(|| ClassifierError::Malformed(format!("expected array, got: {}", value)))?;

    let entries: &[Value] = match top.first() {
        Some(Value::Array(inner)) => inner,
        _ => top,
    };

    let results = entries
        .iter()
        .filter_map(|entry| serde_json::from_value::<ClassificationResult>(entry.clone()).ok())
        .collect();
    Ok(results)
}
