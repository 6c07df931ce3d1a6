// Language Router
// Classifies each sentence's language through the remote language-id model
// and partitions batches into per-language groups for model routing.

use std::sync::Arc;
use tracing::warn;

use crate::models::{ClassificationResult, LanguageLabel};

use super::client::InferenceClient;
use super::throttle::run_throttled;

#[derive(Clone)]
pub struct LanguageRouter {
    client: Arc<InferenceClient>,
    concurrency_limit: usize,
}

impl LanguageRouter {
    pub fn new(client: Arc<InferenceClient>, concurrency_limit: usize) -> Self {
        Self {
            client,
            concurrency_limit,
        }
    }

    /// Detect one sentence's language. Detection failures are swallowed
    /// here deliberately: an unreadable result routes to the English model
    /// rather than failing the scan.
    pub async fn detect(&self, sentence: &str) -> LanguageLabel {
        let model = self.client.config().language_model.clone();
        match self.client.classify(&model, sentence).await {
            Ok(results) => self.label_for(&results),
            Err(e) => {
                warn!("language detection failed, defaulting to english: {}", e);
                LanguageLabel::English
            }
        }
    }

    /// Map the top-ranked detection entry to a language label. Anything
    /// other than a recognized token defaults to English.
    pub fn label_for(&self, results: &[ClassificationResult]) -> LanguageLabel {
        let config = self.client.config();
        match results.first() {
            Some(top) if top.label == config.tagalog_language_token => LanguageLabel::Tagalog,
            _ => LanguageLabel::English,
        }
    }

    /// Batch mode: detect every sentence (throttled) and split into
    /// English/Tagalog groups, preserving relative order within each group.
    pub async fn partition(&self, sentences: &[String]) -> (Vec<String>, Vec<String>) {
        let tasks: Vec<_> = sentences
            .iter()
            .cloned()
            .map(|sentence| {
                let router = self.clone();
                async move { router.detect(&sentence).await }
            })
            .collect();
        let labels = run_throttled(tasks, self.concurrency_limit).await;

        let mut english = Vec::new();
        let mut tagalog = Vec::new();
        for (sentence, label) in sentences.iter().zip(labels) {
            match label {
                LanguageLabel::English => english.push(sentence.clone()),
                LanguageLabel::Tagalog => tagalog.push(sentence.clone()),
            }
        }
        (english, tagalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::config::ClassifierConfig;

    fn router() -> LanguageRouter {
        let client = Arc::new(InferenceClient::new(ClassifierConfig::default()));
        LanguageRouter::new(client, 5)
    }

    fn result(label: &str, score: f64) -> ClassificationResult {
        ClassificationResult {
            label: label.to_string(),
            score,
        }
    }

    #[test]
    fn test_recognized_tokens_route_correctly() {
        let r = router();
        assert_eq!(r.label_for(&[result("tl", 0.97)]), LanguageLabel::Tagalog);
        assert_eq!(r.label_for(&[result("en", 0.98)]), LanguageLabel::English);
    }

    #[test]
    fn test_unrecognized_label_defaults_to_english() {
        let r = router();
        assert_eq!(r.label_for(&[result("fr", 0.99)]), LanguageLabel::English);
    }

    #[test]
    fn test_missing_results_default_to_english() {
        let r = router();
        assert_eq!(r.label_for(&[]), LanguageLabel::English);
    }

    #[tokio::test]
    async fn test_detect_failure_defaults_to_english() {
        // Unreachable endpoint: the transport error must be swallowed.
        let config = ClassifierConfig {
            base_url: "http://127.0.0.1:9/models".to_string(),
            ..ClassifierConfig::default()
        };
        let client = Arc::new(InferenceClient::new(config));
        let r = LanguageRouter::new(client, 5);
        assert_eq!(r.detect("kumusta ka na").await, LanguageLabel::English);
    }
}
