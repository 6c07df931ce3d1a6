// Bantay data models
// Wire types for the popup/content-script message contract

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============ Moderation Mode ============

/// Moderation mode selected in the popup. Drives the confidence threshold
/// the aggregator applies when deciding whether a sentence counts as hate
/// speech.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Strict,
    Moderate,
    Free,
}

impl Mode {
    /// Lenient parse of the `setMode` selector string. Unknown selectors fall
    /// back to Moderate.
    pub fn from_selector(val: &str) -> Self {
        match val.trim().to_lowercase().as_str() {
            "strict" => Self::Strict,
            "free" => Self::Free,
            _ => Self::Moderate,
        }
    }

    /// Minimum score a positive-label result needs to count as hate speech.
    pub fn threshold(self) -> f64 {
        match self {
            Self::Strict => 0.6,
            Self::Moderate => 0.8,
            Self::Free => 0.9,
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::Moderate
    }
}

// ============ Language ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageLabel {
    English,
    Tagalog,
}

impl Default for LanguageLabel {
    fn default() -> Self {
        Self::English
    }
}

// ============ Classification Results ============

/// One ranked entry from a remote classification model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationResult {
    pub label: String,
    pub score: f64,
}

/// Sentence -> ranked results, accumulated across one scan.
pub type HateSpeechMap = HashMap<String, Vec<ClassificationResult>>;

// ============ Scan Outcome ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScanStatus {
    Success,
    ColdStart,
    MaxAttempts,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HateSpeechCounts {
    pub english_hate_count: i32,
    pub tagalog_hate_count: i32,
}

impl HateSpeechCounts {
    pub fn total(&self) -> i32 {
        self.english_hate_count + self.tagalog_hate_count
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub scan_id: String,
    pub scan_result: ScanStatus,
    pub detected_hate_speeches: HateSpeechCounts,
    #[serde(default)]
    pub hate_speech_map: HateSpeechMap,
    /// All sentences that survived normalization for this scan.
    #[serde(default)]
    pub sentences: Vec<String>,
}

impl ScanResponse {
    /// Response shape for scans that never produced results (cold start or
    /// terminal failure).
    pub fn failed(scan_id: String, status: ScanStatus) -> Self {
        Self {
            scan_id,
            scan_result: status,
            detected_hate_speeches: HateSpeechCounts::default(),
            hate_speech_map: HateSpeechMap::new(),
            sentences: Vec::new(),
        }
    }
}

/// Real-time (single sentence) classification outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentencePrediction {
    pub status: ScanStatus,
    pub language: LanguageLabel,
    #[serde(default)]
    pub prediction: Vec<ClassificationResult>,
}

// ============ Message Contract ============

/// Requests the popup/content-script layer sends to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    ScanPage { html: String },
    ProcessSentence { sentence: String },
    SetMode { mode: String },
    ToggleObserver { enabled: bool },
    /// Newly inserted DOM subtrees, forwarded by the content script's
    /// mutation callback while the observer is enabled.
    #[serde(rename_all = "camelCase")]
    MutationBatch { inserted_html: Vec<String> },
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response {
    Scan(ScanResponse),
    Prediction(SentencePrediction),
    ModeSet { mode: Mode },
    Observer { enabled: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_selector_parsing() {
        assert_eq!(Mode::from_selector("strict"), Mode::Strict);
        assert_eq!(Mode::from_selector(" FREE "), Mode::Free);
        assert_eq!(Mode::from_selector("moderate"), Mode::Moderate);
        assert_eq!(Mode::from_selector("banana"), Mode::Moderate);
    }

    #[test]
    fn test_mode_thresholds() {
        assert_eq!(Mode::Strict.threshold(), 0.6);
        assert_eq!(Mode::Moderate.threshold(), 0.8);
        assert_eq!(Mode::Free.threshold(), 0.9);
    }

    #[test]
    fn test_scan_status_wire_format() {
        let json = serde_json::to_string(&ScanStatus::ColdStart).unwrap();
        assert_eq!(json, "\"coldStart\"");
        let json = serde_json::to_string(&ScanStatus::MaxAttempts).unwrap();
        assert_eq!(json, "\"maxAttempts\"");
    }

    #[test]
    fn test_counts_serialize_camel_case() {
        let counts = HateSpeechCounts {
            english_hate_count: 2,
            tagalog_hate_count: 1,
        };
        let json = serde_json::to_value(&counts).unwrap();
        assert_eq!(json["englishHateCount"], 2);
        assert_eq!(json["tagalogHateCount"], 1);
    }

    #[test]
    fn test_request_action_tag() {
        let req: Request =
            serde_json::from_str(r#"{"action":"setMode","mode":"strict"}"#).unwrap();
        match req {
            Request::SetMode { mode } => assert_eq!(mode, "strict"),
            other => panic!("unexpected request: {:?}", other),
        }
    }
}
