// Pipeline configuration
// All heuristically tuned constants live here so entry points share one
// pipeline instead of re-implementing selector lists and thresholds.

use std::env;
use std::time::Duration;

const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co/models";

const DEFAULT_ENGLISH_HATE_MODEL: &str = "Hate-speech-CNERG/dehatebert-mono-english";
const DEFAULT_TAGALOG_HATE_MODEL: &str = "ggpt1006/tl-hatespeech-bert";
const DEFAULT_LANGUAGE_MODEL: &str = "papluca/xlm-roberta-base-language-detection";

/// Which elements the extractor reads, and which chrome subtrees it skips.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Content-bearing elements captured directly.
    pub content_tags: Vec<String>,
    /// Elements captured only when carrying `dir="auto"` (comment containers
    /// on social feeds).
    pub auto_dir_tags: Vec<String>,
    /// Subtrees never descended into.
    pub excluded_tags: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            content_tags: str_vec(&[
                "p", "h1", "h2", "h3", "h4", "h5", "h6", "span", "li", "blockquote",
            ]),
            auto_dir_tags: str_vec(&["div"]),
            excluded_tags: str_vec(&[
                "nav", "footer", "header", "aside", "button", "script", "style", "noscript",
            ]),
        }
    }
}

/// Validity thresholds and exclusion lists for candidate sentences.
///
/// The numeric defaults (0.3 non-alpha ratio, repetition 5, opaque token 10)
/// are tuned heuristics; they are configuration, not derived semantics.
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    pub min_word_count: usize,
    pub max_non_alpha_ratio: f64,
    pub repetition_threshold: usize,
    pub opaque_token_min_len: usize,
    /// Literal phrases (already lower-cased) dropped outright.
    pub exclusion_literals: Vec<String>,
    /// Regex sources matched against the normalized sentence.
    pub exclusion_patterns: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            min_word_count: 3,
            max_non_alpha_ratio: 0.3,
            repetition_threshold: 5,
            opaque_token_min_len: 10,
            exclusion_literals: str_vec(&[
                "view more comments",
                "view more replies",
                "see more",
                "see translation",
                "log in",
                "sign up",
                "sponsored",
                "suggested for you",
            ]),
            exclusion_patterns: str_vec(&[
                // Relative timestamps: "2 hrs ago", "5m", "3 days"
                r"^\d+\s*(s|m|h|d|w|y|sec|min|hr|hrs|second|minute|hour|day|week|month|year)s?(\s+ago)?$",
                // Reaction counters: "12 likes", "3 shares 1 comment"
                r"^\d+\s+(like|share|comment|repl(y|ies)|view)s?\b",
            ]),
        }
    }
}

/// Remote inference endpoint settings shared by all model calls.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub base_url: String,
    pub api_token: String,
    /// Maximum whitespace-delimited words sent per request.
    pub token_budget: usize,
    pub request_timeout: Duration,
    pub english_hate_model: String,
    pub tagalog_hate_model: String,
    pub language_model: String,
    /// Positive-class label token per hate-speech model.
    pub english_hate_label: String,
    pub tagalog_hate_label: String,
    /// Label tokens the language-identification model emits.
    pub english_language_token: String,
    pub tagalog_language_token: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: env::var("BANTAY_API_URL")
                .unwrap_or_else(|_| DEFAULT_INFERENCE_URL.to_string()),
            api_token: env::var("BANTAY_API_TOKEN").unwrap_or_default(),
            token_budget: 512,
            request_timeout: Duration::from_secs(60),
            english_hate_model: DEFAULT_ENGLISH_HATE_MODEL.to_string(),
            tagalog_hate_model: DEFAULT_TAGALOG_HATE_MODEL.to_string(),
            language_model: DEFAULT_LANGUAGE_MODEL.to_string(),
            english_hate_label: "HATE".to_string(),
            tagalog_hate_label: "LABEL_1".to_string(),
            english_language_token: "en".to_string(),
            tagalog_language_token: "tl".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub extractor: ExtractorConfig,
    pub normalizer: NormalizerConfig,
    pub classifier: ClassifierConfig,
    /// Maximum simultaneously outstanding classifier requests.
    pub concurrency_limit: usize,
    /// How long a cold-started scan waits before reporting `coldStart`.
    pub cold_start_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extractor: ExtractorConfig::default(),
            normalizer: NormalizerConfig::default(),
            classifier: ClassifierConfig::default(),
            concurrency_limit: 5,
            cold_start_delay: Duration::from_secs(30),
        }
    }
}

fn str_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
