// Hate-Speech Aggregator
// Applies the mode-dependent confidence threshold to per-language result
// sequences and produces the scan-level counts and flagged-sentence map.

use crate::models::{ClassificationResult, HateSpeechCounts, HateSpeechMap, Mode};

/// Sentence paired with the ranked results the model returned for it.
pub type SentenceResults = Vec<(String, Vec<ClassificationResult>)>;

#[derive(Debug, Clone, Default)]
pub struct ScanAggregation {
    pub counts: HateSpeechCounts,
    pub hate_speech_map: HateSpeechMap,
}

/// A sentence counts as hate speech when any of its results carries the
/// language's positive label with a score at or above the threshold.
/// Malformed or empty result lists are non-matches, never errors.
pub fn is_hate(results: &[ClassificationResult], positive_label: &str, threshold: f64) -> bool {
    results
        .iter()
        .any(|r| r.label == positive_label && r.score >= threshold)
}

/// Aggregate both language groups under one mode snapshot.
///
/// The threshold is read from `mode` exactly once here, so a mode change
/// mid-scan affects only scans that aggregate after it.
pub fn aggregate(
    english: &SentenceResults,
    tagalog: &SentenceResults,
    english_label: &str,
    tagalog_label: &str,
    mode: Mode,
) -> ScanAggregation {
    let threshold = mode.threshold();
    let mut agg = ScanAggregation::default();

    for (sentence, results) in english {
        if is_hate(results, english_label, threshold) {
            agg.counts.english_hate_count += 1;
            agg.hate_speech_map
                .insert(sentence.clone(), results.clone());
        }
    }
    for (sentence, results) in tagalog {
        if is_hate(results, tagalog_label, threshold) {
            agg.counts.tagalog_hate_count += 1;
            agg.hate_speech_map
                .insert(sentence.clone(), results.clone());
        }
    }

    agg
}
