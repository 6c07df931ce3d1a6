// Sentence Normalizer/Validator
// One shared cleanup-and-quality pipeline for every entry point (full scan,
// mutation observer, real-time chat path).

use regex::Regex;
use std::collections::HashSet;
use tracing::{trace, warn};

use super::config::NormalizerConfig;

pub struct SentenceNormalizer {
    config: NormalizerConfig,
    tag_re: Regex,
    ws_re: Regex,
    strip_re: Regex,
    opaque_re: Regex,
    exclusion_res: Vec<Regex>,
}

impl SentenceNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        let opaque_re = Regex::new(&format!(
            r"\b[0-9a-z]{{{},}}\b",
            config.opaque_token_min_len
        ))
        .unwrap();
        // A pattern that fails to compile loses its filtering, nothing more;
        // the rest of the pipeline keeps running.
        let exclusion_res = config
            .exclusion_patterns
            .iter()
            .filter_map(|src| match Regex::new(src) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("skipping invalid exclusion pattern {:?}: {}", src, e);
                    None
                }
            })
            .collect();

        Self {
            config,
            tag_re: Regex::new(r"<[^>]*>").unwrap(),
            ws_re: Regex::new(r"\s+").unwrap(),
            strip_re: Regex::new(r"[^\p{L}\p{N}\s]").unwrap(),
            opaque_re,
            exclusion_res,
        }
    }

    /// Cleanup pipeline. Steps run in a fixed order; each assumes the
    /// previous step's output.
    pub fn normalize(&self, raw: &str) -> String {
        // 1. trim + lower-case
        let mut s = raw.trim().to_lowercase();

        // 2. strip HTML-tag-like substrings
        s = self.tag_re.replace_all(&s, "").to_string();

        // 3. collapse whitespace runs
        s = self.ws_re.replace_all(&s, " ").trim().to_string();

        // 4. strip characters outside letters/digits/whitespace; stripping
        //    can leave fresh whitespace runs, so re-collapse
        s = self.strip_re.replace_all(&s, "").to_string();
        s = self.ws_re.replace_all(&s, " ").trim().to_string();

        // 5. collapse consecutive duplicate tokens (stutter artifacts, not
        //    legitimate repeated words elsewhere in the sentence)
        let mut cleaned: Vec<&str> = Vec::new();
        for word in s.split_whitespace() {
            if cleaned.last() != Some(&word) {
                cleaned.push(word);
            }
        }
        cleaned.join(" ")
    }

    /// Quality predicate, evaluated on normalized text.
    pub fn is_valid(&self, sentence: &str) -> bool {
        let words: Vec<&str> = sentence.split_whitespace().collect();
        if words.len() < self.config.min_word_count {
            return false;
        }

        let total_chars = sentence.chars().count();
        let non_alpha = sentence
            .chars()
            .filter(|c| !c.is_alphabetic() && !c.is_whitespace())
            .count();
        if non_alpha as f64 >= total_chars.max(1) as f64 * self.config.max_non_alpha_ratio {
            return false;
        }

        let unique: HashSet<&str> = words.iter().copied().collect();
        if words.len() - unique.len() >= self.config.repetition_threshold {
            return false;
        }

        if self
            .config
            .exclusion_literals
            .iter()
            .any(|phrase| phrase == sentence)
        {
            return false;
        }
        if self.exclusion_res.iter().any(|re| re.is_match(sentence)) {
            return false;
        }

        // Long opaque alphanumeric tokens are IDs/hashes, not prose.
        if self.opaque_re.is_match(sentence) {
            return false;
        }

        true
    }

    /// Normalize one candidate and keep it only if it passes validation.
    /// Rejections are silent; they are filtering, not errors.
    pub fn process(&self, raw: &str) -> Option<String> {
        let sentence = self.normalize(raw);
        if self.is_valid(&sentence) {
            Some(sentence)
        } else {
            trace!(candidate = raw, "candidate rejected");
            None
        }
    }

    /// Process a batch of candidates, deduplicating against `seen`. The
    /// caller owns the set: per-scan batches pass a fresh one, the mutation
    /// observer passes its persistent cross-batch set.
    pub fn process_batch(&self, candidates: &[String], seen: &mut HashSet<String>) -> Vec<String> {
        let mut sentences = Vec::new();
        for candidate in candidates {
            if let Some(sentence) = self.process(candidate) {
                if seen.insert(sentence.clone()) {
                    sentences.push(sentence);
                }
            }
        }
        sentences
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> SentenceNormalizer {
        SentenceNormalizer::new(NormalizerConfig::default())
    }

    #[test]
    fn test_normalize_strips_tags_and_whitespace_runs() {
        let n = normalizer();
        let out = n.normalize("  <b>Hello</b>   WORLD &amp; <i>friends</i>  ");
        assert!(!out.contains('<'));
        assert!(!out.contains('>'));
        assert!(!out.contains("  "));
        assert_eq!(out, "hello world amp friends");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let n = normalizer();
        let once = n.normalize("The QUICK-brown fox... jumped <b>over</b>  it!");
        let twice = n.normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_stripping_punctuation_leaves_single_spaces() {
        let n = normalizer();
        let out = n.normalize("foo - bar -- baz");
        assert_eq!(out, "foo bar baz");
    }

    #[test]
    fn test_consecutive_duplicates_collapse_but_distant_repeats_survive() {
        let n = normalizer();
        assert_eq!(n.normalize("the the the cat sat"), "the cat sat");
        assert_eq!(
            n.normalize("it was what it was again"),
            "it was what it was again"
        );
    }

    #[test]
    fn test_min_word_count_rejects_short_candidates() {
        let n = normalizer();
        assert!(n.process("ok").is_none());
        assert!(n.process("this works fine").is_some());
    }

    #[test]
    fn test_repeated_word_stutter_rejected() {
        let n = normalizer();
        assert!(n.process("ok ok ok ok ok ok").is_none());
    }

    #[test]
    fn test_exclusion_literal_dropped_regardless_of_word_count() {
        let n = normalizer();
        assert!(n.process("View more comments").is_none());
    }

    #[test]
    fn test_relative_timestamp_pattern_dropped() {
        let n = normalizer();
        assert!(n.process("2 hrs ago").is_none());
        assert!(n.process("5 minutes ago").is_none());
    }

    #[test]
    fn test_opaque_token_rejected() {
        let n = normalizer();
        assert!(n.process("session token a1b2c3d4e5f677").is_none());
    }

    #[test]
    fn test_non_alpha_heavy_candidate_rejected() {
        let n = normalizer();
        assert!(n.process("12 34 56 78 90 ab").is_none());
    }

    #[test]
    fn test_invalid_exclusion_pattern_is_skipped_not_fatal() {
        let mut config = NormalizerConfig::default();
        config.exclusion_patterns.push("([unclosed".to_string());
        let n = SentenceNormalizer::new(config);
        // Remaining patterns still filter; valid prose still passes.
        assert!(n.process("2 hrs ago").is_none());
        assert!(n.process("this still works fine").is_some());
    }

    #[test]
    fn test_batch_deduplicates_within_scan() {
        let n = normalizer();
        let candidates = vec![
            "You people are nice".to_string(),
            "you  people are NICE".to_string(),
            "A different sentence here".to_string(),
        ];
        let mut seen = HashSet::new();
        let sentences = n.process_batch(&candidates, &mut seen);
        assert_eq!(sentences.len(), 2);
        let unique: HashSet<&String> = sentences.iter().collect();
        assert_eq!(unique.len(), sentences.len());
    }

    #[test]
    fn test_batch_respects_persistent_seen_set() {
        let n = normalizer();
        let mut seen = HashSet::new();
        let first = n.process_batch(&["hello there friend".to_string()], &mut seen);
        assert_eq!(first.len(), 1);
        let second = n.process_batch(&["hello there friend".to_string()], &mut seen);
        assert!(second.is_empty());
    }
}
