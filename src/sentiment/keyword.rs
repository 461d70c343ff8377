use super::SentimentScorer;
use crate::models::Polarity;

pub const DEFAULT_POSITIVE_WORDS: &[&str] = &["gain", "up", "positive", "bullish"];
pub const DEFAULT_NEGATIVE_WORDS: &[&str] = &["down", "loss", "negative", "bearish"];

/// Word-list sentiment heuristic
///
/// Matching is a case-insensitive substring test, so "up" also hits "upgrade"
/// and "setup". Positive words are checked first: a text that matches both
/// lists scores positive.
#[derive(Debug, Clone)]
pub struct KeywordScorer {
    positive: Vec<String>,
    negative: Vec<String>,
}

impl KeywordScorer {
    pub fn new() -> Self {
        Self::with_words(DEFAULT_POSITIVE_WORDS, DEFAULT_NEGATIVE_WORDS)
    }

    pub fn with_words<S: AsRef<str>>(positive: &[S], negative: &[S]) -> Self {
        let normalize = |words: &[S]| {
            words
                .iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect()
        };

        Self {
            positive: normalize(positive),
            negative: normalize(negative),
        }
    }
}

impl Default for KeywordScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentScorer for KeywordScorer {
    fn score(&self, text: &str) -> Polarity {
        let text = text.to_lowercase();

        if self.positive.iter().any(|w| text.contains(w.as_str())) {
            Polarity::Positive
        } else if self.negative.iter().any(|w| text.contains(w.as_str())) {
            Polarity::Negative
        } else {
            Polarity::Neutral
        }
    }

    fn name(&self) -> &str {
        "Keyword"
    }
}
