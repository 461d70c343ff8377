// Article sentiment scoring
pub mod keyword;

pub use keyword::KeywordScorer;

use crate::models::Polarity;

/// Maps article text to a polarity.
///
/// The decision engine only depends on this trait, so the keyword heuristic
/// can be swapped for a model-backed scorer without touching the pipeline.
pub trait SentimentScorer: Send + Sync {
    /// Score a single piece of text
    fn score(&self, text: &str) -> Polarity;

    /// Get scorer name
    fn name(&self) -> &str;
}
