// News sentiment decision engine
use crate::models::{Article, Polarity, TradeDecision};
use crate::sentiment::SentimentScorer;

pub const DEFAULT_THRESHOLD: f64 = 0.1;

/// Per-batch sentiment counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SentimentTally {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentTally {
    pub fn record(&mut self, polarity: Polarity) {
        match polarity {
            Polarity::Positive => self.positive += 1,
            Polarity::Negative => self.negative += 1,
            Polarity::Neutral => self.neutral += 1,
        }
    }

    /// Signed count `positive - negative`
    pub fn polarity(&self) -> i64 {
        self.positive as i64 - self.negative as i64
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }
}

/// Turns a batch of articles into a single trade decision
pub struct DecisionEngine {
    scorer: Box<dyn SentimentScorer>,
    threshold: f64,
}

impl DecisionEngine {
    pub fn new(scorer: Box<dyn SentimentScorer>, threshold: f64) -> Self {
        Self { scorer, threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn scorer_name(&self) -> &str {
        self.scorer.name()
    }

    /// Score every article title and count the results
    pub fn tally(&self, articles: &[Article]) -> SentimentTally {
        let mut tally = SentimentTally::default();
        for article in articles {
            let polarity = self.scorer.score(&article.title);
            tracing::debug!(title = %article.title, score = polarity.value(), "Scored article");
            tally.record(polarity);
        }
        tally
    }

    /// Decide from a tally already computed and log the decision
    pub fn decide_from_tally(&self, tally: &SentimentTally) -> TradeDecision {
        let decision = TradeDecision::from_polarity(tally.polarity(), self.threshold);
        tracing::info!(
            positive = tally.positive,
            negative = tally.negative,
            polarity = tally.polarity(),
            "Trade Decision: {}",
            decision
        );
        decision
    }

    /// Score the batch and decide. An empty batch is Hold.
    pub fn decide(&self, articles: &[Article]) -> TradeDecision {
        self.decide_from_tally(&self.tally(articles))
    }
}
