use std::collections::HashSet;
use std::sync::Arc;

use sentiflow_core::{ClassifierError, SentimentLabel};

const POSITIVE: &[&str] = &[
    "amazing", "awesome", "best", "brilliant", "delighted", "enjoy", "enjoyed", "excellent",
    "fantastic", "fast", "friendly", "good", "great", "happy", "helpful", "impressed", "love",
    "loved", "nice", "perfect", "pleased", "recommend", "reliable", "satisfied", "superb",
    "wonderful", "works",
];

const NEGATIVE: &[&str] = &[
    "angry", "awful", "bad", "broken", "disappointed", "disappointing", "defective", "hate",
    "hated", "horrible", "poor", "refund", "rude", "slow", "terrible", "useless", "waste",
    "worse", "worst", "wrong", "unhappy", "unreliable",
];

const NEGATORS: &[&str] = &["not", "no", "never", "don't", "didn't", "isn't", "wasn't", "hardly"];

/// Word-list classifier. Deterministic and dependency free.
#[derive(Clone)]
pub struct LexiconClassifier {
    positive: Arc<HashSet<&'static str>>,
    negative: Arc<HashSet<&'static str>>,
    negators: Arc<HashSet<&'static str>>,
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconClassifier {
    pub fn new() -> Self {
        Self {
            positive: Arc::new(POSITIVE.iter().copied().collect()),
            negative: Arc::new(NEGATIVE.iter().copied().collect()),
            negators: Arc::new(NEGATORS.iter().copied().collect()),
        }
    }

    pub fn classify(&self, batch: &[String]) -> Result<Vec<SentimentLabel>, ClassifierError> {
        Ok(batch.iter().map(|text| self.label(text)).collect())
    }

    /// A negator flips the polarity of the next sentiment word.
    pub fn score(&self, text: &str) -> i32 {
        let mut score = 0;
        let mut negated = false;
        for token in tokens(text) {
            if self.negators.contains(token.as_str()) {
                negated = true;
                continue;
            }
            let polarity = if self.positive.contains(token.as_str()) {
                1
            } else if self.negative.contains(token.as_str()) {
                -1
            } else {
                continue;
            };
            score += if negated { -polarity } else { polarity };
            negated = false;
        }
        score
    }

    pub fn label(&self, text: &str) -> SentimentLabel {
        match self.score(text) {
            s if s > 0 => SentimentLabel::Positive,
            s if s < 0 => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        }
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obvious_reviews() {
        let lexicon = LexiconClassifier::new();
        assert_eq!(lexicon.label("great product"), SentimentLabel::Positive);
        assert_eq!(lexicon.label("Terrible!"), SentimentLabel::Negative);
        assert_eq!(lexicon.label("arrived on tuesday"), SentimentLabel::Neutral);
    }

    #[test]
    fn negation_flips_polarity() {
        let lexicon = LexiconClassifier::new();
        assert_eq!(lexicon.label("not good"), SentimentLabel::Negative);
        assert_eq!(lexicon.label("never disappointed"), SentimentLabel::Positive);
    }

    #[test]
    fn batch_preserves_order_and_length() {
        let lexicon = LexiconClassifier::new();
        let batch = vec!["love it".to_string(), "".to_string(), "awful".to_string()];
        assert_eq!(
            lexicon.classify(&batch).unwrap(),
            vec![
                SentimentLabel::Positive,
                SentimentLabel::Neutral,
                SentimentLabel::Negative
            ]
        );
    }
}
