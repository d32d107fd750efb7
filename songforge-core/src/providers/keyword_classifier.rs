//! Keyword-based mood classification
//!
//! Offline classifier scoring each mood by the fraction of its keyword
//! list found in the text. Deterministic, so it doubles as the test
//! classifier. A transformer-backed provider can replace it behind the
//! same trait without touching the pipeline.

use crate::mood::EmotionScore;
use crate::providers::{MoodClassifier, ProviderResult};
use async_trait::async_trait;

/// Per-mood keyword lists.
///
/// Labels use the closed mood vocabulary directly so the analyzer's
/// bucket table maps them 1:1.
const KEYWORDS: &[(&str, &[&str])] = &[
    (
        "happy",
        &["joy", "happy", "smile", "laugh", "dance", "celebrate", "sunshine", "bright", "shining"],
    ),
    (
        "sad",
        &["tears", "cry", "lonely", "heartbreak", "pain", "sadness", "darkness", "alone", "goodbye"],
    ),
    (
        "angry",
        &["rage", "anger", "hate", "fight", "war", "fire", "storm", "revenge", "scream"],
    ),
    (
        "energetic",
        &["energy", "power", "strong", "wild", "free", "run", "jump", "alive", "faster"],
    ),
    (
        "romantic",
        &["love", "heart", "kiss", "romance", "beautiful", "sweet", "tender", "passion", "darling"],
    ),
    (
        "calm",
        &["peace", "quiet", "gentle", "soft", "breeze", "ocean", "mountain", "still", "slow"],
    ),
    (
        "mysterious",
        &["secret", "mystery", "unknown", "shadow", "whisper", "hidden", "midnight", "strange"],
    ),
];

/// Builtin offline mood classifier.
#[derive(Debug, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MoodClassifier for KeywordClassifier {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn classify(&self, text: &str) -> ProviderResult<Vec<EmotionScore>> {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .collect();

        let mut scores = Vec::new();
        for (mood, keywords) in KEYWORDS {
            let hits = keywords
                .iter()
                .filter(|kw| words.iter().any(|w| w == *kw))
                .count();
            if hits > 0 {
                scores.push(EmotionScore {
                    label: mood.to_string(),
                    score: hits as f32 / keywords.len() as f32,
                });
            }
        }

        // No keyword hits at all: the text carries no mood signal
        if scores.is_empty() {
            scores.push(EmotionScore {
                label: "neutral".to_string(),
                score: 1.0,
            });
        }

        scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_happy_lyrics_score_happy() {
        let classifier = KeywordClassifier::new();
        let scores = classifier
            .classify("I am so happy today, the sun is shining bright")
            .await
            .unwrap();

        assert_eq!(scores[0].label, "happy");
        assert!(scores[0].score > 0.0);
    }

    #[tokio::test]
    async fn test_no_signal_yields_neutral() {
        let classifier = KeywordClassifier::new();
        let scores = classifier.classify("the quick brown fox").await.unwrap();

        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].label, "neutral");
        assert_eq!(scores[0].score, 1.0);
    }

    #[tokio::test]
    async fn test_whole_word_matching() {
        let classifier = KeywordClassifier::new();
        // "scream" must not match inside "screaming" is too strict, but
        // "art" must not match inside "heart"
        let scores = classifier.classify("works of art").await.unwrap();
        assert_eq!(scores[0].label, "neutral");
    }

    #[tokio::test]
    async fn test_deterministic() {
        let classifier = KeywordClassifier::new();
        let a = classifier.classify("love and tears").await.unwrap();
        let b = classifier.classify("love and tears").await.unwrap();
        assert_eq!(a, b);
    }
}
