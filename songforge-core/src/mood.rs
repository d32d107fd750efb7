//! Mood classification of segmented lyrics
//!
//! Wraps an injected [`MoodClassifier`] capability and aggregates its
//! ranked emotion scores into a single [`MoodProfile`]. This stage
//! fails open: a provider error or timeout yields a neutral fallback
//! profile and the run continues (AnalysisDegraded).

use crate::lyrics::LyricsDocument;
use crate::providers::MoodClassifier;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Closed mood vocabulary driving genre and tempo decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Angry,
    Energetic,
    Romantic,
    Calm,
    Mysterious,
    Neutral,
}

impl Mood {
    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
            Mood::Energetic => "energetic",
            Mood::Romantic => "romantic",
            Mood::Calm => "calm",
            Mood::Mysterious => "mysterious",
            Mood::Neutral => "neutral",
        }
    }

    /// All enum values, for totality tests over the mapping tables
    pub const ALL: [Mood; 8] = [
        Mood::Happy,
        Mood::Sad,
        Mood::Angry,
        Mood::Energetic,
        Mood::Romantic,
        Mood::Calm,
        Mood::Mysterious,
        Mood::Neutral,
    ];
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ranked emotion label from a classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    pub label: String,
    pub score: f32,
}

/// Positive/negative/neutral triple, normalized to sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    pub positive: f32,
    pub negative: f32,
    pub neutral: f32,
}

impl SentimentScores {
    /// Neutral-only triple used by the fallback path
    pub fn neutral() -> Self {
        Self {
            positive: 0.0,
            negative: 0.0,
            neutral: 1.0,
        }
    }
}

/// Aggregated classification result for one lyrics document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodProfile {
    pub primary_mood: Mood,
    /// Normalized score of the winning mood bucket, in [0, 1]
    pub confidence: f32,
    /// Emotion labels sorted descending by score
    pub emotions: Vec<EmotionScore>,
    pub sentiment: SentimentScores,
    /// True when the classifier failed and the neutral fallback was used
    pub fallback: bool,
}

impl MoodProfile {
    /// Profile used when classification is unavailable.
    pub fn neutral_fallback() -> Self {
        Self {
            primary_mood: Mood::Neutral,
            confidence: 0.0,
            emotions: Vec::new(),
            sentiment: SentimentScores::neutral(),
            fallback: true,
        }
    }
}

/// Buckets raw classifier labels into the closed mood enum.
///
/// Unknown labels fall outside every bucket and are kept only in the
/// ranked emotion list.
fn bucket_label(label: &str) -> Option<Mood> {
    match label.to_ascii_lowercase().as_str() {
        "joy" | "happy" | "happiness" => Some(Mood::Happy),
        "sadness" | "sad" | "grief" => Some(Mood::Sad),
        "anger" | "angry" | "disgust" | "rage" => Some(Mood::Angry),
        "surprise" | "energetic" | "excitement" => Some(Mood::Energetic),
        "love" | "romantic" | "romance" => Some(Mood::Romantic),
        "calm" | "peaceful" | "serenity" => Some(Mood::Calm),
        "fear" | "mysterious" | "mystery" => Some(Mood::Mysterious),
        "neutral" => Some(Mood::Neutral),
        _ => None,
    }
}

/// Sentiment valence of each mood bucket.
fn valence(mood: Mood) -> (f32, f32, f32) {
    match mood {
        Mood::Happy | Mood::Romantic | Mood::Energetic | Mood::Calm => (1.0, 0.0, 0.0),
        Mood::Sad | Mood::Angry | Mood::Mysterious => (0.0, 1.0, 0.0),
        Mood::Neutral => (0.0, 0.0, 1.0),
    }
}

/// Classification stage over an injected provider.
pub struct MoodAnalyzer {
    classifier: Arc<dyn MoodClassifier>,
    timeout: Duration,
}

impl MoodAnalyzer {
    pub fn new(classifier: Arc<dyn MoodClassifier>, timeout: Duration) -> Self {
        Self { classifier, timeout }
    }

    /// Classify the whole document into a [`MoodProfile`].
    ///
    /// Never fails: provider errors and timeouts produce the neutral
    /// fallback profile with `fallback = true` so the orchestrator can
    /// record the degradation.
    pub async fn analyze(&self, doc: &LyricsDocument) -> MoodProfile {
        let text = doc.joined_text();

        let scores = match tokio::time::timeout(self.timeout, self.classifier.classify(&text)).await
        {
            Ok(Ok(scores)) if !scores.is_empty() => scores,
            Ok(Ok(_)) => {
                warn!(
                    classifier = self.classifier.name(),
                    "Classifier returned no emotions, using neutral fallback"
                );
                return MoodProfile::neutral_fallback();
            }
            Ok(Err(e)) => {
                warn!(
                    classifier = self.classifier.name(),
                    error = %e,
                    "Mood classification failed, using neutral fallback"
                );
                return MoodProfile::neutral_fallback();
            }
            Err(_) => {
                warn!(
                    classifier = self.classifier.name(),
                    timeout_secs = self.timeout.as_secs(),
                    "Mood classification timed out, using neutral fallback"
                );
                return MoodProfile::neutral_fallback();
            }
        };

        Self::aggregate(scores)
    }

    /// Fold ranked emotion scores into the profile. Pure.
    fn aggregate(mut emotions: Vec<EmotionScore>) -> MoodProfile {
        emotions.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        // Sum each bucket's score; the winner becomes primary_mood
        let mut bucket_totals: Vec<(Mood, f32)> = Vec::new();
        for emotion in &emotions {
            let Some(mood) = bucket_label(&emotion.label) else {
                continue;
            };
            match bucket_totals.iter_mut().find(|(m, _)| *m == mood) {
                Some((_, total)) => *total += emotion.score.max(0.0),
                None => bucket_totals.push((mood, emotion.score.max(0.0))),
            }
        }

        let total: f32 = bucket_totals.iter().map(|(_, s)| s).sum();
        if total <= 0.0 {
            debug!("No classifier label mapped into a mood bucket");
            let mut profile = MoodProfile::neutral_fallback();
            profile.emotions = emotions;
            return profile;
        }

        let (primary_mood, top_score) = bucket_totals
            .iter()
            .copied()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or((Mood::Neutral, 0.0));

        // Sentiment triple by valence-weighted aggregation
        let (mut pos, mut neg, mut neu) = (0.0f32, 0.0f32, 0.0f32);
        for (mood, score) in &bucket_totals {
            let (p, n, u) = valence(*mood);
            pos += p * score;
            neg += n * score;
            neu += u * score;
        }
        let sentiment = SentimentScores {
            positive: pos / total,
            negative: neg / total,
            neutral: neu / total,
        };

        MoodProfile {
            primary_mood,
            confidence: (top_score / total).clamp(0.0, 1.0),
            emotions,
            sentiment,
            fallback: false,
        }
    }
}
