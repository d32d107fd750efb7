//! Capability provider contracts
//!
//! The pipeline never hard-wires a model. Each capability (mood
//! classification, music generation, voice synthesis) is an
//! object-safe async trait; concrete providers are plugged in at
//! configuration time and the orchestrator only sees `Arc<dyn _>`.
//!
//! Providers must be safe for concurrent invocation: multiple pipeline
//! runs may call the same instance at once.

pub mod keyword_classifier;
pub mod synth_music;
pub mod synth_voice;

use crate::audio::AudioAsset;
use crate::mood::EmotionScore;
use crate::params::GenerationParameters;
use async_trait::async_trait;
use songforge_common::config::AudioConfig;
use std::sync::Arc;
use thiserror::Error;

pub use keyword_classifier::KeywordClassifier;
pub use synth_music::SynthMusicProvider;
pub use synth_voice::SynthVoiceProvider;

/// Typed failures a provider may return.
///
/// The adapters treat a timeout identically to any other provider
/// error; the distinction exists for logging.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider did not answer within its deadline
    #[error("Provider timed out")]
    Timeout,

    /// Provider is not reachable or not loaded
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// Provider answered with something the adapter cannot use
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// Provider-internal failure
    #[error("Provider error: {0}")]
    Internal(String),
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Mood-classification capability: text in, ranked emotion scores out.
#[async_trait]
pub trait MoodClassifier: Send + Sync {
    /// Provider name for logs and provenance
    fn name(&self) -> &'static str;

    /// Classify text into emotion labels with scores.
    async fn classify(&self, text: &str) -> ProviderResult<Vec<EmotionScore>>;
}

/// Music-generation capability: parameters in, instrumental PCM out.
#[async_trait]
pub trait MusicProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Produce an instrumental track approximating the requested
    /// duration, tempo, key, and instrumentation. The adapter owns
    /// exact duration reconciliation.
    async fn generate(&self, params: &GenerationParameters) -> ProviderResult<AudioAsset>;
}

/// One vocal clip request: a single lyric segment.
#[derive(Debug, Clone)]
pub struct VoiceRequest<'a> {
    /// Segment text to sing/speak
    pub text: &'a str,
    /// Which voice to use
    pub voice_profile_id: &'a str,
    /// Target tempo for pacing
    pub tempo_bpm: u32,
}

/// Voice-synthesis capability: per-segment text in, vocal PCM out.
#[async_trait]
pub trait VoiceProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Synthesize one segment's vocal clip.
    async fn synthesize(&self, request: &VoiceRequest<'_>) -> ProviderResult<AudioAsset>;
}

/// The full provider bundle a pipeline run needs.
#[derive(Clone)]
pub struct ProviderSet {
    pub classifier: Arc<dyn MoodClassifier>,
    pub music: Arc<dyn MusicProvider>,
    pub voice: Arc<dyn VoiceProvider>,
}

impl ProviderSet {
    /// The builtin offline providers: keyword classification and
    /// procedural synthesis. Deterministic, network-free.
    pub fn builtin(audio: &AudioConfig) -> Self {
        Self {
            classifier: Arc::new(KeywordClassifier::new()),
            music: Arc::new(SynthMusicProvider::new(audio.sample_rate, audio.channels)),
            voice: Arc::new(SynthVoiceProvider::new(audio.sample_rate, audio.channels)),
        }
    }
}
