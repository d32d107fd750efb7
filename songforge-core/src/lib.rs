//! Song-assembly pipeline
//!
//! Turns lyric text into a finished mixed song: segmentation, mood
//! classification, generation-parameter mapping, concurrent
//! instrumental and vocal generation, time-aligned mixing, and artifact
//! persistence. Capability providers (classifier, music, voice) are
//! injected; builtin offline providers exist for every capability.

pub mod artifact;
pub mod audio;
pub mod generate;
pub mod lyrics;
pub mod mixer;
pub mod mood;
pub mod orchestrator;
pub mod params;
pub mod providers;

pub use artifact::{ArtifactStore, SongArtifact};
pub use audio::{AudioAsset, Provenance};
pub use lyrics::{LyricsDocument, LyricsProcessor, Segment};
pub use mixer::AudioMixer;
pub use mood::{Mood, MoodAnalyzer, MoodProfile};
pub use orchestrator::{PipelineOrchestrator, SongRequest};
pub use params::{GenerationParameters, Genre, GenreRequest, ParameterMapper};
pub use providers::ProviderSet;
