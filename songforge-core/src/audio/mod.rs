//! Audio data types and format plumbing
//!
//! Interleaved f32 PCM throughout the pipeline; rubato for sample-rate
//! conversion and hound for the persisted WAV contract.

pub mod resampler;
pub mod types;
pub mod wav;

pub use types::{AudioAsset, Provenance};
