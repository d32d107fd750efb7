//! Generation-stage adapters
//!
//! Thin policy layers between the pipeline and the capability
//! providers: timeouts, retries, fallback, and format reconciliation
//! live here so providers stay simple. The music and voice adapters
//! run concurrently from the orchestrator.

pub mod music;
pub mod voice;

pub use music::{MusicGenerator, MusicOutcome};
pub use voice::VoiceSynthesizer;
