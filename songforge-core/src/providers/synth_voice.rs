//! Procedural vocal synthesis
//!
//! Builtin [`VoiceProvider`] rendering one tone per word: a fundamental
//! with two harmonics and slow vibrato, paced from the requested tempo.
//! The fundamental pitch is derived from the voice profile id, so the
//! same profile always sounds the same and different profiles are
//! audibly distinct. Deterministic end to end.

use crate::audio::{AudioAsset, Provenance};
use crate::providers::{ProviderError, ProviderResult, VoiceProvider, VoiceRequest};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Lowest fundamental a profile can map to
const PITCH_FLOOR_HZ: f32 = 150.0;

/// Fraction of each word slot that carries tone; the rest is a breath
/// gap before the next word.
const VOICED_FRACTION: f32 = 0.8;

/// Pitch offset cycle giving the line a sung contour rather than a
/// monotone.
const CONTOUR_SEMITONES: [i32; 8] = [0, 2, 4, 2, 0, -1, 0, 2];

/// Map a profile id onto a fundamental within one octave of the floor.
fn profile_pitch(voice_profile_id: &str) -> f32 {
    let mut hasher = DefaultHasher::new();
    voice_profile_id.hash(&mut hasher);
    let semitone = (hasher.finish() % 12) as f32;
    PITCH_FLOOR_HZ * 2.0f32.powf(semitone / 12.0)
}

/// Builtin procedural voice provider.
pub struct SynthVoiceProvider {
    sample_rate: u32,
    channels: u16,
}

impl SynthVoiceProvider {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    fn render(&self, request: &VoiceRequest<'_>, words: &[&str]) -> Vec<f32> {
        let sr = self.sample_rate as f32;
        let base_pitch = profile_pitch(request.voice_profile_id);

        // One beat per word
        let slot_seconds = 60.0 / request.tempo_bpm as f32;
        let slot_frames = ((slot_seconds * sr) as usize).max(1);
        let voiced_frames = ((slot_frames as f32 * VOICED_FRACTION) as usize).max(1);

        let mut mono = Vec::with_capacity(slot_frames * words.len());
        for (word_idx, word) in words.iter().enumerate() {
            let contour = CONTOUR_SEMITONES[word_idx % CONTOUR_SEMITONES.len()];
            // Longer words sit slightly lower, short words slightly higher
            let length_shift = if word.len() > 6 { -1 } else { 0 };
            let pitch =
                base_pitch * 2.0f32.powf((contour + length_shift) as f32 / 12.0);

            for i in 0..slot_frames {
                if i >= voiced_frames {
                    mono.push(0.0);
                    continue;
                }

                let t = i as f32 / sr;
                // Attack/release keeps word onsets from clicking
                let progress = i as f32 / voiced_frames as f32;
                let envelope = (progress * 8.0).min(1.0) * ((1.0 - progress) * 8.0).min(1.0);

                let vibrato = 1.0 + 0.008 * (2.0 * std::f32::consts::PI * 5.0 * t).sin();
                let phase = 2.0 * std::f32::consts::PI * pitch * vibrato * t;
                let sample = phase.sin() * 0.5
                    + (2.0 * phase).sin() * 0.25
                    + (3.0 * phase).sin() * 0.12;

                mono.push(sample * envelope * 0.6);
            }
        }

        if self.channels == 1 {
            return mono;
        }
        let mut interleaved = Vec::with_capacity(mono.len() * self.channels as usize);
        for sample in mono {
            for _ in 0..self.channels {
                interleaved.push(sample);
            }
        }
        interleaved
    }
}

#[async_trait]
impl VoiceProvider for SynthVoiceProvider {
    fn name(&self) -> &'static str {
        "synth-voice"
    }

    async fn synthesize(&self, request: &VoiceRequest<'_>) -> ProviderResult<AudioAsset> {
        let words: Vec<&str> = request.text.split_whitespace().collect();
        if words.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "Segment text has no words".into(),
            ));
        }
        if request.tempo_bpm == 0 {
            return Err(ProviderError::InvalidResponse("Tempo must be nonzero".into()));
        }

        let samples = self.render(request, &words);
        AudioAsset::new(samples, self.sample_rate, self.channels, Provenance::Voice)
            .map_err(|e| ProviderError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(text: &'a str, profile: &'a str) -> VoiceRequest<'a> {
        VoiceRequest {
            text,
            voice_profile_id: profile,
            tempo_bpm: 120,
        }
    }

    #[tokio::test]
    async fn test_duration_scales_with_word_count() {
        let provider = SynthVoiceProvider::new(44100, 1);
        let short = provider.synthesize(&request("hello world", "v1")).await.unwrap();
        let long = provider
            .synthesize(&request("hello world again and again", "v1"))
            .await
            .unwrap();

        assert!(long.frames() > short.frames());
        // Two words at 120bpm is one second
        assert!((short.duration_seconds() - 1.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_profiles_differ() {
        let provider = SynthVoiceProvider::new(22050, 1);
        let a = provider.synthesize(&request("hello there friend", "alto")).await.unwrap();
        let b = provider.synthesize(&request("hello there friend", "bass")).await.unwrap();
        assert_ne!(a.samples, b.samples);
    }

    #[tokio::test]
    async fn test_same_profile_is_deterministic() {
        let provider = SynthVoiceProvider::new(22050, 1);
        let a = provider.synthesize(&request("sing this line", "v1")).await.unwrap();
        let b = provider.synthesize(&request("sing this line", "v1")).await.unwrap();
        assert_eq!(a.samples, b.samples);
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let provider = SynthVoiceProvider::new(44100, 2);
        assert!(provider.synthesize(&request("   ", "v1")).await.is_err());
    }

    #[test]
    fn test_profile_pitch_in_range() {
        for id in ["a", "b", "soprano", "x9"] {
            let pitch = profile_pitch(id);
            assert!(pitch >= PITCH_FLOOR_HZ && pitch < PITCH_FLOOR_HZ * 2.0);
        }
    }
}
