//! Procedural instrumental synthesis
//!
//! Builtin [`MusicProvider`] that renders a chord-progression backing
//! track from additive sine layers: harmony, bass, and a kick/snare
//! rhythm bed. Output is deterministic for a given parameter set (the
//! snare noise is seeded from tempo and key), which keeps pipeline
//! runs reproducible. A neural provider can replace this behind the
//! same trait.

use crate::audio::{AudioAsset, Provenance};
use crate::params::{GenerationParameters, Genre};
use crate::providers::{MusicProvider, ProviderError, ProviderResult};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Equal-tempered frequencies starting at middle C
const BASE_C: f32 = 261.63;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Chord step within a progression: semitone offset from the key root
/// plus chord quality.
#[derive(Clone, Copy)]
struct ChordStep {
    offset: i32,
    minor: bool,
}

const fn maj(offset: i32) -> ChordStep {
    ChordStep { offset, minor: false }
}

const fn min(offset: i32) -> ChordStep {
    ChordStep { offset, minor: true }
}

/// Per-genre chord progressions (one chord per bar).
fn progression(genre: Genre) -> &'static [ChordStep] {
    match genre {
        // I - V - vi - IV
        Genre::Pop => &const { [maj(0), maj(7), min(9), maj(5)] },
        // I - vi - IV - V
        Genre::Ballad => &const { [maj(0), min(9), maj(5), maj(7)] },
        // I - IV - V - vi
        Genre::Rock => &const { [maj(0), maj(5), maj(7), min(9)] },
        // i - VI - III - VII
        Genre::Ambient => &const { [min(0), maj(8), maj(3), maj(10)] },
        // i - VI - i - VII
        Genre::Electronic => &const { [min(0), maj(8), min(0), maj(10)] },
        // I - iii - IV - V
        Genre::Rnb => &const { [maj(0), min(4), maj(5), maj(7)] },
        // ii - V - I - I
        Genre::Jazz => &const { [min(2), maj(7), maj(0), maj(0)] },
        // I - V - vi - iii
        Genre::Classical => &const { [maj(0), maj(7), min(9), min(4)] },
    }
}

/// Eighth-note beat masks, from the drum patterns the genres use.
fn rhythm_pattern(genre: Genre) -> &'static [bool; 8] {
    match genre {
        Genre::Ambient | Genre::Classical => &[true, false, false, false, false, false, false, false],
        Genre::Jazz => &[true, false, false, true, false, false, true, false],
        _ => &[true, false, true, false, true, false, true, false],
    }
}

const BASS_PATTERN: [bool; 8] = [true, false, false, false, true, false, false, false];

/// Semitone index of a key string's root ("F#m" -> 6).
fn key_root_index(key: &str) -> usize {
    let root = key.strip_suffix('m').filter(|r| !r.is_empty()).unwrap_or(key);
    NOTE_NAMES.iter().position(|n| *n == root).unwrap_or(0)
}

fn note_freq(semitone_from_c: i32) -> f32 {
    BASE_C * 2.0f32.powf(semitone_from_c.rem_euclid(12) as f32 / 12.0)
}

/// Chord tone frequencies: root, third, fifth.
fn chord_freqs(root_semitone: i32, minor: bool) -> [f32; 3] {
    let third = if minor { 3 } else { 4 };
    [
        note_freq(root_semitone),
        note_freq(root_semitone + third),
        note_freq(root_semitone + 7),
    ]
}

/// Builtin procedural instrumental provider.
pub struct SynthMusicProvider {
    sample_rate: u32,
    channels: u16,
}

impl SynthMusicProvider {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Render the mono layer stack, then interleave to the output
    /// channel count.
    fn render(&self, params: &GenerationParameters) -> Vec<f32> {
        let sr = self.sample_rate as f32;
        let total_frames = (params.duration_seconds * self.sample_rate as f64).round() as usize;
        let mut mono = vec![0.0f32; total_frames];

        // Eighth notes at the requested tempo
        let step_seconds = 60.0 / params.tempo_bpm as f32 / 2.0;
        let step_frames = ((step_seconds * sr) as usize).max(1);

        let root = key_root_index(&params.key) as i32;
        let chords = progression(params.genre);
        let rhythm = rhythm_pattern(params.genre);

        // Snare noise seeded from the parameter set for reproducibility
        let seed = (params.tempo_bpm as u64) << 8 | root as u64;
        let mut rng = StdRng::seed_from_u64(seed);

        let mut step = 0usize;
        let mut frame = 0usize;
        while frame < total_frames {
            let end = (frame + step_frames).min(total_frames);
            // One chord per bar (8 eighth-note steps)
            let chord = chords[(step / 8) % chords.len()];
            let tones = chord_freqs(root + chord.offset, chord.minor);

            for (i, sample) in mono[frame..end].iter_mut().enumerate() {
                let t = i as f32 / sr;
                let envelope = (-2.0 * t).exp();

                // Harmony: sustained chord tones
                let mut value = 0.0f32;
                for freq in tones {
                    value += (2.0 * std::f32::consts::PI * freq * t).sin() * 0.12;
                }

                // Bass: root an octave down on the bass pattern
                if BASS_PATTERN[step % 8] {
                    let bass = tones[0] / 2.0;
                    value += (2.0 * std::f32::consts::PI * bass * t).sin() * 0.25 * envelope;
                }

                // Rhythm: decaying kick plus noise snare on the backbeat
                if rhythm[step % 8] {
                    value += (2.0 * std::f32::consts::PI * 60.0 * t).sin() * 0.3 * (-8.0 * t).exp();
                    if step % 4 == 2 {
                        value += (rng.gen::<f32>() - 0.5) * 0.2 * (-6.0 * t).exp();
                    }
                }

                *sample += value;
            }

            frame = end;
            step += 1;
        }

        // Normalize the layer sum below full scale
        let peak = mono.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        if peak > 0.0 {
            let scale = 0.8 / peak;
            for sample in &mut mono {
                *sample *= scale;
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
impl MusicProvider for SynthMusicProvider {
    fn name(&self) -> &'static str {
        "synth-music"
    }

    async fn generate(&self, params: &GenerationParameters) -> ProviderResult<AudioAsset> {
        if params.duration_seconds <= 0.0 {
            return Err(ProviderError::InvalidResponse(
                "Requested duration must be positive".into(),
            ));
        }

        let samples = self.render(params);
        AudioAsset::new(samples, self.sample_rate, self.channels, Provenance::Music)
            .map_err(|e| ProviderError::Internal(e.to_string()))
    }
}
