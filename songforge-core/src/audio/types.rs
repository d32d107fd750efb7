//! Core audio buffer type
//!
//! [`AudioAsset`] holds decoded PCM ready for generation adapters and
//! the mixer.
//!
//! **Format:**
//! - Samples are f32 (floating point -1.0 to 1.0)
//! - Interleaved: [L, R, L, R, ...] for stereo, [M, M, ...] for mono
//! - Ownership moves stage to stage; the mixer consumes both inputs

use serde::{Deserialize, Serialize};
use songforge_common::{Error, Result};

/// Which stage produced an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Music,
    Voice,
    Mix,
}

/// PCM audio buffer with format metadata.
#[derive(Debug, Clone)]
pub struct AudioAsset {
    /// Interleaved PCM samples
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Producing stage
    pub provenance: Provenance,
}

impl AudioAsset {
    /// Create an asset, rejecting sample counts that don't divide into
    /// whole frames.
    pub fn new(
        samples: Vec<f32>,
        sample_rate: u32,
        channels: u16,
        provenance: Provenance,
    ) -> Result<Self> {
        if channels == 0 || sample_rate == 0 {
            return Err(Error::Mixing(
                "Audio asset needs nonzero sample rate and channels".into(),
            ));
        }
        if samples.len() % channels as usize != 0 {
            return Err(Error::Mixing(format!(
                "{} samples do not divide into {}-channel frames",
                samples.len(),
                channels
            )));
        }
        Ok(Self {
            samples,
            sample_rate,
            channels,
            provenance,
        })
    }

    /// Silent asset of the given duration.
    pub fn silence(
        duration_seconds: f64,
        sample_rate: u32,
        channels: u16,
        provenance: Provenance,
    ) -> Self {
        let frames = (duration_seconds * sample_rate as f64).round().max(0.0) as usize;
        Self {
            samples: vec![0.0; frames * channels as usize],
            sample_rate,
            channels,
            provenance,
        }
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration_seconds(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Scale every sample in place
    pub fn apply_gain(&mut self, gain: f32) {
        for sample in &mut self.samples {
            *sample *= gain;
        }
    }

    /// Truncate to exactly `frames` frames (no-op when already shorter)
    pub fn trim_to_frames(&mut self, frames: usize) {
        let samples = frames * self.channels as usize;
        if self.samples.len() > samples {
            self.samples.truncate(samples);
        }
    }

    /// Extend with silence to exactly `frames` frames (no-op when
    /// already longer)
    pub fn pad_to_frames(&mut self, frames: usize) {
        let samples = frames * self.channels as usize;
        if self.samples.len() < samples {
            self.samples.resize(samples, 0.0);
        }
    }

    /// Append another buffer's samples; formats must already match.
    pub fn append(&mut self, other: &AudioAsset) -> Result<()> {
        if other.sample_rate != self.sample_rate || other.channels != self.channels {
            return Err(Error::Mixing(format!(
                "Cannot append {}Hz/{}ch audio to {}Hz/{}ch buffer",
                other.sample_rate, other.channels, self.sample_rate, self.channels
            )));
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }

    /// Convert to the requested channel count.
    ///
    /// Mono is duplicated up to stereo; stereo is only ever widened,
    /// never truncated down, so asking a stereo asset for mono fails.
    pub fn to_channels(self, channels: u16) -> Result<Self> {
        if channels == self.channels {
            return Ok(self);
        }
        match (self.channels, channels) {
            (1, 2) => {
                let mut samples = Vec::with_capacity(self.samples.len() * 2);
                for sample in &self.samples {
                    samples.push(*sample);
                    samples.push(*sample);
                }
                Ok(Self {
                    samples,
                    sample_rate: self.sample_rate,
                    channels: 2,
                    provenance: self.provenance,
                })
            }
            (from, to) => Err(Error::Mixing(format!(
                "Refusing channel conversion {from} -> {to} (would drop channels)"
            ))),
        }
    }
}
