//! Time-aligned two-track mixing
//!
//! Combines the instrumental and vocal tracks into the final mix:
//! format reconciliation, per-track gains, vocal placement at the
//! intro-pad offset, and a mastering limiter that keeps the peak at or
//! below the configured ceiling.
//!
//! Reconciliation never discards fidelity: when the tracks disagree on
//! sample rate the lower one is resampled up, and mono is widened to
//! stereo rather than stereo collapsed down.

use crate::audio::{resampler, AudioAsset, Provenance};
use crate::params::Genre;
use songforge_common::config::MixerConfig;
use songforge_common::{Error, Result};
use tracing::{debug, info};

/// Voice/music balance the genre presets were tuned against.
const PRESET_BASELINE: (f32, f32) = (0.8, 0.6);

/// Per-genre (voice, music) balance presets.
///
/// Genres without an entry mix at the configured gains unchanged;
/// genres with one shift the balance relative to [`PRESET_BASELINE`]
/// (ambient buries the voice in the bed, pop pushes it forward).
fn genre_preset(genre: Genre) -> Option<(f32, f32)> {
    match genre {
        Genre::Pop => Some((0.9, 0.7)),
        Genre::Rock => Some((0.85, 0.8)),
        Genre::Electronic => Some((0.75, 0.85)),
        Genre::Jazz => Some((0.8, 0.65)),
        Genre::Classical => Some((0.7, 0.8)),
        Genre::Ambient => Some((0.6, 0.9)),
        Genre::Ballad | Genre::Rnb => None,
    }
}

/// Final-mix stage.
#[derive(Debug, Clone)]
pub struct AudioMixer {
    voice_gain: f32,
    music_gain: f32,
    peak_ceiling: f32,
}

impl AudioMixer {
    pub fn new(config: &MixerConfig) -> Self {
        Self {
            voice_gain: config.voice_gain,
            music_gain: config.music_gain,
            peak_ceiling: config.peak_ceiling,
        }
    }

    /// Gains for one run: the configured pair, rebalanced by the
    /// genre preset when one exists.
    fn gains_for(&self, genre: Genre) -> (f32, f32) {
        match genre_preset(genre) {
            Some((voice, music)) => (
                self.voice_gain * voice / PRESET_BASELINE.0,
                self.music_gain * music / PRESET_BASELINE.1,
            ),
            None => (self.voice_gain, self.music_gain),
        }
    }

    /// Mix the vocal track over the instrumental, with the vocal
    /// starting `voice_offset_seconds` in. The genre selects the
    /// voice/music balance preset.
    ///
    /// The output covers both tracks in full: its length is the later
    /// of instrumental end and offset vocal end, whichever region one
    /// track does not reach is carried by the other alone.
    pub fn mix(
        &self,
        music: AudioAsset,
        voice: AudioAsset,
        voice_offset_seconds: f64,
        genre: Genre,
    ) -> Result<AudioAsset> {
        if music.is_empty() {
            return Err(Error::Mixing("Instrumental track is empty".into()));
        }
        if voice.is_empty() {
            return Err(Error::Mixing("Vocal track is empty".into()));
        }
        if voice_offset_seconds < 0.0 {
            return Err(Error::Mixing(format!(
                "Vocal offset must be >= 0, got {voice_offset_seconds}"
            )));
        }

        let (mut music, mut voice) = reconcile(music, voice)?;
        let sample_rate = music.sample_rate;
        let channels = music.channels;

        let (voice_gain, music_gain) = self.gains_for(genre);
        music.apply_gain(music_gain);
        voice.apply_gain(voice_gain);

        let offset_frames = (voice_offset_seconds * sample_rate as f64).round() as usize;
        let total_frames = music.frames().max(offset_frames + voice.frames());
        debug!(
            music_frames = music.frames(),
            voice_frames = voice.frames(),
            offset_frames,
            total_frames,
            "Mixing tracks"
        );

        let stride = channels as usize;
        let mut samples = vec![0.0f32; total_frames * stride];
        for (i, sample) in music.samples.iter().enumerate() {
            samples[i] += sample;
        }
        let voice_start = offset_frames * stride;
        for (i, sample) in voice.samples.iter().enumerate() {
            samples[voice_start + i] += sample;
        }

        let mut mix = AudioAsset::new(samples, sample_rate, channels, Provenance::Mix)?;
        self.limit(&mut mix);
        Ok(mix)
    }

    /// Attenuate the whole mix when its peak exceeds the ceiling.
    /// Quiet mixes are left alone; the limiter never amplifies.
    fn limit(&self, mix: &mut AudioAsset) {
        let peak = mix.peak();
        if peak > self.peak_ceiling {
            let scale = self.peak_ceiling / peak;
            info!(peak, scale, "Mix exceeds peak ceiling, attenuating");
            mix.apply_gain(scale);
        }
    }
}

/// Bring both tracks to a common format: the higher sample rate and
/// the wider channel count win.
fn reconcile(music: AudioAsset, voice: AudioAsset) -> Result<(AudioAsset, AudioAsset)> {
    let target_rate = music.sample_rate.max(voice.sample_rate);
    let target_channels = music.channels.max(voice.channels);

    let music = to_format(music, target_rate, target_channels)?;
    let voice = to_format(voice, target_rate, target_channels)?;
    Ok((music, voice))
}

fn to_format(asset: AudioAsset, sample_rate: u32, channels: u16) -> Result<AudioAsset> {
    let asset = if asset.sample_rate != sample_rate {
        let samples = resampler::resample(
            &asset.samples,
            asset.sample_rate,
            sample_rate,
            asset.channels,
        )?;
        AudioAsset::new(samples, sample_rate, asset.channels, asset.provenance)?
    } else {
        asset
    };
    asset.to_channels(channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 1000;

    fn mixer() -> AudioMixer {
        AudioMixer::new(&MixerConfig::default())
    }

    fn constant(seconds: f64, value: f32, provenance: Provenance) -> AudioAsset {
        let frames = (seconds * RATE as f64) as usize;
        AudioAsset::new(vec![value; frames], RATE, 1, provenance)
            .expect("test asset")
    }

    #[test]
    fn test_output_covers_both_tracks() {
        // 30s music, 34s voice offset 3s: voice ends at 37s
        let music = constant(30.0, 0.2, Provenance::Music);
        let voice = constant(34.0, 0.2, Provenance::Voice);

        let mix = mixer().mix(music, voice, 3.0, Genre::Ballad).unwrap();
        assert!((mix.duration_seconds() - 37.0).abs() < 0.01);
        assert_eq!(mix.provenance, Provenance::Mix);
    }

    #[test]
    fn test_music_longer_than_voice() {
        let music = constant(20.0, 0.2, Provenance::Music);
        let voice = constant(5.0, 0.2, Provenance::Voice);

        let mix = mixer().mix(music, voice, 3.0, Genre::Ballad).unwrap();
        assert!((mix.duration_seconds() - 20.0).abs() < 0.01);
    }

    #[test]
    fn test_gains_applied_and_voice_offset() {
        let music = constant(2.0, 0.5, Provenance::Music);
        let voice = constant(1.0, 0.5, Provenance::Voice);
        let mix = mixer().mix(music, voice, 1.0, Genre::Ballad).unwrap();

        // Before the offset only music plays at 0.6 gain
        let early = mix.samples[(RATE / 2) as usize];
        assert!((early - 0.3).abs() < 1e-5);
        // After the offset music (0.3) and voice (0.5) sum
        let late = mix.samples[(RATE + RATE / 2) as usize];
        assert!((late - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_hot_mix_limited_to_ceiling() {
        let music = constant(1.0, 0.9, Provenance::Music);
        let voice = constant(1.0, 0.9, Provenance::Voice);
        // 0.9*0.6 + 0.9*1.0 = 1.44, above the 0.98 ceiling
        let mix = mixer().mix(music, voice, 0.0, Genre::Ballad).unwrap();

        let peak = mix.peak();
        assert!(peak <= 0.98 + 1e-5);
        assert!(peak > 0.97, "limiter should land on the ceiling");
    }

    #[test]
    fn test_quiet_mix_not_amplified() {
        let music = constant(1.0, 0.1, Provenance::Music);
        let voice = constant(1.0, 0.1, Provenance::Voice);
        let mix = mixer().mix(music, voice, 0.0, Genre::Ballad).unwrap();

        // 0.1*0.6 + 0.1*1.0 = 0.16, untouched
        assert!((mix.peak() - 0.16).abs() < 1e-5);
    }

    #[test]
    fn test_empty_track_rejected() {
        let music = constant(1.0, 0.2, Provenance::Music);
        let empty = AudioAsset::new(Vec::new(), RATE, 1, Provenance::Voice).unwrap();
        assert!(matches!(
            mixer().mix(music, empty, 0.0, Genre::Ballad),
            Err(Error::Mixing(_))
        ));

        let empty = AudioAsset::new(Vec::new(), RATE, 1, Provenance::Music).unwrap();
        let voice = constant(1.0, 0.2, Provenance::Voice);
        assert!(matches!(
            mixer().mix(empty, voice, 0.0, Genre::Ballad),
            Err(Error::Mixing(_))
        ));
    }

    #[test]
    fn test_genre_preset_rebalances_gains() {
        // Ambient pulls the voice down and the bed up relative to the
        // configured pair
        let music = constant(2.0, 0.5, Provenance::Music);
        let voice = constant(1.0, 0.5, Provenance::Voice);
        let mix = mixer().mix(music, voice, 1.0, Genre::Ambient).unwrap();

        // Music alone: 0.5 * (0.6 * 0.9/0.6) = 0.45
        let early = mix.samples[(RATE / 2) as usize];
        assert!((early - 0.45).abs() < 1e-5);
        // Sum: 0.45 + 0.5 * (1.0 * 0.6/0.8) = 0.825
        let late = mix.samples[(RATE + RATE / 2) as usize];
        assert!((late - 0.825).abs() < 1e-5);
    }

    #[test]
    fn test_unpreset_genres_use_configured_pair() {
        let music = constant(1.0, 0.5, Provenance::Music);
        let voice = constant(1.0, 0.5, Provenance::Voice);
        let ballad = mixer().mix(music, voice, 0.0, Genre::Ballad).unwrap();

        let music = constant(1.0, 0.5, Provenance::Music);
        let voice = constant(1.0, 0.5, Provenance::Voice);
        let rnb = mixer().mix(music, voice, 0.0, Genre::Rnb).unwrap();

        // Both fall back to voice 1.0 / music 0.6
        assert!((ballad.samples[10] - 0.8).abs() < 1e-5);
        assert!((rnb.samples[10] - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_mixed_rates_reconciled_upward() {
        let music = AudioAsset::silence(1.0, 44100, 2, Provenance::Music);
        let mut music = music;
        music.samples.iter_mut().for_each(|s| *s = 0.2);
        let voice = constant(1.0, 0.2, Provenance::Voice);

        let mix = mixer().mix(music, voice, 0.0, Genre::Ballad).unwrap();
        assert_eq!(mix.sample_rate, 44100);
        assert_eq!(mix.channels, 2);
    }
}
