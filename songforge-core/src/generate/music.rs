//! Instrumental generation adapter
//!
//! Wraps the [`MusicProvider`] with the run policy: per-call timeout,
//! configured retries, and a local fallback backing track when every
//! attempt fails. Music generation never kills a run; the worst case
//! is a degraded artifact. The adapter also owns format and duration
//! reconciliation, so downstream stages always see PCM at the
//! configured output format within tolerance of the requested length.

use crate::audio::{resampler, AudioAsset, Provenance};
use crate::params::GenerationParameters;
use crate::providers::MusicProvider;
use songforge_common::config::{AudioConfig, GenerationConfig};
use songforge_common::{DegradedReason, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What the adapter delivered: the instrumental plus whether the
/// provider path failed and the local fallback was used.
#[derive(Debug)]
pub struct MusicOutcome {
    pub asset: AudioAsset,
    pub degraded: Option<DegradedReason>,
}

/// Instrumental generation with retry-then-fallback policy.
pub struct MusicGenerator {
    provider: Arc<dyn MusicProvider>,
    timeout: Duration,
    retries: u32,
    duration_tolerance_seconds: f64,
    sample_rate: u32,
    channels: u16,
}

impl MusicGenerator {
    pub fn new(
        provider: Arc<dyn MusicProvider>,
        generation: &GenerationConfig,
        audio: &AudioConfig,
    ) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(generation.provider_timeout_seconds),
            retries: generation.music_retries,
            duration_tolerance_seconds: generation.duration_tolerance_seconds,
            sample_rate: audio.sample_rate,
            channels: audio.channels,
        }
    }

    /// Produce the instrumental for the given parameters.
    ///
    /// Provider failures and timeouts are retried `music_retries` times;
    /// when every attempt fails, a locally rendered backing track is
    /// substituted and the outcome is marked degraded.
    pub async fn generate(&self, params: &GenerationParameters) -> Result<MusicOutcome> {
        let attempts = self.retries + 1;
        for attempt in 1..=attempts {
            match tokio::time::timeout(self.timeout, self.provider.generate(params)).await {
                Ok(Ok(asset)) => {
                    debug!(
                        provider = self.provider.name(),
                        attempt,
                        delivered_secs = asset.duration_seconds(),
                        "Music provider delivered"
                    );
                    let asset = self.conform(asset, params.duration_seconds)?;
                    return Ok(MusicOutcome {
                        asset,
                        degraded: None,
                    });
                }
                Ok(Err(e)) => {
                    warn!(
                        provider = self.provider.name(),
                        attempt,
                        error = %e,
                        "Music generation attempt failed"
                    );
                }
                Err(_) => {
                    warn!(
                        provider = self.provider.name(),
                        attempt,
                        timeout_secs = self.timeout.as_secs(),
                        "Music generation attempt timed out"
                    );
                }
            }
        }

        info!(
            provider = self.provider.name(),
            genre = %params.genre,
            "All music attempts failed, using local backing track"
        );
        let asset = fallback_backing_track(params, self.sample_rate, self.channels);
        Ok(MusicOutcome {
            asset,
            degraded: Some(DegradedReason::GenerationFallback),
        })
    }

    /// Bring a provider asset to the output format and requested length.
    ///
    /// Duration deviations inside the tolerance are accepted as-is;
    /// larger ones are trimmed or silence-padded to the exact request.
    fn conform(&self, asset: AudioAsset, requested_seconds: f64) -> Result<AudioAsset> {
        let mut asset = if asset.sample_rate != self.sample_rate {
            let samples = resampler::resample(
                &asset.samples,
                asset.sample_rate,
                self.sample_rate,
                asset.channels,
            )?;
            AudioAsset::new(samples, self.sample_rate, asset.channels, Provenance::Music)?
        } else {
            asset
        };

        asset = asset.to_channels(self.channels)?;

        let deviation = (asset.duration_seconds() - requested_seconds).abs();
        if deviation > self.duration_tolerance_seconds {
            let target_frames = (requested_seconds * self.sample_rate as f64).round() as usize;
            warn!(
                delivered_secs = asset.duration_seconds(),
                requested_secs = requested_seconds,
                "Instrumental duration out of tolerance, reconciling"
            );
            asset.trim_to_frames(target_frames);
            asset.pad_to_frames(target_frames);
        }

        Ok(asset)
    }
}

/// Minimal local backing track: a looping I-IV-V-I triad bed at the
/// requested tempo, with minor triads for the darker genres. Exists so
/// a dead music provider degrades the song instead of failing the run.
fn fallback_backing_track(
    params: &GenerationParameters,
    sample_rate: u32,
    channels: u16,
) -> AudioAsset {
    const ROOT_HZ: f32 = 220.0;
    const PROGRESSION: [i32; 4] = [0, 5, 7, 0];

    let third = match params.genre {
        crate::params::Genre::Ambient | crate::params::Genre::Electronic => 3,
        _ => 4,
    };

    let sr = sample_rate as f32;
    let total_frames = (params.duration_seconds * sample_rate as f64).round() as usize;
    // One chord per four beats
    let chord_frames = (((60.0 / params.tempo_bpm as f32) * 4.0 * sr) as usize).max(1);

    let mut mono = Vec::with_capacity(total_frames);
    for frame in 0..total_frames {
        let chord = PROGRESSION[(frame / chord_frames) % PROGRESSION.len()];
        let root = ROOT_HZ * 2.0f32.powf(chord as f32 / 12.0);
        let t = frame as f32 / sr;

        let mut value = 0.0f32;
        for interval in [0, third, 7] {
            let freq = root * 2.0f32.powf(interval as f32 / 12.0);
            value += (2.0 * std::f32::consts::PI * freq * t).sin();
        }
        mono.push(value / 3.0 * 0.4);
    }

    let samples = if channels == 1 {
        mono
    } else {
        let mut interleaved = Vec::with_capacity(mono.len() * channels as usize);
        for sample in mono {
            for _ in 0..channels {
                interleaved.push(sample);
            }
        }
        interleaved
    };

    AudioAsset {
        samples,
        sample_rate,
        channels,
        provenance: Provenance::Music,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Genre;
    use crate::providers::{ProviderError, ProviderResult};
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn params(duration: f64) -> GenerationParameters {
        GenerationParameters {
            genre: Genre::Pop,
            tempo_bpm: 120,
            key: "C".to_string(),
            duration_seconds: duration,
            instrumentation_tags: BTreeSet::new(),
            structure: Vec::new(),
            voice_profile_id: "v".to_string(),
        }
    }

    fn generator(provider: Arc<dyn MusicProvider>) -> MusicGenerator {
        let mut generation = GenerationConfig::default();
        generation.provider_timeout_seconds = 2;
        generation.music_retries = 1;
        MusicGenerator::new(
            provider,
            &generation,
            &AudioConfig {
                sample_rate: 22050,
                channels: 2,
            },
        )
    }

    /// Delivers a fixed-duration silent asset, counting calls.
    struct FixedProvider {
        delivered_seconds: f64,
        sample_rate: u32,
        channels: u16,
        calls: AtomicU32,
    }

    #[async_trait]
    impl MusicProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn generate(&self, _params: &GenerationParameters) -> ProviderResult<AudioAsset> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AudioAsset::silence(
                self.delivered_seconds,
                self.sample_rate,
                self.channels,
                Provenance::Music,
            ))
        }
    }

    /// Never answers within any reasonable deadline.
    struct SlowProvider {
        calls: AtomicU32,
    }

    #[async_trait]
    impl MusicProvider for SlowProvider {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn generate(&self, params: &GenerationParameters) -> ProviderResult<AudioAsset> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok(AudioAsset::silence(
                params.duration_seconds,
                22050,
                2,
                Provenance::Music,
            ))
        }
    }

    struct FailingProvider {
        calls: AtomicU32,
    }

    #[async_trait]
    impl MusicProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn generate(&self, _params: &GenerationParameters) -> ProviderResult<AudioAsset> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Unavailable("model offline".into()))
        }
    }

    #[tokio::test]
    async fn test_within_tolerance_passes_through() {
        let provider = Arc::new(FixedProvider {
            delivered_seconds: 10.3,
            sample_rate: 22050,
            channels: 2,
            calls: AtomicU32::new(0),
        });
        let outcome = generator(provider).generate(&params(10.0)).await.unwrap();

        assert!(outcome.degraded.is_none());
        // 0.3s deviation is inside the 0.5s tolerance, left untouched
        assert!((outcome.asset.duration_seconds() - 10.3).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_out_of_tolerance_reconciled() {
        let provider = Arc::new(FixedProvider {
            delivered_seconds: 13.0,
            sample_rate: 22050,
            channels: 2,
            calls: AtomicU32::new(0),
        });
        let outcome = generator(provider).generate(&params(10.0)).await.unwrap();

        assert!((outcome.asset.duration_seconds() - 10.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_short_delivery_padded() {
        let provider = Arc::new(FixedProvider {
            delivered_seconds: 7.0,
            sample_rate: 22050,
            channels: 2,
            calls: AtomicU32::new(0),
        });
        let outcome = generator(provider).generate(&params(10.0)).await.unwrap();

        assert!((outcome.asset.duration_seconds() - 10.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_mono_provider_upmixed() {
        let provider = Arc::new(FixedProvider {
            delivered_seconds: 5.0,
            sample_rate: 22050,
            channels: 1,
            calls: AtomicU32::new(0),
        });
        let outcome = generator(provider).generate(&params(5.0)).await.unwrap();
        assert_eq!(outcome.asset.channels, 2);
    }

    #[tokio::test]
    async fn test_retry_then_fallback() {
        let provider = Arc::new(FailingProvider {
            calls: AtomicU32::new(0),
        });
        let outcome = generator(provider.clone()).generate(&params(8.0)).await.unwrap();

        // 1 initial attempt + 1 retry
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(outcome.degraded, Some(DegradedReason::GenerationFallback));
        // Fallback honors the requested duration and output format
        assert!((outcome.asset.duration_seconds() - 8.0).abs() < 0.01);
        assert_eq!(outcome.asset.channels, 2);
        assert!(outcome.asset.peak() > 0.1, "fallback must be audible");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failed_attempt() {
        let provider = Arc::new(SlowProvider {
            calls: AtomicU32::new(0),
        });
        let outcome = generator(provider.clone()).generate(&params(6.0)).await.unwrap();

        // Both attempts expired at the 2s deadline, then the fallback
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(outcome.degraded, Some(DegradedReason::GenerationFallback));
        assert!((outcome.asset.duration_seconds() - 6.0).abs() < 0.01);
    }
}
