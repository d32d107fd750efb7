//! Vocal synthesis adapter
//!
//! Synthesizes one clip per lyric segment through the [`VoiceProvider`]
//! and assembles them into a single vocal track with inter-segment
//! gaps. Unlike music generation there is no fallback for vocals: any
//! provider failure is fatal to the run.
//!
//! The assembled track is fitted to the lyric window by compressing the
//! gaps, never by dropping or truncating sung words.

use crate::audio::{resampler, AudioAsset, Provenance};
use crate::lyrics::LyricsDocument;
use crate::params::GenerationParameters;
use crate::providers::{VoiceProvider, VoiceRequest};
use songforge_common::config::{AudioConfig, GenerationConfig};
use songforge_common::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Vocal track assembly over an injected provider.
pub struct VoiceSynthesizer {
    provider: Arc<dyn VoiceProvider>,
    timeout: Duration,
    inter_segment_gap_seconds: f64,
    sample_rate: u32,
    channels: u16,
}

impl VoiceSynthesizer {
    pub fn new(
        provider: Arc<dyn VoiceProvider>,
        generation: &GenerationConfig,
        audio: &AudioConfig,
    ) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(generation.provider_timeout_seconds),
            inter_segment_gap_seconds: generation.inter_segment_gap_seconds,
            sample_rate: audio.sample_rate,
            channels: audio.channels,
        }
    }

    /// Synthesize the full vocal track for a document.
    ///
    /// `target_seconds` is the lyric window the track should fit in
    /// (the instrumental duration minus the intro and outro pads). When
    /// the clips plus configured gaps overrun it, the gaps are
    /// compressed toward zero; the clips themselves are never cut.
    pub async fn synthesize(
        &self,
        doc: &LyricsDocument,
        params: &GenerationParameters,
        target_seconds: f64,
    ) -> Result<AudioAsset> {
        let mut clips: Vec<(AudioAsset, f64)> = Vec::with_capacity(doc.segments.len());
        for segment in &doc.segments {
            let request = VoiceRequest {
                text: &segment.text,
                voice_profile_id: &params.voice_profile_id,
                tempo_bpm: params.tempo_bpm,
            };

            let clip = match tokio::time::timeout(
                self.timeout,
                self.provider.synthesize(&request),
            )
            .await
            {
                Ok(Ok(clip)) => clip,
                Ok(Err(e)) => {
                    return Err(Error::Synthesis(format!(
                        "Segment {} failed: {e}",
                        segment.index
                    )));
                }
                Err(_) => {
                    return Err(Error::Synthesis(format!(
                        "Segment {} timed out after {}s",
                        segment.index,
                        self.timeout.as_secs()
                    )));
                }
            };

            if clip.is_empty() {
                return Err(Error::Synthesis(format!(
                    "Segment {} produced no audio",
                    segment.index
                )));
            }

            debug!(
                provider = self.provider.name(),
                segment = segment.index,
                clip_secs = clip.duration_seconds(),
                "Vocal clip synthesized"
            );
            clips.push((self.conform(clip)?, segment.estimated_duration_seconds));
        }

        self.assemble(clips, target_seconds)
    }

    /// Bring one clip to the output format.
    fn conform(&self, clip: AudioAsset) -> Result<AudioAsset> {
        let clip = if clip.sample_rate != self.sample_rate {
            let samples = resampler::resample(
                &clip.samples,
                clip.sample_rate,
                self.sample_rate,
                clip.channels,
            )?;
            AudioAsset::new(samples, self.sample_rate, clip.channels, Provenance::Voice)?
        } else {
            clip
        };
        clip.to_channels(self.channels)
    }

    /// Join clips with pacing gaps, fitting the result inside
    /// `target_seconds`.
    ///
    /// The gap after each segment carries the remainder of that
    /// segment's duration estimate (when the clip came in shorter) plus
    /// the configured inter-segment gap. On overrun every gap is scaled
    /// down proportionally, to zero at worst.
    fn assemble(&self, clips: Vec<(AudioAsset, f64)>, target_seconds: f64) -> Result<AudioAsset> {
        let clip_total: f64 = clips.iter().map(|(c, _)| c.duration_seconds()).sum();
        // No gap after the last segment; the outro pad follows in the mix
        let mut gaps: Vec<f64> = clips
            .iter()
            .take(clips.len().saturating_sub(1))
            .map(|(clip, estimated)| {
                (estimated - clip.duration_seconds()).max(0.0) + self.inter_segment_gap_seconds
            })
            .collect();

        let gap_total: f64 = gaps.iter().sum();
        if clip_total + gap_total > target_seconds && gap_total > 0.0 {
            let scale = ((target_seconds - clip_total) / gap_total).clamp(0.0, 1.0);
            warn!(
                clip_secs = clip_total,
                target_secs = target_seconds,
                gap_scale = scale,
                "Vocal track overruns its window, compressing gaps"
            );
            for gap in &mut gaps {
                *gap *= scale;
            }
        }

        let mut track = AudioAsset::new(
            Vec::new(),
            self.sample_rate,
            self.channels,
            Provenance::Voice,
        )?;
        for (i, (clip, _)) in clips.iter().enumerate() {
            track.append(clip)?;
            if let Some(gap) = gaps.get(i).copied().filter(|g| *g > 0.0) {
                let silence =
                    AudioAsset::silence(gap, self.sample_rate, self.channels, Provenance::Voice);
                track.append(&silence)?;
            }
        }
        Ok(track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::LyricsProcessor;
    use crate::params::Genre;
    use crate::providers::{ProviderError, ProviderResult};
    use async_trait::async_trait;
    use songforge_common::config::LyricsConfig;
    use std::collections::BTreeSet;

    const RATE: u32 = 22050;

    fn params() -> GenerationParameters {
        GenerationParameters {
            genre: Genre::Pop,
            tempo_bpm: 120,
            key: "C".to_string(),
            duration_seconds: 20.0,
            instrumentation_tags: BTreeSet::new(),
            structure: Vec::new(),
            voice_profile_id: "v1".to_string(),
        }
    }

    fn doc(raw: &str) -> LyricsDocument {
        LyricsProcessor::new(&LyricsConfig::default()).process(raw).unwrap()
    }

    fn synthesizer(provider: Arc<dyn VoiceProvider>) -> VoiceSynthesizer {
        let mut generation = GenerationConfig::default();
        generation.provider_timeout_seconds = 2;
        VoiceSynthesizer::new(
            provider,
            &generation,
            &AudioConfig {
                sample_rate: RATE,
                channels: 1,
            },
        )
    }

    /// Delivers a fixed-length DC clip per segment.
    struct ClipProvider {
        clip_seconds: f64,
    }

    #[async_trait]
    impl VoiceProvider for ClipProvider {
        fn name(&self) -> &'static str {
            "clip"
        }

        async fn synthesize(&self, _request: &VoiceRequest<'_>) -> ProviderResult<AudioAsset> {
            let frames = (self.clip_seconds * RATE as f64) as usize;
            AudioAsset::new(vec![0.4; frames], RATE, 1, Provenance::Voice)
                .map_err(|e| ProviderError::Internal(e.to_string()))
        }
    }

    /// Never answers within any reasonable deadline.
    struct SlowProvider;

    #[async_trait]
    impl VoiceProvider for SlowProvider {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn synthesize(&self, _request: &VoiceRequest<'_>) -> ProviderResult<AudioAsset> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            AudioAsset::new(vec![0.4; RATE as usize], RATE, 1, Provenance::Voice)
                .map_err(|e| ProviderError::Internal(e.to_string()))
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl VoiceProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn synthesize(&self, _request: &VoiceRequest<'_>) -> ProviderResult<AudioAsset> {
            Err(ProviderError::Unavailable("voice model offline".into()))
        }
    }

    #[tokio::test]
    async fn test_clips_joined_with_configured_gaps() {
        let synth = synthesizer(Arc::new(ClipProvider { clip_seconds: 1.0 }));
        // 3 segments: 3s of clips + 2 gaps of 0.2s, well inside 20s
        let track = synth
            .synthesize(&doc("line one\nline two\nline three"), &params(), 20.0)
            .await
            .unwrap();

        assert!((track.duration_seconds() - 3.4).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_overrun_compresses_gaps_not_clips() {
        let synth = synthesizer(Arc::new(ClipProvider { clip_seconds: 2.0 }));
        // 3 clips of 2s against a 6.1s window: gaps shrink to 0.05s each
        let track = synth
            .synthesize(&doc("one\ntwo\nthree"), &params(), 6.1)
            .await
            .unwrap();

        assert!(track.duration_seconds() <= 6.1 + 0.01);
        // All sung material survives
        assert!(track.duration_seconds() >= 6.0 - 0.01);
    }

    #[tokio::test]
    async fn test_clips_alone_exceeding_window_keeps_all_words() {
        let synth = synthesizer(Arc::new(ClipProvider { clip_seconds: 3.0 }));
        // 9s of clips against a 5s window: gaps floor at zero, clips stay
        let track = synth
            .synthesize(&doc("one\ntwo\nthree"), &params(), 5.0)
            .await
            .unwrap();

        assert!((track.duration_seconds() - 9.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_short_clip_padded_to_segment_estimate() {
        let synth = synthesizer(Arc::new(ClipProvider { clip_seconds: 1.0 }));
        // First segment estimates 2.8s (7 words at 2.5 words/sec) but the
        // clip is 1s: the pacing gap carries the remaining 1.8s + 0.2s
        let track = synth
            .synthesize(
                &doc("one two three four five six seven\nend"),
                &params(),
                10.0,
            )
            .await
            .unwrap();

        assert!((track.duration_seconds() - 4.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_provider_failure_is_fatal() {
        let synth = synthesizer(Arc::new(FailingProvider));
        let result = synth.synthesize(&doc("one line"), &params(), 10.0).await;

        assert!(matches!(result, Err(Error::Synthesis(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_timeout_is_fatal() {
        let synth = synthesizer(Arc::new(SlowProvider));
        let result = synth.synthesize(&doc("one line"), &params(), 10.0).await;

        match result {
            Err(Error::Synthesis(msg)) => assert!(msg.contains("timed out"), "{msg}"),
            other => panic!("expected fatal synthesis error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_single_segment_has_no_gap() {
        let synth = synthesizer(Arc::new(ClipProvider { clip_seconds: 1.5 }));
        let track = synth.synthesize(&doc("only line"), &params(), 10.0).await.unwrap();
        assert!((track.duration_seconds() - 1.5).abs() < 0.01);
    }
}
