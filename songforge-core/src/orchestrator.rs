//! Pipeline orchestration
//!
//! Drives one song request through the staged pipeline: lyric
//! segmentation, mood analysis, parameter mapping, concurrent music and
//! voice generation, mixing, and artifact persistence. Every state
//! transition and recovered fallback is broadcast on the [`EventBus`].
//!
//! Fatal errors abort the run; recovered degradations accumulate in the
//! artifact metadata. The recovered-vs-fatal decision itself lives in
//! the taxonomy table, not here.

use crate::artifact::{ArtifactStore, RunScratch, SongArtifact};
use crate::audio::wav;
use crate::generate::{MusicGenerator, VoiceSynthesizer};
use crate::lyrics::LyricsProcessor;
use crate::mixer::AudioMixer;
use crate::mood::MoodAnalyzer;
use crate::params::{GenreRequest, ParameterMapper};
use crate::providers::ProviderSet;
use songforge_common::config::PipelineConfig;
use songforge_common::{
    DegradedReason, Error, EventBus, PipelineEvent, Result, RunState,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// One song-assembly request.
#[derive(Debug, Clone)]
pub struct SongRequest {
    /// Raw lyric text
    pub lyrics: String,
    /// Voice profile passed through to the voice provider
    pub voice_profile_id: String,
    /// Concrete genre or auto-inference from mood
    pub genre: GenreRequest,
}

/// Tracks the run state machine and broadcasts transitions.
struct RunProgress {
    bus: EventBus,
    request_id: Uuid,
    state: RunState,
}

impl RunProgress {
    fn new(bus: EventBus, request_id: Uuid) -> Self {
        Self {
            bus,
            request_id,
            state: RunState::Pending,
        }
    }

    fn advance(&mut self, new_state: RunState) {
        info!(request_id = %self.request_id, from = ?self.state, to = ?new_state, "Run state change");
        self.bus.emit(PipelineEvent::RunStateChanged {
            request_id: self.request_id,
            old_state: self.state,
            new_state,
            timestamp: chrono::Utc::now(),
        });
        self.state = new_state;
    }

    fn degraded(&self, reason: DegradedReason, detail: String) {
        self.bus.emit(PipelineEvent::RunDegraded {
            request_id: self.request_id,
            reason,
            detail,
        });
    }
}

/// End-to-end pipeline over an injected provider set.
pub struct PipelineOrchestrator {
    config: PipelineConfig,
    lyrics: LyricsProcessor,
    analyzer: MoodAnalyzer,
    mapper: ParameterMapper,
    music: MusicGenerator,
    voice: VoiceSynthesizer,
    mixer: AudioMixer,
    store: ArtifactStore,
    bus: EventBus,
}

impl PipelineOrchestrator {
    pub fn new(config: PipelineConfig, providers: ProviderSet, bus: EventBus) -> Result<Self> {
        config.validate()?;
        let store = ArtifactStore::open(&config.storage_root())?;
        let timeout = Duration::from_secs(config.generation.provider_timeout_seconds);

        Ok(Self {
            lyrics: LyricsProcessor::new(&config.lyrics),
            analyzer: MoodAnalyzer::new(providers.classifier.clone(), timeout),
            mapper: ParameterMapper::new(&config.generation),
            music: MusicGenerator::new(providers.music.clone(), &config.generation, &config.audio),
            voice: VoiceSynthesizer::new(providers.voice.clone(), &config.generation, &config.audio),
            mixer: AudioMixer::new(&config.mixer),
            store,
            bus,
            config,
        })
    }

    /// Run one request to completion or failure.
    ///
    /// Cancellation is cooperative: the token is checked between stages
    /// and while generation is in flight. A cancelled run releases its
    /// scratch space and produces no artifact.
    #[instrument(skip_all, fields(request_id))]
    pub async fn run(
        &self,
        request: SongRequest,
        cancel: CancellationToken,
    ) -> Result<SongArtifact> {
        let request_id = Uuid::new_v4();
        tracing::Span::current().record("request_id", tracing::field::display(request_id));
        let mut progress = RunProgress::new(self.bus.clone(), request_id);

        match self.execute(request_id, &request, &cancel, &mut progress).await {
            Ok(artifact) => {
                progress.advance(RunState::Complete);
                self.bus.emit(PipelineEvent::RunCompleted {
                    request_id,
                    artifact_id: artifact.artifact_id,
                    duration_seconds: artifact.duration_seconds,
                    degraded: artifact.degraded,
                });
                Ok(artifact)
            }
            Err(e) => {
                let code = e.code();
                error!(
                    request_id = %request_id,
                    code = code.as_str(),
                    severity = ?code.severity(),
                    error = %e,
                    "Run failed"
                );
                progress.advance(RunState::Failed);
                self.bus.emit(PipelineEvent::RunFailed {
                    request_id,
                    code,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        request_id: Uuid,
        request: &SongRequest,
        cancel: &CancellationToken,
        progress: &mut RunProgress,
    ) -> Result<SongArtifact> {
        let doc = self.lyrics.process(&request.lyrics)?;
        info!(
            segments = doc.segments.len(),
            words = doc.word_count(),
            estimated_secs = doc.total_duration_seconds(),
            "Lyrics segmented"
        );

        let mut degraded_reasons = Vec::new();

        checkpoint(cancel)?;
        progress.advance(RunState::Analyzing);
        let profile = self.analyzer.analyze(&doc).await;
        if profile.fallback {
            degraded_reasons.push(DegradedReason::AnalysisFallback);
            progress.degraded(
                DegradedReason::AnalysisFallback,
                "Mood classification unavailable, using neutral profile".into(),
            );
        }
        info!(
            mood = %profile.primary_mood,
            confidence = profile.confidence,
            fallback = profile.fallback,
            "Mood resolved"
        );

        checkpoint(cancel)?;
        progress.advance(RunState::Mapping);
        let params = self.mapper.map(
            &profile,
            request.genre,
            doc.total_duration_seconds(),
            &request.voice_profile_id,
        )?;
        info!(
            genre = %params.genre,
            tempo_bpm = params.tempo_bpm,
            key = %params.key,
            duration_secs = params.duration_seconds,
            "Generation parameters resolved"
        );

        checkpoint(cancel)?;
        progress.advance(RunState::Generating);
        let scratch = RunScratch::create(&self.config.storage_root(), request_id)?;

        // Lyric window the vocal track must fit
        let vocal_window = doc.total_duration_seconds();
        let (music_outcome, voice_track) = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            results = async {
                tokio::join!(
                    self.music.generate(&params),
                    self.voice.synthesize(&doc, &params, vocal_window),
                )
            } => results,
        };

        // Voice is unrecoverable: its failure discards any music result
        let voice_track = voice_track?;
        let music_outcome = music_outcome?;
        if let Some(reason) = music_outcome.degraded {
            degraded_reasons.push(reason);
            progress.degraded(
                reason,
                "Music provider failed, using local backing track".into(),
            );
        }

        // Intermediate tracks land in scratch for post-mortem inspection
        wav::write_wav(&scratch.path().join("music.wav"), &music_outcome.asset)?;
        wav::write_wav(&scratch.path().join("voice.wav"), &voice_track)?;

        checkpoint(cancel)?;
        progress.advance(RunState::Mixing);
        let mix = self.mixer.mix(
            music_outcome.asset,
            voice_track,
            self.mapper.intro_pad_seconds(),
            params.genre,
        )?;

        self.store.persist(
            request_id,
            &mix,
            profile.primary_mood,
            params.genre,
            degraded_reasons,
        )
    }
}

fn checkpoint(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use songforge_common::TaxonomyCode;

    fn config(root: &std::path::Path) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.storage.root_folder = Some(root.to_path_buf());
        // Keep tests fast
        config.audio.sample_rate = 8000;
        config.audio.channels = 1;
        config
    }

    fn request(lyrics: &str) -> SongRequest {
        SongRequest {
            lyrics: lyrics.to_string(),
            voice_profile_id: "v1".to_string(),
            genre: GenreRequest::Auto,
        }
    }

    #[tokio::test]
    async fn test_state_sequence_on_success() {
        let root = tempfile::tempdir().unwrap();
        let config = config(root.path());
        let providers = ProviderSet::builtin(&config.audio);
        let bus = EventBus::new(64);
        let mut rx = bus.subscribe();
        let orchestrator = PipelineOrchestrator::new(config, providers, bus).unwrap();

        orchestrator
            .run(request("la la la"), CancellationToken::new())
            .await
            .unwrap();

        let mut states = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let PipelineEvent::RunStateChanged { new_state, .. } = event {
                states.push(new_state);
            }
        }
        assert_eq!(
            states,
            vec![
                RunState::Analyzing,
                RunState::Mapping,
                RunState::Generating,
                RunState::Mixing,
                RunState::Complete,
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_lyrics_fail_before_any_stage() {
        let root = tempfile::tempdir().unwrap();
        let config = config(root.path());
        let providers = ProviderSet::builtin(&config.audio);
        let bus = EventBus::new(64);
        let mut rx = bus.subscribe();
        let orchestrator = PipelineOrchestrator::new(config, providers, bus).unwrap();

        let result = orchestrator
            .run(request("   "), CancellationToken::new())
            .await;
        assert!(matches!(result, Err(Error::Input(_))));

        // Only the Failed transition and the failure event are emitted
        let mut saw_failed_event = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                PipelineEvent::RunStateChanged { new_state, .. } => {
                    assert_eq!(new_state, RunState::Failed);
                }
                PipelineEvent::RunFailed { code, .. } => {
                    assert_eq!(code, TaxonomyCode::Input);
                    saw_failed_event = true;
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }
        assert!(saw_failed_event);
    }

    #[tokio::test]
    async fn test_pre_cancelled_run_produces_nothing() {
        let root = tempfile::tempdir().unwrap();
        let config = config(root.path());
        let providers = ProviderSet::builtin(&config.audio);
        let orchestrator =
            PipelineOrchestrator::new(config, providers, EventBus::new(16)).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = orchestrator.run(request("la la la"), cancel).await;

        assert!(matches!(result, Err(Error::Cancelled)));
        // No artifacts and no leftover scratch
        let artifacts: Vec<_> = std::fs::read_dir(root.path().join("artifacts"))
            .unwrap()
            .collect();
        assert!(artifacts.is_empty());
        let scratch_root = root.path().join("scratch");
        if scratch_root.exists() {
            assert_eq!(std::fs::read_dir(scratch_root).unwrap().count(), 0);
        }
    }
}
