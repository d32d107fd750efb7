//! Artifact persistence and scratch-space lifecycle
//!
//! A completed run produces one WAV file plus a JSON metadata sidecar
//! under `<storage root>/artifacts/`. Intermediate files live in a
//! per-run scratch folder that is removed when the run ends, on every
//! exit path.

use crate::audio::{wav, AudioAsset};
use crate::mood::Mood;
use crate::params::Genre;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use songforge_common::{DegradedReason, Error, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

/// Metadata describing one finished song artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongArtifact {
    pub artifact_id: Uuid,
    /// The run that produced this artifact
    pub request_id: Uuid,
    /// Absolute path of the WAV file
    pub path: PathBuf,
    pub mood: Mood,
    pub genre: Genre,
    pub duration_seconds: f64,
    pub created_at: DateTime<Utc>,
    /// True when any stage fell back during the run
    pub degraded: bool,
    pub degraded_reasons: Vec<DegradedReason>,
}

/// Filesystem store for finished artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    artifacts_dir: PathBuf,
}

impl ArtifactStore {
    /// Open (and create if needed) the store under a storage root.
    pub fn open(storage_root: &Path) -> Result<Self> {
        let artifacts_dir = storage_root.join("artifacts");
        std::fs::create_dir_all(&artifacts_dir).map_err(|e| {
            Error::Resource(format!(
                "Cannot create artifact folder {}: {e}",
                artifacts_dir.display()
            ))
        })?;
        Ok(Self { artifacts_dir })
    }

    /// Persist the final mix as `<id>.wav` with a `<id>.json` sidecar.
    pub fn persist(
        &self,
        request_id: Uuid,
        mix: &AudioAsset,
        mood: Mood,
        genre: Genre,
        degraded_reasons: Vec<DegradedReason>,
    ) -> Result<SongArtifact> {
        let artifact_id = Uuid::new_v4();
        let wav_path = self.artifacts_dir.join(format!("{artifact_id}.wav"));
        wav::write_wav(&wav_path, mix)?;

        let artifact = SongArtifact {
            artifact_id,
            request_id,
            path: wav_path.clone(),
            mood,
            genre,
            duration_seconds: mix.duration_seconds(),
            created_at: Utc::now(),
            degraded: !degraded_reasons.is_empty(),
            degraded_reasons,
        };

        let json = serde_json::to_string_pretty(&artifact)
            .map_err(|e| Error::Resource(format!("Cannot serialize artifact metadata: {e}")))?;
        let sidecar = self.artifacts_dir.join(format!("{artifact_id}.json"));
        std::fs::write(&sidecar, json).map_err(|e| {
            Error::Resource(format!("Cannot write {}: {e}", sidecar.display()))
        })?;

        info!(
            artifact_id = %artifact_id,
            path = %wav_path.display(),
            duration_secs = artifact.duration_seconds,
            degraded = artifact.degraded,
            "Artifact persisted"
        );
        Ok(artifact)
    }

    /// Load the metadata sidecar for a stored artifact.
    pub fn load_metadata(&self, artifact_id: Uuid) -> Result<SongArtifact> {
        let sidecar = self.artifacts_dir.join(format!("{artifact_id}.json"));
        let json = std::fs::read_to_string(&sidecar).map_err(|e| {
            Error::Resource(format!("Cannot read {}: {e}", sidecar.display()))
        })?;
        serde_json::from_str(&json)
            .map_err(|e| Error::Resource(format!("Corrupt metadata {}: {e}", sidecar.display())))
    }
}

/// Per-run scratch folder, removed on drop.
///
/// Holding the guard for the whole run guarantees cleanup on success,
/// failure, and cancellation alike.
#[derive(Debug)]
pub struct RunScratch {
    dir: PathBuf,
}

impl RunScratch {
    /// Create `<storage root>/scratch/<request id>/`.
    pub fn create(storage_root: &Path, request_id: Uuid) -> Result<Self> {
        let dir = storage_root.join("scratch").join(request_id.to_string());
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::Resource(format!("Cannot create scratch folder {}: {e}", dir.display()))
        })?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

impl Drop for RunScratch {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            // Leftover scratch is a disk-space leak, not a correctness issue
            warn!(dir = %self.dir.display(), error = %e, "Failed to remove scratch folder");
        }
    }
}
