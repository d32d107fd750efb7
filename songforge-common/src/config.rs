//! Configuration loading for the song-assembly pipeline
//!
//! Resolution priority for the config file path:
//! 1. Command-line argument (highest priority)
//! 2. `SONGFORGE_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/songforge/config.toml`)
//! 4. Compiled defaults (no file required)
//!
//! All values carry serde defaults, so a partial TOML file only
//! overrides the sections it names.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub audio: AudioConfig,
    pub lyrics: LyricsConfig,
    pub generation: GenerationConfig,
    pub mixer: MixerConfig,
    pub storage: StorageConfig,
}

/// Output audio format. This is the persisted WAV contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Output channel count (1 = mono, 2 = stereo)
    pub channels: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
        }
    }
}

/// Lyric segmentation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LyricsConfig {
    /// Estimated singing rate used for per-segment duration
    pub words_per_second: f64,
    /// Minimum duration assigned to any segment, in seconds
    pub min_segment_seconds: f64,
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            words_per_second: 2.5,
            min_segment_seconds: 1.0,
        }
    }
}

/// Generation-stage timing and fallback policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Instrumental lead-in before the first vocal, in seconds
    pub intro_pad_seconds: f64,
    /// Instrumental tail after the last vocal, in seconds
    pub outro_pad_seconds: f64,
    /// Timeout applied to every capability provider call, in seconds
    pub provider_timeout_seconds: u64,
    /// Retries for the music provider before falling back
    pub music_retries: u32,
    /// Accepted deviation between requested and delivered instrumental
    /// duration before the adapter trims/pads, in seconds
    pub duration_tolerance_seconds: f64,
    /// Gap inserted between vocal segments, in seconds
    pub inter_segment_gap_seconds: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            intro_pad_seconds: 3.0,
            outro_pad_seconds: 3.0,
            provider_timeout_seconds: 30,
            music_retries: 1,
            duration_tolerance_seconds: 0.5,
            inter_segment_gap_seconds: 0.2,
        }
    }
}

/// Mixing gains and mastering ceiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    /// Gain applied to the vocal track (voice prioritized)
    pub voice_gain: f32,
    /// Gain applied to the instrumental track
    pub music_gain: f32,
    /// Peak-normalization target as a fraction of full scale
    pub peak_ceiling: f32,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            voice_gain: 1.0,
            music_gain: 0.6,
            peak_ceiling: 0.98,
        }
    }
}

/// Artifact and scratch storage locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root folder for artifacts and per-run scratch space.
    /// Defaults to the platform data directory when unset.
    pub root_folder: Option<PathBuf>,
}

impl PipelineConfig {
    /// Load configuration with CLI > env > config-file > default priority.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = cli_path {
            return Self::from_file(path);
        }

        if let Ok(path) = std::env::var("SONGFORGE_CONFIG") {
            return Self::from_file(Path::new(&path));
        }

        if let Some(path) = default_config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        info!("No config file found, using compiled defaults");
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Reject values the pipeline cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(Error::Config("audio.sample_rate must be > 0".into()));
        }
        if self.audio.channels == 0 || self.audio.channels > 2 {
            return Err(Error::Config("audio.channels must be 1 or 2".into()));
        }
        if self.lyrics.words_per_second <= 0.0 {
            return Err(Error::Config("lyrics.words_per_second must be > 0".into()));
        }
        if self.lyrics.min_segment_seconds <= 0.0 {
            return Err(Error::Config("lyrics.min_segment_seconds must be > 0".into()));
        }
        if self.generation.intro_pad_seconds < 0.0 || self.generation.outro_pad_seconds < 0.0 {
            return Err(Error::Config("generation pads must be >= 0".into()));
        }
        if !(0.0..=1.0).contains(&self.mixer.peak_ceiling) {
            return Err(Error::Config("mixer.peak_ceiling must be in (0, 1]".into()));
        }
        if self.mixer.peak_ceiling == 0.0 {
            return Err(Error::Config("mixer.peak_ceiling must be > 0".into()));
        }
        if self.mixer.voice_gain < 0.0 || self.mixer.music_gain < 0.0 {
            return Err(Error::Config("mixer gains must be >= 0".into()));
        }
        Ok(())
    }

    /// Resolve the storage root, falling back to the platform data dir.
    pub fn storage_root(&self) -> PathBuf {
        if let Some(root) = &self.storage.root_folder {
            return root.clone();
        }
        match dirs::data_local_dir() {
            Some(dir) => dir.join("songforge"),
            None => {
                warn!("No platform data directory, using ./songforge-data");
                PathBuf::from("songforge-data")
            }
        }
    }
}

/// Platform default config file path (`<config_dir>/songforge/config.toml`)
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("songforge").join("config.toml"))
}
