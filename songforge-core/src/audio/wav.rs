//! WAV container I/O
//!
//! The persisted artifact contract: 16-bit PCM WAV at the configured
//! sample rate. Reading exists for the test suite and for callers that
//! want to inspect stored artifacts.

use crate::audio::{AudioAsset, Provenance};
use hound::{SampleFormat, WavSpec, WavWriter};
use songforge_common::{Error, Result};
use std::path::Path;

/// Write an asset as 16-bit PCM WAV.
pub fn write_wav(path: &Path, asset: &AudioAsset) -> Result<()> {
    let spec = WavSpec {
        channels: asset.channels,
        sample_rate: asset.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .map_err(|e| Error::Resource(format!("Failed to create {}: {e}", path.display())))?;

    for sample in &asset.samples {
        let scaled = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(scaled)
            .map_err(|e| Error::Resource(format!("Failed to write {}: {e}", path.display())))?;
    }

    writer
        .finalize()
        .map_err(|e| Error::Resource(format!("Failed to finalize {}: {e}", path.display())))?;
    Ok(())
}

/// Read a 16-bit PCM WAV back into an asset.
pub fn read_wav(path: &Path, provenance: Provenance) -> Result<AudioAsset> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| Error::Resource(format!("Failed to open {}: {e}", path.display())))?;
    let spec = reader.spec();

    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(Error::Resource(format!(
            "{} is not 16-bit PCM WAV",
            path.display()
        )));
    }

    let samples: Vec<f32> = reader
        .samples::<i16>()
        .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| Error::Resource(format!("Failed to read {}: {e}", path.display())))?;

    AudioAsset::new(samples, spec.sample_rate, spec.channels, provenance)
}
