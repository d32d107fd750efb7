//! Sample-rate conversion using rubato
//!
//! The mixer never truncates fidelity: when two assets disagree on
//! sample rate, the lower-rate one is converted up to match before
//! mixing. FastFixedIn gives a good quality/cost tradeoff for the
//! one-shot full-buffer conversions done here.

use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use songforge_common::{Error, Result};
use tracing::debug;

/// Resample interleaved audio to `output_rate`.
///
/// Returns a copy when the rates already match.
pub fn resample(input: &[f32], input_rate: u32, output_rate: u32, channels: u16) -> Result<Vec<f32>> {
    if input_rate == output_rate {
        return Ok(input.to_vec());
    }
    if input.is_empty() {
        return Ok(Vec::new());
    }

    debug!(
        "Resampling from {}Hz to {}Hz ({} channels)",
        input_rate, output_rate, channels
    );

    // rubato expects planar input
    let planar_input = deinterleave(input, channels);
    let input_frames = planar_input[0].len();

    let mut resampler = FastFixedIn::<f32>::new(
        output_rate as f64 / input_rate as f64,
        1.0,
        PolynomialDegree::Septic,
        input_frames,
        channels as usize,
    )
    .map_err(|e| Error::Mixing(format!("Failed to create resampler: {e}")))?;

    let planar_output = resampler
        .process(&planar_input, None)
        .map_err(|e| Error::Mixing(format!("Resampling failed: {e}")))?;

    Ok(interleave(planar_output))
}

/// [L, R, L, R, ...] -> [[L, L, ...], [R, R, ...]]
fn deinterleave(samples: &[f32], channels: u16) -> Vec<Vec<f32>> {
    let num_channels = channels as usize;
    let num_frames = samples.len() / num_channels;

    let mut planar = vec![Vec::with_capacity(num_frames); num_channels];
    for frame_idx in 0..num_frames {
        for ch_idx in 0..num_channels {
            planar[ch_idx].push(samples[frame_idx * num_channels + ch_idx]);
        }
    }
    planar
}

/// [[L, L, ...], [R, R, ...]] -> [L, R, L, R, ...]
fn interleave(planar: Vec<Vec<f32>>) -> Vec<f32> {
    if planar.is_empty() {
        return Vec::new();
    }

    let num_channels = planar.len();
    let num_frames = planar[0].len();
    let mut interleaved = Vec::with_capacity(num_frames * num_channels);

    for frame_idx in 0..num_frames {
        for channel in planar.iter().take(num_channels) {
            interleaved.push(channel[frame_idx]);
        }
    }
    interleaved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deinterleave_stereo() {
        let interleaved = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let planar = deinterleave(&interleaved, 2);

        assert_eq!(planar.len(), 2);
        assert_eq!(planar[0], vec![1.0, 3.0, 5.0]);
        assert_eq!(planar[1], vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_interleave_roundtrip() {
        let planar = vec![vec![1.0, 3.0], vec![2.0, 4.0]];
        assert_eq!(interleave(planar), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_same_rate_is_copy() {
        let input = vec![0.1, 0.2, 0.3, 0.4];
        let output = resample(&input, 44100, 44100, 2).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_upsample_length() {
        let input_rate = 22050;
        let frames = 2000;
        let mut input = Vec::with_capacity(frames * 2);
        for i in 0..frames {
            let t = i as f32 / input_rate as f32;
            let sample = (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5;
            input.push(sample);
            input.push(sample);
        }

        let output = resample(&input, input_rate, 44100, 2).unwrap();
        let output_frames = output.len() / 2;
        let expected = frames * 2;

        assert!(
            output_frames.abs_diff(expected) <= 20,
            "expected ~{expected} frames, got {output_frames}"
        );
    }

    #[test]
    fn test_empty_input() {
        let output = resample(&[], 22050, 44100, 2).unwrap();
        assert!(output.is_empty());
    }
}
