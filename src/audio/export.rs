// Audio export - offline rendering to WAV
//
// Unlike the device callback this renders as fast as possible. Output is
// always 16-bit PCM stereo.

use std::path::Path;

use hound::{WavSpec, WavWriter};

use crate::audio::dsp_utils::soft_clip;
use crate::audio::format_conversion::f32_to_i16;
use crate::audio::graph::OneShotGraph;
use crate::synth::recipe::SynthesisRecipe;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f32),
}

/// Write stereo frames as a 16-bit PCM WAV file
pub fn write_wav(
    path: impl AsRef<Path>,
    frames: &[(f32, f32)],
    sample_rate: f32,
) -> Result<(), ExportError> {
    if !(sample_rate.is_finite() && sample_rate >= 1.0) {
        return Err(ExportError::InvalidSampleRate(sample_rate));
    }

    let spec = WavSpec {
        channels: 2,
        sample_rate: sample_rate.round() as u32,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path.as_ref(), spec)?;
    for &(left, right) in frames {
        writer.write_sample(f32_to_i16(left))?;
        writer.write_sample(f32_to_i16(right))?;
    }
    writer.finalize()?;

    tracing::info!(
        path = %path.as_ref().display(),
        frames = frames.len(),
        "WAV written"
    );
    Ok(())
}

/// Render a single resolved sound, centred, to a WAV file
///
/// Returns the number of frames written.
pub fn render_sound_to_wav(
    path: impl AsRef<Path>,
    label: &str,
    recipe: &SynthesisRecipe,
    volume: f32,
    sample_rate: f32,
) -> Result<usize, ExportError> {
    if !(sample_rate.is_finite() && sample_rate >= 1.0) {
        return Err(ExportError::InvalidSampleRate(sample_rate));
    }

    let frames: Vec<(f32, f32)> = OneShotGraph::build(label, recipe, volume, 0.0, 0.0, sample_rate)
        .render()
        .into_iter()
        .map(|(l, r)| (soft_clip(l), soft_clip(r)))
        .collect();

    write_wav(path, &frames, sample_rate)?;
    Ok(frames.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::resolve;
    use tempfile::TempDir;

    #[test]
    fn test_render_sound_to_wav() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("click.wav");
        let (recipe, volume) = resolve("ui", "ui_click");

        let frames = render_sound_to_wav(&path, "ui_click", &recipe, volume, 22050.0).unwrap();
        assert!(frames > 0);

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len() as usize, frames * 2);
    }

    #[test]
    fn test_invalid_sample_rate() {
        let dir = TempDir::new().unwrap();
        let result = write_wav(dir.path().join("x.wav"), &[(0.0, 0.0)], 0.0);
        assert!(matches!(result, Err(ExportError::InvalidSampleRate(_))));
    }

    #[test]
    fn test_empty_frames_still_produce_valid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.wav");
        write_wav(&path, &[], 44100.0).unwrap();
        assert_eq!(hound::WavReader::open(&path).unwrap().len(), 0);
    }
}
