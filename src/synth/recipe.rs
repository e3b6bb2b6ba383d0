// Synthesis recipes - declarative descriptions of one sound
//
// A recipe says what to synthesize, independent of any audio runtime.
// `audio::graph` realizes it as a signal chain.

use serde::{Deserialize, Serialize};

use crate::synth::filter::FilterType;
use crate::synth::oscillator::WaveformType;

/// Amplitude envelope parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeSpec {
    /// Linear ramp time in seconds
    pub attack: f32,
    /// Peak/plateau level (0.0 to 1.0)
    pub sustain: f32,
    /// Total length in seconds, attack included
    pub duration: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub filter_type: FilterType,
    /// Cutoff in Hz
    pub cutoff: f32,
    /// Q factor
    pub resonance: f32,
}

/// Periodic frequency modulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vibrato {
    /// Hz
    pub rate: f32,
    /// Deviation in Hz
    pub depth: f32,
}

/// A single oscillator voice
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneSpec {
    pub waveform: WaveformType,
    /// Start frequency in Hz
    pub frequency: f32,
    /// Frequency reached at the end of the envelope (exponential ramp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_target: Option<f32>,
    pub envelope: EnvelopeSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterSpec>,
}

/// One layer of a Multi recipe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub tone: ToneSpec,
    /// Start offset relative to the trigger, seconds
    pub offset: f32,
    /// Relative layer gain
    pub gain: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibrato: Option<Vibrato>,
}

/// Amplitude shape applied across a noise buffer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseDecay {
    /// exp(-rate * t)
    Exponential { rate: f32 },
    /// 1 - t
    Linear,
    /// (1 - t)^exponent
    Power { exponent: f32 },
}

impl NoiseDecay {
    /// Gain at normalized buffer position `t` (0.0 at the first sample, 1.0 at the end)
    pub fn amplitude(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            NoiseDecay::Exponential { rate } => (-rate * t).exp(),
            NoiseDecay::Linear => 1.0 - t,
            NoiseDecay::Power { exponent } => (1.0 - t).powf(exponent),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseSpec {
    pub decay: NoiseDecay,
    pub filter: FilterSpec,
    /// Seconds
    pub duration: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisRecipe {
    Single(ToneSpec),
    Multi(Vec<LayerSpec>),
    Noise(NoiseSpec),
}

impl SynthesisRecipe {
    pub fn kind(&self) -> &'static str {
        match self {
            SynthesisRecipe::Single(_) => "single",
            SynthesisRecipe::Multi(_) => "multi",
            SynthesisRecipe::Noise(_) => "noise",
        }
    }

    /// Time until the last layer falls silent, in seconds
    pub fn duration(&self) -> f32 {
        match self {
            SynthesisRecipe::Single(tone) => tone.envelope.duration,
            SynthesisRecipe::Multi(layers) => layers
                .iter()
                .map(|l| l.offset + l.tone.envelope.duration)
                .fold(0.0, f32::max),
            SynthesisRecipe::Noise(noise) => noise.duration,
        }
    }

    /// Scale every oscillator frequency by `factor`
    ///
    /// Filters are left alone so the timbre keeps its brightness. Noise has
    /// no pitch and is returned unchanged.
    pub fn with_pitch(mut self, factor: f32) -> Self {
        if factor <= 0.0 || factor == 1.0 {
            return self;
        }
        match &mut self {
            SynthesisRecipe::Single(tone) => tone.transpose(factor),
            SynthesisRecipe::Multi(layers) => {
                for layer in layers.iter_mut() {
                    layer.tone.transpose(factor);
                    if let Some(vibrato) = layer.vibrato.as_mut() {
                        vibrato.depth *= factor;
                    }
                }
            }
            SynthesisRecipe::Noise(_) => {}
        }
        self
    }
}

impl ToneSpec {
    fn transpose(&mut self, factor: f32) {
        self.frequency *= factor;
        if let Some(target) = self.frequency_target.as_mut() {
            *target *= factor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(frequency: f32, duration: f32) -> ToneSpec {
        ToneSpec {
            waveform: WaveformType::Sine,
            frequency,
            frequency_target: Some(frequency * 2.0),
            envelope: EnvelopeSpec {
                attack: 0.01,
                sustain: 0.8,
                duration,
            },
            filter: None,
        }
    }

    #[test]
    fn test_multi_duration_includes_offsets() {
        let recipe = SynthesisRecipe::Multi(vec![
            LayerSpec {
                tone: tone(440.0, 0.2),
                offset: 0.0,
                gain: 1.0,
                vibrato: None,
            },
            LayerSpec {
                tone: tone(660.0, 0.1),
                offset: 0.3,
                gain: 0.5,
                vibrato: None,
            },
        ]);
        assert!((recipe.duration() - 0.4).abs() < 1e-6);
        assert_eq!(recipe.kind(), "multi");
    }

    #[test]
    fn test_with_pitch_scales_frequencies() {
        let recipe = SynthesisRecipe::Single(tone(440.0, 0.2)).with_pitch(2.0);
        match recipe {
            SynthesisRecipe::Single(t) => {
                assert_eq!(t.frequency, 880.0);
                assert_eq!(t.frequency_target, Some(1760.0));
            }
            _ => panic!("Expected Single"),
        }
    }

    #[test]
    fn test_noise_decay_shapes() {
        assert_eq!(NoiseDecay::Linear.amplitude(0.0), 1.0);
        assert_eq!(NoiseDecay::Linear.amplitude(1.0), 0.0);
        let exponential = NoiseDecay::Exponential { rate: 5.0 }.amplitude(1.0);
        assert!((exponential - (-5.0f32).exp()).abs() < 1e-6);
        assert_eq!(NoiseDecay::Power { exponent: 2.0 }.amplitude(0.5), 0.25);
        // Out-of-range positions are clamped
        assert_eq!(NoiseDecay::Linear.amplitude(2.0), 0.0);
    }
}
