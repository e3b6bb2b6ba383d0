// One-shot signal graphs
//
// A graph is the realization of one recipe trigger: oscillator/noise source
// -> optional filter -> envelope gain -> layer gain, summed, scaled by the
// trigger volume and panned. Graphs are built on the control thread (all
// allocation happens there) and consumed sample by sample in the output
// callback or in offline rendering. A finished graph is discarded.

use rand::Rng;
use std::f32::consts::TAU;

use crate::audio::dsp_utils::{equal_power_pan, flush_denormals_to_zero};
use crate::synth::envelope::OneShotEnvelope;
use crate::synth::filter::StateVariableFilter;
use crate::synth::oscillator::{Oscillator, SimpleOscillator};
use crate::synth::recipe::{LayerSpec, NoiseSpec, SynthesisRecipe, ToneSpec, Vibrato};

#[derive(Debug, Clone)]
struct VibratoLfo {
    phase: f32,
    increment: f32,
    depth: f32,
}

impl VibratoLfo {
    fn new(vibrato: &Vibrato, sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            increment: vibrato.rate / sample_rate,
            depth: vibrato.depth,
        }
    }

    #[inline]
    fn next_offset(&mut self) -> f32 {
        let value = (self.phase * TAU).sin() * self.depth;
        self.phase = (self.phase + self.increment).fract();
        value
    }
}

#[derive(Debug, Clone)]
struct ToneNode {
    oscillator: SimpleOscillator,
    envelope: OneShotEnvelope,
    filter: Option<StateVariableFilter>,
    vibrato: Option<VibratoLfo>,
    frequency: f32,
    /// Per-sample frequency multiplier (1.0 = fixed pitch)
    ramp_ratio: f32,
}

impl ToneNode {
    fn new(tone: &ToneSpec, vibrato: Option<&Vibrato>, sample_rate: f32) -> Self {
        let envelope = OneShotEnvelope::new(&tone.envelope, sample_rate);
        let start = tone.frequency.max(1.0);
        let ramp_ratio = match tone.frequency_target {
            Some(target) if target > 0.0 => {
                (target / start).powf(1.0 / envelope.total_samples() as f32)
            }
            _ => 1.0,
        };

        Self {
            oscillator: SimpleOscillator::new(tone.waveform, sample_rate),
            envelope,
            filter: tone
                .filter
                .as_ref()
                .map(|spec| StateVariableFilter::from_spec(spec, sample_rate)),
            vibrato: vibrato.map(|v| VibratoLfo::new(v, sample_rate)),
            frequency: start,
            ramp_ratio,
        }
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        if self.envelope.is_finished() {
            return 0.0;
        }

        let vibrato = self.vibrato.as_mut().map_or(0.0, VibratoLfo::next_offset);
        self.oscillator.set_frequency(self.frequency + vibrato);
        let mut sample = self.oscillator.next_sample();
        if let Some(filter) = self.filter.as_mut() {
            sample = filter.process(sample);
        }
        self.frequency *= self.ramp_ratio;

        sample * self.envelope.process()
    }

    fn is_finished(&self) -> bool {
        self.envelope.is_finished()
    }

    fn len(&self) -> u64 {
        self.envelope.total_samples()
    }
}

/// Pre-rendered, filtered and decayed white noise
#[derive(Debug, Clone)]
struct NoiseNode {
    buffer: Vec<f32>,
    position: usize,
}

impl NoiseNode {
    fn new(spec: &NoiseSpec, sample_rate: f32) -> Self {
        let len = (spec.duration.max(0.0) * sample_rate).round().max(1.0) as usize;
        let mut filter = StateVariableFilter::from_spec(&spec.filter, sample_rate);
        let mut rng = rand::thread_rng();

        let buffer = (0..len)
            .map(|i| {
                let decay = spec.decay.amplitude(i as f32 / len as f32);
                filter.process(rng.gen_range(-1.0f32..1.0) * decay)
            })
            .collect();

        Self {
            buffer,
            position: 0,
        }
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        match self.buffer.get(self.position) {
            Some(&sample) => {
                self.position += 1;
                sample
            }
            None => 0.0,
        }
    }

    fn is_finished(&self) -> bool {
        self.position >= self.buffer.len()
    }

    fn len(&self) -> u64 {
        self.buffer.len() as u64
    }
}

#[derive(Debug, Clone)]
enum Source {
    Tone(ToneNode),
    Noise(NoiseNode),
}

#[derive(Debug, Clone)]
struct LayerNode {
    /// Samples after the graph start before this layer sounds
    offset_samples: u64,
    gain: f32,
    source: Source,
}

impl LayerNode {
    fn from_layer(layer: &LayerSpec, sample_rate: f32) -> Self {
        Self {
            offset_samples: seconds_to_samples(layer.offset, sample_rate),
            gain: layer.gain,
            source: Source::Tone(ToneNode::new(&layer.tone, layer.vibrato.as_ref(), sample_rate)),
        }
    }

    #[inline]
    fn next_sample(&mut self, local: u64) -> f32 {
        if local < self.offset_samples {
            return 0.0;
        }
        let sample = match &mut self.source {
            Source::Tone(tone) => tone.next_sample(),
            Source::Noise(noise) => noise.next_sample(),
        };
        sample * self.gain
    }

    fn is_finished(&self) -> bool {
        match &self.source {
            Source::Tone(tone) => tone.is_finished(),
            Source::Noise(noise) => noise.is_finished(),
        }
    }

    fn end_sample(&self) -> u64 {
        let len = match &self.source {
            Source::Tone(tone) => tone.len(),
            Source::Noise(noise) => noise.len(),
        };
        self.offset_samples + len
    }
}

fn seconds_to_samples(seconds: f32, sample_rate: f32) -> u64 {
    (seconds.max(0.0) * sample_rate).round() as u64
}

/// A playable instance of one recipe
#[derive(Debug, Clone)]
pub struct OneShotGraph {
    label: String,
    delay_samples: u64,
    position: u64,
    layers: Vec<LayerNode>,
    gain: f32,
    pan_gains: (f32, f32),
}

impl OneShotGraph {
    /// Build a graph for `recipe`
    ///
    /// `start_offset` (seconds, negative treated as 0) delays the whole
    /// graph; `pan` is -1 (left) to 1 (right).
    pub fn build(
        label: impl Into<String>,
        recipe: &SynthesisRecipe,
        volume: f32,
        start_offset: f32,
        pan: f32,
        sample_rate: f32,
    ) -> Self {
        let layers = match recipe {
            SynthesisRecipe::Single(tone) => vec![LayerNode {
                offset_samples: 0,
                gain: 1.0,
                source: Source::Tone(ToneNode::new(tone, None, sample_rate)),
            }],
            SynthesisRecipe::Multi(layers) => layers
                .iter()
                .map(|layer| LayerNode::from_layer(layer, sample_rate))
                .collect(),
            SynthesisRecipe::Noise(noise) => vec![LayerNode {
                offset_samples: 0,
                gain: 1.0,
                source: Source::Noise(NoiseNode::new(noise, sample_rate)),
            }],
        };

        Self {
            label: label.into(),
            delay_samples: seconds_to_samples(start_offset, sample_rate),
            position: 0,
            layers,
            gain: volume.max(0.0),
            pan_gains: equal_power_pan(pan),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn delay_samples(&self) -> u64 {
        self.delay_samples
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn pan_gains(&self) -> (f32, f32) {
        self.pan_gains
    }

    /// Samples from submission until the last layer is silent
    pub fn total_samples(&self) -> u64 {
        self.delay_samples + self.layers.iter().map(LayerNode::end_sample).max().unwrap_or(0)
    }

    /// Render one stereo frame
    #[inline]
    pub fn next_frame(&mut self) -> (f32, f32) {
        if self.position < self.delay_samples {
            self.position += 1;
            return (0.0, 0.0);
        }

        let local = self.position - self.delay_samples;
        let mut mono = 0.0;
        for layer in self.layers.iter_mut() {
            mono += layer.next_sample(local);
        }
        self.position += 1;

        let sample = flush_denormals_to_zero(mono * self.gain);
        (sample * self.pan_gains.0, sample * self.pan_gains.1)
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.delay_samples && self.layers.iter().all(LayerNode::is_finished)
    }

    /// Render the whole graph into a fresh buffer of stereo frames
    pub fn render(mut self) -> Vec<(f32, f32)> {
        let mut frames = Vec::with_capacity(self.total_samples() as usize);
        while !self.is_finished() {
            frames.push(self.next_frame());
        }
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::filter::FilterType;
    use crate::synth::oscillator::WaveformType;
    use crate::synth::recipe::{EnvelopeSpec, FilterSpec, NoiseDecay};

    const SR: f32 = 8000.0;

    fn beep(frequency: f32, duration: f32) -> ToneSpec {
        ToneSpec {
            waveform: WaveformType::Sine,
            frequency,
            frequency_target: None,
            envelope: EnvelopeSpec {
                attack: 0.01,
                sustain: 0.8,
                duration,
            },
            filter: None,
        }
    }

    fn peak(frames: &[(f32, f32)]) -> f32 {
        frames.iter().fold(0.0, |m, (l, r)| m.max(l.abs()).max(r.abs()))
    }

    #[test]
    fn test_single_tone_renders_and_finishes() {
        let recipe = SynthesisRecipe::Single(beep(440.0, 0.1));
        let graph = OneShotGraph::build("beep", &recipe, 1.0, 0.0, 0.0, SR);
        assert_eq!(graph.total_samples(), 800);

        let frames = graph.render();
        assert_eq!(frames.len(), 800);
        assert!(peak(&frames) > 0.3);
        assert!(peak(&frames) <= 1.0);
    }

    #[test]
    fn test_start_offset_delays_output() {
        let recipe = SynthesisRecipe::Single(beep(440.0, 0.05));
        let mut graph = OneShotGraph::build("late", &recipe, 1.0, 0.1, 0.0, SR);
        assert_eq!(graph.delay_samples(), 800);

        for _ in 0..800 {
            assert_eq!(graph.next_frame(), (0.0, 0.0));
            assert!(!graph.is_finished());
        }
        let rest = graph.render();
        assert_eq!(rest.len(), 400);
        assert!(peak(&rest) > 0.0);
    }

    #[test]
    fn test_hard_pan_silences_other_side() {
        let recipe = SynthesisRecipe::Single(beep(440.0, 0.05));
        let frames = OneShotGraph::build("left", &recipe, 1.0, 0.0, -1.0, SR).render();
        assert!(frames.iter().all(|&(_, r)| r.abs() < 1e-6));
        assert!(frames.iter().any(|&(l, _)| l.abs() > 0.1));
    }

    #[test]
    fn test_multi_layer_offsets() {
        let recipe = SynthesisRecipe::Multi(vec![
            LayerSpec {
                tone: beep(440.0, 0.05),
                offset: 0.0,
                gain: 1.0,
                vibrato: None,
            },
            LayerSpec {
                tone: beep(880.0, 0.05),
                offset: 0.1,
                gain: 1.0,
                vibrato: Some(Vibrato {
                    rate: 5.0,
                    depth: 10.0,
                }),
            },
        ]);
        let graph = OneShotGraph::build("two", &recipe, 0.5, 0.0, 0.0, SR);
        // Second layer ends at 0.15 s
        assert_eq!(graph.total_samples(), 1200);

        let frames = graph.render();
        assert_eq!(frames.len(), 1200);
        // Gap between the two layers is silent
        assert!(peak(&frames[400..800]) < 1e-6);
        assert!(peak(&frames[800..]) > 0.0);
    }

    #[test]
    fn test_noise_is_bounded_and_decays() {
        let recipe = SynthesisRecipe::Noise(NoiseSpec {
            decay: NoiseDecay::Linear,
            filter: FilterSpec {
                filter_type: FilterType::LowPass,
                cutoff: 2000.0,
                resonance: 0.7,
            },
            duration: 0.5,
        });
        let frames = OneShotGraph::build("noise", &recipe, 1.0, 0.0, 0.0, SR).render();
        assert_eq!(frames.len(), 4000);
        assert!(peak(&frames[..1000]) > peak(&frames[3000..]));
        assert!(frames.iter().all(|(l, r)| l.is_finite() && r.is_finite()));
    }

    #[test]
    fn test_frequency_ramp_reaches_target() {
        let mut tone = beep(200.0, 0.1);
        tone.frequency_target = Some(800.0);
        let mut node = ToneNode::new(&tone, None, SR);
        for _ in 0..node.len() {
            node.next_sample();
        }
        assert!((node.frequency - 800.0).abs() < 1.0);
    }

    #[test]
    fn test_zero_volume_is_silent() {
        let recipe = SynthesisRecipe::Single(beep(440.0, 0.05));
        let frames = OneShotGraph::build("mute", &recipe, 0.0, 0.0, 0.0, SR).render();
        assert_eq!(peak(&frames), 0.0);
    }
}
