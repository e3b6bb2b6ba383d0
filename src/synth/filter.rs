// Filter - State Variable Filter (Chamberlin)
//
// 2-pole digital state variable filter with low-pass, high-pass and
// band-pass outputs. Used as the resonant stage of tone layers and noise
// bursts.
//
// References:
// - Hal Chamberlin's "Musical Applications of Microprocessors" (1985)
// - https://www.earlevel.com/main/2003/03/02/the-digital-state-variable-filter/
//
// Stable up to ~Fs/6, so cutoff is clamped there.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::synth::recipe::FilterSpec;

/// Filter type/mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Low-pass filter (12dB/octave)
    #[default]
    LowPass,
    /// High-pass filter (12dB/octave)
    HighPass,
    /// Band-pass filter (6dB/octave on each side)
    BandPass,
}

#[derive(Debug, Clone)]
pub struct StateVariableFilter {
    filter_type: FilterType,
    sample_rate: f32,

    // State variables
    low: f32,
    band: f32,

    // Coefficients
    f: f32, // Frequency coefficient
    q: f32, // Damping (1/Q)
}

impl StateVariableFilter {
    pub fn new(filter_type: FilterType, cutoff: f32, resonance: f32, sample_rate: f32) -> Self {
        let mut filter = Self {
            filter_type,
            sample_rate,
            low: 0.0,
            band: 0.0,
            f: 0.0,
            q: 0.0,
        };
        filter.set_cutoff(cutoff, resonance);
        filter
    }

    /// Build the filter described by a recipe
    pub fn from_spec(spec: &FilterSpec, sample_rate: f32) -> Self {
        Self::new(spec.filter_type, spec.cutoff, spec.resonance, sample_rate)
    }

    /// Recompute coefficients
    ///
    /// - `f = 2 * sin(π * fc / Fs)`
    /// - `q = 1 / Q`
    pub fn set_cutoff(&mut self, cutoff: f32, resonance: f32) {
        let max_cutoff = self.sample_rate / 6.0;
        let safe_cutoff = cutoff.clamp(20.0, max_cutoff);
        self.f = 2.0 * (PI * safe_cutoff / self.sample_rate).sin();

        let q_factor = resonance.clamp(0.5, 20.0);
        self.q = (1.0 / q_factor).clamp(0.01, 2.0);
    }

    pub fn reset(&mut self) {
        self.low = 0.0;
        self.band = 0.0;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let high = input - self.low - self.q * self.band;
        self.band += self.f * high;
        self.low += self.f * self.band;

        match self.filter_type {
            FilterType::LowPass => self.low,
            FilterType::HighPass => high,
            FilterType::BandPass => self.band,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowpass_passes_dc() {
        let mut filter = StateVariableFilter::new(FilterType::LowPass, 100.0, 0.707, 44100.0);
        let mut last = 0.0;
        for _ in 0..2000 {
            last = filter.process(1.0);
        }
        assert!((last - 1.0).abs() < 0.1);
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut filter = StateVariableFilter::new(FilterType::HighPass, 1000.0, 0.707, 44100.0);
        let mut last = 1.0;
        for _ in 0..2000 {
            last = filter.process(1.0);
        }
        assert!(last.abs() < 0.1);
    }

    #[test]
    fn test_bandpass_blocks_dc_passes_centre() {
        let sample_rate = 44100.0;
        let mut dc = StateVariableFilter::new(FilterType::BandPass, 1000.0, 2.0, sample_rate);
        let mut last = 1.0;
        for _ in 0..4000 {
            last = dc.process(1.0);
        }
        assert!(last.abs() < 0.05);

        let mut tone = StateVariableFilter::new(FilterType::BandPass, 1000.0, 2.0, sample_rate);
        let mut peak = 0.0f32;
        for i in 0..4000 {
            let input = (i as f32 * 1000.0 * 2.0 * PI / sample_rate).sin();
            let out = tone.process(input);
            if i > 2000 {
                peak = peak.max(out.abs());
            }
        }
        assert!(peak > 0.5, "peak {peak}");
    }

    #[test]
    fn test_high_resonance_stays_finite() {
        let mut filter = StateVariableFilter::new(FilterType::BandPass, 50_000.0, 100.0, 44100.0);
        for i in 0..10_000 {
            let input = if i % 2 == 0 { 1.0 } else { -1.0 };
            assert!(filter.process(input).is_finite());
        }
    }

    #[test]
    fn test_reset_clears_state() {
        let mut filter = StateVariableFilter::new(FilterType::LowPass, 500.0, 1.0, 44100.0);
        for _ in 0..100 {
            filter.process(0.5);
        }
        filter.reset();
        assert_eq!(filter.low, 0.0);
        assert_eq!(filter.band, 0.0);
    }
}
