// One-shot amplitude envelope
//
// Attack: linear ramp from silence to the sustain level
// Plateau: short hold at the sustain level
// Decay: exponential fall toward ENVELOPE_FLOOR, reached at the total duration
//
// An exponential ramp can never reach zero, so the decay targets a small
// floor and the envelope reports Finished once the total duration is spent.

use crate::synth::recipe::EnvelopeSpec;

/// Level the exponential decay aims for
pub const ENVELOPE_FLOOR: f32 = 0.001;

/// Longest plateau between attack and decay (seconds)
pub const MAX_PLATEAU: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Attack,
    Plateau,
    Decay,
    Finished,
}

/// Sample-driven envelope for a single fire-and-forget sound
#[derive(Debug, Clone)]
pub struct OneShotEnvelope {
    level: f32,
    attack_samples: u64,
    plateau_end: u64,
    total_samples: u64,
    decay_ratio: f32,
    position: u64,
    current_value: f32,
}

impl OneShotEnvelope {
    pub fn new(spec: &EnvelopeSpec, sample_rate: f32) -> Self {
        let duration = spec.duration.max(0.001);
        let attack = spec.attack.clamp(0.0, duration);
        let plateau = ((duration - attack) * 0.1).clamp(0.0, MAX_PLATEAU);
        let level = spec.sustain.clamp(ENVELOPE_FLOOR, 1.0);

        let total_samples = (duration * sample_rate).round().max(1.0) as u64;
        let attack_samples = (attack * sample_rate).round() as u64;
        let plateau_samples = (plateau * sample_rate).round() as u64;
        let plateau_end = (attack_samples + plateau_samples).min(total_samples);

        let decay_samples = total_samples.saturating_sub(plateau_end).max(1);
        // Per-sample multiplier taking `level` down to the floor over the decay
        let decay_ratio = (ENVELOPE_FLOOR / level).powf(1.0 / decay_samples as f32);

        Self {
            level,
            attack_samples,
            plateau_end,
            total_samples,
            decay_ratio,
            position: 0,
            current_value: 0.0,
        }
    }

    pub fn stage(&self) -> EnvelopeStage {
        if self.position >= self.total_samples {
            EnvelopeStage::Finished
        } else if self.position < self.attack_samples {
            EnvelopeStage::Attack
        } else if self.position < self.plateau_end {
            EnvelopeStage::Plateau
        } else {
            EnvelopeStage::Decay
        }
    }

    /// Advance one sample and return the gain
    #[inline]
    pub fn process(&mut self) -> f32 {
        self.current_value = match self.stage() {
            EnvelopeStage::Attack => {
                self.level * (self.position as f32 / self.attack_samples as f32)
            }
            EnvelopeStage::Plateau => self.level,
            EnvelopeStage::Decay => {
                if self.position == self.plateau_end {
                    self.level
                } else {
                    self.current_value * self.decay_ratio
                }
            }
            EnvelopeStage::Finished => 0.0,
        };

        if self.position < self.total_samples {
            self.position += 1;
        }

        self.current_value
    }

    pub fn is_finished(&self) -> bool {
        self.stage() == EnvelopeStage::Finished
    }

    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    pub fn current_value(&self) -> f32 {
        self.current_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SAMPLE_RATE: f32 = 48000.0;

    fn spec(attack: f32, sustain: f32, duration: f32) -> EnvelopeSpec {
        EnvelopeSpec {
            attack,
            sustain,
            duration,
        }
    }

    #[test]
    fn test_attack_is_linear_up_to_level() {
        let mut env = OneShotEnvelope::new(&spec(0.01, 0.8, 0.5), TEST_SAMPLE_RATE);
        let attack_samples = (0.01 * TEST_SAMPLE_RATE) as usize;

        let mut previous = -1.0;
        for _ in 0..attack_samples {
            let v = env.process();
            assert!(v > previous);
            assert!(v <= 0.8);
            previous = v;
        }
        assert_eq!(env.stage(), EnvelopeStage::Plateau);
        assert!((env.process() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_decay_approaches_floor_without_reaching_zero() {
        let mut env = OneShotEnvelope::new(&spec(0.005, 1.0, 0.2), TEST_SAMPLE_RATE);
        let total = env.total_samples();

        let mut last = 1.0;
        for _ in 0..total {
            last = env.process();
        }

        assert!(last > 0.0);
        assert!(last < ENVELOPE_FLOOR * 1.5, "last value {}", last);
        assert!(env.is_finished());
        assert_eq!(env.process(), 0.0);
    }

    #[test]
    fn test_decay_is_monotonic() {
        let mut env = OneShotEnvelope::new(&spec(0.0, 0.5, 0.3), TEST_SAMPLE_RATE);
        let mut values = Vec::new();
        while !env.is_finished() {
            values.push(env.process());
        }
        let decay_start = values.iter().rposition(|&v| v == 0.5).unwrap();
        for pair in values[decay_start..].windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn test_attack_longer_than_duration_is_clamped() {
        let env = OneShotEnvelope::new(&spec(2.0, 0.7, 0.1), TEST_SAMPLE_RATE);
        assert_eq!(env.total_samples(), (0.1 * TEST_SAMPLE_RATE) as u64);
        assert!(env.attack_samples <= env.total_samples());
    }

    #[test]
    fn test_zero_duration_still_terminates() {
        let mut env = OneShotEnvelope::new(&spec(0.0, 1.0, 0.0), TEST_SAMPLE_RATE);
        for _ in 0..1000 {
            env.process();
        }
        assert!(env.is_finished());
    }
}
