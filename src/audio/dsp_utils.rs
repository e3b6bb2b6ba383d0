// DSP helpers - sample hygiene, gain conversion and parameter smoothing
//
// Everything here is allocation-free and safe to call from the audio callback.

use std::f32::consts::FRAC_PI_4;

/// Flush denormals to zero
///
/// Threshold 1e-15, far below 32-bit float noise.
#[inline]
pub fn flush_denormals_to_zero(x: f32) -> f32 {
    if x.abs() < 1e-15 { 0.0 } else { x }
}

/// Soft clip with tanh, keeps the master bus inside [-1, 1]
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    x.tanh()
}

/// Decibels to linear gain (0 dB = 1.0)
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Equal-power pan law, returns (left, right) gains
///
/// `pan` is clamped to [-1, 1]; centre gives ~0.707 on both sides.
#[inline]
pub fn equal_power_pan(pan: f32) -> (f32, f32) {
    let angle = (pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
    (angle.cos(), angle.sin())
}

/// One-pole low-pass smoother for control values
///
/// y[n] = y[n-1] + a * (x[n] - y[n-1])
pub struct OnePoleSmoother {
    current: f32,
    coefficient: f32,
}

impl OnePoleSmoother {
    /// `time_constant_ms` is the time to reach ~63% of a step
    pub fn new(initial_value: f32, time_constant_ms: f32, sample_rate: f32) -> Self {
        let time_constant_samples = time_constant_ms * 0.001 * sample_rate;
        let coefficient = 1.0 / time_constant_samples.max(1.0);

        Self {
            current: initial_value,
            coefficient: coefficient.min(1.0),
        }
    }

    #[inline]
    pub fn process(&mut self, target: f32) -> f32 {
        self.current += self.coefficient * (target - self.current);
        self.current = flush_denormals_to_zero(self.current);
        self.current
    }

    /// Jump to a value without smoothing
    #[inline]
    pub fn reset(&mut self, value: f32) {
        self.current = value;
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }
}
