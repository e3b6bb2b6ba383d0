// Sample format conversion for device output and WAV export
//
// Device streams may be f32, i16 or u16 (cpal converts through
// `FromSample`); WAV export always writes 16-bit PCM.

use cpal::{FromSample, Sample};

/// f32 to 16-bit PCM, clamped to [-1, 1]
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped >= 0.0 {
        (clamped * i16::MAX as f32) as i16
    } else {
        (clamped * -(i16::MIN as f32)) as i16
    }
}

/// Write one stereo frame into an interleaved device buffer
///
/// Channels beyond the second get silence; a mono device gets the L/R average.
#[inline]
pub fn write_stereo_to_interleaved_frame<T>((left, right): (f32, f32), output_frame: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    if output_frame.len() >= 2 {
        output_frame[0] = T::from_sample(left);
        output_frame[1] = T::from_sample(right);
        for channel_sample in output_frame.iter_mut().skip(2) {
            *channel_sample = T::from_sample(0.0f32);
        }
    } else if let Some(channel_sample) = output_frame.first_mut() {
        *channel_sample = T::from_sample((left + right) * 0.5);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_to_i16_conversion() {
        assert_eq!(f32_to_i16(0.0), 0);
        assert_eq!(f32_to_i16(1.0), i16::MAX);
        assert_eq!(f32_to_i16(-1.0), i16::MIN);
        assert_eq!(f32_to_i16(2.0), i16::MAX);
        assert_eq!(f32_to_i16(-2.0), i16::MIN);
    }

    #[test]
    fn test_write_stereo_frame() {
        let mut frame = [0.0f32; 2];
        write_stereo_to_interleaved_frame((0.25, -0.5), &mut frame);
        assert_eq!(frame, [0.25, -0.5]);

        let mut surround = [1.0f32; 4];
        write_stereo_to_interleaved_frame((0.25, -0.5), &mut surround);
        assert_eq!(surround, [0.25, -0.5, 0.0, 0.0]);

        let mut mono = [0.0f32; 1];
        write_stereo_to_interleaved_frame((0.5, 0.0), &mut mono);
        assert_eq!(mono[0], 0.25);
    }

    #[test]
    fn test_write_stereo_frame_i16() {
        let mut frame = [0i16; 2];
        write_stereo_to_interleaved_frame((0.5, -0.5), &mut frame);
        assert!(frame[0] > 0);
        assert!(frame[1] < 0);
    }
}
