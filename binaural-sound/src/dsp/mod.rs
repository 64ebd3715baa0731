//! Digital signal processing module.
//!
//! # Overview
//!
//! Contains the building blocks every effect and the spatial renderer are made of. Each block here
//! processes one sample at a time, never allocates after construction and never fails, so it is
//! safe to use from the audio thread.

use crate::error::SpatialError;

pub mod filters;
pub mod rms;
pub mod wavetable;

/// Mono circular delay line with fractional (linearly interpolated) taps.
///
/// Delays are measured back from the most recently written sample: a tap of `0` returns the sample
/// that was just written, a tap of `1` the one before it, and so on. Fractional delays blend the
/// sample at the truncated delay with the next older one.
///
/// Capacity is fixed at construction. Requests for delays that do not fit are clamped silently,
/// the line never reallocates.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayLine {
    samples: Vec<f32>,
    cursor: usize,
    sample_rate: u32,
}

impl Default for DelayLine {
    fn default() -> Self {
        Self::new(1, 44100)
    }
}

impl DelayLine {
    /// Creates new delay line which can hold `capacity` samples. Zero capacity is bumped to one
    /// sample, use [`Self::try_new`] if that should be treated as an error instead.
    pub fn new(capacity: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![0.0; capacity.max(1)],
            cursor: 0,
            sample_rate,
        }
    }

    /// Creates new delay line, rejects empty capacity.
    pub fn try_new(capacity: usize, sample_rate: u32) -> Result<Self, SpatialError> {
        if capacity == 0 {
            Err(SpatialError::InvalidDelayCapacity(capacity))
        } else {
            Ok(Self::new(capacity, sample_rate))
        }
    }

    /// Returns total length of the delay line (in samples).
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Returns sample rate used to convert delay times into samples.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns position at which the next sample will be written.
    pub fn write_cursor(&self) -> usize {
        self.cursor
    }

    /// Appends one sample.
    pub fn write(&mut self, sample: f32) {
        self.samples[self.cursor] = sample;
        self.cursor += 1;
        if self.cursor >= self.samples.len() {
            self.cursor = 0;
        }
    }

    /// Reads the line `delay` samples behind the last written sample. Does not modify the line.
    pub fn tap_by_samples(&self, delay: f32) -> f32 {
        let max_delay = (self.samples.len() - 1) as f32;
        let newest = self.wrap_back(self.cursor, 1);
        self.read(newest, delay.max(0.0).min(max_delay))
    }

    /// Same as [`Self::tap_by_samples`], but the delay is given in seconds.
    pub fn tap_by_time(&self, delay: f32) -> f32 {
        self.tap_by_samples(delay * self.sample_rate as f32)
    }

    /// Reads a delayed sample and writes `input + feedback * delayed` in one step, returns the
    /// delayed sample. The delay is counted from the sample being written, so it can not be
    /// shorter than one sample.
    ///
    /// # Notes
    ///
    /// Do not call [`Self::write`] for the same sample, this method writes by itself. Feedback of
    /// 1.0 or higher makes the output grow without bound.
    pub fn feedback_tap(&mut self, input: f32, delay: f32, feedback: f32) -> f32 {
        self.feedback_tap_samples(input, delay * self.sample_rate as f32, feedback)
    }

    /// Same as [`Self::feedback_tap`], but the delay is given in samples.
    pub fn feedback_tap_samples(&mut self, input: f32, delay: f32, feedback: f32) -> f32 {
        let max_delay = self.samples.len() as f32;
        let delayed = self.read(self.cursor, delay.max(1.0).min(max_delay));
        self.write(input + feedback * delayed);
        delayed
    }

    fn wrap_back(&self, position: usize, offset: usize) -> usize {
        let capacity = self.samples.len();
        (position + capacity - offset % capacity) % capacity
    }

    // `anchor` is the slot of zero delay, `delay` is already clamped to the valid range.
    fn read(&self, anchor: usize, delay: f32) -> f32 {
        let whole = delay as usize;
        let frac = delay - whole as f32;
        let index = self.wrap_back(anchor, whole);
        let older = if index == 0 {
            self.samples.len() - 1
        } else {
            index - 1
        };
        (1.0 - frac) * self.samples[index] + frac * self.samples[older]
    }
}

#[cfg(test)]
mod test {
    use crate::dsp::DelayLine;

    fn write_impulse_and_wait(line: &mut DelayLine, delay: usize) {
        line.write(1.0);
        for _ in 0..delay {
            line.write(0.0);
        }
    }

    #[test]
    fn test_impulse_round_trip() {
        for delay in [0usize, 1, 2, 7, 15] {
            let mut line = DelayLine::new(16, 48000);
            write_impulse_and_wait(&mut line, delay);
            assert_eq!(line.tap_by_samples(delay as f32), 1.0, "delay {}", delay);
            if delay > 0 {
                assert_eq!(line.tap_by_samples(delay as f32 - 1.0), 0.0);
            }
        }
    }

    #[test]
    fn test_round_trip_across_wrap() {
        let mut line = DelayLine::new(8, 48000);
        // Move cursor close to the end of the buffer first.
        for _ in 0..6 {
            line.write(0.0);
        }
        write_impulse_and_wait(&mut line, 5);
        assert_eq!(line.write_cursor(), 4);
        assert_eq!(line.tap_by_samples(5.0), 1.0);
    }

    #[test]
    fn test_fractional_tap_blends_backwards() {
        let mut line = DelayLine::new(16, 48000);
        for sample in [1.0, 2.0, 3.0, 4.0] {
            line.write(sample);
        }
        // 4.0 is at delay 0, 3.0 at delay 1.
        let tap = line.tap_by_samples(0.25);
        assert!((tap - (0.75 * 4.0 + 0.25 * 3.0)).abs() < 1.0e-6);
        let tap = line.tap_by_samples(2.5);
        assert!((tap - 1.5).abs() < 1.0e-6);
    }

    #[test]
    fn test_tap_by_time_uses_sample_rate() {
        let mut line = DelayLine::new(64, 20);
        write_impulse_and_wait(&mut line, 10);
        assert_eq!(line.tap_by_time(0.5), 1.0);
    }

    #[test]
    fn test_delay_is_clamped() {
        let mut line = DelayLine::new(4, 48000);
        for sample in [1.0, 2.0, 3.0, 4.0, 5.0] {
            line.write(sample);
        }
        // Oldest sample still in the line is 2.0.
        assert_eq!(line.tap_by_samples(100.0), 2.0);
        assert_eq!(line.tap_by_samples(-3.0), 5.0);
        assert_eq!(line.tap_by_samples(f32::NAN), 5.0);
    }

    #[test]
    fn test_feedback_uses_pre_write_value() {
        let mut line = DelayLine::new(8, 48000);
        let mut outputs = Vec::new();
        outputs.push(line.feedback_tap_samples(1.0, 2.0, 0.5));
        for _ in 0..6 {
            outputs.push(line.feedback_tap_samples(0.0, 2.0, 0.5));
        }
        // Echoes of the impulse every two samples, halved each time.
        assert_eq!(outputs, vec![0.0, 0.0, 1.0, 0.0, 0.5, 0.0, 0.25]);
    }

    #[test]
    fn test_try_new_rejects_empty() {
        assert!(DelayLine::try_new(0, 48000).is_err());
        assert_eq!(DelayLine::new(0, 48000).capacity(), 1);
    }
}
