//! Wavetable oscillator.

use std::f32::consts::PI;

/// Sine oscillator that reads one pre-computed cycle with linear interpolation.
///
/// Mostly used as a low frequency oscillator, see [`crate::effects::tremolo`].
#[derive(Debug, Clone, PartialEq)]
pub struct Wavetable {
    table: Vec<f32>,
    phase: f32,
    sample_rate: u32,
}

impl Wavetable {
    /// Default amount of samples in one cycle.
    pub const DEFAULT_SIZE: usize = 1024;

    /// Creates new oscillator with the table of default size.
    pub fn new(sample_rate: u32) -> Self {
        Self::with_size(Self::DEFAULT_SIZE, sample_rate)
    }

    /// Creates new oscillator with `size` samples per cycle (at least two).
    pub fn with_size(size: usize, sample_rate: u32) -> Self {
        let size = size.max(2);
        let table = (0..size)
            .map(|i| (2.0 * PI * i as f32 / size as f32).sin())
            .collect();
        Self {
            table,
            phase: 0.0,
            sample_rate,
        }
    }

    /// Returns current phase in `[0; 1)` range.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Returns sample rate the phase step is computed for.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Changes sample rate, the phase is kept so the output does not jump.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
    }

    /// Moves phase back to the start of the cycle.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Advances the oscillator by one sample at given frequency and returns the next value.
    /// Negative frequencies run the cycle backwards.
    pub fn feed(&mut self, frequency: f32) -> f32 {
        let step = frequency / self.sample_rate.max(1) as f32;
        if step.is_finite() {
            self.phase = (self.phase + step).rem_euclid(1.0);
            // rem_euclid may round up to exactly 1.0 for tiny negative values.
            if self.phase >= 1.0 {
                self.phase = 0.0;
            }
        }

        let position = self.phase * self.table.len() as f32;
        let index = (position as usize).min(self.table.len() - 1);
        let next = if index + 1 == self.table.len() {
            0
        } else {
            index + 1
        };
        let frac = position - index as f32;
        self.table[index] + frac * (self.table[next] - self.table[index])
    }
}

#[cfg(test)]
mod test {
    use crate::dsp::wavetable::Wavetable;

    #[test]
    fn test_quarter_cycle() {
        let mut oscillator = Wavetable::with_size(1024, 1000);
        // 250 Hz at 1000 Hz moves a quarter of the cycle per sample.
        assert!((oscillator.feed(250.0) - 1.0).abs() < 1.0e-5);
        assert!(oscillator.feed(250.0).abs() < 1.0e-5);
        assert!((oscillator.feed(250.0) + 1.0).abs() < 1.0e-5);
        assert!(oscillator.feed(250.0).abs() < 1.0e-5);
        assert_eq!(oscillator.phase(), 0.0);
    }

    #[test]
    fn test_interpolates_between_table_samples() {
        let mut oscillator = Wavetable::with_size(4, 8);
        // Half way between table[0] = 0 and table[1] = 1.
        assert!((oscillator.feed(1.0) - 0.5).abs() < 1.0e-6);
        // Half way between table[3] = -1 and table[0] = 0 (wraps).
        oscillator.reset();
        assert!((oscillator.feed(7.0) + 0.5).abs() < 1.0e-6);
    }

    #[test]
    fn test_matches_sine() {
        let sample_rate = 48000;
        let frequency = 5.0;
        let mut oscillator = Wavetable::new(sample_rate);
        for i in 1..sample_rate / 10 {
            let expected = (2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate as f32)
                .sin();
            let actual = oscillator.feed(frequency);
            assert!((expected - actual).abs() < 2.0e-3, "sample {}", i);
        }
    }

    #[test]
    fn test_phase_stays_in_range() {
        let mut oscillator = Wavetable::new(44100);
        for _ in 0..10000 {
            oscillator.feed(-3.3);
            assert!((0.0..1.0).contains(&oscillator.phase()));
        }
    }
}
