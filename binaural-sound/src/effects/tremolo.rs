//! Tremolo (amplitude modulation) effect.

use crate::{dsp::wavetable::Wavetable, effects::EffectRenderTrait};

/// Modulates amplitude with a rectified sine. The gain swings between `1 - depth` and `1`.
/// Since the oscillator is rectified, it runs at half of the rate to give `rate` pulses per second.
#[derive(Debug, Clone, PartialEq)]
pub struct Tremolo {
    rate: f32,
    depth: f32,
    oscillator: Wavetable,
}

impl Default for Tremolo {
    fn default() -> Self {
        Self::new(44100)
    }
}

impl Tremolo {
    /// Creates new tremolo with rate of 1 Hz and zero depth.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            rate: 1.0,
            depth: 0.0,
            oscillator: Wavetable::new(sample_rate),
        }
    }

    /// Sets modulation rate in Hertz.
    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate.max(0.0);
    }

    /// Returns modulation rate in Hertz.
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Sets modulation depth, clamped to `[0; 1]`.
    pub fn set_depth(&mut self, depth: f32) {
        self.depth = depth.clamp(0.0, 1.0);
    }

    /// Returns modulation depth.
    pub fn depth(&self) -> f32 {
        self.depth
    }

    fn next_gain(&mut self) -> f32 {
        (1.0 - self.depth) + self.depth * self.oscillator.feed(self.rate * 0.5).abs()
    }
}

impl EffectRenderTrait for Tremolo {
    fn render(&mut self, frames: &mut [(f32, f32)]) {
        for (left, right) in frames.iter_mut() {
            // Both channels share the oscillator.
            let gain = self.next_gain();
            *left *= gain;
            *right *= gain;
        }
    }

    fn set_sample_rate(&mut self, sample_rate: u32) {
        self.oscillator.set_sample_rate(sample_rate);
    }
}
