//! Reverberation module
//!
//! # Overview
//!
//! This is implementation of [Schroeder reverberator](https://ccrma.stanford.edu/~jos/pasp/Schroeder_Reverberators.html)
//! Reverberation gives you scene a "volume" and improves overall perception of sound.
//!
//! Input is diffused by three allpass filters in series, then four feedback comb filters running
//! in parallel build up the decaying tail. Sum of the combs is darkened by a one-pole "absorption"
//! filter.
//!
//! # Usage
//!
//! ```
//! use binaural_sound::effects::{reverb::Reverb, Effect};
//!
//! let mut reverb = Reverb::new(48000);
//! reverb.set_wet(0.3);
//! reverb.set_absorption_frequency(4000.0);
//! let effect = Effect::Reverb(reverb);
//! ```
//!
//! # Known problems
//!
//! This reverberator has noticeable "metallic" tone, but since this is one of the simplest
//! reverberators this is acceptable. Delay lengths are given in samples and do not scale with
//! sample rate, so the room sounds slightly smaller at higher rates.

use crate::{
    dsp::filters::{AllPass, FeedbackComb, OnePole},
    effects::EffectRenderTrait,
};

/// Mono Schroeder reverberator.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelReverb {
    sample_rate: u32,
    wet: f32,
    absorption_frequency: f32,
    all_pass_filters: Vec<AllPass>,
    comb_filters: Vec<FeedbackComb>,
    absorption: OnePole,
}

impl ChannelReverb {
    /// Filter lengths given in samples
    const ALLPASS_LENGTHS: [usize; 3] = [695, 226, 73];
    const COMB_LENGTHS: [usize; 4] = [3375, 3201, 2105, 2503];

    /// Size of every internal delay line in samples.
    pub const CAPACITY: usize = 10000;

    /// Creates new reverberator, every delay of it is extended by `spread` samples.
    pub fn new(sample_rate: u32, spread: usize, absorption_frequency: f32, wet: f32) -> Self {
        Self {
            sample_rate,
            wet,
            absorption_frequency,
            all_pass_filters: Self::ALLPASS_LENGTHS
                .iter()
                .map(|len| AllPass::new(Self::CAPACITY, *len + spread, AllPass::DEFAULT_GAIN))
                .collect(),
            comb_filters: Self::COMB_LENGTHS
                .iter()
                .map(|len| {
                    FeedbackComb::new(
                        Self::CAPACITY,
                        (*len + spread) as f32,
                        FeedbackComb::DEFAULT_FEEDBACK,
                    )
                })
                .collect(),
            absorption: OnePole::new(absorption_frequency, sample_rate),
        }
    }

    /// Sets gain of the reverberated signal.
    pub fn set_wet(&mut self, wet: f32) {
        self.wet = wet;
    }

    /// Sets cutoff of the absorption filter in Hertz.
    pub fn set_absorption_frequency(&mut self, frequency: f32) {
        self.absorption_frequency = frequency;
        self.absorption.set_cutoff(frequency, self.sample_rate);
    }

    /// Changes sample rate of the absorption filter. Delay lengths stay in samples.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.absorption
            .set_cutoff(self.absorption_frequency, self.sample_rate);
    }

    /// Sets feedback of every comb filter. Values of 1.0 and above make the tail grow forever.
    pub fn set_feedback(&mut self, feedback: f32) {
        for comb in self.comb_filters.iter_mut() {
            comb.set_feedback(feedback);
        }
    }

    /// Processes single sample and returns reverberated signal only.
    pub fn feed(&mut self, sample: f32) -> f32 {
        let mut diffused = sample;
        for allpass in self.all_pass_filters.iter_mut() {
            diffused = allpass.feed(diffused);
        }

        let mut result = 0.0;
        for comb in self.comb_filters.iter_mut() {
            result += comb.feed(diffused);
        }

        self.absorption.feed(result * 0.5 * self.wet)
    }
}

/// See module docs.
#[derive(Debug, Clone, PartialEq)]
pub struct Reverb {
    dry: f32,
    wet: f32,
    absorption_frequency: f32,
    left: ChannelReverb,
    right: ChannelReverb,
}

impl Default for Reverb {
    fn default() -> Self {
        Self::new(44100)
    }
}

impl Reverb {
    /// Right channel delays are longer by this amount of samples, so the channels decorrelate.
    const STEREO_SPREAD: usize = 23;

    /// Creates new instance of reverb effect with absorption at 6 kHz, dry signal at full level
    /// and wet signal at half level.
    pub fn new(sample_rate: u32) -> Self {
        let absorption_frequency = 6000.0;
        let wet = 0.5;
        Self {
            dry: 1.0,
            wet,
            absorption_frequency,
            left: ChannelReverb::new(sample_rate, 0, absorption_frequency, wet),
            right: ChannelReverb::new(
                sample_rate,
                Self::STEREO_SPREAD,
                absorption_frequency,
                wet,
            ),
        }
    }

    /// Sets how much of input signal should be passed to output without any processing.
    /// Default value is 1.0.
    pub fn set_dry(&mut self, dry: f32) {
        self.dry = dry.clamp(0.0, 1.0);
    }

    /// Returns dry part.
    pub fn dry(&self) -> f32 {
        self.dry
    }

    /// Sets gain of reverberated signal. Default value is 0.5.
    pub fn set_wet(&mut self, wet: f32) {
        self.wet = wet.clamp(0.0, 1.0);
        self.left.set_wet(self.wet);
        self.right.set_wet(self.wet);
    }

    /// Returns gain of reverberated signal.
    pub fn wet(&self) -> f32 {
        self.wet
    }

    /// Sets cutoff frequency of the absorption filter. Basically this parameter defines
    /// "tone" of reflections, when frequency is higher - then more high frequencies will be in
    /// output signal, and vice versa. For example if you have environment with high absorption of
    /// high frequencies, then sound in reality will be muffled - to simulate this you could set
    /// frequency to 3-4 kHz.
    pub fn set_absorption_frequency(&mut self, frequency: f32) {
        if frequency > 0.0 {
            self.absorption_frequency = frequency;
            self.left.set_absorption_frequency(frequency);
            self.right.set_absorption_frequency(frequency);
        }
    }

    /// Returns cutoff frequency of the absorption filter.
    pub fn absorption_frequency(&self) -> f32 {
        self.absorption_frequency
    }
}

impl EffectRenderTrait for Reverb {
    fn render(&mut self, frames: &mut [(f32, f32)]) {
        for (left, right) in frames.iter_mut() {
            let processed_left = self.left.feed(*left);
            let processed_right = self.right.feed(*right);

            *left = self.dry * *left + processed_left;
            *right = self.dry * *right + processed_right;
        }
    }

    fn set_sample_rate(&mut self, sample_rate: u32) {
        self.left.set_sample_rate(sample_rate);
        self.right.set_sample_rate(sample_rate);
    }
}

#[cfg(test)]
mod test {
    use crate::effects::{
        reverb::{ChannelReverb, Reverb},
        EffectRenderTrait,
    };

    #[test]
    fn test_tail_starts_after_shortest_path() {
        let mut reverb = ChannelReverb::new(48000, 0, 20000.0, 1.0);
        let first = (0..8000)
            .map(|i| reverb.feed(if i == 0 { 1.0 } else { 0.0 }))
            .position(|s| s.abs() > 1.0e-4);
        // Allpass filters pass part of the impulse through immediately, shortest comb is 2105.
        assert!(first.is_some_and(|i| i >= 2105));
    }

    #[test]
    fn test_tail_decays() {
        let mut reverb = Reverb::new(48000);
        let mut frames = vec![(0.0, 0.0); 48000 * 4];
        frames[0] = (1.0, 1.0);
        reverb.render(&mut frames);

        let early = frames[4000..24000]
            .iter()
            .map(|f| f.0.abs())
            .fold(0.0, f32::max);
        let late = frames[frames.len() - 20000..]
            .iter()
            .map(|f| f.0.abs())
            .fold(0.0, f32::max);
        assert!(early > 0.0);
        assert!(late < early * 0.01);
        assert!(frames.iter().all(|f| f.0.is_finite() && f.1.is_finite()));
    }

    #[test]
    fn test_channels_are_decorrelated() {
        let mut reverb = Reverb::new(48000);
        reverb.set_dry(0.0);
        let mut frames = vec![(0.0, 0.0); 8000];
        frames[0] = (1.0, 1.0);
        reverb.render(&mut frames);
        assert!(frames.iter().any(|f| (f.0 - f.1).abs() > 1.0e-4));
    }

    #[test]
    fn test_absorption_follows_sample_rate() {
        let mut reverb = ChannelReverb::new(44100, 0, 6000.0, 1.0);
        reverb.set_sample_rate(96000);
        let expected = ChannelReverb::new(96000, 0, 6000.0, 1.0);
        assert_eq!(reverb.absorption.pole(), expected.absorption.pole());
    }

    #[test]
    fn test_zero_wet_is_dry() {
        let mut reverb = Reverb::new(48000);
        reverb.set_wet(0.0);
        let mut frames = vec![(0.5, -0.5); 4096];
        reverb.render(&mut frames);
        assert!(frames.iter().all(|f| *f == (0.5, -0.5)));
    }
}
