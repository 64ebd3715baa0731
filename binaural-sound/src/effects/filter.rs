//! Contains various filter effects. For example, lowpass filter could be used to muffle sounds.

use crate::{
    dsp::filters::{Biquad, BiquadKind},
    effects::EffectRenderTrait,
};

macro_rules! define_filter_effect {
    ($(#[$attr:meta])* $name:ident, $kind:expr) => {
        $(#[$attr])*
        #[derive(Clone, Debug, PartialEq)]
        pub struct $name {
            frequency: f32,
            quality: f32,
            db_gain: f32,
            sample_rate: u32,
            left: Biquad,
            right: Biquad,
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new(44100)
            }
        }

        impl EffectRenderTrait for $name {
            fn render(&mut self, frames: &mut [(f32, f32)]) {
                for (left, right) in frames.iter_mut() {
                    *left = self.left.feed(*left);
                    *right = self.right.feed(*right);
                }
            }

            fn set_sample_rate(&mut self, sample_rate: u32) {
                self.sample_rate = sample_rate;
                self.update();
            }
        }

        impl $name {
            /// Creates new filter tuned to 2200 Hz with quality of 0.707 and no gain.
            pub fn new(sample_rate: u32) -> Self {
                let mut filter = Self {
                    frequency: 2200.0,
                    quality: std::f32::consts::FRAC_1_SQRT_2,
                    db_gain: 0.0,
                    sample_rate,
                    left: Default::default(),
                    right: Default::default(),
                };
                filter.update();
                filter
            }

            /// Sets the gain of the filter in decibels. Pass filters ignore it.
            #[inline]
            pub fn set_db_gain(&mut self, db_gain: f32) {
                self.db_gain = db_gain;
                self.update();
            }

            /// Returns filter's gain in decibels.
            #[inline]
            pub fn db_gain(&self) -> f32 {
                self.db_gain
            }

            /// Sets a cutoff (or center) frequency of the filter in Hertz. Its exact meaning depends
            /// on an actual filter type. Frequencies outside of `(0; sample_rate / 2)` are ignored.
            #[inline]
            pub fn set_frequency(&mut self, frequency: f32) {
                self.frequency = frequency;
                self.update();
            }

            /// Returns a cutoff frequency of the filter in Hertz.
            #[inline]
            pub fn frequency(&self) -> f32 {
                self.frequency
            }

            /// Quality defines a band width at which amplitude decays by half (or by 3 db in log scale), the lower it will
            /// be, the wider band will be and vice versa. See more info [here](https://ccrma.stanford.edu/~jos/filters/Quality_Factor_Q.html)
            /// Shelves use it as the shelf slope.
            #[inline]
            pub fn set_quality(&mut self, quality: f32) {
                self.quality = quality;
                self.update();
            }

            /// Returns the quality of the filter.
            #[inline]
            pub fn quality(&self) -> f32 {
                self.quality
            }

            /// Returns sample rate the filter is designed for.
            #[inline]
            pub fn sample_rate(&self) -> u32 {
                self.sample_rate
            }

            fn update(&mut self) {
                let nyquist = self.sample_rate as f32 * 0.5;
                if !(self.frequency > 0.0 && self.frequency < nyquist && self.quality > 0.0) {
                    return;
                }

                let coefficients = $kind.design(
                    self.sample_rate,
                    self.frequency,
                    self.quality,
                    self.db_gain,
                );
                self.left.set_coefficients(coefficients);
                self.right.set_coefficients(coefficients);
            }
        }
    };
}

define_filter_effect!(
    /// Lowpass filter defines a filter that passes through every frequency below the cutoff frequency.
    LowPassFilterEffect,
    BiquadKind::LowPass
);
define_filter_effect!(
    /// Highpass filter defines a filter that passes through every frequency upper the cutoff frequency.
    HighPassFilterEffect,
    BiquadKind::HighPass
);
define_filter_effect!(
    /// Bandpass filter defines a filter that passes a band of frequencies surrounding the cutoff frequency.
    BandPassFilterEffect,
    BiquadKind::BandPass
);
define_filter_effect!(
    /// Boosts or cuts frequencies below the cutoff frequency, giving a shape like this ̅ \_ on cut.
    LowShelfFilterEffect,
    BiquadKind::LowShelf
);
define_filter_effect!(
    /// Boosts or cuts frequencies above the cutoff frequency, giving a shape like this _/̅ on boost.
    HighShelfFilterEffect,
    BiquadKind::HighShelf
);
define_filter_effect!(
    /// Boosts (positive gain) or cuts (negative gain) a band around the center frequency.
    PeakNotchFilterEffect,
    BiquadKind::PeakNotch
);
