//! Effects module
//!
//! # Overview
//!
//! Provides unified way of creating and using effects. Every effect processes stereo frames in
//! place, effects of a [`crate::source::SpatialSource`] run in order of insertion, before the
//! signal is spatialized.

use crate::effects::{
    distortion::Distortion,
    echo::Echo,
    filter::{
        BandPassFilterEffect, HighPassFilterEffect, HighShelfFilterEffect, LowPassFilterEffect,
        LowShelfFilterEffect, PeakNotchFilterEffect,
    },
    reverb::Reverb,
    tremolo::Tremolo,
};
use strum_macros::{AsRefStr, EnumString, VariantNames};

pub mod distortion;
pub mod echo;
pub mod filter;
pub mod reverb;
pub mod tremolo;

/// See module docs.
#[derive(Debug, Clone, PartialEq, AsRefStr, EnumString, VariantNames)]
pub enum Effect {
    /// Reverberation effect. See corresponding module for more info.
    Reverb(Reverb),
    /// Amplitude modulation by a slow oscillator.
    Tremolo(Tremolo),
    /// Feedback delay.
    Echo(Echo),
    /// Waveshaping distortion.
    Distortion(Distortion),
    /// See [`LowPassFilterEffect`].
    LowPassFilter(LowPassFilterEffect),
    /// See [`HighPassFilterEffect`].
    HighPassFilter(HighPassFilterEffect),
    /// See [`BandPassFilterEffect`].
    BandPassFilter(BandPassFilterEffect),
    /// See [`LowShelfFilterEffect`].
    LowShelfFilter(LowShelfFilterEffect),
    /// See [`HighShelfFilterEffect`].
    HighShelfFilter(HighShelfFilterEffect),
    /// See [`PeakNotchFilterEffect`].
    PeakNotchFilter(PeakNotchFilterEffect),
}

impl Default for Effect {
    fn default() -> Self {
        Effect::Reverb(Default::default())
    }
}

/// Stereo processing stage. Implementations must not allocate, lock or log while rendering.
pub trait EffectRenderTrait {
    /// Processes the frames in place.
    fn render(&mut self, frames: &mut [(f32, f32)]);

    /// Adapts the effect to a new sample rate. May allocate, so it must not be called while
    /// rendering. [`crate::source::SpatialSource`] calls it for every effect it receives.
    fn set_sample_rate(&mut self, sample_rate: u32);
}

macro_rules! static_dispatch {
    ($self:ident, $func:ident, $($args:expr),*) => {
        match $self {
            Effect::Reverb(v) => v.$func($($args),*),
            Effect::Tremolo(v) => v.$func($($args),*),
            Effect::Echo(v) => v.$func($($args),*),
            Effect::Distortion(v) => v.$func($($args),*),
            Effect::LowPassFilter(v) => v.$func($($args),*),
            Effect::HighPassFilter(v) => v.$func($($args),*),
            Effect::BandPassFilter(v) => v.$func($($args),*),
            Effect::LowShelfFilter(v) => v.$func($($args),*),
            Effect::HighShelfFilter(v) => v.$func($($args),*),
            Effect::PeakNotchFilter(v) => v.$func($($args),*),
        }
    };
}

impl EffectRenderTrait for Effect {
    fn render(&mut self, frames: &mut [(f32, f32)]) {
        static_dispatch!(self, render, frames)
    }

    fn set_sample_rate(&mut self, sample_rate: u32) {
        static_dispatch!(self, set_sample_rate, sample_rate)
    }
}
