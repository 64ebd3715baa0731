//! Interaural time and level differences.
//!
//! Sound from a source on one side reaches the far ear later and quieter than the near ear, and
//! the head shadows high frequencies of the far ear. This module turns azimuth into per-ear delay
//! fractions, gains and head shadow filter settings once per control tick.
//!
//! Only the far ear is driven by the azimuth. The near ear walks back to neutral in fixed steps,
//! so that crossing the median plane (where the far ear swaps) does not click.

use crate::attenuation::step_toward;
use strum_macros::{AsRefStr, EnumString, VariantNames};

/// One of two channels of the binaural output.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, AsRefStr, EnumString, VariantNames)]
pub enum Ear {
    /// Left channel.
    Left,
    /// Right channel.
    Right,
}

impl Ear {
    /// Both ears in channel order.
    pub const BOTH: [Ear; 2] = [Ear::Left, Ear::Right];

    /// Returns index of the channel in a stereo frame.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }

    /// Returns the other ear.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Settings of the head shadow filter of one ear, see
/// [`crate::dsp::filters::BiquadCoefficients::head_shadow`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HeadShadow {
    /// Corner (shelf) or center (peak) frequency in Hertz.
    pub frequency: f32,
    /// Shelf slope or peak quality.
    pub quality: f32,
    /// Gain in decibels, negative gives a shelf cut.
    pub db_gain: f32,
}

/// Per-ear delay fractions and gains, updated once per control tick.
#[derive(Clone, Debug, PartialEq)]
pub struct InterauralState {
    delay: [f32; 2],
    gain: [f32; 2],
    far_ear: Ear,
    step: f32,
}

impl Default for InterauralState {
    fn default() -> Self {
        Self::new(Self::DEFAULT_STEP)
    }
}

impl InterauralState {
    /// Default change of the near ear's delay and gain per tick.
    pub const DEFAULT_STEP: f32 = 0.05;

    /// Gain of the far ear drops by this factor times the lateral fraction.
    pub const LEVEL_DIFFERENCE: f32 = 1.2;

    const FAR_SHELF_FREQUENCY: f32 = 290.0;
    const FAR_SHELF_SLOPE: f32 = 0.0707;
    const FAR_SHELF_DB_PER_DELAY: f32 = -5.0;
    const NEAR_PEAK_FREQUENCY: f32 = 4500.0;
    const NEAR_PEAK_QUALITY: f32 = 0.2;
    const NEAR_PEAK_DB_PER_DELAY: f32 = 2.0;

    /// Creates neutral state: no delay, unity gain.
    pub fn new(step: f32) -> Self {
        Self {
            delay: [0.0; 2],
            gain: [1.0; 2],
            far_ear: Ear::Right,
            step: step.abs(),
        }
    }

    /// How far a source at `azimuth` is from the median plane: 0 in front or behind, 0.5 exactly
    /// to a side.
    pub fn lateral_fraction(azimuth: f32) -> f32 {
        let fraction = (azimuth.abs() / 180.0).min(1.0);
        if fraction > 0.5 {
            1.0 - fraction
        } else {
            fraction
        }
    }

    /// Advances one control tick.
    pub fn update(&mut self, azimuth: f32, spatial_scale: f32) {
        let fraction = Self::lateral_fraction(azimuth);
        let far = if azimuth > 0.0 { Ear::Left } else { Ear::Right };
        let near = far.opposite();

        self.gain[far.index()] = 1.0 - fraction * Self::LEVEL_DIFFERENCE;
        self.delay[far.index()] = fraction * 2.0 * spatial_scale;

        self.delay[near.index()] = step_toward(self.delay[near.index()], 0.0, self.step);
        self.gain[near.index()] = step_toward(self.gain[near.index()], 1.0, self.step);

        self.far_ear = far;
    }

    /// Returns the ear that is currently away from the source.
    pub fn far_ear(&self) -> Ear {
        self.far_ear
    }

    /// Returns delay fraction of an ear, multiply it by the maximum interaural delay to get
    /// seconds.
    pub fn delay(&self, ear: Ear) -> f32 {
        self.delay[ear.index()]
    }

    /// Returns gain factor of an ear.
    pub fn gain(&self, ear: Ear) -> f32 {
        self.gain[ear.index()]
    }

    /// Returns `1 - gain` of an ear.
    pub fn gain_reduction(&self, ear: Ear) -> f32 {
        1.0 - self.gain[ear.index()]
    }

    /// Returns head shadow settings of an ear. The far ear gets a low shelf cut of the highs, the
    /// near ear a broad presence boost, both proportional to the far ear delay.
    pub fn head_shadow(&self, ear: Ear) -> HeadShadow {
        let far_delay = self.delay[self.far_ear.index()];
        if ear == self.far_ear {
            HeadShadow {
                frequency: Self::FAR_SHELF_FREQUENCY,
                quality: Self::FAR_SHELF_SLOPE,
                db_gain: Self::FAR_SHELF_DB_PER_DELAY * far_delay,
            }
        } else {
            HeadShadow {
                frequency: Self::NEAR_PEAK_FREQUENCY,
                quality: Self::NEAR_PEAK_QUALITY,
                db_gain: Self::NEAR_PEAK_DB_PER_DELAY * far_delay,
            }
        }
    }
}

#[cfg(test)]
mod test {
    use crate::renderer::interaural::{Ear, InterauralState};

    #[test]
    fn test_lateral_fraction_is_mirrored() {
        assert_eq!(InterauralState::lateral_fraction(0.0), 0.0);
        assert_eq!(InterauralState::lateral_fraction(90.0), 0.5);
        assert_eq!(InterauralState::lateral_fraction(-90.0), 0.5);
        assert_eq!(InterauralState::lateral_fraction(135.0), 0.25);
        assert_eq!(InterauralState::lateral_fraction(180.0), 0.0);
    }

    #[test]
    fn test_source_on_the_right() {
        let mut state = InterauralState::default();
        state.update(90.0, 1.0);
        assert_eq!(state.far_ear(), Ear::Left);
        assert_eq!(state.delay(Ear::Left), 1.0);
        assert!((state.gain(Ear::Left) - 0.4).abs() < 1.0e-6);
        assert_eq!(state.delay(Ear::Right), 0.0);
        assert_eq!(state.gain(Ear::Right), 1.0);

        let far = state.head_shadow(Ear::Left);
        assert_eq!(far.frequency, 290.0);
        assert_eq!(far.db_gain, -5.0);
        let near = state.head_shadow(Ear::Right);
        assert_eq!(near.frequency, 4500.0);
        assert_eq!(near.db_gain, 2.0);
    }

    #[test]
    fn test_spatial_scale_scales_delay_only() {
        let mut state = InterauralState::default();
        state.update(-45.0, 3.0);
        assert_eq!(state.far_ear(), Ear::Right);
        assert!((state.delay(Ear::Right) - 1.5).abs() < 1.0e-6);
        assert!((state.gain(Ear::Right) - 0.7).abs() < 1.0e-6);
    }

    #[test]
    fn test_crossing_median_plane_decays_old_far_ear() {
        let mut state = InterauralState::default();
        state.update(90.0, 1.0);
        state.update(-10.0, 1.0);

        assert_eq!(state.far_ear(), Ear::Right);
        assert!((state.delay(Ear::Left) - 0.95).abs() < 1.0e-6);
        assert!((state.gain(Ear::Left) - 0.45).abs() < 1.0e-6);

        for _ in 0..40 {
            state.update(-10.0, 1.0);
        }
        assert_eq!(state.delay(Ear::Left), 0.0);
        assert_eq!(state.gain(Ear::Left), 1.0);
    }
}
