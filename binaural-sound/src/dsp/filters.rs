//! Filters module.
//!
//! # Overview
//!
//! This module contains some of common filters used in digital signal processing.
//! Since this is very specific theme with lots of background, every filter has link to source with good
//! description of each filter. There is no need to describe them all here.
//!
//! Biquad filters are split in two parts: [`BiquadCoefficients`] holds the result of a design
//! function (one per filter shape) and [`Biquad`] runs the difference equation with whatever
//! coefficients it was given. Retuning a [`Biquad`] keeps its history, so coefficients can be
//! changed while audio is running without clicks.

use crate::dsp::DelayLine;
use std::f64::consts::PI;

/// One-pole Filter.
/// For details see - <https://www.earlevel.com/main/2012/12/15/a-one-pole-filter/>
///
/// Besides filtering audio it is used to smooth control values, so that a parameter which is
/// updated a few dozen times per second does not produce audible steps. State is kept in `f64`:
/// with cutoffs of a few Hertz the per-sample step falls below `f32` resolution long before the
/// output reaches its target.
#[derive(Debug, PartialEq, Clone)]
pub struct OnePole {
    a0: f64,
    b1: f64,
    last: f64,
}

impl Default for OnePole {
    fn default() -> Self {
        Self {
            a0: 1.0,
            b1: 0.0,
            last: 0.0,
        }
    }
}

fn get_b1(fc: f64) -> f64 {
    (-2.0 * PI * fc.clamp(0.0, 1.0)).exp()
}

impl OnePole {
    /// Creates new instance of one pole filter with given cutoff frequency (in Hertz).
    pub fn new(cutoff_hz: f32, sample_rate: u32) -> Self {
        let mut filter = Self::default();
        filter.set_cutoff(cutoff_hz, sample_rate);
        filter
    }

    /// Sets the state of the filter as if it has been fed with `value` for a long time.
    pub fn with_last(mut self, value: f32) -> Self {
        self.last = value as f64;
        self
    }

    /// Sets cutoff frequency of the filter. Non-positive (or non-finite) frequencies and zero
    /// sample rate are ignored, the filter keeps its previous setting.
    pub fn set_cutoff(&mut self, cutoff_hz: f32, sample_rate: u32) {
        if !(cutoff_hz > 0.0 && cutoff_hz.is_finite()) || sample_rate == 0 {
            return;
        }
        self.b1 = get_b1(cutoff_hz as f64 / sample_rate as f64);
        self.a0 = 1.0 - self.b1;
    }

    /// Returns feedback coefficient of the filter.
    pub fn pole(&self) -> f32 {
        self.b1 as f32
    }

    /// Returns last output of the filter.
    pub fn last(&self) -> f32 {
        self.last as f32
    }

    /// Processes single sample.
    pub fn feed(&mut self, sample: f32) -> f32 {
        self.last = sample as f64 * self.a0 + self.last * self.b1;
        self.last as f32
    }
}

/// Coefficients of a biquad filter, already normalized by `a0`.
///
/// Every designer expects `0 < frequency < sample_rate / 2`, it is up to the caller to keep the
/// frequency in that range.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BiquadCoefficients {
    /// B0 Coefficient of the equation.
    pub b0: f32,
    /// B1 Coefficient of the equation.
    pub b1: f32,
    /// B2 Coefficient of the equation.
    pub b2: f32,
    /// A1 Coefficient of the equation.
    pub a1: f32,
    /// A2 Coefficient of the equation.
    pub a2: f32,
}

impl Default for BiquadCoefficients {
    fn default() -> Self {
        Self::identity()
    }
}

impl BiquadCoefficients {
    /// Coefficients that pass signal unchanged.
    pub fn identity() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }

    fn from_f64(b0: f64, b1: f64, b2: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: b0 as f32,
            b1: b1 as f32,
            b2: b2 as f32,
            a1: a1 as f32,
            a2: a2 as f32,
        }
    }

    /// Second order low pass.
    pub fn low_pass(sample_rate: u32, frequency: f32, quality: f32) -> Self {
        let q = quality as f64;
        let k = (PI * frequency as f64 / sample_rate as f64).tan();
        let k2q = k * k * q;
        let norm = k2q + k + q;
        Self::from_f64(
            k2q / norm,
            2.0 * k2q / norm,
            k2q / norm,
            2.0 * q * (k * k - 1.0) / norm,
            (k2q - k + q) / norm,
        )
    }

    /// Second order high pass.
    pub fn high_pass(sample_rate: u32, frequency: f32, quality: f32) -> Self {
        let q = quality as f64;
        let k = (PI * frequency as f64 / sample_rate as f64).tan();
        let k2q = k * k * q;
        let norm = k2q + k + q;
        Self::from_f64(
            q / norm,
            -2.0 * q / norm,
            q / norm,
            2.0 * q * (k * k - 1.0) / norm,
            (k2q - k + q) / norm,
        )
    }

    /// Band pass around `frequency`.
    pub fn band_pass(sample_rate: u32, frequency: f32, quality: f32) -> Self {
        let q = quality as f64;
        let k = (PI * frequency as f64 / sample_rate as f64).tan();
        let k2q = k * k * q;
        let norm = k2q + k + q;
        Self::from_f64(
            k / norm,
            0.0,
            -k / norm,
            2.0 * q * (k * k - 1.0) / norm,
            (k2q - k + q) / norm,
        )
    }

    /// Low shelf, `slope` is the shelf slope of the cookbook (0.707 gives the steepest slope
    /// without overshoot).
    pub fn low_shelf(sample_rate: u32, frequency: f32, slope: f32, db_gain: f32) -> Self {
        let shelf = Shelf::new(sample_rate, frequency, slope, db_gain);
        let Shelf { a, cos, sq } = shelf;
        Self::normalize(
            a * ((a + 1.0) - (a - 1.0) * cos + sq),
            2.0 * a * ((a - 1.0) - (a + 1.0) * cos),
            a * ((a + 1.0) - (a - 1.0) * cos - sq),
            (a + 1.0) + (a - 1.0) * cos + sq,
            -2.0 * ((a - 1.0) + (a + 1.0) * cos),
            (a + 1.0) + (a - 1.0) * cos - sq,
        )
    }

    /// High shelf, see [`Self::low_shelf`] for the meaning of `slope`.
    pub fn high_shelf(sample_rate: u32, frequency: f32, slope: f32, db_gain: f32) -> Self {
        let shelf = Shelf::new(sample_rate, frequency, slope, db_gain);
        let Shelf { a, cos, sq } = shelf;
        Self::normalize(
            a * ((a + 1.0) + (a - 1.0) * cos + sq),
            -2.0 * a * ((a - 1.0) + (a + 1.0) * cos),
            a * ((a + 1.0) + (a - 1.0) * cos - sq),
            (a + 1.0) - (a - 1.0) * cos + sq,
            2.0 * ((a - 1.0) - (a + 1.0) * cos),
            (a + 1.0) - (a - 1.0) * cos - sq,
        )
    }

    /// Peak (positive gain) or notch (negative gain) at `frequency`. Cut is the exact inverse of
    /// a boost of the same magnitude.
    pub fn peaking(sample_rate: u32, frequency: f32, quality: f32, db_gain: f32) -> Self {
        let q = quality as f64;
        let k = (PI * frequency as f64 / sample_rate as f64).tan();
        let mut v0 = 10.0f64.powf(db_gain as f64 / 20.0);
        if v0 < 1.0 {
            v0 = 1.0 / v0;
        }

        // Boost scales the numerator, cut moves the same term into the denominator.
        let (num_q, den_q) = if db_gain >= 0.0 {
            (v0 / q, 1.0 / q)
        } else {
            (1.0 / q, v0 / q)
        };

        let norm = 1.0 + den_q * k + k * k;
        let b1 = 2.0 * (k * k - 1.0) / norm;
        Self::from_f64(
            (1.0 + num_q * k + k * k) / norm,
            b1,
            (1.0 - num_q * k + k * k) / norm,
            b1,
            (1.0 - den_q * k + k * k) / norm,
        )
    }

    /// Ear shaping filter of the spatial renderer: a high shelf cut when `db_gain` is negative,
    /// a peak boost otherwise.
    pub fn head_shadow(sample_rate: u32, frequency: f32, quality: f32, db_gain: f32) -> Self {
        if db_gain < 0.0 {
            Self::high_shelf(sample_rate, frequency, quality, db_gain)
        } else {
            Self::peaking(sample_rate, frequency, quality, db_gain)
        }
    }

    fn normalize(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self::from_f64(b0 / a0, b1 / a0, b2 / a0, a1 / a0, a2 / a0)
    }

    /// Returns magnitude of the frequency response at given frequency (linear scale).
    pub fn magnitude_at(&self, frequency: f32, sample_rate: u32) -> f32 {
        let w = 2.0 * PI * frequency as f64 / sample_rate as f64;
        let (sin1, cos1) = w.sin_cos();
        let (sin2, cos2) = (2.0 * w).sin_cos();

        let (b0, b1, b2) = (self.b0 as f64, self.b1 as f64, self.b2 as f64);
        let (a1, a2) = (self.a1 as f64, self.a2 as f64);

        let num_re = b0 + b1 * cos1 + b2 * cos2;
        let num_im = -(b1 * sin1 + b2 * sin2);
        let den_re = 1.0 + a1 * cos1 + a2 * cos2;
        let den_im = -(a1 * sin1 + a2 * sin2);

        ((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)).sqrt() as f32
    }
}

// Intermediate values shared by both shelves.
struct Shelf {
    a: f64,
    cos: f64,
    sq: f64,
}

impl Shelf {
    fn new(sample_rate: u32, frequency: f32, slope: f32, db_gain: f32) -> Self {
        let a = 10.0f64.powf(db_gain as f64 / 40.0);
        let w0 = 2.0 * PI * frequency as f64 / sample_rate as f64;
        let alpha = w0.sin() * 0.5 * ((a + 1.0 / a) * (1.0 / slope as f64 - 1.0) + 2.0).sqrt();
        Self {
            a,
            cos: w0.cos(),
            sq: 2.0 * a.sqrt() * alpha,
        }
    }
}

/// Exact kind of biquad filter - it defines coefficients of the filter.
/// More info here: <https://shepazu.github.io/Audio-EQ-Cookbook/audio-eq-cookbook.html>
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BiquadKind {
    /// Reduces amplitude of frequencies higher F_center.
    LowPass,

    /// Reduces amplitude of frequencies lower F_center.
    HighPass,

    /// Reduces amplitude of all frequencies except in some band around F_center giving _/̅ \_ shape
    BandPass,

    /// Boosts or cuts frequencies lower than F_center.
    LowShelf,

    /// Boosts or cuts frequencies higher than F_center.
    HighShelf,

    /// Boosts or cuts a band of frequencies around F_center.
    PeakNotch,
}

impl BiquadKind {
    /// Runs the designer of this kind. `db_gain` is ignored by the pass filters.
    pub fn design(
        self,
        sample_rate: u32,
        frequency: f32,
        quality: f32,
        db_gain: f32,
    ) -> BiquadCoefficients {
        match self {
            Self::LowPass => BiquadCoefficients::low_pass(sample_rate, frequency, quality),
            Self::HighPass => BiquadCoefficients::high_pass(sample_rate, frequency, quality),
            Self::BandPass => BiquadCoefficients::band_pass(sample_rate, frequency, quality),
            Self::LowShelf => {
                BiquadCoefficients::low_shelf(sample_rate, frequency, quality, db_gain)
            }
            Self::HighShelf => {
                BiquadCoefficients::high_shelf(sample_rate, frequency, quality, db_gain)
            }
            Self::PeakNotch => {
                BiquadCoefficients::peaking(sample_rate, frequency, quality, db_gain)
            }
        }
    }
}

/// Generic second order digital filter (direct form I).
/// More info here: <https://ccrma.stanford.edu/~jos/filters/BiQuad_Section.html>
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Biquad {
    coefficients: BiquadCoefficients,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates new instance of filter with given coefficients.
    pub fn new(coefficients: BiquadCoefficients) -> Self {
        Self {
            coefficients,
            ..Default::default()
        }
    }

    /// Replaces coefficients, history is kept.
    pub fn set_coefficients(&mut self, coefficients: BiquadCoefficients) {
        self.coefficients = coefficients;
    }

    /// Returns current coefficients.
    pub fn coefficients(&self) -> &BiquadCoefficients {
        &self.coefficients
    }

    /// Tunes filter using specified parameters, see [`BiquadKind::design`].
    pub fn tune(
        &mut self,
        kind: BiquadKind,
        sample_rate: u32,
        frequency: f32,
        quality: f32,
        db_gain: f32,
    ) {
        self.coefficients = kind.design(sample_rate, frequency, quality, db_gain);
    }

    /// Processes single sample.
    pub fn feed(&mut self, sample: f32) -> f32 {
        let c = &self.coefficients;
        let result = c.b0 * sample + c.b1 * self.x1 + c.b2 * self.x2
            - c.a1 * self.y1
            - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = sample;
        self.y2 = self.y1;
        self.y1 = result;

        result
    }
}

/// Allpass Filter - <https://ccrma.stanford.edu/~jos/pasp/Allpass_Filters.html>
/// For details see - <https://ccrma.stanford.edu/~jos/pasp/Schroeder_Allpass_Sections.html>
#[derive(Debug, Clone, PartialEq)]
pub struct AllPass {
    delay_line: DelayLine,
    delay: usize,
    gain: f32,
}

impl AllPass {
    /// Default gain of feedback and feedforward paths.
    pub const DEFAULT_GAIN: f32 = 0.7;

    /// Creates new instance of allpass filter with delay of `delay` samples. The delay is clamped
    /// to `1..=capacity`.
    pub fn new(capacity: usize, delay: usize, gain: f32) -> Self {
        let delay_line = DelayLine::new(capacity, 1);
        Self {
            delay: delay.clamp(1, delay_line.capacity()),
            delay_line,
            gain,
        }
    }

    /// Sets overall gain of feedback parts of filter. Should be in 0..1 range.
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }

    /// Sets delay in samples, clamped to the capacity.
    pub fn set_delay(&mut self, delay: usize) {
        self.delay = delay.clamp(1, self.delay_line.capacity());
    }

    /// Returns delay in samples.
    pub fn delay(&self) -> usize {
        self.delay
    }

    /// Processes single sample.
    pub fn feed(&mut self, sample: f32) -> f32 {
        let tap = self.delay_line.tap_by_samples((self.delay - 1) as f32);
        self.delay_line.write(sample + self.gain * tap);
        -self.gain * sample + self.gain * tap
    }
}

/// Feedback Comb Filter
/// For details see - <https://ccrma.stanford.edu/~jos/pasp/Feedback_Comb_Filters.html>
///
/// # Notes
///
/// Feedback of 1.0 rings forever, anything above makes the output grow without bound. The value
/// is not clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackComb {
    delay_line: DelayLine,
    delay: f32,
    feedback: f32,
    input_gain: f32,
}

impl FeedbackComb {
    /// Default feedback factor.
    pub const DEFAULT_FEEDBACK: f32 = 0.7;

    /// Creates new comb filter with delay of `delay` samples.
    pub fn new(capacity: usize, delay: f32, feedback: f32) -> Self {
        Self {
            delay_line: DelayLine::new(capacity, 1),
            delay,
            feedback,
            input_gain: 1.0,
        }
    }

    /// Sets feedback factor. For numeric stability factor should be in 0..1 range.
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback;
    }

    /// Returns current feedback factor.
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Sets gain applied to the input before it enters the delay line.
    pub fn set_input_gain(&mut self, gain: f32) {
        self.input_gain = gain;
    }

    /// Sets delay in samples.
    pub fn set_delay(&mut self, delay: f32) {
        self.delay = delay;
    }

    /// Returns total length of internal delay line (in samples)
    pub fn capacity(&self) -> usize {
        self.delay_line.capacity()
    }

    /// Processes single sample.
    pub fn feed(&mut self, sample: f32) -> f32 {
        self.delay_line
            .feedback_tap_samples(self.input_gain * sample, self.delay, self.feedback)
    }
}

/// Feedforward Comb Filter
/// For details see - <https://ccrma.stanford.edu/~jos/pasp/Feedforward_Comb_Filters.html>
#[derive(Debug, Clone, PartialEq)]
pub struct FeedforwardComb {
    delay_line: DelayLine,
    delay: f32,
    input_gain: f32,
    delay_gain: f32,
}

impl FeedforwardComb {
    /// Creates new feedforward comb filter with delay of `delay` samples.
    pub fn new(capacity: usize, delay: f32, input_gain: f32, delay_gain: f32) -> Self {
        Self {
            delay_line: DelayLine::new(capacity, 1),
            delay,
            input_gain,
            delay_gain,
        }
    }

    /// Sets delay in samples.
    pub fn set_delay(&mut self, delay: f32) {
        self.delay = delay;
    }

    /// Processes single sample.
    pub fn feed(&mut self, sample: f32) -> f32 {
        self.delay_line.write(sample);
        self.input_gain * sample + self.delay_gain * self.delay_line.tap_by_samples(self.delay)
    }
}
