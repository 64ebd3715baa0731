//! Renderer module.
//!
//! # Overview
//!
//! Renderer turns a stereo signal of one source into a binaural one. Control values (azimuth,
//! distance, ...) are consumed at a fixed control rate, every other stage runs per sample:
//!
//! 1. head shadow filter of the ear (see [`interaural`]);
//! 2. front-back / elevation high shelf;
//! 3. interaural delay line, read at the smoothed delay;
//! 4. smoothed interaural gain;
//! 5. smoothed distance attenuation.
//!
//! Delay, gain and attenuation targets change in steps at the control rate, each of them goes
//! through its own one-pole smoother before it touches the audio.

use crate::{
    attenuation::DistanceAttenuation,
    dsp::{
        filters::{Biquad, BiquadCoefficients, OnePole},
        DelayLine,
    },
    params::ControlSnapshot,
    renderer::interaural::{Ear, InterauralState},
};

pub mod interaural;

/// Every frequency a filter is tuned to is kept below this share of the sample rate.
pub const NYQUIST_MARGIN: f32 = 0.45;

/// Keeps `frequency` in the range where biquad designs stay well-behaved.
#[inline]
pub fn clamp_frequency(frequency: f32, sample_rate: u32) -> f32 {
    frequency.min(sample_rate as f32 * NYQUIST_MARGIN).max(1.0)
}

/// Gain in decibels of the front-back shelf. Sources ahead are brightened, sources behind are
/// darkened, sources above are brightened and sources below are darkened.
pub fn front_back_gain_db(
    azimuth: f32,
    elevation: f32,
    spatial_scale: f32,
    elevation_shelf_db: f32,
) -> f32 {
    let control = (azimuth.abs() / 180.0).min(1.0);
    let horizontal = if control < 0.5 {
        (1.0 - control * 2.0) * 2.0 * spatial_scale
    } else {
        -(control - 0.5) * 2.0 * 2.0 * spatial_scale
    };
    let vertical = (elevation.clamp(-90.0, 90.0) / 90.0) * elevation_shelf_db * spatial_scale;
    horizontal + vertical
}

/// Construction settings of [`SpatialRenderer`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RendererSettings {
    /// How many times per second control values are consumed.
    pub control_rate: f32,
    /// Delay in seconds of one unit of interaural delay fraction.
    pub max_interaural_delay: f32,
    /// Size of each interaural delay line in samples.
    pub delay_capacity: usize,
    /// Per-tick step of the near ear returning to neutral.
    pub interaural_step: f32,
    /// Per-tick step of the attenuation returning to unity inside the minimum distance.
    pub reentry_step: f32,
    /// Cutoff of the control smoothers in Hertz.
    pub smoothing_frequency: f32,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            control_rate: 60.0,
            max_interaural_delay: 0.00066,
            delay_capacity: 32768,
            interaural_step: InterauralState::DEFAULT_STEP,
            reentry_step: DistanceAttenuation::DEFAULT_REENTRY_STEP,
            smoothing_frequency: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
struct EarChannel {
    head_shadow: Biquad,
    front_back: Biquad,
    delay_line: DelayLine,
    delay: OnePole,
    gain: OnePole,
    distance: OnePole,
}

impl EarChannel {
    fn new(sample_rate: u32, settings: &RendererSettings) -> Self {
        let smoother = OnePole::new(settings.smoothing_frequency, sample_rate);
        Self {
            head_shadow: Default::default(),
            front_back: Default::default(),
            delay_line: DelayLine::new(settings.delay_capacity, sample_rate),
            delay: smoother.clone().with_last(0.0),
            gain: smoother.clone().with_last(1.0),
            distance: smoother.with_last(1.0),
        }
    }

    #[inline]
    fn feed(
        &mut self,
        sample: f32,
        delay: f32,
        gain: f32,
        distance: f32,
        max_interaural_delay: f32,
    ) -> f32 {
        let shaped = self.front_back.feed(self.head_shadow.feed(sample));
        self.delay_line.write(shaped);
        let delayed = self
            .delay_line
            .tap_by_time(self.delay.feed(delay) * max_interaural_delay);
        delayed * self.gain.feed(gain) * self.distance.feed(distance)
    }
}

/// Binaural renderer of one source. See module docs.
#[derive(Debug, Clone)]
pub struct SpatialRenderer {
    sample_rate: u32,
    control_period: usize,
    samples_until_tick: usize,
    max_interaural_delay: f32,
    interaural: InterauralState,
    attenuation: DistanceAttenuation,
    front_back_db: f32,
    ears: [EarChannel; 2],
}

impl SpatialRenderer {
    /// Creates new renderer. Settings are expected to be validated already, see
    /// [`crate::source::SpatialSourceBuilder`]. The first control tick happens on the first
    /// rendered sample, smoothers start from neutral values (no delay, unity gains).
    pub fn new(sample_rate: u32, settings: RendererSettings) -> Self {
        let control_period = (sample_rate as f32 / settings.control_rate).round().max(1.0) as usize;
        Self {
            sample_rate,
            control_period,
            samples_until_tick: 0,
            max_interaural_delay: settings.max_interaural_delay,
            interaural: InterauralState::new(settings.interaural_step),
            attenuation: DistanceAttenuation::new(settings.reentry_step),
            front_back_db: 0.0,
            ears: [
                EarChannel::new(sample_rate, &settings),
                EarChannel::new(sample_rate, &settings),
            ],
        }
    }

    /// Returns amount of samples between two control ticks.
    pub fn control_period(&self) -> usize {
        self.control_period
    }

    /// Returns current interaural state.
    pub fn interaural(&self) -> &InterauralState {
        &self.interaural
    }

    /// Returns current distance attenuation target.
    pub fn distance_gain(&self) -> f32 {
        self.attenuation.gain()
    }

    /// Returns current gain of the front-back shelf in decibels.
    pub fn front_back_db(&self) -> f32 {
        self.front_back_db
    }

    /// Returns delay fraction of an ear after smoothing, as used by the last rendered sample.
    pub fn smoothed_delay(&self, ear: Ear) -> f32 {
        self.ears[ear.index()].delay.last()
    }

    /// Returns gain of an ear after smoothing, as used by the last rendered sample.
    pub fn smoothed_gain(&self, ear: Ear) -> f32 {
        self.ears[ear.index()].gain.last()
    }

    /// Returns distance attenuation after smoothing, as used by the last rendered sample.
    pub fn smoothed_distance_gain(&self) -> f32 {
        self.ears[0].distance.last()
    }

    /// Consumes control values: updates distance attenuation, interaural state and filters.
    pub fn control_tick(&mut self, controls: &ControlSnapshot) {
        self.attenuation.update(
            controls.rolloff,
            controls.distance,
            controls.minimum_distance,
            controls.attenuation_scale,
        );

        self.interaural.update(controls.azimuth, controls.spatial_scale);

        self.front_back_db = front_back_gain_db(
            controls.azimuth,
            controls.elevation,
            controls.spatial_scale,
            controls.elevation_shelf_db,
        );
        let front_back = BiquadCoefficients::high_shelf(
            self.sample_rate,
            clamp_frequency(2000.0, self.sample_rate),
            std::f32::consts::FRAC_1_SQRT_2,
            self.front_back_db,
        );

        for ear in Ear::BOTH {
            let shadow = self.interaural.head_shadow(ear);
            let channel = &mut self.ears[ear.index()];
            channel
                .head_shadow
                .set_coefficients(BiquadCoefficients::head_shadow(
                    self.sample_rate,
                    clamp_frequency(shadow.frequency, self.sample_rate),
                    shadow.quality,
                    shadow.db_gain,
                ));
            channel.front_back.set_coefficients(front_back);
        }
    }

    /// Renders frames in place. Control ticks happen every [`Self::control_period`] samples,
    /// counted across calls, and read `controls`.
    pub fn render(&mut self, frames: &mut [(f32, f32)], controls: &ControlSnapshot) {
        for (left, right) in frames.iter_mut() {
            if self.samples_until_tick == 0 {
                self.control_tick(controls);
                self.samples_until_tick = self.control_period;
            }
            self.samples_until_tick -= 1;

            let distance = self.attenuation.gain();
            let max_delay = self.max_interaural_delay;
            let [left_ear, right_ear] = &mut self.ears;

            *left = left_ear.feed(
                *left,
                self.interaural.delay(Ear::Left),
                self.interaural.gain(Ear::Left),
                distance,
                max_delay,
            );
            *right = right_ear.feed(
                *right,
                self.interaural.delay(Ear::Right),
                self.interaural.gain(Ear::Right),
                distance,
                max_delay,
            );
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        params::ControlSnapshot,
        renderer::{front_back_gain_db, interaural::Ear, RendererSettings, SpatialRenderer},
    };

    #[test]
    fn test_front_back_gain() {
        assert_eq!(front_back_gain_db(0.0, 0.0, 1.0, 2.0), 2.0);
        assert_eq!(front_back_gain_db(90.0, 0.0, 1.0, 2.0), 0.0);
        assert_eq!(front_back_gain_db(-180.0, 0.0, 1.0, 2.0), -2.0);
        assert_eq!(front_back_gain_db(45.0, 0.0, 2.0, 2.0), 2.0);
        assert_eq!(front_back_gain_db(90.0, 90.0, 1.0, 2.0), 2.0);
        assert_eq!(front_back_gain_db(90.0, -45.0, 1.0, 2.0), -1.0);
    }

    #[test]
    fn test_control_ticks_are_counted_across_blocks() {
        let mut renderer = SpatialRenderer::new(48000, RendererSettings::default());
        assert_eq!(renderer.control_period(), 800);

        let controls = ControlSnapshot {
            azimuth: 90.0,
            ..Default::default()
        };
        let mut block = vec![(0.0, 0.0); 300];
        renderer.render(&mut block, &controls);
        assert_eq!(renderer.interaural().far_ear(), Ear::Left);

        // Next tick only after 800 samples in total, no matter how blocks are sized.
        let moved = ControlSnapshot {
            azimuth: -90.0,
            ..Default::default()
        };
        renderer.render(&mut block, &moved);
        assert_eq!(renderer.interaural().far_ear(), Ear::Left);
        renderer.render(&mut block, &moved);
        assert_eq!(renderer.interaural().far_ear(), Ear::Right);
    }

    #[test]
    fn test_smoothers_start_neutral() {
        let mut renderer = SpatialRenderer::new(48000, RendererSettings::default());
        let mut frames = vec![(1.0, 1.0); 1];
        renderer.render(&mut frames, &ControlSnapshot::default());
        // Filters start from zero history, but gains must not start from zero.
        assert!(renderer.smoothed_gain(Ear::Left) > 0.99);
        assert!(renderer.smoothed_distance_gain() > 0.99);
        assert!(frames[0].0.abs() > 0.5);
    }

    #[test]
    fn test_lateral_source_delays_far_ear() {
        let sample_rate = 48000;
        let mut renderer = SpatialRenderer::new(sample_rate, RendererSettings::default());
        let controls = ControlSnapshot {
            azimuth: 90.0,
            ..Default::default()
        };

        let mut frames = vec![(0.0, 0.0); sample_rate as usize * 2];
        renderer.render(&mut frames, &controls);

        // Impulse after the smoothers have settled.
        let mut frames = vec![(0.0, 0.0); 256];
        frames[0] = (1.0, 1.0);
        renderer.render(&mut frames, &controls);

        let peak = |channel: fn(&(f32, f32)) -> f32| {
            frames
                .iter()
                .enumerate()
                .max_by(|a, b| channel(a.1).abs().total_cmp(&channel(b.1).abs()))
                .map(|(i, _)| i)
                .unwrap_or_default()
        };
        let left_peak = peak(|f| f.0);
        let right_peak = peak(|f| f.1);

        // One unit of delay fraction is 0.66 ms, about 32 samples at 48 kHz.
        assert!(left_peak > right_peak + 20, "{} {}", left_peak, right_peak);
        assert!(renderer.smoothed_delay(Ear::Left) > 0.95);
        assert!(renderer.smoothed_gain(Ear::Left) < 0.45);
        assert!(renderer.smoothed_gain(Ear::Right) > 0.99);
    }

    #[test]
    fn test_distance_attenuation_is_applied() {
        let mut renderer = SpatialRenderer::new(48000, RendererSettings::default());
        let controls = ControlSnapshot {
            distance: 11.0,
            minimum_distance: 1.0,
            attenuation_scale: 0.0,
            ..Default::default()
        };
        let mut frames = vec![(0.0, 0.0); 48000 * 3];
        renderer.render(&mut frames, &controls);
        assert!((renderer.distance_gain() - 1.0 / 11.0).abs() < 1.0e-6);
        assert!((renderer.smoothed_distance_gain() - 1.0 / 11.0).abs() < 1.0e-3);
    }
}
