//! Obstruction of a sound source by level geometry.
//!
//! # Overview
//!
//! The application answers ray queries through the [`RayCaster`] trait, [`OcclusionProbe`] turns
//! them into an obstruction amount once per frame and the amount is written into
//! [`crate::params::SpatialControls::set_occlusion`]. On the audio side [`ObstructionFilter`]
//! smooths the amount and muffles the sound accordingly.
//!
//! Two flavours exist, see [`ObstructionMode`]: occlusion takes a fraction of blocked probe rays
//! and darkens the sound with a high shelf, obfuscation takes a single blocked/clear flag and
//! closes a lowpass.

use crate::{
    direction::Direction,
    dsp::filters::{Biquad, BiquadCoefficients, OnePole},
    renderer::clamp_frequency,
};
use fyrox_core::{algebra::Vector3, math::lerpf};
use strum_macros::{AsRefStr, EnumString, VariantNames};

/// Physics query used to probe obstruction. Implemented for closures with the same signature.
pub trait RayCaster {
    /// Returns `true` if a ray from `origin` along `direction` hits anything closer than
    /// `max_distance`. `direction` is not guaranteed to be normalized.
    fn cast_ray(&self, origin: Vector3<f32>, direction: Vector3<f32>, max_distance: f32) -> bool;
}

impl<F> RayCaster for F
where
    F: Fn(Vector3<f32>, Vector3<f32>, f32) -> bool,
{
    fn cast_ray(&self, origin: Vector3<f32>, direction: Vector3<f32>, max_distance: f32) -> bool {
        self(origin, direction, max_distance)
    }
}

/// Casts probe rays from a source toward the listener.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OcclusionProbe {
    spread: f32,
}

impl Default for OcclusionProbe {
    fn default() -> Self {
        Self { spread: 0.1 }
    }
}

impl OcclusionProbe {
    /// Amount of rays cast by [`Self::occlusion`].
    pub const RAY_COUNT: usize = 5;

    /// Creates new probe, side rays deviate from the central one by `spread` along world up and
    /// right axes.
    pub fn new(spread: f32) -> Self {
        Self { spread }
    }

    /// Returns fraction of blocked rays: 0.0, 0.2, ... 1.0. A source at the listener is never
    /// occluded.
    pub fn occlusion<R: RayCaster + ?Sized>(
        &self,
        caster: &R,
        source_position: Vector3<f32>,
        direction: &Direction,
    ) -> f32 {
        if direction.distance <= 0.0 {
            return 0.0;
        }

        let center = direction.to_listener;
        let up = Vector3::y() * self.spread;
        let right = Vector3::x() * self.spread;
        let rays = [center, center + up, center - up, center + right, center - right];

        let hits = rays
            .iter()
            .filter(|ray| caster.cast_ray(source_position, **ray, direction.distance))
            .count();

        hits as f32 / Self::RAY_COUNT as f32
    }

    /// Casts only the central ray.
    pub fn is_obstructed<R: RayCaster + ?Sized>(
        &self,
        caster: &R,
        source_position: Vector3<f32>,
        direction: &Direction,
    ) -> bool {
        direction.distance > 0.0
            && caster.cast_ray(source_position, direction.to_listener, direction.distance)
    }
}

/// How obstruction is rendered.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, AsRefStr, EnumString, VariantNames)]
pub enum ObstructionMode {
    /// Fractional amount drives frequency and depth of a high shelf cut.
    #[default]
    Occlusion,
    /// Blocked/clear flag closes a one-pole lowpass.
    Obfuscation,
}

impl ObstructionMode {
    /// Default cutoff of the smoother of the obstruction amount, in Hertz.
    pub fn default_smoothing_frequency(self) -> f32 {
        match self {
            Self::Occlusion => 0.5,
            Self::Obfuscation => 2.0,
        }
    }
}

/// Audio side of obstruction. See module docs.
#[derive(Debug, Clone)]
pub struct ObstructionFilter {
    mode: ObstructionMode,
    sample_rate: u32,
    open_frequency: f32,
    smoother: OnePole,
    designed: Option<(f32, f32, f32)>,
    cutoff: f32,
    gain_db: f32,
    shelves: [Biquad; 2],
    lowpasses: [OnePole; 2],
}

impl ObstructionFilter {
    /// Cutoff when nothing obstructs the source, in Hertz.
    pub const OPEN_FREQUENCY: f32 = 20000.0;

    const SHELF_SLOPE: f32 = std::f32::consts::FRAC_1_SQRT_2;

    /// Changes of the smoothed amount below this do not redesign the filters.
    const REDESIGN_THRESHOLD: f32 = 1.0e-6;

    /// Creates new filter in given mode. The smoother of the amount has cutoff of
    /// `smoothing_frequency` Hertz.
    pub fn new(mode: ObstructionMode, sample_rate: u32, smoothing_frequency: f32) -> Self {
        let open_frequency = clamp_frequency(Self::OPEN_FREQUENCY, sample_rate);
        Self {
            mode,
            sample_rate,
            open_frequency,
            smoother: OnePole::new(smoothing_frequency, sample_rate),
            designed: None,
            cutoff: open_frequency,
            gain_db: 0.0,
            shelves: Default::default(),
            lowpasses: [
                OnePole::new(open_frequency, sample_rate),
                OnePole::new(open_frequency, sample_rate),
            ],
        }
    }

    /// Returns rendering mode.
    pub fn mode(&self) -> ObstructionMode {
        self.mode
    }

    /// Returns obstruction amount after smoothing.
    pub fn amount(&self) -> f32 {
        self.smoother.last()
    }

    /// Returns cutoff frequency used by the last rendered sample.
    pub fn cutoff_frequency(&self) -> f32 {
        self.cutoff
    }

    /// Returns shelf gain in decibels used by the last rendered sample, always zero in
    /// obfuscation mode.
    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    fn redesign(&mut self, amount: f32, obstructed_frequency: f32, obstruction_db: f32) {
        let obstructed = clamp_frequency(obstructed_frequency, self.sample_rate);
        if let Some((last_amount, last_frequency, last_db)) = self.designed {
            if (amount - last_amount).abs() <= Self::REDESIGN_THRESHOLD
                && last_frequency == obstructed
                && last_db == obstruction_db
            {
                return;
            }
        }
        self.designed = Some((amount, obstructed, obstruction_db));

        self.cutoff = lerpf(self.open_frequency, obstructed, amount);
        match self.mode {
            ObstructionMode::Occlusion => {
                self.gain_db = obstruction_db * amount;
                let coefficients = BiquadCoefficients::high_shelf(
                    self.sample_rate,
                    self.cutoff,
                    Self::SHELF_SLOPE,
                    self.gain_db,
                );
                for shelf in self.shelves.iter_mut() {
                    shelf.set_coefficients(coefficients);
                }
            }
            ObstructionMode::Obfuscation => {
                self.gain_db = 0.0;
                for lowpass in self.lowpasses.iter_mut() {
                    lowpass.set_cutoff(self.cutoff, self.sample_rate);
                }
            }
        }
    }

    /// Renders frames in place. `amount` is the target obstruction in `[0; 1]`,
    /// `obstructed_frequency` and `obstruction_db` describe a fully obstructed source.
    pub fn render(
        &mut self,
        frames: &mut [(f32, f32)],
        amount: f32,
        obstructed_frequency: f32,
        obstruction_db: f32,
    ) {
        let target = amount.clamp(0.0, 1.0);
        for (left, right) in frames.iter_mut() {
            let smoothed = self.smoother.feed(target);
            self.redesign(smoothed, obstructed_frequency, obstruction_db);

            match self.mode {
                ObstructionMode::Occlusion => {
                    *left = self.shelves[0].feed(*left);
                    *right = self.shelves[1].feed(*right);
                }
                ObstructionMode::Obfuscation => {
                    *left = self.lowpasses[0].feed(*left);
                    *right = self.lowpasses[1].feed(*right);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::Cell;

    fn direction(distance: f32) -> Direction {
        Direction {
            distance,
            to_listener: Vector3::new(0.0, 0.0, -1.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_probe_counts_hits() {
        let probe = OcclusionProbe::default();
        let wall_above = |_: Vector3<f32>, dir: Vector3<f32>, _: f32| dir.y > 0.0;
        assert_eq!(probe.occlusion(&wall_above, Vector3::zeros(), &direction(5.0)), 0.2);
        assert!(!probe.is_obstructed(&wall_above, Vector3::zeros(), &direction(5.0)));

        let everything = |_: Vector3<f32>, _: Vector3<f32>, _: f32| true;
        assert_eq!(probe.occlusion(&everything, Vector3::zeros(), &direction(5.0)), 1.0);
        assert!(probe.is_obstructed(&everything, Vector3::zeros(), &direction(5.0)));
        assert_eq!(probe.occlusion(&everything, Vector3::zeros(), &direction(0.0)), 0.0);
    }

    #[test]
    fn test_probe_uses_distance_and_origin() {
        let calls = Cell::new(0);
        let caster = |origin: Vector3<f32>, _: Vector3<f32>, max_distance: f32| {
            calls.set(calls.get() + 1);
            assert_eq!(origin, Vector3::new(1.0, 2.0, 3.0));
            assert_eq!(max_distance, 7.0);
            false
        };
        let probe = OcclusionProbe::default();
        probe.occlusion(&caster, Vector3::new(1.0, 2.0, 3.0), &direction(7.0));
        assert_eq!(calls.get(), OcclusionProbe::RAY_COUNT);
    }

    #[test]
    fn test_occlusion_sweeps_smoothly() {
        let sample_rate = 48000;
        let mut filter = ObstructionFilter::new(ObstructionMode::Occlusion, sample_rate, 0.5);
        let mut block = vec![(0.0, 0.0); 512];

        let mut cutoffs = Vec::new();
        for _ in 0..400 {
            filter.render(&mut block, 1.0, 5000.0, -10.0);
            cutoffs.push(filter.cutoff_frequency());
        }

        assert!(cutoffs.windows(2).all(|w| w[1] <= w[0]));
        let open = clamp_frequency(ObstructionFilter::OPEN_FREQUENCY, sample_rate);
        // Per block the amount moves at most by block length times (1 - pole).
        let max_step = 512.0 * (1.0 - filter.smoother.pole()) * (open - 5000.0);
        assert!(cutoffs.windows(2).all(|w| w[0] - w[1] <= max_step + 1.0));
        assert!((cutoffs[cutoffs.len() - 1] - 5000.0).abs() < 50.0);
        assert!((filter.gain_db() + 10.0).abs() < 0.1);
    }

    #[test]
    fn test_clear_source_is_transparent() {
        let mut filter = ObstructionFilter::new(ObstructionMode::Occlusion, 48000, 0.5);
        let mut frames = vec![(0.5, -0.5); 256];
        filter.render(&mut frames, 0.0, 5000.0, -10.0);
        assert!(frames
            .iter()
            .all(|f| (f.0 - 0.5).abs() < 1.0e-5 && (f.1 + 0.5).abs() < 1.0e-5));
    }

    #[test]
    fn test_obfuscation_closes_lowpass() {
        let sample_rate = 48000;
        let mut filter = ObstructionFilter::new(ObstructionMode::Obfuscation, sample_rate, 2.0);
        let mut frames = vec![(0.0, 0.0); sample_rate as usize * 4];
        filter.render(&mut frames, 1.0, 1000.0, -10.0);
        assert!((filter.cutoff_frequency() - 1000.0).abs() < 1.0);
        assert_eq!(filter.gain_db(), 0.0);

        // Nyquist tone is almost gone.
        let mut frames = (0..4800)
            .map(|i| if i % 2 == 0 { (1.0, 1.0) } else { (-1.0, -1.0) })
            .collect::<Vec<_>>();
        filter.render(&mut frames, 1.0, 1000.0, -10.0);
        assert!(frames[4000..].iter().all(|f| f.0.abs() < 0.2));
    }
}
