//! Spatial source module.
//!
//! # Overview
//!
//! Spatial source is a single sound emitter: it owns a chain of effects, a binaural renderer and
//! an obstruction filter, and shares its runtime controls with the application through an
//! [`Arc`]. Audio is pushed through it block by block:
//!
//! ```text
//! effects -> binaural renderer -> obstruction filter
//! ```
//!
//! Control values are read once at the beginning of every block.
//!
//! # Usage
//!
//! ```
//! use binaural_sound::{
//!     attenuation::RolloffCurve,
//!     effects::{reverb::Reverb, Effect},
//!     source::SpatialSourceBuilder,
//! };
//!
//! let mut source = SpatialSourceBuilder::new(44100)
//!     .with_rolloff(RolloffCurve::Linear)
//!     .with_attenuation_scale(0.1)
//!     .with_effect(Effect::Reverb(Reverb::new(44100)))
//!     .build()
//!     .unwrap();
//!
//! source.controls().set_azimuth(30.0);
//!
//! let mut block = vec![0.0; 2 * 256];
//! source.process_interleaved(&mut block, 2);
//! ```

use crate::{
    attenuation::RolloffCurve,
    dsp::DelayLine,
    effects::{Effect, EffectRenderTrait},
    error::SpatialError,
    occlusion::{ObstructionFilter, ObstructionMode},
    params::{ControlSnapshot, SpatialControls},
    renderer::{RendererSettings, SpatialRenderer},
};
use fyrox_core::log::Log;
use std::sync::Arc;

/// Lowest sample rate the renderer's fixed filter frequencies fit under.
pub const MIN_SAMPLE_RATE: u32 = 8000;

/// Interleaved blocks are processed in pieces of this many frames.
const SCRATCH_FRAMES: usize = 512;

/// See module docs.
#[derive(Debug)]
pub struct SpatialSource {
    sample_rate: u32,
    controls: Arc<SpatialControls>,
    effects: Vec<Effect>,
    renderer: SpatialRenderer,
    obstruction: ObstructionFilter,
    scratch: Vec<(f32, f32)>,
}

impl SpatialSource {
    /// Returns sample rate the source was built for.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns runtime controls of the source. The handle can be sent to other threads.
    pub fn controls(&self) -> Arc<SpatialControls> {
        self.controls.clone()
    }

    /// Adds new effect to the end of the effects chain. The effect is switched to the sample rate
    /// of the source. Allocates, so do not call it while rendering.
    pub fn add_effect(&mut self, mut effect: Effect) {
        effect.set_sample_rate(self.sample_rate);
        self.effects.push(effect)
    }

    /// Removes an effect at the given position, returns `None` if there is no such effect.
    pub fn remove_effect(&mut self, index: usize) -> Option<Effect> {
        if index < self.effects.len() {
            Some(self.effects.remove(index))
        } else {
            None
        }
    }

    /// Returns a shared reference to an effect at the given position.
    pub fn effect(&self, index: usize) -> Option<&Effect> {
        self.effects.get(index)
    }

    /// Returns mutable reference to effect at the given position.
    pub fn effect_mut(&mut self, index: usize) -> Option<&mut Effect> {
        self.effects.get_mut(index)
    }

    /// Returns an iterator over effects of the source.
    pub fn effects(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter()
    }

    /// Returns an iterator over effects of the source.
    pub fn effects_mut(&mut self) -> impl Iterator<Item = &mut Effect> {
        self.effects.iter_mut()
    }

    /// Returns binaural renderer of the source.
    pub fn renderer(&self) -> &SpatialRenderer {
        &self.renderer
    }

    /// Returns obstruction filter of the source.
    pub fn obstruction(&self) -> &ObstructionFilter {
        &self.obstruction
    }

    fn render_with(&mut self, frames: &mut [(f32, f32)], controls: &ControlSnapshot) {
        for effect in self.effects.iter_mut() {
            effect.render(frames);
        }
        self.renderer.render(frames, controls);
        self.obstruction.render(
            frames,
            controls.occlusion,
            controls.obstructed_frequency,
            controls.obstruction_db,
        );
    }

    /// Processes one block of stereo frames in place.
    pub fn render(&mut self, frames: &mut [(f32, f32)]) {
        let controls = self.controls.snapshot();
        self.render_with(frames, &controls);
    }

    /// Processes one block of interleaved samples in place. Only stereo is supported, any other
    /// channel count leaves the buffer untouched. A trailing incomplete frame is left untouched
    /// as well.
    pub fn process_interleaved(&mut self, buffer: &mut [f32], channels: usize) {
        if channels != 2 {
            return;
        }

        let controls = self.controls.snapshot();
        let mut scratch = std::mem::take(&mut self.scratch);

        for chunk in buffer.chunks_mut(SCRATCH_FRAMES * 2) {
            let frame_count = chunk.len() / 2;
            let frames = &mut scratch[..frame_count];
            for (frame, samples) in frames.iter_mut().zip(chunk.chunks_exact(2)) {
                *frame = (samples[0], samples[1]);
            }

            self.render_with(frames, &controls);

            for (frame, samples) in frames.iter().zip(chunk.chunks_exact_mut(2)) {
                samples[0] = frame.0;
                samples[1] = frame.1;
            }
        }

        self.scratch = scratch;
    }
}

/// Allows you to create a spatial source with desired settings.
#[derive(Debug, Clone)]
pub struct SpatialSourceBuilder {
    sample_rate: u32,
    settings: RendererSettings,
    obstruction_mode: ObstructionMode,
    obstruction_smoothing: Option<f32>,
    controls: ControlSnapshot,
    effects: Vec<Effect>,
}

impl SpatialSourceBuilder {
    /// Creates new builder with default settings for given sample rate.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            settings: Default::default(),
            obstruction_mode: Default::default(),
            obstruction_smoothing: None,
            controls: Default::default(),
            effects: Default::default(),
        }
    }

    /// Sets how many times per second control values are consumed. Default is 60 Hz.
    pub fn with_control_rate(mut self, control_rate: f32) -> Self {
        self.settings.control_rate = control_rate;
        self
    }

    /// Sets delay in seconds of one unit of interaural delay. Default is 0.66 ms.
    pub fn with_max_interaural_delay(mut self, delay: f32) -> Self {
        self.settings.max_interaural_delay = delay;
        self
    }

    /// Sets size of interaural delay lines in samples. Default is 32768.
    pub fn with_delay_capacity(mut self, capacity: usize) -> Self {
        self.settings.delay_capacity = capacity;
        self
    }

    /// Sets per-tick step of the near ear returning to neutral. Default is 0.05.
    pub fn with_interaural_step(mut self, step: f32) -> Self {
        self.settings.interaural_step = step;
        self
    }

    /// Sets per-tick step of the attenuation returning to unity inside minimum distance.
    /// Default is 0.05.
    pub fn with_reentry_step(mut self, step: f32) -> Self {
        self.settings.reentry_step = step;
        self
    }

    /// Sets cutoff of the renderer's control smoothers. Default is 2 Hz.
    pub fn with_smoothing_frequency(mut self, frequency: f32) -> Self {
        self.settings.smoothing_frequency = frequency;
        self
    }

    /// Sets obstruction rendering mode.
    pub fn with_obstruction_mode(mut self, mode: ObstructionMode) -> Self {
        self.obstruction_mode = mode;
        self
    }

    /// Sets cutoff of the obstruction amount smoother. Default depends on the mode, see
    /// [`ObstructionMode::default_smoothing_frequency`].
    pub fn with_obstruction_smoothing_frequency(mut self, frequency: f32) -> Self {
        self.obstruction_smoothing = Some(frequency);
        self
    }

    /// Sets initial values of every runtime control.
    pub fn with_controls(mut self, controls: ControlSnapshot) -> Self {
        self.controls = controls;
        self
    }

    /// See [`SpatialControls::set_spatial_scale`]
    pub fn with_spatial_scale(mut self, scale: f32) -> Self {
        self.controls.spatial_scale = scale;
        self
    }

    /// See [`SpatialControls::set_minimum_distance`]
    pub fn with_minimum_distance(mut self, distance: f32) -> Self {
        self.controls.minimum_distance = distance;
        self
    }

    /// See [`SpatialControls::set_attenuation_scale`]
    pub fn with_attenuation_scale(mut self, scale: f32) -> Self {
        self.controls.attenuation_scale = scale;
        self
    }

    /// See [`SpatialControls::set_rolloff`]
    pub fn with_rolloff(mut self, curve: RolloffCurve) -> Self {
        self.controls.rolloff = curve;
        self
    }

    /// See [`SpatialControls::set_obstructed_frequency`]
    pub fn with_obstructed_frequency(mut self, frequency: f32) -> Self {
        self.controls.obstructed_frequency = frequency;
        self
    }

    /// See [`SpatialControls::set_obstruction_db`]
    pub fn with_obstruction_db(mut self, db: f32) -> Self {
        self.controls.obstruction_db = db;
        self
    }

    /// See [`SpatialControls::set_elevation_shelf_db`]
    pub fn with_elevation_shelf_db(mut self, db: f32) -> Self {
        self.controls.elevation_shelf_db = db;
        self
    }

    /// Appends an effect to the effects chain.
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Replaces the effects chain.
    pub fn with_effects(mut self, effects: Vec<Effect>) -> Self {
        self.effects = effects;
        self
    }

    fn check_positive(name: &'static str, value: f32) -> Result<(), SpatialError> {
        if value > 0.0 && value.is_finite() {
            Ok(())
        } else {
            Err(SpatialError::InvalidParameter { name, value })
        }
    }

    fn check_non_negative(name: &'static str, value: f32) -> Result<(), SpatialError> {
        if value >= 0.0 && value.is_finite() {
            Ok(())
        } else {
            Err(SpatialError::InvalidParameter { name, value })
        }
    }

    /// Creates new spatial source.
    pub fn build(self) -> Result<SpatialSource, SpatialError> {
        if self.sample_rate < MIN_SAMPLE_RATE {
            return Err(SpatialError::InvalidSampleRate(self.sample_rate));
        }

        let settings = self.settings;
        if !(settings.control_rate > 0.0 && settings.control_rate <= self.sample_rate as f32) {
            return Err(SpatialError::InvalidControlRate(settings.control_rate));
        }

        // Only validates, the renderer owns its lines.
        DelayLine::try_new(settings.delay_capacity, self.sample_rate)?;

        Self::check_non_negative("max_interaural_delay", settings.max_interaural_delay)?;
        Self::check_non_negative("interaural_step", settings.interaural_step)?;
        Self::check_non_negative("reentry_step", settings.reentry_step)?;
        Self::check_positive("smoothing_frequency", settings.smoothing_frequency)?;

        let obstruction_smoothing = self
            .obstruction_smoothing
            .unwrap_or_else(|| self.obstruction_mode.default_smoothing_frequency());
        Self::check_positive("obstruction_smoothing_frequency", obstruction_smoothing)?;

        let longest_delay = settings.max_interaural_delay
            * SpatialControls::MAX_SPATIAL_SCALE
            * self.sample_rate as f32;
        if longest_delay >= settings.delay_capacity as f32 {
            Log::warn(format!(
                "Interaural delay line of {} samples is shorter than the longest possible \
                delay of {} samples, long delays will be clamped.",
                settings.delay_capacity, longest_delay
            ));
        }

        let mut effects = self.effects;
        for effect in effects.iter_mut() {
            effect.set_sample_rate(self.sample_rate);
        }

        let source = SpatialSource {
            sample_rate: self.sample_rate,
            controls: Arc::new(SpatialControls::new(self.controls)),
            effects,
            renderer: SpatialRenderer::new(self.sample_rate, settings),
            obstruction: ObstructionFilter::new(
                self.obstruction_mode,
                self.sample_rate,
                obstruction_smoothing,
            ),
            scratch: vec![(0.0, 0.0); SCRATCH_FRAMES],
        };

        Log::info(format!(
            "Spatial source created: {} Hz, control tick every {} samples, {} effect(s), {} mode.",
            source.sample_rate,
            source.renderer.control_period(),
            source.effects.len(),
            source.obstruction.mode().as_ref()
        ));

        Ok(source)
    }
}

#[cfg(test)]
mod test {
    use crate::{
        effects::{distortion::Distortion, echo::Echo, Effect, EffectRenderTrait},
        error::SpatialError,
        source::SpatialSourceBuilder,
    };
    use std::str::FromStr;

    #[test]
    fn test_build_validates_settings() {
        assert_eq!(
            SpatialSourceBuilder::new(4000).build().err(),
            Some(SpatialError::InvalidSampleRate(4000))
        );
        assert_eq!(
            SpatialSourceBuilder::new(48000)
                .with_control_rate(0.0)
                .build()
                .err(),
            Some(SpatialError::InvalidControlRate(0.0))
        );
        assert_eq!(
            SpatialSourceBuilder::new(48000)
                .with_delay_capacity(0)
                .build()
                .err(),
            Some(SpatialError::InvalidDelayCapacity(0))
        );
        assert!(matches!(
            SpatialSourceBuilder::new(48000)
                .with_smoothing_frequency(-1.0)
                .build(),
            Err(SpatialError::InvalidParameter {
                name: "smoothing_frequency",
                ..
            })
        ));
        assert!(SpatialSourceBuilder::new(48000).build().is_ok());
    }

    #[test]
    fn test_initial_controls_are_applied() {
        let source = SpatialSourceBuilder::new(48000)
            .with_spatial_scale(2.5)
            .with_minimum_distance(4.0)
            .with_attenuation_scale(5.0)
            .with_elevation_shelf_db(4.0)
            .build()
            .unwrap();
        let controls = source.controls();
        assert_eq!(controls.elevation_shelf_db(), 4.0);
        assert_eq!(controls.spatial_scale(), 2.5);
        assert_eq!(controls.minimum_distance(), 4.0);
        // Clamped like the runtime setter does.
        assert_eq!(controls.attenuation_scale(), 1.0);
    }

    #[test]
    fn test_non_stereo_is_untouched() {
        let mut source = SpatialSourceBuilder::new(48000).build().unwrap();
        let mut buffer = vec![0.25; 3 * 100];
        source.process_interleaved(&mut buffer, 3);
        assert!(buffer.iter().all(|s| *s == 0.25));
        source.process_interleaved(&mut buffer, 1);
        assert!(buffer.iter().all(|s| *s == 0.25));
    }

    #[test]
    fn test_interleaved_matches_frames() {
        let make = || {
            SpatialSourceBuilder::new(48000)
                .with_effect(Effect::Distortion(Distortion::soft(2.0)))
                .build()
                .unwrap()
        };
        let mut a = make();
        let mut b = make();
        for source in [&a, &b] {
            source.controls().set_azimuth(60.0);
            source.controls().set_distance(3.0);
        }

        // Longer than the scratch buffer to cover chunking.
        let signal = (0..1500)
            .map(|i| ((i as f32 * 0.05).sin(), (i as f32 * 0.03).cos()))
            .collect::<Vec<_>>();

        let mut frames = signal.clone();
        a.render(&mut frames);

        let mut interleaved = signal
            .iter()
            .flat_map(|(l, r)| [*l, *r])
            .collect::<Vec<_>>();
        b.process_interleaved(&mut interleaved, 2);

        for (frame, samples) in frames.iter().zip(interleaved.chunks_exact(2)) {
            assert_eq!(frame.0, samples[0]);
            assert_eq!(frame.1, samples[1]);
        }
    }

    fn first_echo_repeat(effect: &mut Effect) -> Option<usize> {
        if let Effect::Echo(echo) = effect {
            echo.set_dry(0.0);
            echo.set_delay_gain(1.0);
        }
        let mut frames = vec![(0.0, 0.0); 13000];
        frames[0] = (1.0, 1.0);
        effect.render(&mut frames);
        frames.iter().position(|f| f.0 != 0.0)
    }

    #[test]
    fn test_effects_run_at_source_sample_rate() {
        let mut source = SpatialSourceBuilder::new(48000)
            .with_effect(Effect::Echo(Echo::default()))
            .build()
            .unwrap();
        source.add_effect(Effect::from_str("Echo").unwrap());

        for index in 0..2 {
            let effect = source.effect_mut(index).unwrap();
            if let Effect::Echo(echo) = effect {
                assert_eq!(echo.sample_rate(), 48000);
            }
            // 250 ms of default echo delay.
            assert_eq!(first_echo_repeat(effect), Some(12000));
        }
    }

    #[test]
    fn test_effects_chain_management() {
        let mut source = SpatialSourceBuilder::new(48000).build().unwrap();
        source.add_effect(Effect::Distortion(Distortion::clip(1.0)));
        assert_eq!(source.effects().count(), 1);
        assert!(source.effect_mut(0).is_some());
        assert!(source.remove_effect(3).is_none());
        assert!(source.remove_effect(0).is_some());
        assert!(source.effect(0).is_none());
    }
}
