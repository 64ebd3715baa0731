//! Control parameters shared between the application and the audio thread.
//!
//! # Overview
//!
//! Application thread writes controls at any time, audio thread takes a [`ControlSnapshot`] once
//! per block. Every parameter is a separate atomic with relaxed ordering, so a snapshot may mix
//! values from two consecutive writes. That is at most one block of inconsistency, which is
//! inaudible after smoothing, and neither side ever waits for the other.

use crate::{attenuation::RolloffCurve, direction::Direction};
use fyrox_core::log::Log;
use std::{
    fmt::{Debug, Formatter},
    sync::atomic::{AtomicU32, Ordering},
};

/// `f32` that can be shared between threads, stored as raw bits in an [`AtomicU32`].
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    /// Creates new atomic with given value.
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    /// Reads current value.
    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Replaces current value.
    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed)
    }
}

impl Default for AtomicF32 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Debug for AtomicF32 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.load())
    }
}

/// Plain copy of every control, taken by the audio thread.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ControlSnapshot {
    /// Signed azimuth in degrees, positive on the right.
    pub azimuth: f32,
    /// Elevation in degrees, positive above.
    pub elevation: f32,
    /// Distance between source and listener.
    pub distance: f32,
    /// Obstruction amount in `[0; 1]`.
    pub occlusion: f32,
    /// Strength of every spatial cue in `[0; 3]`.
    pub spatial_scale: f32,
    /// Radius around the source without distance attenuation.
    pub minimum_distance: f32,
    /// Steepness of the roll-off curve in `[0; 1]`.
    pub attenuation_scale: f32,
    /// Roll-off curve.
    pub rolloff: RolloffCurve,
    /// Cutoff of the obstruction filter when fully obstructed, in Hertz.
    pub obstructed_frequency: f32,
    /// Gain of the obstruction shelf when fully obstructed, in decibels.
    pub obstruction_db: f32,
    /// Gain of the elevation shelf for a source straight above, in decibels.
    pub elevation_shelf_db: f32,
}

impl Default for ControlSnapshot {
    fn default() -> Self {
        Self {
            azimuth: 0.0,
            elevation: 0.0,
            distance: 1.0,
            occlusion: 0.0,
            spatial_scale: 1.0,
            minimum_distance: 1.0,
            attenuation_scale: 0.05,
            rolloff: RolloffCurve::Inverse,
            obstructed_frequency: 5000.0,
            obstruction_db: -10.0,
            elevation_shelf_db: 2.0,
        }
    }
}

/// Runtime controls of a [`crate::source::SpatialSource`]. Obtain them with
/// [`crate::source::SpatialSource::controls`] and write from any thread.
///
/// Geometry setters ([`Self::set_direction`], [`Self::set_occlusion`], ...) are meant to be called
/// every frame and sanitize silently. Configuration setters clamp out-of-range values and report
/// it to the log.
#[derive(Debug)]
pub struct SpatialControls {
    azimuth: AtomicF32,
    elevation: AtomicF32,
    distance: AtomicF32,
    occlusion: AtomicF32,
    spatial_scale: AtomicF32,
    minimum_distance: AtomicF32,
    attenuation_scale: AtomicF32,
    rolloff: AtomicU32,
    obstructed_frequency: AtomicF32,
    obstruction_db: AtomicF32,
    elevation_shelf_db: AtomicF32,
}

impl Default for SpatialControls {
    fn default() -> Self {
        Self::new(ControlSnapshot::default())
    }
}

fn clamp_logged(name: &str, value: f32, min: f32, max: f32) -> Option<f32> {
    if value.is_nan() {
        Log::warn(format!("Ignoring NaN value of `{name}`."));
        return None;
    }
    let clamped = value.clamp(min, max);
    if clamped != value {
        Log::warn(format!(
            "Value {value} of `{name}` is out of [{min}; {max}] range and was clamped to {clamped}."
        ));
    }
    Some(clamped)
}

impl SpatialControls {
    /// Upper limit of spatial scale.
    pub const MAX_SPATIAL_SCALE: f32 = 3.0;

    /// Lowest frequency the obstruction filter may be configured to, in Hertz.
    pub const MIN_OBSTRUCTED_FREQUENCY: f32 = 20.0;

    /// Creates controls with given initial values. Initial values pass the same checks as the
    /// setters.
    pub fn new(initial: ControlSnapshot) -> Self {
        let controls = Self {
            azimuth: AtomicF32::new(0.0),
            elevation: AtomicF32::new(0.0),
            distance: AtomicF32::new(1.0),
            occlusion: AtomicF32::new(0.0),
            spatial_scale: AtomicF32::new(1.0),
            minimum_distance: AtomicF32::new(1.0),
            attenuation_scale: AtomicF32::new(0.05),
            rolloff: AtomicU32::new(RolloffCurve::Inverse.as_u32()),
            obstructed_frequency: AtomicF32::new(5000.0),
            obstruction_db: AtomicF32::new(-10.0),
            elevation_shelf_db: AtomicF32::new(2.0),
        };
        controls.set_azimuth(initial.azimuth);
        controls.set_elevation(initial.elevation);
        controls.set_distance(initial.distance);
        controls.set_occlusion(initial.occlusion);
        controls.set_spatial_scale(initial.spatial_scale);
        controls.set_minimum_distance(initial.minimum_distance);
        controls.set_attenuation_scale(initial.attenuation_scale);
        controls.set_rolloff(initial.rolloff);
        controls.set_obstructed_frequency(initial.obstructed_frequency);
        controls.set_obstruction_db(initial.obstruction_db);
        controls.set_elevation_shelf_db(initial.elevation_shelf_db);
        controls
    }

    /// Takes a copy of every control.
    pub fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot {
            azimuth: self.azimuth.load(),
            elevation: self.elevation.load(),
            distance: self.distance.load(),
            occlusion: self.occlusion.load(),
            spatial_scale: self.spatial_scale.load(),
            minimum_distance: self.minimum_distance.load(),
            attenuation_scale: self.attenuation_scale.load(),
            rolloff: RolloffCurve::from_u32(self.rolloff.load(Ordering::Relaxed)),
            obstructed_frequency: self.obstructed_frequency.load(),
            obstruction_db: self.obstruction_db.load(),
            elevation_shelf_db: self.elevation_shelf_db.load(),
        }
    }

    /// Writes azimuth, elevation and distance of a resolved direction.
    pub fn set_direction(&self, direction: &Direction) {
        self.set_azimuth(direction.azimuth);
        self.set_elevation(direction.elevation);
        self.set_distance(direction.distance);
    }

    /// Sets azimuth in degrees, wrapped into `[-180; 180]`. Non-finite values are ignored.
    pub fn set_azimuth(&self, azimuth: f32) {
        if azimuth.is_finite() {
            let wrapped = if (-180.0..=180.0).contains(&azimuth) {
                azimuth
            } else {
                (azimuth + 180.0).rem_euclid(360.0) - 180.0
            };
            self.azimuth.store(wrapped);
        }
    }

    /// Returns azimuth in degrees.
    pub fn azimuth(&self) -> f32 {
        self.azimuth.load()
    }

    /// Sets elevation in degrees, clamped to `[-90; 90]`. Non-finite values are ignored.
    pub fn set_elevation(&self, elevation: f32) {
        if elevation.is_finite() {
            self.elevation.store(elevation.clamp(-90.0, 90.0));
        }
    }

    /// Returns elevation in degrees.
    pub fn elevation(&self) -> f32 {
        self.elevation.load()
    }

    /// Sets distance between source and listener. Negative values become zero, non-finite values
    /// are ignored.
    pub fn set_distance(&self, distance: f32) {
        if distance.is_finite() {
            self.distance.store(distance.max(0.0));
        }
    }

    /// Returns distance between source and listener.
    pub fn distance(&self) -> f32 {
        self.distance.load()
    }

    /// Sets obstruction amount, clamped to `[0; 1]`. Non-finite values are ignored.
    pub fn set_occlusion(&self, occlusion: f32) {
        if occlusion.is_finite() {
            self.occlusion.store(occlusion.clamp(0.0, 1.0));
        }
    }

    /// Sets obstruction as a flag, for obfuscation mode.
    pub fn set_obstructed(&self, obstructed: bool) {
        self.occlusion.store(if obstructed { 1.0 } else { 0.0 });
    }

    /// Returns obstruction amount.
    pub fn occlusion(&self) -> f32 {
        self.occlusion.load()
    }

    /// Sets strength of every spatial cue. 0 is almost no spatial effect, 3 is max effect.
    pub fn set_spatial_scale(&self, scale: f32) {
        if let Some(scale) = clamp_logged("spatial_scale", scale, 0.0, Self::MAX_SPATIAL_SCALE) {
            self.spatial_scale.store(scale);
        }
    }

    /// Returns strength of spatial cues.
    pub fn spatial_scale(&self) -> f32 {
        self.spatial_scale.load()
    }

    /// Sets radius around the source in which the sound is not attenuated.
    pub fn set_minimum_distance(&self, distance: f32) {
        if let Some(distance) = clamp_logged("minimum_distance", distance, 0.0, f32::MAX) {
            self.minimum_distance.store(distance);
        }
    }

    /// Returns radius without attenuation.
    pub fn minimum_distance(&self) -> f32 {
        self.minimum_distance.load()
    }

    /// Sets steepness of the roll-off. 0 is a long fade and 1 is short.
    pub fn set_attenuation_scale(&self, scale: f32) {
        if let Some(scale) = clamp_logged("attenuation_scale", scale, 0.0, 1.0) {
            self.attenuation_scale.store(scale);
        }
    }

    /// Returns steepness of the roll-off.
    pub fn attenuation_scale(&self) -> f32 {
        self.attenuation_scale.load()
    }

    /// Sets roll-off curve.
    pub fn set_rolloff(&self, curve: RolloffCurve) {
        self.rolloff.store(curve.as_u32(), Ordering::Relaxed);
    }

    /// Returns roll-off curve.
    pub fn rolloff(&self) -> RolloffCurve {
        RolloffCurve::from_u32(self.rolloff.load(Ordering::Relaxed))
    }

    /// Sets cutoff of the obstruction filter when fully obstructed, in Hertz. The renderer keeps
    /// it below its Nyquist margin.
    pub fn set_obstructed_frequency(&self, frequency: f32) {
        if let Some(frequency) = clamp_logged(
            "obstructed_frequency",
            frequency,
            Self::MIN_OBSTRUCTED_FREQUENCY,
            f32::MAX,
        ) {
            self.obstructed_frequency.store(frequency);
        }
    }

    /// Returns cutoff of the obstruction filter when fully obstructed.
    pub fn obstructed_frequency(&self) -> f32 {
        self.obstructed_frequency.load()
    }

    /// Sets shelf gain when fully obstructed, in decibels. Must not be positive.
    pub fn set_obstruction_db(&self, db: f32) {
        if let Some(db) = clamp_logged("obstruction_db", db, -120.0, 0.0) {
            self.obstruction_db.store(db);
        }
    }

    /// Returns shelf gain when fully obstructed.
    pub fn obstruction_db(&self) -> f32 {
        self.obstruction_db.load()
    }

    /// Sets shelf gain for a source straight above the listener, in decibels. Sources below get
    /// the opposite gain.
    pub fn set_elevation_shelf_db(&self, db: f32) {
        if let Some(db) = clamp_logged("elevation_shelf_db", db, -24.0, 24.0) {
            self.elevation_shelf_db.store(db);
        }
    }

    /// Returns elevation shelf gain.
    pub fn elevation_shelf_db(&self) -> f32 {
        self.elevation_shelf_db.load()
    }
}

#[cfg(test)]
mod test {
    use crate::{
        attenuation::RolloffCurve,
        direction::Direction,
        params::{AtomicF32, ControlSnapshot, SpatialControls},
    };
    use std::sync::Arc;

    #[test]
    fn test_atomic_f32() {
        let value = AtomicF32::new(-1.5);
        assert_eq!(value.load(), -1.5);
        value.store(f32::MIN_POSITIVE);
        assert_eq!(value.load(), f32::MIN_POSITIVE);
    }

    #[test]
    fn test_configuration_is_clamped() {
        let controls = SpatialControls::default();
        controls.set_spatial_scale(7.0);
        assert_eq!(controls.spatial_scale(), 3.0);
        controls.set_attenuation_scale(-1.0);
        assert_eq!(controls.attenuation_scale(), 0.0);
        controls.set_minimum_distance(-2.0);
        assert_eq!(controls.minimum_distance(), 0.0);
        controls.set_obstruction_db(6.0);
        assert_eq!(controls.obstruction_db(), 0.0);

        controls.set_spatial_scale(f32::NAN);
        assert_eq!(controls.spatial_scale(), 3.0);
    }

    #[test]
    fn test_geometry_is_sanitized() {
        let controls = SpatialControls::default();
        controls.set_azimuth(270.0);
        assert!((controls.azimuth() + 90.0).abs() < 1.0e-4);
        controls.set_azimuth(180.0);
        assert_eq!(controls.azimuth(), 180.0);
        controls.set_azimuth(f32::INFINITY);
        assert_eq!(controls.azimuth(), 180.0);
        controls.set_occlusion(1.5);
        assert_eq!(controls.occlusion(), 1.0);
        controls.set_obstructed(false);
        assert_eq!(controls.occlusion(), 0.0);
        controls.set_distance(-3.0);
        assert_eq!(controls.distance(), 0.0);
    }

    #[test]
    fn test_snapshot() {
        let controls = Arc::new(SpatialControls::default());
        assert_eq!(controls.snapshot(), ControlSnapshot::default());

        controls.set_direction(&Direction {
            azimuth: 45.0,
            elevation: 10.0,
            distance: 3.0,
            ..Default::default()
        });
        controls.set_rolloff(RolloffCurve::Linear);

        let snapshot = std::thread::spawn({
            let controls = controls.clone();
            move || controls.snapshot()
        })
        .join()
        .unwrap();
        assert_eq!(snapshot.azimuth, 45.0);
        assert_eq!(snapshot.elevation, 10.0);
        assert_eq!(snapshot.distance, 3.0);
        assert_eq!(snapshot.rolloff, RolloffCurve::Linear);
    }
}
