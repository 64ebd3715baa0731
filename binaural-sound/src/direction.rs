//! Direction of a sound source relative to the listener.
//!
//! Resolving runs on the application side, usually once per frame, and its result is written
//! into [`crate::params::SpatialControls`] of a source.

use crate::listener::{Handedness, Listener};
use fyrox_core::{algebra::Vector3, log::Log};

/// Squared length below which a horizontal projection has no usable direction.
const DEGENERATE_EPSILON: f32 = 1.0e-12;

/// Position of a source as seen by the listener.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Direction {
    /// Signed horizontal angle in degrees within `[-180; 180]`, positive on the right.
    pub azimuth: f32,
    /// Angle above (positive) or below (negative) the horizontal plane, in degrees.
    pub elevation: f32,
    /// Distance between listener and source.
    pub distance: f32,
    /// Unit vector from the source toward the listener, zero if they coincide.
    pub to_listener: Vector3<f32>,
}

impl Default for Direction {
    fn default() -> Self {
        Self {
            azimuth: 0.0,
            elevation: 0.0,
            distance: 0.0,
            to_listener: Vector3::zeros(),
        }
    }
}

/// Computes [`Direction`]s. Remembers the last azimuth and elevation so that singular geometry
/// (listener looking straight up, source exactly above the listener, source at the listener's
/// position) keeps the previous angles instead of producing NaN.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DirectionResolver {
    last_azimuth: f32,
    last_elevation: f32,
    degenerate_logged: bool,
}

impl DirectionResolver {
    /// Creates new resolver, initial angles are zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns direction of a source at `source_position` relative to the listener.
    pub fn resolve(&mut self, listener: &Listener, source_position: Vector3<f32>) -> Direction {
        let object = source_position - listener.position();
        let distance = object.norm();

        let look = listener.look_axis();
        let look_h = Vector3::new(look.x, 0.0, look.z);
        let object_h = Vector3::new(object.x, 0.0, object.z);

        if look_h.norm_squared() > DEGENERATE_EPSILON && object_h.norm_squared() > DEGENERATE_EPSILON
        {
            let cross = look_h.cross(&object_h);
            let angle = cross.norm().atan2(look_h.dot(&object_h)).to_degrees();
            let mut sign = if listener.up_axis().dot(&cross) < 0.0 {
                -1.0
            } else {
                1.0
            };
            if listener.handedness() == Handedness::Right {
                sign = -sign;
            }
            self.last_azimuth = sign * angle;
        } else if !self.degenerate_logged {
            self.degenerate_logged = true;
            Log::warn(
                "Horizontal direction of the listener or a source is degenerate, \
                the last azimuth is kept.",
            );
        }

        if distance > 0.0 {
            self.last_elevation = (object.y / distance).clamp(-1.0, 1.0).asin().to_degrees();
        }

        let to_listener = if distance > 0.0 {
            -object / distance
        } else {
            Vector3::zeros()
        };

        Direction {
            azimuth: self.last_azimuth,
            elevation: self.last_elevation,
            distance,
            to_listener,
        }
    }

    /// Returns last resolved azimuth.
    pub fn azimuth(&self) -> f32 {
        self.last_azimuth
    }

    /// Returns last resolved elevation.
    pub fn elevation(&self) -> f32 {
        self.last_elevation
    }

    /// Returns `true` if degenerate geometry has been met (and reported) at least once.
    pub fn has_met_degenerate_geometry(&self) -> bool {
        self.degenerate_logged
    }
}
