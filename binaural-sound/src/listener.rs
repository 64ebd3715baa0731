//! Listener module.
//!
//! # Overview
//!
//! Listener is a coordinate system which is used to compute spatial properties of sound sources.
//! There is no global listener: the application owns it and passes it to
//! [`crate::direction::DirectionResolver::resolve`] explicitly.

use fyrox_core::algebra::{Matrix3, Vector3};
use strum_macros::{AsRefStr, EnumString, VariantNames};

/// Convention of the coordinate system of the application.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, AsRefStr, EnumString, VariantNames)]
pub enum Handedness {
    /// X points right, Y up, Z forward.
    #[default]
    Left,
    /// X points right, Y up, -Z forward.
    Right,
}

/// See module docs.
#[derive(Debug, Clone, PartialEq)]
pub struct Listener {
    basis: Matrix3<f32>,
    position: Vector3<f32>,
    handedness: Handedness,
}

impl Default for Listener {
    fn default() -> Self {
        Self::new()
    }
}

impl Listener {
    /// Creates new listener at the origin, looking along +Z in left-handed coordinate system.
    pub fn new() -> Self {
        Self {
            basis: Matrix3::identity(),
            position: Vector3::new(0.0, 0.0, 0.0),
            handedness: Handedness::Left,
        }
    }

    /// Sets new basis from given vectors in left-handed coordinate system.
    pub fn set_orientation_lh(&mut self, look: Vector3<f32>, up: Vector3<f32>) {
        self.basis = Matrix3::from_columns(&[up.cross(&look), up, look]);
        self.handedness = Handedness::Left;
    }

    /// Sets new basis from given vectors in right-handed coordinate system.
    pub fn set_orientation_rh(&mut self, look: Vector3<f32>, up: Vector3<f32>) {
        self.basis = Matrix3::from_columns(&[look.cross(&up), up, look]);
        self.handedness = Handedness::Right;
    }

    /// Sets current position in world space.
    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
    }

    /// Builder-style variant of [`Self::set_position`].
    pub fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.position = position;
        self
    }

    /// Returns position of listener.
    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    /// Returns shared reference to current basis. Columns are ear (right), up and look axes.
    pub fn basis(&self) -> &Matrix3<f32> {
        &self.basis
    }

    /// Returns coordinate system convention the orientation was given in.
    pub fn handedness(&self) -> Handedness {
        self.handedness
    }

    /// Returns ear axis from basis, it points to the right ear.
    pub fn ear_axis(&self) -> Vector3<f32> {
        self.basis.column(0).into_owned()
    }

    /// Returns up axis from basis.
    pub fn up_axis(&self) -> Vector3<f32> {
        self.basis.column(1).into_owned()
    }

    /// Returns look axis from basis.
    pub fn look_axis(&self) -> Vector3<f32> {
        self.basis.column(2).into_owned()
    }
}

#[cfg(test)]
mod test {
    use crate::listener::{Handedness, Listener};
    use fyrox_core::algebra::Vector3;

    #[test]
    fn test_ear_axis_points_right() {
        let mut listener = Listener::new();
        listener.set_orientation_lh(Vector3::z(), Vector3::y());
        assert_eq!(listener.ear_axis(), Vector3::x());
        assert_eq!(listener.handedness(), Handedness::Left);

        listener.set_orientation_rh(-Vector3::z(), Vector3::y());
        assert_eq!(listener.ear_axis(), Vector3::x());
        assert_eq!(listener.handedness(), Handedness::Right);
    }
}
