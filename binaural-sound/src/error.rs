//! Contains all possible errors that can occur while setting up spatial sources.
//!
//! Nothing in this crate fails while rendering audio. Errors are only produced when a source or
//! one of its parts is constructed with settings it cannot work with.

use std::fmt::{Display, Error, Formatter};

/// Generic error enumeration for each error in this crate.
#[derive(Debug, Clone, PartialEq)]
pub enum SpatialError {
    /// Sample rate is too low to host the fixed filter frequencies of the renderer.
    InvalidSampleRate(u32),

    /// Control rate must be positive and must not exceed the sample rate.
    InvalidControlRate(f32),

    /// A delay line must hold at least one sample.
    InvalidDelayCapacity(usize),

    /// Some parameter is out of the range it is allowed to take at construction.
    InvalidParameter {
        /// Name of the parameter.
        name: &'static str,
        /// Rejected value.
        value: f32,
    },
}

impl Display for SpatialError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        match self {
            Self::InvalidSampleRate(rate) => {
                write!(f, "sample rate {} Hz is not supported", rate)
            }
            Self::InvalidControlRate(rate) => {
                write!(f, "control rate {} Hz is out of range", rate)
            }
            Self::InvalidDelayCapacity(capacity) => {
                write!(f, "delay line capacity {} is invalid", capacity)
            }
            Self::InvalidParameter { name, value } => {
                write!(f, "invalid value {} of parameter `{}`", value, name)
            }
        }
    }
}

impl std::error::Error for SpatialError {}
