//! Waveshaping distortion.

use crate::effects::EffectRenderTrait;
use strum_macros::{AsRefStr, EnumString, VariantNames};

/// Transfer curve of the distortion.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, AsRefStr, EnumString, VariantNames)]
pub enum DistortionKind {
    /// Hard clipping at ±1, gives square-like harmonics.
    #[default]
    Clip,
    /// Arctangent saturation, never exceeds ±1 but approaches it smoothly.
    Soft,
}

impl DistortionKind {
    /// Shapes one sample after applying pre-gain.
    #[inline]
    pub fn shape(self, sample: f32, gain: f32) -> f32 {
        match self {
            Self::Clip => (sample * gain).clamp(-1.0, 1.0),
            Self::Soft => std::f32::consts::FRAC_2_PI * (sample * gain).atan(),
        }
    }
}

/// See module docs.
#[derive(Debug, Clone, PartialEq)]
pub struct Distortion {
    kind: DistortionKind,
    gain: f32,
}

impl Default for Distortion {
    fn default() -> Self {
        Self::new(DistortionKind::Clip, 1.0)
    }
}

impl Distortion {
    /// Creates new distortion with given curve and pre-gain.
    pub fn new(kind: DistortionKind, gain: f32) -> Self {
        Self { kind, gain }
    }

    /// Shortcut for hard clipping distortion.
    pub fn clip(gain: f32) -> Self {
        Self::new(DistortionKind::Clip, gain)
    }

    /// Shortcut for soft saturation.
    pub fn soft(gain: f32) -> Self {
        Self::new(DistortionKind::Soft, gain)
    }

    /// Sets pre-gain applied before shaping.
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }

    /// Returns pre-gain.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Sets transfer curve.
    pub fn set_kind(&mut self, kind: DistortionKind) {
        self.kind = kind;
    }

    /// Returns transfer curve.
    pub fn kind(&self) -> DistortionKind {
        self.kind
    }
}

impl EffectRenderTrait for Distortion {
    fn render(&mut self, frames: &mut [(f32, f32)]) {
        for (left, right) in frames.iter_mut() {
            *left = self.kind.shape(*left, self.gain);
            *right = self.kind.shape(*right, self.gain);
        }
    }

    fn set_sample_rate(&mut self, _sample_rate: u32) {
        // Memoryless, nothing depends on time.
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_clip() {
        assert_eq!(DistortionKind::Clip.shape(0.25, 2.0), 0.5);
        assert_eq!(DistortionKind::Clip.shape(0.75, 2.0), 1.0);
        assert_eq!(DistortionKind::Clip.shape(-3.0, 1.0), -1.0);
    }

    #[test]
    fn test_soft() {
        assert_eq!(DistortionKind::Soft.shape(0.0, 10.0), 0.0);
        let loud = DistortionKind::Soft.shape(1.0, 1000.0);
        assert!(loud < 1.0 && loud > 0.99);
        // Odd symmetry.
        assert_eq!(
            DistortionKind::Soft.shape(-0.3, 2.0),
            -DistortionKind::Soft.shape(0.3, 2.0)
        );
    }

    #[test]
    fn test_kind_from_string() {
        assert_eq!(DistortionKind::from_str("Soft"), Ok(DistortionKind::Soft));
    }
}
