//! Distance roll-off.
//!
//! Every curve is flat (gain of 1.0) inside the minimum distance and decays beyond it, how fast is
//! defined by the attenuation scale `k` in `[0; 1]`. With `x = distance - min_distance + 1`:
//!
//! - Inverse: `(1 / x) * (1 - k)`
//! - Logarithmic: `1 - ln(x) / ln(20 / k)`, clamped to zero
//! - Linear: `1 - k * x`, clamped to zero

use strum_macros::{AsRefStr, EnumString, VariantNames};

/// Shape of attenuation over distance.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, AsRefStr, EnumString, VariantNames,
)]
#[repr(u32)]
pub enum RolloffCurve {
    /// Hyperbolic decay, closest to how sound decays in the open.
    #[default]
    Inverse = 0,
    /// Gentle logarithmic decay.
    Logarithmic = 1,
    /// Straight line down to silence.
    Linear = 2,
}

impl RolloffCurve {
    /// Restores a curve from its numeric representation, unknown values give [`Self::Inverse`].
    pub fn from_u32(value: u32) -> Self {
        match value {
            1 => Self::Logarithmic,
            2 => Self::Linear,
            _ => Self::Inverse,
        }
    }

    /// Numeric representation of the curve.
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Returns gain for a source at `distance`. The result is within `[0; 1]` for any
    /// `attenuation_scale` in `[0; 1]`.
    pub fn attenuation(self, distance: f32, min_distance: f32, attenuation_scale: f32) -> f32 {
        if !(distance > min_distance) {
            return 1.0;
        }

        let x = distance - min_distance + 1.0;
        let k = attenuation_scale;
        match self {
            Self::Inverse => (1.0 / x) * (1.0 - k),
            Self::Logarithmic => {
                if k <= 0.0 {
                    // Base of the logarithm goes to infinity, nothing is attenuated.
                    1.0
                } else {
                    (1.0 - x.ln() / (20.0 / k).ln()).max(0.0)
                }
            }
            Self::Linear => (1.0 - k * x).max(0.0),
        }
    }
}

/// Stateful distance attenuation of one source, updated once per control tick.
///
/// Outside of the minimum distance the gain follows the curve immediately. When the source comes
/// back inside the minimum distance the gain does not jump to 1.0, it rises by `reentry_step`
/// per tick instead.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceAttenuation {
    gain: f32,
    reentry_step: f32,
}

impl Default for DistanceAttenuation {
    fn default() -> Self {
        Self::new(Self::DEFAULT_REENTRY_STEP)
    }
}

impl DistanceAttenuation {
    /// Default gain increment per tick inside the minimum distance.
    pub const DEFAULT_REENTRY_STEP: f32 = 0.05;

    /// Creates new attenuation with full gain.
    pub fn new(reentry_step: f32) -> Self {
        Self {
            gain: 1.0,
            reentry_step: reentry_step.abs(),
        }
    }

    /// Returns current gain.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Advances by one control tick and returns the new gain.
    pub fn update(
        &mut self,
        curve: RolloffCurve,
        distance: f32,
        min_distance: f32,
        attenuation_scale: f32,
    ) -> f32 {
        if distance > min_distance {
            self.gain = curve.attenuation(distance, min_distance, attenuation_scale);
        } else {
            self.gain = step_toward(self.gain, 1.0, self.reentry_step);
        }
        self.gain
    }
}

/// Moves `value` toward `target` by at most `step`, never overshooting.
#[inline]
pub(crate) fn step_toward(value: f32, target: f32, step: f32) -> f32 {
    if value < target {
        (value + step).min(target)
    } else {
        (value - step).max(target)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    const CURVES: [RolloffCurve; 3] = [
        RolloffCurve::Inverse,
        RolloffCurve::Logarithmic,
        RolloffCurve::Linear,
    ];

    #[test]
    fn test_unity_inside_min_distance() {
        for curve in CURVES {
            assert_eq!(curve.attenuation(2.0, 2.0, 0.5), 1.0);
            assert_eq!(curve.attenuation(0.5, 2.0, 0.5), 1.0);
        }
        assert_eq!(RolloffCurve::Inverse.attenuation(1.0, 1.0, 0.0), 1.0);
    }

    #[test]
    fn test_monotonic_decay() {
        for curve in CURVES {
            for k in [0.1, 0.5, 1.0] {
                let mut previous = curve.attenuation(1.0, 1.0, k);
                for step in 1..200 {
                    let distance = 1.0 + step as f32 * 0.25;
                    let gain = curve.attenuation(distance, 1.0, k);
                    assert!(gain <= previous, "{:?} k={} d={}", curve, k, distance);
                    assert!((0.0..=1.0).contains(&gain));
                    previous = gain;
                }
                assert!(previous < 1.0);
            }
        }
    }

    #[test]
    fn test_curve_values() {
        assert!((RolloffCurve::Inverse.attenuation(3.0, 1.0, 0.5) - 0.5 / 3.0).abs() < 1.0e-6);
        assert!((RolloffCurve::Linear.attenuation(3.0, 1.0, 0.25) - 0.25).abs() < 1.0e-6);
        assert_eq!(RolloffCurve::Linear.attenuation(10.0, 1.0, 0.5), 0.0);
        // Log curve reaches zero at x = 20 / k.
        assert!(RolloffCurve::Logarithmic.attenuation(40.0, 1.0, 0.5).abs() < 1.0e-5);
    }

    #[test]
    fn test_reentry_eases_back() {
        let mut attenuation = DistanceAttenuation::default();
        let far = attenuation.update(RolloffCurve::Linear, 5.0, 1.0, 0.1);
        assert!((far - 0.5).abs() < 1.0e-6);

        let mut gains = Vec::new();
        for _ in 0..12 {
            gains.push(attenuation.update(RolloffCurve::Linear, 0.5, 1.0, 0.1));
        }
        assert!((gains[0] - 0.55).abs() < 1.0e-5);
        assert!(gains.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(gains[11], 1.0);
    }

    #[test]
    fn test_numeric_and_string_forms() {
        for curve in CURVES {
            assert_eq!(RolloffCurve::from_u32(curve.as_u32()), curve);
            assert_eq!(RolloffCurve::from_str(curve.as_ref()), Ok(curve));
        }
        assert_eq!(RolloffCurve::from_u32(77), RolloffCurve::Inverse);
    }

    #[test]
    fn test_step_toward() {
        assert_eq!(step_toward(0.0, 1.0, 0.3), 0.3);
        assert_eq!(step_toward(0.9, 1.0, 0.3), 1.0);
        assert_eq!(step_toward(0.1, 0.0, 0.3), 0.0);
    }
}
