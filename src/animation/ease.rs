use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::foundation::error::{ChoreoError, ChoreoResult};

/// Easing presets used to map normalized progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    /// Linear interpolation.
    Linear,
    /// Quadratic ease-in.
    InQuad,
    /// Quadratic ease-out.
    OutQuad,
    /// Quadratic ease-in/out.
    InOutQuad,
    /// Cubic ease-in.
    InCubic,
    /// Cubic ease-out.
    OutCubic,
    /// Cubic ease-in/out.
    InOutCubic,
    /// Quartic ease-in.
    InQuart,
    /// Quartic ease-out.
    OutQuart,
    /// Quartic ease-in/out.
    InOutQuart,
    /// Sinusoidal ease-in.
    InSine,
    /// Sinusoidal ease-out.
    OutSine,
    /// Sinusoidal ease-in/out.
    InOutSine,
    /// Exponential ease-in.
    InExpo,
    /// Exponential ease-out.
    OutExpo,
    /// Exponential ease-in/out.
    InOutExpo,
    /// Circular ease-in.
    InCirc,
    /// Circular ease-out.
    OutCirc,
    /// Circular ease-in/out.
    InOutCirc,
    /// Anticipating ease-in (dips below 0).
    InBack,
    /// Overshooting ease-out (rises above 1).
    OutBack,
    /// Elastic ease-out.
    OutElastic,
    /// Bouncing ease-out.
    OutBounce,
}

impl Ease {
    /// Every preset, in declaration order.
    pub const ALL: [Ease; 23] = [
        Self::Linear,
        Self::InQuad,
        Self::OutQuad,
        Self::InOutQuad,
        Self::InCubic,
        Self::OutCubic,
        Self::InOutCubic,
        Self::InQuart,
        Self::OutQuart,
        Self::InOutQuart,
        Self::InSine,
        Self::OutSine,
        Self::InOutSine,
        Self::InExpo,
        Self::OutExpo,
        Self::InOutExpo,
        Self::InCirc,
        Self::OutCirc,
        Self::InOutCirc,
        Self::InBack,
        Self::OutBack,
        Self::OutElastic,
        Self::OutBounce,
    ];

    /// Apply this easing function to normalized progress `t` in `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        use std::f64::consts::PI;

        const BACK: f64 = 1.70158;

        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::InQuart => t.powi(4),
            Self::OutQuart => 1.0 - (1.0 - t).powi(4),
            Self::InOutQuart => {
                if t < 0.5 {
                    8.0 * t.powi(4)
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(4) / 2.0)
                }
            }
            Self::InSine => 1.0 - ((t * PI) / 2.0).cos(),
            Self::OutSine => ((t * PI) / 2.0).sin(),
            Self::InOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Self::InExpo => {
                if t == 0.0 {
                    0.0
                } else {
                    2f64.powf(10.0 * t - 10.0)
                }
            }
            Self::OutExpo => {
                if t == 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * t)
                }
            }
            Self::InOutExpo => {
                if t == 0.0 || t == 1.0 {
                    t
                } else if t < 0.5 {
                    2f64.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
            Self::InCirc => 1.0 - (1.0 - t * t).sqrt(),
            Self::OutCirc => (1.0 - (t - 1.0).powi(2)).sqrt(),
            Self::InOutCirc => {
                if t < 0.5 {
                    (1.0 - (1.0 - (2.0 * t).powi(2)).sqrt()) / 2.0
                } else {
                    ((1.0 - (-2.0 * t + 2.0).powi(2)).sqrt() + 1.0) / 2.0
                }
            }
            Self::InBack => (BACK + 1.0) * t.powi(3) - BACK * t * t,
            Self::OutBack => 1.0 + (BACK + 1.0) * (t - 1.0).powi(3) + BACK * (t - 1.0).powi(2),
            Self::OutElastic => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    let c4 = (2.0 * PI) / 3.0;
                    2f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
                }
            }
            Self::OutBounce => bounce_out(t),
        }
    }

    /// Registry key of this preset, e.g. `"inOutCubic"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::InQuad => "inQuad",
            Self::OutQuad => "outQuad",
            Self::InOutQuad => "inOutQuad",
            Self::InCubic => "inCubic",
            Self::OutCubic => "outCubic",
            Self::InOutCubic => "inOutCubic",
            Self::InQuart => "inQuart",
            Self::OutQuart => "outQuart",
            Self::InOutQuart => "inOutQuart",
            Self::InSine => "inSine",
            Self::OutSine => "outSine",
            Self::InOutSine => "inOutSine",
            Self::InExpo => "inExpo",
            Self::OutExpo => "outExpo",
            Self::InOutExpo => "inOutExpo",
            Self::InCirc => "inCirc",
            Self::OutCirc => "outCirc",
            Self::InOutCirc => "inOutCirc",
            Self::InBack => "inBack",
            Self::OutBack => "outBack",
            Self::OutElastic => "outElastic",
            Self::OutBounce => "outBounce",
        }
    }
}

fn bounce_out(t: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

impl FromStr for Ease {
    type Err = ChoreoError;

    /// Case-insensitive lookup that ignores `-` and `_`, so `"inOutCubic"`,
    /// `"in-out-cubic"` and `"IN_OUT_CUBIC"` all resolve to [`Ease::InOutCubic`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        Self::ALL
            .into_iter()
            .find(|ease| ease.name().to_lowercase() == key)
            .ok_or_else(|| ChoreoError::validation(format!("unknown easing preset {s:?}")))
    }
}

/// Progress warping function: a preset or a caller-supplied curve.
///
/// `Easer::default()` is the identity, which is what an omitted easer means everywhere in
/// the API.
#[derive(Clone, Default)]
pub enum Easer {
    /// Pass progress through unchanged.
    #[default]
    Identity,
    /// One of the built-in presets.
    Preset(Ease),
    /// Arbitrary `(progress) -> progress` function.
    Custom(Rc<dyn Fn(f64) -> f64>),
}

impl Easer {
    /// Resolve a preset by registry key.
    pub fn named(name: &str) -> ChoreoResult<Self> {
        name.parse::<Ease>().map(Self::Preset)
    }

    /// Wrap a custom curve.
    pub fn custom(f: impl Fn(f64) -> f64 + 'static) -> Self {
        Self::Custom(Rc::new(f))
    }

    /// Warp `t`. Presets clamp their input; custom curves see it untouched.
    pub fn apply(&self, t: f64) -> f64 {
        match self {
            Self::Identity => t,
            Self::Preset(ease) => ease.apply(t),
            Self::Custom(f) => f(t),
        }
    }
}

impl fmt::Debug for Easer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("Identity"),
            Self::Preset(ease) => f.debug_tuple("Preset").field(ease).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<Ease> for Easer {
    fn from(ease: Ease) -> Self {
        Self::Preset(ease)
    }
}

impl From<Option<Ease>> for Easer {
    fn from(ease: Option<Ease>) -> Self {
        ease.map(Self::Preset).unwrap_or_default()
    }
}

impl From<fn(f64) -> f64> for Easer {
    fn from(f: fn(f64) -> f64) -> Self {
        Self::Custom(Rc::new(f))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
