//! Height remapping curves
//!
//! The mesh builder does not hard-code how normalized heights turn into
//! elevation: it takes any [`HeightCurve`]. Closures work directly, and
//! [`KeyframeCurve`] provides a serializable piecewise-linear curve for
//! configuration files (e.g. a flat plateau at the bottom for water).

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;
use crate::core::updatable::Validate;

/// Monotonic remap from normalized height to output height.
pub trait HeightCurve: Send + Sync {
    fn evaluate(&self, t: f32) -> f32;
}

impl<F> HeightCurve for F
where
    F: Fn(f32) -> f32 + Send + Sync,
{
    fn evaluate(&self, t: f32) -> f32 {
        self(t)
    }
}

/// A single control point
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
}

impl Keyframe {
    pub const fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

/// Piecewise-linear curve through keyframes, clamped outside the first and
/// last key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyframeCurve {
    pub keys: Vec<Keyframe>,
}

impl Default for KeyframeCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl KeyframeCurve {
    /// Identity on [0, 1]
    pub fn linear() -> Self {
        Self {
            keys: vec![Keyframe::new(0.0, 0.0), Keyframe::new(1.0, 1.0)],
        }
    }

    pub fn new(keys: Vec<Keyframe>) -> Self {
        Self { keys }
    }
}

impl HeightCurve for KeyframeCurve {
    fn evaluate(&self, t: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return t;
        };
        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // First key strictly after t; keys are sorted by time.
        let upper = self.keys.partition_point(|k| k.time <= t);
        let a = self.keys[upper - 1];
        let b = self.keys[upper];
        let span = b.time - a.time;
        if span <= 0.0 {
            return b.value;
        }
        a.value + (b.value - a.value) * ((t - a.time) / span)
    }
}

impl Validate for KeyframeCurve {
    fn validate(&self) -> Result<(), ConfigError> {
        let ordered = self.keys.windows(2).all(|pair| {
            pair[0].time < pair[1].time && pair[0].value <= pair[1].value
        });
        let finite = self.keys.iter().all(|k| k.time.is_finite() && k.value.is_finite());
        if ordered && finite {
            Ok(())
        } else {
            Err(ConfigError::NonMonotonicCurve)
        }
    }
}
