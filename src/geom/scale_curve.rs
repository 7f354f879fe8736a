//! Keyframed scalar curves used to remap a position along a branch.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyframe {
    pub time: f64,
    pub value: f64,
    #[serde(default)]
    pub in_tangent: f64,
    #[serde(default)]
    pub out_tangent: f64,
}

impl Keyframe {
    #[must_use]
    pub const fn new(time: f64, value: f64, in_tangent: f64, out_tangent: f64) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }

    /// Key with zero tangents.
    #[must_use]
    pub const fn flat(time: f64, value: f64) -> Self {
        Self::new(time, value, 0.0, 0.0)
    }
}

/// Piecewise cubic Hermite curve over sorted keyframes.
///
/// Outside the key range the curve holds the first/last value. An empty
/// curve evaluates to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct ScaleCurve {
    keys: Vec<Keyframe>,
}

impl ScaleCurve {
    #[must_use]
    pub fn new(keys: Vec<Keyframe>) -> Self {
        let mut curve = Self { keys: Vec::with_capacity(keys.len()) };
        for key in keys {
            curve.add_key(key);
        }
        curve
    }

    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new(vec![Keyframe::flat(0.0, value)])
    }

    /// Straight line through `(t0, v0)` and `(t1, v1)`.
    #[must_use]
    pub fn linear(t0: f64, v0: f64, t1: f64, v1: f64) -> Self {
        let dt = t1 - t0;
        let slope = if dt != 0.0 { (v1 - v0) / dt } else { 0.0 };
        Self::new(vec![
            Keyframe::new(t0, v0, slope, slope),
            Keyframe::new(t1, v1, slope, slope),
        ])
    }

    /// S-shaped curve with flat ends.
    #[must_use]
    pub fn ease_in_out(t0: f64, v0: f64, t1: f64, v1: f64) -> Self {
        Self::new(vec![Keyframe::flat(t0, v0), Keyframe::flat(t1, v1)])
    }

    #[must_use]
    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Inserts a key keeping times sorted; a key at an existing time replaces it.
    pub fn add_key(&mut self, key: Keyframe) {
        match self
            .keys
            .binary_search_by(|probe| probe.time.total_cmp(&key.time))
        {
            Ok(index) => self.keys[index] = key,
            Err(index) => self.keys.insert(index, key),
        }
    }

    /// True when every key time, value and tangent is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.keys.iter().all(|key| {
            key.time.is_finite() && key.value.is_finite() && key.in_tangent.is_finite() && key.out_tangent.is_finite()
        })
    }

    #[must_use]
    pub fn evaluate(&self, time: f64) -> f64 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if time.is_nan() || time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        // Non-finite key times defeat the range checks above.
        let right = self.keys.partition_point(|key| key.time <= time);
        if right == 0 {
            return first.value;
        }
        if right >= self.keys.len() {
            return last.value;
        }
        let k0 = self.keys[right - 1];
        let k1 = self.keys[right];
        hermite(k0, k1, time)
    }
}

impl Default for ScaleCurve {
    /// Identity remap on `[0, 1]`.
    fn default() -> Self {
        Self::linear(0.0, 0.0, 1.0, 1.0)
    }
}

impl From<Vec<Keyframe>> for ScaleCurve {
    fn from(keys: Vec<Keyframe>) -> Self {
        Self::new(keys)
    }
}

impl From<ScaleCurve> for Vec<Keyframe> {
    fn from(curve: ScaleCurve) -> Self {
        curve.keys
    }
}

fn hermite(k0: Keyframe, k1: Keyframe, time: f64) -> f64 {
    let dt = k1.time - k0.time;
    if dt <= 0.0 {
        return k1.value;
    }
    let s = (time - k0.time) / dt;
    let s2 = s * s;
    let s3 = s2 * s;

    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    h00 * k0.value + h10 * dt * k0.out_tangent + h01 * k1.value + h11 * dt * k1.in_tangent
}

/// Where `value` falls between `a` and `b`, clamped to `[0, 1]`.
/// Returns 0 when `a == b`.
#[must_use]
pub fn inverse_lerp(a: f64, b: f64, value: f64) -> f64 {
    if a == b {
        return 0.0;
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}
