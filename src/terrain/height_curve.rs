//! Keyframe curve remapping raw noise samples to display height.
//!
//! [`HeightCurve`] is sampled over the normalized `[0, 1]` sample range and
//! clamps outside the first and last key, so flat sea floors and capped peaks
//! can be authored with a handful of keys.

use serde::{Deserialize, Serialize};

/// Piecewise-linear curve over `(t, value)` keys sorted by `t`.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightCurve {
    keys: Vec<(f32, f32)>,
}

impl HeightCurve {
    /// Create a new curve from unsorted keys. Keys are sorted by `t`.
    pub fn new(mut keys: Vec<(f32, f32)>) -> Self {
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    /// Identity curve: `evaluate(t) == t` on `[0, 1]`.
    pub fn linear() -> Self {
        Self::new(vec![(0.0, 0.0), (1.0, 1.0)])
    }

    /// Constant curve that always returns `value`.
    pub fn constant(value: f32) -> Self {
        Self { keys: vec![(0.0, value)] }
    }

    /// Sorted keys
    pub fn keys(&self) -> &[(f32, f32)] {
        &self.keys
    }

    /// Sample the curve at `t`, clamping to the end keys.
    pub fn evaluate(&self, t: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return t;
        };

        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }

        // First key strictly after t; guaranteed to exist and not be index 0
        let upper = self.keys.partition_point(|k| k.0 <= t);
        let (t_a, v_a) = self.keys[upper - 1];
        let (t_b, v_b) = self.keys[upper];
        let span = t_b - t_a;
        if span < 1e-6 {
            return v_a;
        }
        v_a + (v_b - v_a) * ((t - t_a) / span)
    }
}

impl Default for HeightCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl Serialize for HeightCurve {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.keys.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for HeightCurve {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let keys = Vec::<(f32, f32)>::deserialize(deserializer)?;
        Ok(Self::new(keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_linear_is_identity() {
        let curve = HeightCurve::linear();
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            assert!(approx_eq(curve.evaluate(t), t));
        }
    }

    #[test]
    fn test_clamps_outside_keys() {
        let curve = HeightCurve::new(vec![(0.2, 0.0), (0.8, 1.0)]);
        assert_eq!(curve.evaluate(-3.0), 0.0);
        assert_eq!(curve.evaluate(0.1), 0.0);
        assert_eq!(curve.evaluate(0.9), 1.0);
        assert_eq!(curve.evaluate(5.0), 1.0);
        assert!(approx_eq(curve.evaluate(0.5), 0.5));
    }

    #[test]
    fn test_flat_sea_floor() {
        // Everything below 0.3 maps to zero height
        let curve = HeightCurve::new(vec![(0.0, 0.0), (0.3, 0.0), (1.0, 1.0)]);
        assert_eq!(curve.evaluate(0.15), 0.0);
        assert!(approx_eq(curve.evaluate(0.65), 0.5));
    }

    #[test]
    fn test_unsorted_keys_are_sorted() {
        let curve = HeightCurve::new(vec![(1.0, 2.0), (0.0, 0.0), (0.5, 0.5)]);
        assert_eq!(curve.keys()[0].0, 0.0);
        assert!(approx_eq(curve.evaluate(0.75), 1.25));
    }

    #[test]
    fn test_constant_and_empty() {
        assert_eq!(HeightCurve::constant(0.4).evaluate(0.9), 0.4);

        let empty = HeightCurve::new(Vec::new());
        assert_eq!(empty.evaluate(0.7), 0.7);
    }

    #[test]
    fn test_serde_as_key_list() {
        let curve: HeightCurve = serde_json::from_str("[[1.0, 1.0], [0.0, 0.0]]").unwrap();
        assert_eq!(curve, HeightCurve::linear());
        assert_eq!(serde_json::to_string(&curve).unwrap(), "[[0.0,0.0],[1.0,1.0]]");
    }
}
