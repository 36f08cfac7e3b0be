use serde::{Deserialize, Serialize};

/// One keyframe of a [`HeightCurve`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub t: f32,
    pub value: f32,
}

impl CurveKey {
    pub fn new(t: f32, value: f32) -> Self {
        CurveKey { t, value }
    }
}

/// Piecewise-linear response curve used to reshape normalized heights
/// before the height multiplier is applied (flatten water, steepen peaks).
///
/// Keys are kept sorted by `t`; evaluation clamps outside the key range.
/// The curve is immutable after construction so mesh workers can share one
/// instance across threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightCurve {
    keys: Vec<CurveKey>,
}

impl HeightCurve {
    /// Builds a curve from keyframes, sorting them by `t`. With fewer than
    /// two keys the curve degenerates to a constant (or the identity when
    /// empty).
    pub fn new(mut keys: Vec<CurveKey>) -> Self {
        keys.sort_by(|a, b| a.t.total_cmp(&b.t));
        HeightCurve { keys }
    }

    /// The identity curve: evaluate(t) == t on [0, 1].
    pub fn identity() -> Self {
        HeightCurve {
            keys: vec![CurveKey::new(0.0, 0.0), CurveKey::new(1.0, 1.0)],
        }
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Restores the sort order `new` guarantees. Deserialization fills the
    /// key list directly, so configuration loading calls this afterwards.
    pub fn sanitize(&mut self) {
        self.keys.sort_by(|a, b| a.t.total_cmp(&b.t));
    }

    pub fn evaluate(&self, t: f32) -> f32 {
        match self.keys.len() {
            0 => t,
            1 => self.keys[0].value,
            _ => {
                let first = self.keys[0];
                let last = self.keys[self.keys.len() - 1];
                if t <= first.t {
                    return first.value;
                }
                if t >= last.t {
                    return last.value;
                }
                // Find the segment containing t and lerp across it.
                let mut upper = 1;
                while self.keys[upper].t < t {
                    upper += 1;
                }
                let a = self.keys[upper - 1];
                let b = self.keys[upper];
                let span = b.t - a.t;
                if span <= f32::EPSILON {
                    return a.value;
                }
                let alpha = (t - a.t) / span;
                a.value + (b.value - a.value) * alpha
            }
        }
    }
}

impl Default for HeightCurve {
    fn default() -> Self {
        Self::identity()
    }
}
