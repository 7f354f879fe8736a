//! Random sources for bark jitter and displacement.
//!
//! All randomness used while building cross sections goes through
//! [`JitterSource`]. Any `rand::Rng` is a jitter source; [`SequenceJitter`]
//! replays fixed fractions so tests can assert exact geometry.

use rand::Rng;

pub trait JitterSource {
    /// A value in `[min, max]`. Bounds may be given in either order;
    /// equal bounds return that bound without consuming randomness.
    fn range(&mut self, min: f64, max: f64) -> f64;
}

impl<R: Rng + ?Sized> JitterSource for R {
    fn range(&mut self, min: f64, max: f64) -> f64 {
        let (lo, hi) = ordered(min, max);
        let span = hi - lo;
        if !span.is_finite() || span <= 0.0 {
            return lo;
        }
        self.random_range(lo..=hi)
    }
}

/// Replays a cycle of unit fractions: `range(min, max)` yields
/// `min + (max - min) * fraction` for the next fraction in the cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceJitter {
    fractions: Vec<f64>,
    cursor: usize,
}

impl SequenceJitter {
    /// Fractions are clamped to `[0, 1]`. An empty list behaves like `[0.5]`.
    #[must_use]
    pub fn new(fractions: impl IntoIterator<Item = f64>) -> Self {
        let mut fractions: Vec<f64> = fractions
            .into_iter()
            .map(|f| if f.is_finite() { f.clamp(0.0, 1.0) } else { 0.5 })
            .collect();
        if fractions.is_empty() {
            fractions.push(0.5);
        }
        Self {
            fractions,
            cursor: 0,
        }
    }

    /// Always returns the middle of the requested range.
    #[must_use]
    pub fn midpoint() -> Self {
        Self::new([0.5])
    }

    /// Number of fractions handed out so far.
    #[must_use]
    pub const fn draws(&self) -> usize {
        self.cursor
    }
}

impl JitterSource for SequenceJitter {
    fn range(&mut self, min: f64, max: f64) -> f64 {
        let (lo, hi) = ordered(min, max);
        let span = hi - lo;
        if !span.is_finite() || span <= 0.0 {
            return lo;
        }
        let fraction = self.fractions[self.cursor % self.fractions.len()];
        self.cursor += 1;
        lo + span * fraction
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn sequence_cycles_through_fractions() {
        let mut jitter = SequenceJitter::new([0.0, 1.0, 0.25]);
        assert_eq!(jitter.range(2.0, 4.0), 2.0);
        assert_eq!(jitter.range(2.0, 4.0), 4.0);
        assert_eq!(jitter.range(2.0, 4.0), 2.5);
        assert_eq!(jitter.range(2.0, 4.0), 2.0);
        assert_eq!(jitter.draws(), 4);
    }

    #[test]
    fn equal_bounds_do_not_consume() {
        let mut jitter = SequenceJitter::new([0.3]);
        assert_eq!(jitter.range(1.5, 1.5), 1.5);
        assert_eq!(jitter.draws(), 0);
    }

    #[test]
    fn rng_respects_reversed_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..64 {
            let value = rng.range(3.0, -1.0);
            assert!((-1.0..=3.0).contains(&value));
        }
    }
}
