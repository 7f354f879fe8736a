//! Branch skeleton inputs supplied by the caller.

use crate::geom::{Point3, Vec3};

/// Provider of a branch's girth along its length.
pub trait BranchSkin {
    /// Girth (local radius) at `position` along the branch.
    fn girth_at(&self, position: f64) -> f64;
}

impl<F: Fn(f64) -> f64> BranchSkin for F {
    fn girth_at(&self, position: f64) -> f64 {
        self(position)
    }
}

/// One longitudinal sample of a branch skin: the frame a ring is placed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinSegment {
    pub center: Point3,
    /// Forward direction along the branch; the ring's plane is perpendicular to it.
    pub direction: Vec3,
    /// Up reference used to orient the ring around `direction`.
    pub normal: Vec3,
    pub girth: f64,
    /// Running position along the skin, in the same units as the registration range.
    pub position: f64,
}

impl SkinSegment {
    #[must_use]
    pub const fn new(center: Point3, direction: Vec3, normal: Vec3, girth: f64, position: f64) -> Self {
        Self {
            center,
            direction,
            normal,
            girth,
            position,
        }
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.center.is_finite()
            && self.direction.is_finite()
            && self.normal.is_finite()
            && self.girth.is_finite()
            && self.position.is_finite()
    }
}

/// Girth table sampled at increasing positions, linearly interpolated and
/// clamped at both ends.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampledBranchSkin {
    samples: Vec<(f64, f64)>,
}

impl SampledBranchSkin {
    /// Samples are sorted by position; non-finite samples are dropped.
    #[must_use]
    pub fn new(samples: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut samples: Vec<(f64, f64)> = samples
            .into_iter()
            .filter(|(p, g)| p.is_finite() && g.is_finite())
            .collect();
        samples.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { samples }
    }

    /// Linear taper from `base_girth` at 0 to `top_girth` at `length`.
    #[must_use]
    pub fn tapered(length: f64, base_girth: f64, top_girth: f64) -> Self {
        Self::new([(0.0, base_girth), (length, top_girth)])
    }

    #[must_use]
    pub fn samples(&self) -> &[(f64, f64)] {
        &self.samples
    }

    /// Ring frames along a straight branch from `origin` in `direction`,
    /// `count` segments spaced evenly over `length`.
    #[must_use]
    pub fn straight_segments(
        &self,
        origin: Point3,
        direction: Vec3,
        normal: Vec3,
        length: f64,
        count: usize,
    ) -> Vec<SkinSegment> {
        let Some(dir) = direction.normalized() else {
            return Vec::new();
        };
        let count = count.max(1);
        (0..=count)
            .map(|i| {
                let position = length * (i as f64 / count as f64);
                SkinSegment::new(
                    origin.add_vec(dir.mul_scalar(position)),
                    dir,
                    normal,
                    self.girth_at(position),
                    position,
                )
            })
            .collect()
    }
}

impl BranchSkin for SampledBranchSkin {
    fn girth_at(&self, position: f64) -> f64 {
        let (Some(first), Some(last)) = (self.samples.first(), self.samples.last()) else {
            return 0.0;
        };
        if position.is_nan() {
            return f64::NAN;
        }
        if position <= first.0 {
            return first.1;
        }
        if position >= last.0 {
            return last.1;
        }
        let right = self.samples.partition_point(|(p, _)| *p <= position);
        if right == 0 || right >= self.samples.len() {
            return if right == 0 { first.1 } else { last.1 };
        }
        let (p0, g0) = self.samples[right - 1];
        let (p1, g1) = self.samples[right];
        let span = p1 - p0;
        if span <= 0.0 {
            return g1;
        }
        g0 + (g1 - g0) * (position - p0) / span
    }
}
