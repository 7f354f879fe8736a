use super::core::{Point3, Vec3};

/// Finite-difference step for the default derivative, relative to the domain span.
const DERIVATIVE_STEP: f64 = 1e-6;

pub trait Curve3 {
    fn point_at(&self, t: f64) -> Point3;

    #[must_use]
    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    #[must_use]
    fn is_closed(&self) -> bool {
        false
    }

    #[must_use]
    fn derivative_at(&self, t: f64) -> Vec3 {
        let (a, b) = self.domain();
        let span = b - a;
        if !span.is_finite() || span == 0.0 {
            return Vec3::ZERO;
        }

        let h = DERIVATIVE_STEP * span.abs();
        let t0 = (t - h).max(a);
        let t1 = (t + h).min(b);
        if t1 == t0 {
            return Vec3::ZERO;
        }

        let p0 = self.point_at(t0);
        let p1 = self.point_at(t1);
        p1.sub_point(p0).mul_scalar(1.0 / (t1 - t0))
    }

    /// Returns the unit tangent vector at parameter `t`.
    /// Returns `None` if the derivative is zero or degenerate.
    #[must_use]
    fn tangent_at(&self, t: f64) -> Option<Vec3> {
        self.derivative_at(t).normalized()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier3 {
    pub p0: Point3,
    pub p1: Point3,
    pub p2: Point3,
    pub p3: Point3,
}

impl CubicBezier3 {
    #[must_use]
    pub const fn new(p0: Point3, p1: Point3, p2: Point3, p3: Point3) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Direction of travel at `t`, falling back to the chord when the
    /// control polygon collapses onto an endpoint (zero-length handles).
    #[must_use]
    pub fn direction_at(&self, t: f64) -> Option<Vec3> {
        self.tangent_at(t)
            .or_else(|| self.p3.sub_point(self.p0).normalized())
    }
}

impl Curve3 for CubicBezier3 {
    fn point_at(&self, t: f64) -> Point3 {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        let u2 = u * u;
        let t2 = t * t;
        point_weighted_sum4(
            self.p0,
            u2 * u,
            self.p1,
            3.0 * u2 * t,
            self.p2,
            3.0 * u * t2,
            self.p3,
            t2 * t,
        )
    }

    fn derivative_at(&self, t: f64) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        let a = self.p1.sub_point(self.p0);
        let b = self.p2.sub_point(self.p1);
        let c = self.p3.sub_point(self.p2);
        a.mul_scalar(3.0 * u * u)
            .add(b.mul_scalar(6.0 * u * t))
            .add(c.mul_scalar(3.0 * t * t))
    }
}

/// Approximates the arc length of a curve by summing `samples` chords.
#[must_use]
pub fn curve_arc_length<C: Curve3 + ?Sized>(curve: &C, samples: usize) -> f64 {
    let samples = samples.max(1);
    let (t0, t1) = curve.domain();
    let span = t1 - t0;
    if !span.is_finite() || span == 0.0 {
        return 0.0;
    }

    let mut length = 0.0;
    let mut prev = curve.point_at(t0);
    for i in 1..=samples {
        let t = t0 + span * (i as f64 / samples as f64);
        let curr = curve.point_at(t);
        length += curr.sub_point(prev).length();
        prev = curr;
    }
    length
}

#[allow(clippy::too_many_arguments)]
fn point_weighted_sum4(
    p0: Point3,
    w0: f64,
    p1: Point3,
    w1: f64,
    p2: Point3,
    w2: f64,
    p3: Point3,
    w3: f64,
) -> Point3 {
    Point3::new(
        p0.x * w0 + p1.x * w1 + p2.x * w2 + p3.x * w3,
        p0.y * w0 + p1.y * w1 + p2.y * w2 + p3.y * w3,
        p0.z * w0 + p1.z * w1 + p2.z * w2 + p3.z * w3,
    )
}
