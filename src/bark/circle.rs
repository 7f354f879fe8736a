//! Jittered bezier circles used as bark cross-section profiles.

use std::f64::consts::{PI, TAU};

use crate::geom::{BezierCurve, BezierError, BezierNode, Point3, Vec3};

use super::jitter::JitterSource;

/// Builds a closed bezier curve approximating a circle of `radius` in the XY plane.
///
/// The curve gets `2 * point_count` distinct nodes so that every other node
/// can later receive [`apply_base_displacement`]. One jitter magnitude `j` is
/// drawn from `[min_angle_jitter, max_angle_jitter]` (radians) per call, and
/// each node's angle is offset by a fresh draw from `[-j/2, j/2]`.
///
/// Handles use the circle-approximation length `r * 4/3 * tan(π / 2n)`,
/// perpendicular to the radius, with Auto style. The first node is repeated
/// at the end to close the loop.
///
/// # Errors
/// - [`BezierError::ZeroPointCount`] when `point_count == 0`.
/// - [`BezierError::TooManyPoints`] when the node count overflows.
/// - [`BezierError::NonFiniteInput`] for non-finite radius or jitter bounds.
pub fn build_circle<J: JitterSource + ?Sized>(
    point_count: usize,
    radius: f64,
    min_angle_jitter: f64,
    max_angle_jitter: f64,
    jitter: &mut J,
) -> Result<BezierCurve, BezierError> {
    if point_count == 0 {
        return Err(BezierError::ZeroPointCount);
    }
    let n = point_count
        .checked_mul(2)
        .filter(|n| *n < usize::MAX)
        .ok_or(BezierError::TooManyPoints { point_count })?;
    if !radius.is_finite() || !min_angle_jitter.is_finite() || !max_angle_jitter.is_finite() {
        return Err(BezierError::NonFiniteInput);
    }

    let step = TAU / n as f64;
    let handle_length = radius * (4.0 / 3.0) * (PI / (2.0 * n as f64)).tan();
    let magnitude = jitter.range(min_angle_jitter, max_angle_jitter);
    let half = 0.5 * magnitude;

    let mut curve = BezierCurve::new(true);
    for i in 0..n {
        let angle = i as f64 * step + jitter.range(-half, half);
        let (sin, cos) = angle.sin_cos();
        let position = Point3::new(radius * cos, radius * sin, 0.0);
        let handle1 = Vec3::new(-sin, cos, 0.0).mul_scalar(handle_length);
        curve.push_node(BezierNode::auto(position, handle1));
    }

    if let Some(first) = curve.node(0).cloned() {
        curve.push_node(first);
    }
    curve.process();
    Ok(curve)
}

/// Scales every second node (by creation order, starting with the second)
/// by a fresh factor from `[min_scale, max_scale]`, pushing it outward or
/// inward to form root-flare bumps. Position and both handles are scaled.
pub fn apply_base_displacement<J: JitterSource + ?Sized>(
    curve: &mut BezierCurve,
    min_scale: f64,
    max_scale: f64,
    jitter: &mut J,
) {
    let mut apply = false;
    let count = curve.len();
    let closed = curve.closed();
    for (index, node) in curve.nodes_mut().enumerate() {
        if closed && index + 1 == count && count > 1 {
            break;
        }
        if apply {
            node.scale(jitter.range(min_scale, max_scale));
        }
        apply = !apply;
    }
    curve.sync_closure();
    curve.process();
}
