//! Angle-tolerance tessellation for bezier curves.
//!
//! Every segment of a [`BezierCurve`] is subdivided until the direction of
//! travel turns by no more than `angle_tolerance` radians between two
//! consecutive output points. Straight segments therefore collapse to a
//! single step while tight bends receive more points.
//!
//! ```ignore
//! use bark_engine::geom::{BezierCurve, CurveTessellationOptions};
//!
//! let options = CurveTessellationOptions::from_degrees(10.0);
//! let (points, diagnostics) = curve.tessellate(options)?;
//! // points[0] is the curve start; the last point is the curve end.
//! ```
//!
//! Output points carry an arc-length fraction (`relative_position`) measured
//! along the tessellated polyline: 0 at the first point, 1 at the last.

use super::bezier::{BezierCurve, BezierError};
use super::core::{Point3, Vec3};
use super::curve::{CubicBezier3, Curve3};

/// Default distance below which neighbouring samples are merged.
pub const DEFAULT_MERGE_DISTANCE: f64 = 0.05;

/// Default turning-angle tolerance in degrees.
pub const DEFAULT_ANGLE_TOLERANCE_DEGREES: f64 = 10.0;

/// Options controlling angle-based curve tessellation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveTessellationOptions {
    /// Maximum turning angle between consecutive samples, in radians.
    /// Non-finite or non-positive values disable refinement (one step per segment).
    pub angle_tolerance: f64,
    /// Merge consecutive samples closer than `merge_distance`.
    pub merge_by_distance: bool,
    /// Distance threshold used when `merge_by_distance` is set.
    pub merge_distance: f64,
    /// Maximum number of bisections per segment.
    pub max_depth: usize,
}

impl Default for CurveTessellationOptions {
    fn default() -> Self {
        Self {
            angle_tolerance: DEFAULT_ANGLE_TOLERANCE_DEGREES.to_radians(),
            merge_by_distance: false,
            merge_distance: DEFAULT_MERGE_DISTANCE,
            max_depth: 12,
        }
    }
}

impl CurveTessellationOptions {
    /// Options with the given angle tolerance in degrees and default merging.
    #[must_use]
    pub fn from_degrees(degrees: f64) -> Self {
        Self {
            angle_tolerance: degrees.to_radians(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_merge_distance(self, distance: f64) -> Self {
        Self {
            merge_by_distance: true,
            merge_distance: distance,
            ..self
        }
    }
}

/// A tessellated sample on a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub position: Point3,
    /// Unit direction of travel, or zero when it could not be determined.
    pub tangent: Vec3,
    /// Arc-length fraction along the tessellated polyline.
    pub relative_position: f64,
    /// Index of the bezier segment the sample was taken from.
    pub segment_index: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TessellationDiagnostics {
    /// Samples produced before merging.
    pub raw_point_count: usize,
    /// Samples removed by merge-by-distance.
    pub merged_point_count: usize,
    /// Whether some segment hit `max_depth` before meeting the tolerance.
    pub depth_limited: bool,
}

/// Tessellates a bezier curve under an angle tolerance.
///
/// The first and last samples are the curve endpoints. For closed curves the
/// last sample therefore duplicates the first; callers building rings drop it.
///
/// # Errors
/// - [`BezierError::DegenerateCurve`] for curves with fewer than two nodes.
/// - [`BezierError::NonFiniteInput`] if any control point is non-finite.
pub fn tessellate_bezier_curve(
    curve: &BezierCurve,
    options: CurveTessellationOptions,
) -> Result<(Vec<CurvePoint>, TessellationDiagnostics), BezierError> {
    if curve.len() < 2 {
        return Err(BezierError::DegenerateCurve {
            node_count: curve.len(),
        });
    }
    if curve
        .nodes()
        .iter()
        .any(|n| !n.position().is_finite() || !n.handle1().is_finite() || !n.handle2().is_finite())
    {
        return Err(BezierError::NonFiniteInput);
    }

    let tolerance = options.angle_tolerance;
    let refine = tolerance.is_finite() && tolerance > 0.0;
    let max_depth = if refine { options.max_depth } else { 0 };

    let mut diagnostics = TessellationDiagnostics::default();
    let mut points = Vec::new();

    for (segment_index, segment) in curve.segments().enumerate() {
        let dir_start = segment.direction_at(0.0).unwrap_or(Vec3::ZERO);
        let dir_end = segment.direction_at(1.0).unwrap_or(Vec3::ZERO);

        if segment_index == 0 {
            points.push(CurvePoint {
                position: segment.p0,
                tangent: dir_start,
                relative_position: 0.0,
                segment_index,
            });
        }

        let span = SegmentSpan {
            segment: &segment,
            segment_index,
            tolerance,
        };
        span.refine(0.0, 1.0, dir_start, dir_end, max_depth, &mut points, &mut diagnostics);
    }

    diagnostics.raw_point_count = points.len();

    if options.merge_by_distance && options.merge_distance > 0.0 {
        let before = points.len();
        points = merge_points_by_distance(points, options.merge_distance);
        diagnostics.merged_point_count = before - points.len();
    }

    assign_relative_positions(&mut points);
    Ok((points, diagnostics))
}

struct SegmentSpan<'a> {
    segment: &'a CubicBezier3,
    segment_index: usize,
    tolerance: f64,
}

impl SegmentSpan<'_> {
    /// Emits samples for `(a, b]`, bisecting while the turn exceeds the tolerance.
    #[allow(clippy::too_many_arguments)]
    fn refine(
        &self,
        a: f64,
        b: f64,
        dir_a: Vec3,
        dir_b: Vec3,
        depth: usize,
        out: &mut Vec<CurvePoint>,
        diagnostics: &mut TessellationDiagnostics,
    ) {
        if depth > 0 {
            let m = 0.5 * (a + b);
            let dir_m = self.segment.direction_at(m).unwrap_or(dir_a);
            let turn = dir_a.angle_to(dir_m).unwrap_or(0.0) + dir_m.angle_to(dir_b).unwrap_or(0.0);
            if turn > self.tolerance {
                self.refine(a, m, dir_a, dir_m, depth - 1, out, diagnostics);
                self.refine(m, b, dir_m, dir_b, depth - 1, out, diagnostics);
                return;
            }
        } else if self.tolerance.is_finite() && self.tolerance > 0.0 {
            let turn = dir_a.angle_to(dir_b).unwrap_or(0.0);
            if turn > self.tolerance {
                diagnostics.depth_limited = true;
            }
        }

        out.push(CurvePoint {
            position: self.segment.point_at(b),
            tangent: dir_b,
            relative_position: 0.0,
            segment_index: self.segment_index,
        });
    }
}

/// Drops samples closer than `distance` to the previously kept sample.
///
/// The first and last samples are always kept, so a closed polyline stays
/// closed; an interior sample crowding the last one is removed instead.
#[must_use]
pub fn merge_points_by_distance(points: Vec<CurvePoint>, distance: f64) -> Vec<CurvePoint> {
    if points.len() <= 2 {
        return points;
    }

    let last_index = points.len() - 1;
    let last = points[last_index];
    let mut kept: Vec<CurvePoint> = Vec::with_capacity(points.len());

    for (index, point) in points.into_iter().enumerate() {
        if index == 0 || index == last_index {
            kept.push(point);
            continue;
        }
        let too_close = kept
            .last()
            .is_some_and(|prev| prev.position.distance_to(point.position) < distance);
        if !too_close {
            kept.push(point);
        }
    }

    while kept.len() > 2 {
        let crowding = kept[kept.len() - 2].position.distance_to(last.position) < distance;
        if !crowding {
            break;
        }
        kept.remove(kept.len() - 2);
    }

    kept
}

/// Fills `relative_position` with the cumulative chord-length fraction.
pub fn assign_relative_positions(points: &mut [CurvePoint]) {
    let mut cumulative = Vec::with_capacity(points.len());
    let mut total = 0.0;
    let mut prev: Option<Point3> = None;
    for point in points.iter() {
        if let Some(prev) = prev {
            total += point.position.distance_to(prev);
        }
        cumulative.push(total);
        prev = Some(point.position);
    }

    for (point, length) in points.iter_mut().zip(cumulative) {
        point.relative_position = if total > 0.0 && total.is_finite() {
            length / total
        } else {
            0.0
        };
    }
}
