mod bezier;
mod core;
mod curve;
mod scale_curve;
mod tessellation;

pub use bezier::{BezierCurve, BezierError, BezierNode, HandleStyle};
pub use self::core::{Point3, Tolerance, Transform, Vec3};
pub use curve::{CubicBezier3, Curve3, curve_arc_length};
pub use scale_curve::{Keyframe, ScaleCurve, inverse_lerp};
pub use tessellation::{
    CurvePoint, CurveTessellationOptions, DEFAULT_ANGLE_TOLERANCE_DEGREES, DEFAULT_MERGE_DISTANCE,
    TessellationDiagnostics, assign_relative_positions, merge_points_by_distance,
    tessellate_bezier_curve,
};

#[cfg(test)]
mod tests;
