use std::f64::consts::{PI, TAU};

use crate::geom::{
    BezierCurve, BezierError, BezierNode, CurvePoint, CurveTessellationOptions, HandleStyle, Point3,
    Tolerance, Vec3, merge_points_by_distance,
};

fn circle(n: usize, radius: f64) -> BezierCurve {
    let handle_length = radius * (4.0 / 3.0) * (PI / (2.0 * n as f64)).tan();
    let mut curve = BezierCurve::new(true);
    for i in 0..n {
        let (sin, cos) = (i as f64 * TAU / n as f64).sin_cos();
        curve.push_node(BezierNode::auto(
            Point3::new(radius * cos, radius * sin, 0.0),
            Vec3::new(-sin, cos, 0.0).mul_scalar(handle_length),
        ));
    }
    let first = curve.nodes()[0].clone();
    curve.push_node(first);
    curve.process();
    curve
}

fn sample(position: Point3) -> CurvePoint {
    CurvePoint {
        position,
        tangent: Vec3::X,
        relative_position: 0.0,
        segment_index: 0,
    }
}

#[test]
fn wide_tolerance_keeps_only_nodes() {
    let curve = circle(8, 1.0);
    let (points, diag) = curve
        .tessellate(CurveTessellationOptions::from_degrees(200.0))
        .expect("tessellation should succeed");

    assert_eq!(points.len(), 9);
    assert_eq!(diag.raw_point_count, 9);
    assert!(!diag.depth_limited);

    let tol = Tolerance::default_geom();
    for (point, node) in points.iter().zip(curve.nodes()) {
        assert!(tol.approx_eq_point3(point.position, node.position()));
    }
    assert!(tol.approx_eq_point3(points[0].position, points[8].position));
}

#[test]
fn tight_tolerance_bounds_the_turn() {
    let curve = circle(8, 1.0);
    let tolerance = 10f64.to_radians();
    let (points, diag) = curve
        .tessellate(CurveTessellationOptions::from_degrees(10.0))
        .expect("tessellation should succeed");

    assert!(points.len() > 9);
    assert!(!diag.depth_limited);
    for pair in points.windows(2) {
        let turn = pair[0].tangent.angle_to(pair[1].tangent).unwrap();
        assert!(turn <= tolerance + 1e-9, "turn {turn} exceeds tolerance");
    }
}

#[test]
fn smaller_tolerance_never_yields_fewer_points() {
    let curve = circle(6, 1.5);
    let mut previous = 0;
    for degrees in [90.0, 45.0, 20.0, 10.0, 5.0, 1.0] {
        let (points, _) = curve
            .tessellate(CurveTessellationOptions::from_degrees(degrees))
            .unwrap();
        assert!(points.len() >= previous, "{degrees} deg gave {} points", points.len());
        previous = points.len();
    }
}

#[test]
fn straight_segment_is_a_single_step() {
    let curve = BezierCurve::from_nodes(
        vec![
            BezierNode::new(Point3::ORIGIN, Vec3::ZERO, Vec3::ZERO, HandleStyle::None),
            BezierNode::new(Point3::new(4.0, 0.0, 0.0), Vec3::ZERO, Vec3::ZERO, HandleStyle::None),
        ],
        false,
    );
    let (points, _) = curve.tessellate(CurveTessellationOptions::default()).unwrap();

    assert_eq!(points.len(), 2);
    assert_eq!(points[0].relative_position, 0.0);
    assert_eq!(points[1].relative_position, 1.0);
    assert_eq!(points[1].tangent, Vec3::X);
}

#[test]
fn depth_limit_is_reported() {
    let curve = circle(4, 1.0);
    let options = CurveTessellationOptions {
        max_depth: 1,
        ..CurveTessellationOptions::from_degrees(1.0)
    };
    let (points, diag) = curve.tessellate(options).unwrap();

    assert!(diag.depth_limited);
    assert_eq!(points.len(), 4 * 2 + 1);
}

#[test]
fn relative_positions_increase_to_one() {
    let (points, _) = circle(8, 1.0)
        .tessellate(CurveTessellationOptions::default())
        .unwrap();

    assert_eq!(points[0].relative_position, 0.0);
    assert!((points[points.len() - 1].relative_position - 1.0).abs() < 1e-12);
    for pair in points.windows(2) {
        assert!(pair[1].relative_position > pair[0].relative_position);
    }
}

#[test]
fn merge_keeps_endpoints() {
    let points = vec![
        sample(Point3::new(0.0, 0.0, 0.0)),
        sample(Point3::new(0.01, 0.0, 0.0)),
        sample(Point3::new(1.0, 0.0, 0.0)),
        sample(Point3::new(1.98, 0.0, 0.0)),
        sample(Point3::new(2.0, 0.0, 0.0)),
    ];
    let merged = merge_points_by_distance(points, 0.05);

    let xs: Vec<f64> = merged.iter().map(|p| p.position.x).collect();
    assert_eq!(xs, vec![0.0, 1.0, 2.0]);
}

#[test]
fn merge_by_distance_is_counted() {
    let curve = circle(8, 0.01);
    let options = CurveTessellationOptions::from_degrees(10.0).with_merge_distance(0.005);
    let (points, diag) = curve.tessellate(options).unwrap();

    assert!(diag.merged_point_count > 0);
    assert_eq!(diag.raw_point_count - diag.merged_point_count, points.len());
    let tol = Tolerance::default_geom();
    assert!(tol.approx_eq_point3(points[0].position, points[points.len() - 1].position));
}

#[test]
fn degenerate_curves_are_rejected() {
    let mut curve = BezierCurve::new(true);
    curve.push_node(BezierNode::auto(Point3::ORIGIN, Vec3::X));
    assert_eq!(
        curve.tessellate(CurveTessellationOptions::default()),
        Err(BezierError::DegenerateCurve { node_count: 1 })
    );

    let mut curve = circle(4, 1.0);
    if let Some(node) = curve.node_mut(1) {
        node.set_position(Point3::new(f64::NAN, 0.0, 0.0));
    }
    assert_eq!(
        curve.tessellate(CurveTessellationOptions::default()),
        Err(BezierError::NonFiniteInput)
    );
}
