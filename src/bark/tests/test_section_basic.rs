use std::f64::consts::FRAC_PI_4;

use crate::bark::{
    BarkSectionBuilder, BarkSettings, BranchRegistration, SampledBranchSkin, SectionError, SequenceJitter,
    SkinSegment,
};
use crate::geom::{BezierError, Keyframe, Point3, ScaleCurve, Tolerance, Vec3};

fn wide_settings() -> BarkSettings {
    BarkSettings {
        angle_tolerance_degrees: 200.0,
        ..BarkSettings::seeded(11)
    }
}

fn upright(position: f64, girth: f64) -> SkinSegment {
    SkinSegment::new(Point3::ORIGIN, Vec3::Z, Vec3::Y, girth, position)
}

fn plain_builder(settings: BarkSettings) -> BarkSectionBuilder<SequenceJitter> {
    BarkSectionBuilder::with_jitter(settings, SequenceJitter::midpoint()).expect("valid settings")
}

#[test]
fn zero_jitter_ring_matches_node_count() {
    let mut builder = BarkSectionBuilder::new(wide_settings()).unwrap();
    let skin = |_: f64| 1.0;
    assert!(builder.register_branch(1, &skin, &BranchRegistration::default()).unwrap());

    assert_eq!(builder.segment_count_at(1, 0.0), 8);
    let (ring, diag) = builder.sample_cross_section(1, &upright(0.0, 1.0), 8, 1.0, 1.0);

    assert!(diag.is_clean(), "{diag}");
    assert_eq!(ring.len(), 8);
    assert_eq!(ring.relative_positions.len(), 8);
    let tol = Tolerance::new(1e-9);
    for (i, point) in ring.points.iter().enumerate() {
        let (sin, cos) = (i as f64 * FRAC_PI_4).sin_cos();
        assert!(tol.approx_eq_point3(*point, Point3::new(cos, sin, 0.0)), "point {i}: {point:?}");
    }
}

#[test]
fn count_matches_sample_along_branch() {
    let mut builder = BarkSectionBuilder::new(BarkSettings::seeded(3)).unwrap();
    let skin = SampledBranchSkin::tapered(5.0, 0.6, 0.15);
    let registration = BranchRegistration {
        jitter_points: 5,
        valid_range: 5.0,
        min_base_scale: 0.8,
        max_base_scale: 1.6,
        min_angle_jitter: 0.05,
        max_angle_jitter: 0.3,
        twirl: 0.3,
        ..Default::default()
    };
    builder.register_branch(9, &skin, &registration).unwrap();

    for segment in skin.straight_segments(Point3::new(1.0, 0.0, 2.0), Vec3::new(0.2, 1.0, 0.1), Vec3::Z, 5.0, 10) {
        let count = builder.segment_count_at(9, segment.position);
        let (ring, diag) = builder.sample_cross_section(9, &segment, 6, 1.0, 1.0);
        assert!(diag.succeeded());
        assert_eq!(ring.len(), count, "position {}", segment.position);
        assert!(ring.relative_positions.windows(2).all(|w| w[1] > w[0]));
    }
}

#[test]
fn same_seed_gives_same_rings() {
    let registration = BranchRegistration {
        min_base_scale: 0.7,
        max_base_scale: 1.3,
        max_angle_jitter: 0.4,
        ..Default::default()
    };
    let skin = SampledBranchSkin::tapered(1.0, 1.0, 0.4);

    let rings: Vec<_> = (0..2)
        .map(|_| {
            let mut builder = BarkSectionBuilder::new(BarkSettings::seeded(42)).unwrap();
            builder.register_branch(1, &skin, &registration).unwrap();
            builder.sample_cross_section(1, &upright(0.3, 0.8), 8, 1.0, 1.0).0
        })
        .collect();
    assert_eq!(rings[0], rings[1]);

    let mut other = BarkSectionBuilder::new(BarkSettings::seeded(43)).unwrap();
    other.register_branch(1, &skin, &registration).unwrap();
    let (ring, _) = other.sample_cross_section(1, &upright(0.3, 0.8), 8, 1.0, 1.0);
    assert_ne!(ring, rings[0]);
}

#[test]
fn too_few_sides_yields_empty_ring() {
    let mut builder = plain_builder(wide_settings());
    builder.register_branch(1, &|_: f64| 1.0, &BranchRegistration::default()).unwrap();

    let (ring, diag) = builder.sample_cross_section(1, &upright(0.0, 1.0), 2, 1.0, 1.0);
    assert!(ring.is_empty());
    assert_eq!(diag.error, Some(SectionError::NotEnoughPolygonSides { sides: 2 }));
}

#[test]
fn unregistered_branch_is_reported() {
    let mut builder = plain_builder(wide_settings());
    builder.register_branch(1, &|_: f64| 1.0, &BranchRegistration::default()).unwrap();

    assert_eq!(builder.segment_count_at(2, 0.0), 0);
    assert_eq!(
        builder.try_segment_count_at(2, 0.0),
        Err(SectionError::UnregisteredBranch { branch_id: 2 })
    );
    let (ring, diag) = builder.sample_cross_section(2, &upright(0.0, 1.0), 8, 1.0, 1.0);
    assert!(ring.is_empty());
    assert_eq!(diag.error, Some(SectionError::UnregisteredBranch { branch_id: 2 }));
}

#[test]
fn first_registration_wins() {
    let mut builder = plain_builder(wide_settings());
    assert!(builder.register_branch(4, &|_: f64| 1.0, &BranchRegistration::default()).unwrap());

    let draws = builder.jitter_mut().draws();
    let second = BranchRegistration {
        jitter_points: 7,
        max_angle_jitter: 1.0,
        ..Default::default()
    };
    assert!(!builder.register_branch(4, &|_: f64| 5.0, &second).unwrap());

    assert_eq!(builder.jitter_mut().draws(), draws);
    assert_eq!(builder.registry().info(4).map(|info| info.base_girth), Some(1.0));
    assert_eq!(builder.segment_count_at(4, 0.0), 8);
}

#[test]
fn failed_registration_leaves_no_entry() {
    let mut builder = plain_builder(wide_settings());
    let registration = BranchRegistration {
        jitter_points: 0,
        ..Default::default()
    };
    assert_eq!(
        builder.register_branch(1, &|_: f64| 1.0, &registration),
        Err(SectionError::Bezier(BezierError::ZeroPointCount))
    );
    assert_eq!(
        builder.register_branch(2, &|_: f64| f64::NAN, &BranchRegistration::default()),
        Err(SectionError::NonFiniteInput)
    );
    assert!(builder.registry().is_empty());
}

#[test]
fn non_finite_scale_curve_is_rejected() {
    let mut builder = plain_builder(wide_settings());
    let registration = BranchRegistration {
        scale_curve: ScaleCurve::new(vec![Keyframe::flat(f64::NAN, 0.0)]),
        ..Default::default()
    };
    assert_eq!(
        builder.register_branch(1, &|_: f64| 1.0, &registration),
        Err(SectionError::NonFiniteInput)
    );
    assert!(builder.registry().is_empty());

    let (ring, diag) = builder.sample_cross_section(1, &upright(0.5, 1.0), 8, 1.0, 1.0);
    assert!(ring.is_empty());
    assert_eq!(diag.error, Some(SectionError::UnregisteredBranch { branch_id: 1 }));
    assert_eq!(builder.segment_count_at(1, 0.5), 0);

    let registration = BranchRegistration {
        twirl: f64::INFINITY,
        ..Default::default()
    };
    assert_eq!(
        builder.register_branch(2, &|_: f64| 1.0, &registration),
        Err(SectionError::NonFiniteInput)
    );
}

#[test]
fn merged_rings_keep_count_consistent() {
    let settings = BarkSettings {
        angle_tolerance_degrees: 1.0,
        merge_by_distance: true,
        ..BarkSettings::seeded(5)
    };
    let mut builder = BarkSectionBuilder::new(settings).unwrap();
    let skin = SampledBranchSkin::tapered(4.0, 1.0, 0.4);
    let registration = BranchRegistration {
        jitter_points: 8,
        valid_range: 4.0,
        min_base_scale: 0.7,
        max_base_scale: 1.5,
        min_angle_jitter: 0.3,
        max_angle_jitter: 0.6,
        twirl: 0.2,
        ..Default::default()
    };
    builder.register_branch(1, &skin, &registration).unwrap();

    for segment in skin.straight_segments(Point3::ORIGIN, Vec3::Y, Vec3::Z, 4.0, 8) {
        let count = builder.segment_count_at(1, segment.position);
        let (ring, diag) = builder.sample_cross_section(1, &segment, 6, 1.0, 1.0);
        assert!(diag.succeeded(), "{diag}");
        assert!(diag.merged_point_count > 0, "position {}", segment.position);
        assert_eq!(ring.len(), count, "position {}", segment.position);

        // The merge threshold applies to the profile, so rescaling the ring
        // does not change its point count.
        let (scaled, _) = builder.sample_cross_section(1, &segment, 6, 2.0, 3.0);
        assert_eq!(scaled.len(), count);
    }
}

#[test]
fn ring_follows_skin_girth_and_scales() {
    let mut builder = plain_builder(wide_settings());
    let skin = SampledBranchSkin::tapered(1.0, 1.0, 0.5);
    builder.register_branch(1, &skin, &BranchRegistration::default()).unwrap();

    let tol = Tolerance::new(1e-9);
    let (ring, diag) = builder.sample_cross_section(1, &upright(0.5, 0.75), 8, 1.0, 1.0);
    assert!((diag.blend - 0.5).abs() < 1e-12);
    for point in &ring.points {
        assert!(tol.approx_eq_f64(point.to_vec3().length(), 0.75));
    }

    let (ring, _) = builder.sample_cross_section(1, &upright(0.5, 0.75), 8, 1.0, 2.0);
    for point in &ring.points {
        assert!(tol.approx_eq_f64(point.to_vec3().length(), 1.5));
    }

    let segment = SkinSegment::new(Point3::new(1.0, 2.0, 3.0), Vec3::Z, Vec3::Y, 0.75, 0.5);
    let (ring, _) = builder.sample_cross_section(1, &segment, 8, 2.0, 1.0);
    let center = Point3::new(2.0, 4.0, 6.0);
    for point in &ring.points {
        assert!(tol.approx_eq_f64(point.distance_to(center), 1.5));
    }
}

#[test]
fn ring_is_perpendicular_to_direction() {
    let mut builder = BarkSectionBuilder::new(BarkSettings::seeded(8)).unwrap();
    let registration = BranchRegistration {
        max_angle_jitter: 0.2,
        min_base_scale: 0.9,
        max_base_scale: 1.2,
        ..Default::default()
    };
    builder.register_branch(1, &|_: f64| 0.5, &registration).unwrap();

    let direction = Vec3::new(1.0, 1.0, 0.5).normalized().unwrap();
    let center = Point3::new(-3.0, 0.5, 2.0);
    let segment = SkinSegment::new(center, direction, Vec3::Z, 0.5, 0.2);
    let (ring, diag) = builder.sample_cross_section(1, &segment, 8, 1.0, 1.0);

    assert!(diag.succeeded());
    for point in &ring.points {
        assert!(point.sub_point(center).dot(direction).abs() < 1e-9);
    }
}

#[test]
fn ring_local_up_follows_normal() {
    let mut builder = plain_builder(wide_settings());
    builder.register_branch(1, &|_: f64| 1.0, &BranchRegistration::default()).unwrap();

    let segment = SkinSegment::new(Point3::ORIGIN, Vec3::X, Vec3::Z, 1.0, 0.0);
    let (ring, _) = builder.sample_cross_section(1, &segment, 8, 1.0, 1.0);

    // local +Y follows the normal, local +X is normal x direction
    let tol = Tolerance::new(1e-9);
    assert!(tol.approx_eq_point3(ring.points[0], Point3::new(0.0, 1.0, 0.0)));
    assert!(tol.approx_eq_point3(ring.points[2], Point3::new(0.0, 0.0, 1.0)));
}

#[test]
fn twirl_fades_toward_the_top() {
    let mut builder = plain_builder(wide_settings());
    let registration = BranchRegistration {
        twirl: 0.25,
        valid_range: 2.0,
        ..Default::default()
    };
    builder.register_branch(1, &|_: f64| 1.0, &registration).unwrap();

    let tol = Tolerance::new(1e-9);
    let (base, diag) = builder.sample_cross_section(1, &upright(0.0, 1.0), 8, 1.0, 1.0);
    assert!(tol.approx_eq_f64(diag.twirl_angle, std::f64::consts::FRAC_PI_2));
    assert!(tol.approx_eq_point3(base.points[0], Point3::new(0.0, 1.0, 0.0)));

    let (middle, diag) = builder.sample_cross_section(1, &upright(1.0, 1.0), 8, 1.0, 1.0);
    assert!(tol.approx_eq_f64(diag.twirl_angle, FRAC_PI_4));
    assert!(tol.approx_eq_point3(middle.points[0], Point3::new(FRAC_PI_4.cos(), FRAC_PI_4.sin(), 0.0)));

    let (top, diag) = builder.sample_cross_section(1, &upright(2.0, 1.0), 8, 1.0, 1.0);
    assert_eq!(diag.twirl_angle, 0.0);
    assert!(tol.approx_eq_point3(top.points[0], Point3::new(1.0, 0.0, 0.0)));
}

#[test]
fn scale_curve_remaps_the_blend() {
    let mut builder = plain_builder(wide_settings());
    let registration = BranchRegistration {
        valid_range: 4.0,
        scale_curve: ScaleCurve::constant(1.0),
        ..Default::default()
    };
    builder.register_branch(1, &SampledBranchSkin::tapered(4.0, 2.0, 1.0), &registration).unwrap();

    let (_, diag) = builder.sample_cross_section(1, &upright(0.0, 2.0), 8, 1.0, 1.0);
    assert_eq!(diag.blend, 1.0);
}

#[test]
fn degenerate_frames_produce_warnings() {
    let mut builder = plain_builder(wide_settings());
    builder.register_branch(1, &|_: f64| 1.0, &BranchRegistration::default()).unwrap();

    let parallel = SkinSegment::new(Point3::ORIGIN, Vec3::Z, Vec3::Z, 1.0, 0.0);
    let (ring, diag) = builder.sample_cross_section(1, &parallel, 8, 1.0, 1.0);
    assert_eq!(ring.len(), 8);
    assert!(diag.has_warnings());
    for point in &ring.points {
        assert!(point.z.abs() < 1e-9);
    }

    let stalled = SkinSegment::new(Point3::ORIGIN, Vec3::ZERO, Vec3::Y, 1.0, 0.0);
    let (ring, diag) = builder.sample_cross_section(1, &stalled, 8, 1.0, 1.0);
    assert_eq!(ring.len(), 8);
    assert!(diag.succeeded());
    assert!(diag.has_warnings());
}

#[test]
fn non_finite_segment_is_rejected() {
    let mut builder = plain_builder(wide_settings());
    builder.register_branch(1, &|_: f64| 1.0, &BranchRegistration::default()).unwrap();

    let (ring, diag) = builder.sample_cross_section(1, &upright(0.0, f64::NAN), 8, 1.0, 1.0);
    assert!(ring.is_empty());
    assert_eq!(diag.error, Some(SectionError::NonFiniteInput));
}

#[test]
fn sample_branch_aggregates_diagnostics() {
    let mut builder = plain_builder(wide_settings());
    let skin = SampledBranchSkin::tapered(3.0, 1.0, 0.5);
    builder
        .register_branch(1, &skin, &BranchRegistration { valid_range: 3.0, ..Default::default() })
        .unwrap();

    let segments = skin.straight_segments(Point3::ORIGIN, Vec3::Z, Vec3::Y, 3.0, 4);
    let (rings, diag) = builder.sample_branch(1, &segments, 8, 1.0, 1.0);
    assert_eq!(rings.len(), 5);
    assert_eq!(diag.point_count, 40);
    assert!(diag.succeeded());
}

#[test]
fn clear_forgets_branches() {
    let mut builder = plain_builder(wide_settings());
    builder.register_branch(1, &|_: f64| 1.0, &BranchRegistration::default()).unwrap();
    builder.clear();
    assert_eq!(builder.segment_count_at(1, 0.0), 0);
}
