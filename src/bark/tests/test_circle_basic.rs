use std::f64::consts::{FRAC_PI_4, PI};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::bark::{SequenceJitter, apply_base_displacement, build_circle};
use crate::geom::{BezierError, Tolerance};

#[test]
fn zero_jitter_circle_has_even_nodes() {
    let mut rng = StdRng::seed_from_u64(1);
    let curve = build_circle(4, 1.0, 0.0, 0.0, &mut rng).expect("circle should build");

    assert!(curve.closed());
    assert_eq!(curve.len(), 9);

    let tol = Tolerance::default_geom();
    for (i, node) in curve.nodes().iter().take(8).enumerate() {
        let p = node.position();
        let angle = p.y.atan2(p.x).rem_euclid(2.0 * PI);
        assert!(tol.approx_eq_f64(p.to_vec3().length(), 1.0));
        assert!(tol.approx_eq_f64(angle, i as f64 * FRAC_PI_4), "node {i} at {angle}");
    }
    assert_eq!(curve.nodes()[0].position(), curve.nodes()[8].position());
}

#[test]
fn handles_use_circle_approximation_length() {
    let mut jitter = SequenceJitter::midpoint();
    let curve = build_circle(3, 2.0, 0.0, 0.0, &mut jitter).unwrap();

    let expected = 2.0 * (4.0 / 3.0) * (PI / 12.0).tan();
    let tol = Tolerance::default_geom();
    for node in curve.nodes() {
        assert!(tol.approx_eq_f64(node.handle1().length(), expected));
        assert!(tol.approx_eq_vec3(node.handle2(), node.handle1().neg()));
        assert!(node.handle1().dot(node.position().to_vec3()).abs() < 1e-9);
    }
}

#[test]
fn angular_jitter_offsets_each_node() {
    let mut jitter = SequenceJitter::new([1.0]);
    let curve = build_circle(2, 1.0, 0.4, 0.4, &mut jitter).unwrap();

    // equal bounds draw nothing; each of the 4 nodes draws once
    assert_eq!(jitter.draws(), 4);
    let tol = Tolerance::default_geom();
    for (i, node) in curve.nodes().iter().take(4).enumerate() {
        let p = node.position();
        let expected = (i as f64 * PI / 2.0 + 0.2).rem_euclid(2.0 * PI);
        assert!(tol.approx_eq_f64(p.y.atan2(p.x).rem_euclid(2.0 * PI), expected));
    }
}

#[test]
fn jitter_stays_within_half_magnitude() {
    let mut rng = StdRng::seed_from_u64(99);
    let curve = build_circle(6, 1.0, 0.0, 0.3, &mut rng).unwrap();
    let step = PI / 6.0;
    for (i, node) in curve.nodes().iter().take(12).enumerate() {
        let p = node.position();
        let angle = p.y.atan2(p.x);
        let nominal = i as f64 * step;
        let delta = (angle - nominal + PI).rem_euclid(2.0 * PI) - PI;
        assert!(delta.abs() <= 0.15 + 1e-12, "node {i} offset {delta}");
    }
}

#[test]
fn invalid_inputs_are_rejected() {
    let mut jitter = SequenceJitter::midpoint();
    assert_eq!(build_circle(0, 1.0, 0.0, 0.0, &mut jitter), Err(BezierError::ZeroPointCount));
    assert_eq!(
        build_circle(4, f64::INFINITY, 0.0, 0.0, &mut jitter),
        Err(BezierError::NonFiniteInput)
    );
    assert_eq!(
        build_circle(usize::MAX / 2 + 1, 1.0, 0.0, 0.0, &mut jitter),
        Err(BezierError::TooManyPoints {
            point_count: usize::MAX / 2 + 1
        })
    );
    assert_eq!(jitter.draws(), 0);
}

#[test]
fn base_displacement_scales_every_other_node() {
    let mut jitter = SequenceJitter::midpoint();
    let mut curve = build_circle(2, 1.0, 0.0, 0.0, &mut jitter).unwrap();
    apply_base_displacement(&mut curve, 1.5, 2.5, &mut jitter);

    let radii: Vec<f64> = curve
        .nodes()
        .iter()
        .map(|node| node.position().to_vec3().length())
        .collect();
    let tol = Tolerance::default_geom();
    let expected = [1.0, 2.0, 1.0, 2.0, 1.0];
    for (radius, expected) in radii.iter().zip(expected) {
        assert!(tol.approx_eq_f64(*radius, expected), "{radii:?}");
    }
    assert_eq!(jitter.draws(), 2);
    assert_eq!(curve.nodes()[0].position(), curve.nodes()[4].position());
}

#[test]
fn base_displacement_keeps_closure() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut curve = build_circle(5, 0.8, 0.0, 0.2, &mut rng).unwrap();
    apply_base_displacement(&mut curve, 0.7, 1.4, &mut rng);

    let first = &curve.nodes()[0];
    let last = &curve.nodes()[curve.len() - 1];
    assert_eq!(first.position(), last.position());
    assert_eq!(first.handle1(), last.handle1());
    assert_eq!(last.relative_position(), 1.0);
}
