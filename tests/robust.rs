mod common;

use common::init_logger;
use common::synthetic_image::XorShift;
use feature_stab::homography::{apply_homography, approx_calibration};
use feature_stab::robust::{estimate, EstimatorOptions, HomographyType};
use nalgebra::Matrix3;

#[test]
fn translation_from_four_exact_points() {
    init_logger();
    let a = [[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [10.0, 10.0]];
    let b: Vec<[f64; 2]> = a.iter().map(|p| [p[0] + 3.0, p[1] - 2.0]).collect();
    let options = EstimatorOptions {
        homography_type: HomographyType::Translation,
        ..EstimatorOptions::default()
    };
    let k = Matrix3::identity();
    let est = estimate(&a, &b, &k, &k, &options);

    let expected = Matrix3::new(1.0, 0.0, 3.0, 0.0, 1.0, -2.0, 0.0, 0.0, 1.0);
    assert!((est.h - expected).norm() < 1e-9, "estimated {}", est.h);
    assert_eq!(est.stats.nr_points, 4);
    assert_eq!(est.stats.inlier_fraction, 1.0);
}

struct Scene {
    a: Vec<[f64; 2]>,
    b: Vec<[f64; 2]>,
    truth: Matrix3<f64>,
}

/// 100 correspondences under `truth`, 30 of them replaced by gross outliers.
fn scene(truth: Matrix3<f64>, seed: u64) -> Scene {
    let mut rng = XorShift::new(seed);
    let mut a = Vec::new();
    let mut b = Vec::new();
    for i in 0..100 {
        let p = [rng.uniform(20.0, 620.0), rng.uniform(20.0, 460.0)];
        let (x, y) = apply_homography(&truth, p[0], p[1]);
        let q = if i % 10 < 3 {
            let angle = rng.uniform(0.0, std::f64::consts::TAU);
            let dist = rng.uniform(20.0, 200.0);
            [x + dist * angle.cos(), y + dist * angle.sin()]
        } else {
            [x, y]
        };
        a.push(p);
        b.push(q);
    }
    Scene { a, b, truth }
}

fn assert_maps_like(h: &Matrix3<f64>, truth: &Matrix3<f64>, tol: f64) {
    for &(x, y) in &[(0.0, 0.0), (640.0, 0.0), (0.0, 480.0), (640.0, 480.0), (320.0, 240.0)] {
        let (ex, ey) = apply_homography(truth, x, y);
        let (gx, gy) = apply_homography(h, x, y);
        let err = ((ex - gx).powi(2) + (ey - gy).powi(2)).sqrt();
        assert!(err < tol, "({x}, {y}) maps {err:.4} px away from the truth");
    }
}

fn options(family: HomographyType) -> (Matrix3<f64>, EstimatorOptions) {
    let k = approx_calibration(640, 480);
    let scale = 2.0 / (k[(0, 0)] + k[(1, 1)]);
    let options = EstimatorOptions {
        homography_type: family,
        nr_samples: 500,
        scale,
        ..EstimatorOptions::default()
    };
    (k, options)
}

#[test]
fn projective_recovery_with_outliers() {
    init_logger();
    let truth = Matrix3::new(1.03, 0.02, 12.0, -0.015, 0.98, -7.0, 2e-5, -1e-5, 1.0);
    let s = scene(truth, 99);
    let (k, opts) = options(HomographyType::Projective);
    let est = estimate(&s.a, &s.b, &k, &k, &opts);
    assert_maps_like(&est.h, &s.truth, 0.05);
    assert!(est.stats.inlier_fraction >= 0.65, "{:?}", est.stats);
    assert!(est.nr_hypotheses >= 500);
}

#[test]
fn similarity_and_affine_recovery_with_outliers() {
    init_logger();
    let (c, s) = (0.02f64.cos() * 1.05, 0.02f64.sin() * 1.05);
    let truth = Matrix3::new(c, -s, 5.0, s, c, 9.0, 0.0, 0.0, 1.0);
    let scene = scene(truth, 5);
    for family in [HomographyType::Similarity, HomographyType::Affine] {
        let (k, opts) = options(family);
        let est = estimate(&scene.a, &scene.b, &k, &k, &opts);
        assert_maps_like(&est.h, &scene.truth, 0.05);
        assert!(est.stats.inlier_fraction >= 0.65, "{family:?}: {:?}", est.stats);
    }
}

#[test]
fn outlier_removal_reports_the_inliers() {
    init_logger();
    let truth = Matrix3::new(1.0, 0.0, -4.0, 0.0, 1.0, 6.0, 0.0, 0.0, 1.0);
    let s = scene(truth, 17);
    let (k, mut opts) = options(HomographyType::Translation);
    opts.outlier_removal = true;
    let est = estimate(&s.a, &s.b, &k, &k, &opts);
    let kept = est.inliers_kept.expect("outlier removal lists kept points");
    assert_eq!(kept.len(), 70);
    assert!(kept.iter().all(|&i| i % 10 >= 3));
}

#[test]
fn same_seed_gives_the_same_estimate() {
    init_logger();
    let truth = Matrix3::new(0.99, 0.01, 3.0, -0.01, 1.01, -2.0, 1e-5, 0.0, 1.0);
    let s = scene(truth, 42);
    let (k, opts) = options(HomographyType::Projective);
    let first = estimate(&s.a, &s.b, &k, &k, &opts);
    let second = estimate(&s.a, &s.b, &k, &k, &opts);
    assert_eq!(first, second);
}
