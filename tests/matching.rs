mod common;

use common::init_logger;
use common::synthetic_image::{blob_field_u8, shifted_u8, warped_u8};
use feature_stab::corners::{CornerDetector, DetectorParams};
use feature_stab::image::ImageU8;
use feature_stab::homography::apply_homography;
use feature_stab::matching::{AffineSampling, MatcherOptions, PatchMatcher, PatchWindow, Prewarp};
use nalgebra::Matrix3;
use std::collections::HashSet;

const W: usize = 240;
const H: usize = 180;

fn detector() -> CornerDetector {
    CornerDetector::with_params(
        W,
        H,
        &DetectorParams {
            target_count: 600,
            blocks_x: 4,
            blocks_y: 3,
            abs_threshold: 1e5,
            rel_threshold: 0.0,
            subpixel: true,
        },
    )
}

#[test]
fn mutual_matches_recover_a_shift() {
    init_logger();
    let base = blob_field_u8(W, H, 90, 11);
    let moved = shifted_u8(&base, W, H, 6, -4);
    let (img_a, img_b) = (ImageU8::new(W, H, &base), ImageU8::new(W, H, &moved));

    let mut det = detector();
    let corners_a = det.detect(&img_a, None);
    let corners_b = det.detect(&img_b, None);

    let mut matcher = PatchMatcher::new();
    matcher.init(W, H, 0.1, corners_a.len().max(corners_b.len()), &MatcherOptions::default());
    let matches = matcher.match_corners(&img_a, &img_b, &corners_a, &corners_b, &Prewarp::None);
    assert!(matches.len() >= 20, "only {} matches", matches.len());

    let mut seen_a = HashSet::new();
    let mut seen_b = HashSet::new();
    for m in &matches {
        assert!(seen_a.insert(m.a), "reference corner {} matched twice", m.a);
        assert!(seen_b.insert(m.b), "inspection corner {} matched twice", m.b);
        assert!(m.score.abs() <= 1.0 + 1e-9, "score {} out of range", m.score);
    }

    let consistent = matches
        .iter()
        .filter(|m| {
            let (a, b) = (corners_a[m.a], corners_b[m.b]);
            (b.x - a.x - 6.0).abs() < 0.5 && (b.y - a.y + 4.0).abs() < 0.5
        })
        .count();
    assert!(
        consistent * 10 >= matches.len() * 7,
        "{consistent} of {} matches follow the shift",
        matches.len()
    );
}

#[test]
fn prewarp_compensates_motion_beyond_the_search_radius() {
    init_logger();
    let base = blob_field_u8(W, H, 90, 23);
    let moved = shifted_u8(&base, W, H, 30, 0);
    let (img_a, img_b) = (ImageU8::new(W, H, &base), ImageU8::new(W, H, &moved));

    let mut det = detector();
    let corners_a = det.detect(&img_a, None);
    let corners_b = det.detect(&img_b, None);

    let mut matcher = PatchMatcher::new();
    let options = MatcherOptions {
        window: PatchWindow::Small,
        ..MatcherOptions::default()
    };
    // 0.05·240 = 12 px of admissible disparity, far below the 30 px shift.
    matcher.init(W, H, 0.05, corners_a.len().max(corners_b.len()), &options);

    let follows = |matches: &[feature_stab::Match]| {
        matches
            .iter()
            .filter(|m| (corners_b[m.b].x - corners_a[m.a].x - 30.0).abs() < 0.5)
            .count()
    };
    let plain = matcher.match_corners(&img_a, &img_b, &corners_a, &corners_b, &Prewarp::None);
    assert_eq!(follows(&plain), 0);

    let mut back = Matrix3::identity();
    back[(0, 2)] = -30.0;
    let warped = matcher.match_corners(
        &img_a,
        &img_b,
        &corners_a,
        &corners_b,
        &Prewarp::Homography(back),
    );
    assert!(follows(&warped) >= 10, "{} prewarped matches follow the shift", follows(&warped));
}

#[test]
fn affine_prewarp_matches_rotated_and_scaled_frames() {
    init_logger();
    let base = blob_field_u8(W, H, 90, 47);
    let (cx, cy) = (W as f64 / 2.0, H as f64 / 2.0);
    let (angle, scale) = (12f64.to_radians(), 1.1);
    let (c, s) = (scale * angle.cos(), scale * angle.sin());
    // Reference to inspection: rotation and scale about the image centre.
    let forward = Matrix3::new(c, -s, cx - c * cx + s * cy, s, c, cy - s * cx - c * cy, 0.0, 0.0, 1.0);
    let backward = forward.try_inverse().expect("similarity is invertible");
    let moved = warped_u8(&base, W, H, |x, y| apply_homography(&backward, x, y));
    let (img_a, img_b) = (ImageU8::new(W, H, &base), ImageU8::new(W, H, &moved));

    let mut det = detector();
    let corners_a = det.detect(&img_a, None);
    let corners_b = det.detect(&img_b, None);

    let mut matcher = PatchMatcher::new();
    matcher.init(W, H, 0.1, corners_a.len().max(corners_b.len()), &MatcherOptions::default());

    for sampling in [AffineSampling::Nearest, AffineSampling::Bilinear] {
        let prewarp = Prewarp::Affine { h: backward, sampling };
        let matches = matcher.match_corners(&img_a, &img_b, &corners_a, &corners_b, &prewarp);
        let consistent = matches
            .iter()
            .filter(|m| {
                let (a, b) = (corners_a[m.a], corners_b[m.b]);
                let (x, y) = apply_homography(&forward, a.x, a.y);
                (x - b.x).powi(2) + (y - b.y).powi(2) < 1.5 * 1.5
            })
            .count();
        assert!(
            consistent >= 10 && consistent * 10 >= matches.len() * 6,
            "{sampling:?}: {consistent} of {} matches follow the rotation",
            matches.len()
        );
        for m in &matches {
            assert!(m.score.abs() <= 1.0 + 1e-9);
        }
    }
}

#[test]
fn degenerate_prewarp_drops_corners_instead_of_overflowing() {
    init_logger();
    let base = blob_field_u8(W, H, 90, 11);
    let img = ImageU8::new(W, H, &base);
    let mut det = detector();
    let corners = det.detect(&img, None);
    assert!(!corners.is_empty());

    let mut matcher = PatchMatcher::new();
    matcher.init(W, H, 0.2, corners.len(), &MatcherOptions::default());

    let near_singular = Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1e-30);
    let not_finite = Matrix3::from_element(f64::NAN);
    for h in [near_singular, not_finite] {
        let matches = matcher.match_corners(&img, &img, &corners, &corners, &Prewarp::Homography(h));
        assert!(matches.is_empty(), "{} matches through a degenerate prewarp", matches.len());
    }
    // The matcher stays usable afterwards.
    let plain = matcher.match_corners(&img, &img, &corners, &corners, &Prewarp::None);
    assert!(!plain.is_empty());
}
