mod common;

use common::{lidar_at_pixel, pinhole_calibration};
use lidar_camera_ttc::cluster::{
    cluster_kpt_matches_for_boxes, cluster_kpt_matches_with_roi, cluster_lidar_with_roi,
};
use lidar_camera_ttc::{BoundingBox, FusionError, Keypoint, KeypointMatch, LidarPoint, Roi};

fn two_overlapping_boxes() -> Vec<BoundingBox> {
    vec![
        BoundingBox::new(0, Roi::new(100.0, 100.0, 200.0, 200.0)),
        BoundingBox::new(1, Roi::new(250.0, 100.0, 200.0, 200.0)),
    ]
}

#[test]
fn test_lidar_points_go_to_exactly_one_box() {
    let calib = pinhole_calibration();
    let mut boxes = two_overlapping_boxes();
    let only_a = lidar_at_pixel(150.5, 150.5, 10.0);
    let both = lidar_at_pixel(275.5, 150.5, 10.0);
    let only_b = lidar_at_pixel(400.5, 150.5, 10.0);
    let none = lidar_at_pixel(700.5, 700.5, 10.0);
    cluster_lidar_with_roi(&mut boxes, &[only_a, both, only_b, none], 0.0, &calib).unwrap();

    assert_eq!(boxes[0].lidar_points, vec![only_a]);
    assert_eq!(boxes[1].lidar_points, vec![only_b]);
}

#[test]
fn test_lidar_shrink_excludes_edges() {
    let calib = pinhole_calibration();
    let edge = lidar_at_pixel(120.5, 120.5, 10.0);
    let center = lidar_at_pixel(200.5, 200.5, 10.0);

    let mut boxes = vec![BoundingBox::new(0, Roi::new(100.0, 100.0, 200.0, 200.0))];
    cluster_lidar_with_roi(&mut boxes, &[edge, center], 0.0, &calib).unwrap();
    assert_eq!(boxes[0].lidar_points.len(), 2);

    // shrunk to [150, 250) x [150, 250)
    let mut boxes = vec![BoundingBox::new(0, Roi::new(100.0, 100.0, 200.0, 200.0))];
    cluster_lidar_with_roi(&mut boxes, &[edge, center], 0.5, &calib).unwrap();
    assert_eq!(boxes[0].lidar_points, vec![center]);
}

#[test]
fn test_shrink_factor_monotonic() {
    let calib = pinhole_calibration();
    let mut points = Vec::new();
    for i in 0..30 {
        for j in 0..30 {
            points.push(lidar_at_pixel(90.5 + 8.0 * i as f64, 90.5 + 8.0 * j as f64, 12.0));
        }
    }
    let mut last = usize::MAX;
    for shrink in [0.0, 0.05, 0.1, 0.25, 0.5, 0.75, 0.95] {
        let mut boxes = vec![BoundingBox::new(3, Roi::new(100.0, 100.0, 200.0, 200.0))];
        cluster_lidar_with_roi(&mut boxes, &points, shrink, &calib).unwrap();
        let count = boxes[0].lidar_points.len();
        assert!(count <= last, "shrink {} kept {} > {}", shrink, count, last);
        last = count;
    }
    assert!(last < 900);
}

#[test]
fn test_full_image_box_keeps_every_finite_point() {
    let calib = pinhole_calibration();
    let points: Vec<LidarPoint> = (0..50)
        .map(|i| LidarPoint::new(2.0 + i as f64 * 0.5, -3.0 + i as f64 * 0.12, -1.5 + i as f64 * 0.05, 0.5))
        .collect();
    let mut boxes = vec![BoundingBox::new(0, Roi::new(-1e7, -1e7, 2e7, 2e7))];
    cluster_lidar_with_roi(&mut boxes, &points, 0.0, &calib).unwrap();
    assert_eq!(boxes[0].lidar_points, points);
}

#[test]
fn test_degenerate_projection_is_dropped() {
    let calib = pinhole_calibration();
    let mut boxes = vec![BoundingBox::new(0, Roi::new(-1e7, -1e7, 2e7, 2e7))];
    cluster_lidar_with_roi(&mut boxes, &[LidarPoint::new(0.0, 0.0, 0.0, 1.0)], 0.0, &calib)
        .unwrap();
    assert!(boxes[0].lidar_points.is_empty());
}

#[test]
fn test_invalid_shrink_factor() {
    let calib = pinhole_calibration();
    let mut boxes = two_overlapping_boxes();
    let result = cluster_lidar_with_roi(&mut boxes, &[], 1.0, &calib);
    assert!(matches!(result, Err(FusionError::InvalidConfig(_))));
}

fn planted_outlier_keypoints() -> Vec<Keypoint> {
    let mut kpts: Vec<Keypoint> = (0..20).map(|i| Keypoint::new(100.0 + i as f64, 150.0)).collect();
    kpts.push(Keypoint::new(300.0, 150.0));
    kpts.push(Keypoint::new(310.0, 150.0));
    kpts
}

#[test]
fn test_keypoint_outliers_removed() {
    let kpts = planted_outlier_keypoints();
    let matches: Vec<KeypointMatch> = (0..kpts.len()).map(|i| KeypointMatch::new(i, i)).collect();
    let mut bbox = BoundingBox::new(0, Roi::new(0.0, 0.0, 400.0, 400.0));

    cluster_kpt_matches_with_roi(&mut bbox, &kpts, &kpts, &matches, 2.0).unwrap();
    assert_eq!(bbox.kpt_matches, matches[..20].to_vec());

    // filtering again keeps everything
    let filtered = bbox.kpt_matches.clone();
    cluster_kpt_matches_with_roi(&mut bbox, &kpts, &kpts, &filtered, 2.0).unwrap();
    assert_eq!(bbox.kpt_matches, filtered);
}

/// Bell-shaped x distribution around 200 px: binomial weights 1, 4, 6, 4, 1 on a 4 px grid.
fn bell_shaped_keypoints() -> Vec<Keypoint> {
    let mut kpts = Vec::new();
    for (k, weight) in (-2..=2).zip([1, 4, 6, 4, 1]) {
        for j in 0..3 * weight {
            kpts.push(Keypoint::new(200.0 + 4.0 * k as f64, 100.0 + 5.0 * j as f64));
        }
    }
    kpts
}

#[test]
fn test_keypoint_outliers_removed_from_bell_shaped_cluster() {
    let mut kpts = bell_shaped_keypoints();
    let num_inliers = kpts.len();
    kpts.push(Keypoint::new(140.0, 150.0));
    kpts.push(Keypoint::new(260.0, 150.0));
    let matches: Vec<KeypointMatch> = (0..kpts.len()).map(|i| KeypointMatch::new(i, i)).collect();
    let mut bbox = BoundingBox::new(0, Roi::new(0.0, 0.0, 400.0, 400.0));

    cluster_kpt_matches_with_roi(&mut bbox, &kpts, &kpts, &matches, 2.0).unwrap();
    assert_eq!(bbox.kpt_matches, matches[..num_inliers].to_vec());

    // the tails of the bell stay within two standard deviations
    let filtered = bbox.kpt_matches.clone();
    cluster_kpt_matches_with_roi(&mut bbox, &kpts, &kpts, &filtered, 2.0).unwrap();
    assert_eq!(bbox.kpt_matches, filtered);
}

#[test]
fn test_keypoint_clustering_uses_previous_keypoints() {
    let kpts_prev = vec![
        Keypoint::new(10.0, 10.0),
        Keypoint::new(12.0, 10.0),
        Keypoint::new(500.0, 10.0),
    ];
    // current keypoints all far outside the box
    let kpts_curr = vec![Keypoint::new(900.0, 900.0); 3];
    let matches = vec![
        KeypointMatch::new(0, 0),
        KeypointMatch::new(1, 1),
        KeypointMatch::new(2, 2),
    ];
    let mut bbox = BoundingBox::new(0, Roi::new(0.0, 0.0, 100.0, 100.0));
    cluster_kpt_matches_with_roi(&mut bbox, &kpts_prev, &kpts_curr, &matches, 2.0).unwrap();
    assert_eq!(bbox.kpt_matches, matches[..2].to_vec());
}

#[test]
fn test_keypoint_clustering_needs_two_matches() {
    let kpts = vec![Keypoint::new(10.0, 10.0), Keypoint::new(500.0, 10.0)];
    let matches = vec![KeypointMatch::new(0, 0), KeypointMatch::new(1, 1)];
    let mut bbox = BoundingBox::new(0, Roi::new(0.0, 0.0, 100.0, 100.0));
    bbox.kpt_matches = matches.clone();

    let result = cluster_kpt_matches_with_roi(&mut bbox, &kpts, &kpts, &matches, 2.0);
    match result {
        Err(FusionError::InsufficientData { required, found, .. }) => {
            assert_eq!(required, 2);
            assert_eq!(found, 1);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(bbox.kpt_matches.is_empty());
}

#[test]
fn test_keypoint_clustering_bad_index() {
    let kpts = vec![Keypoint::new(10.0, 10.0)];
    let matches = vec![KeypointMatch::new(0, 5)];
    let mut bbox = BoundingBox::new(0, Roi::new(0.0, 0.0, 100.0, 100.0));
    let result = cluster_kpt_matches_with_roi(&mut bbox, &kpts, &kpts, &matches, 2.0);
    assert!(matches!(
        result,
        Err(FusionError::InvalidMatchIndex { index: 5, len: 1 })
    ));
}

#[test]
fn test_cluster_keypoints_for_all_boxes() {
    let kpts = planted_outlier_keypoints();
    let matches: Vec<KeypointMatch> = (0..kpts.len()).map(|i| KeypointMatch::new(i, i)).collect();
    let mut boxes = vec![
        BoundingBox::new(0, Roi::new(0.0, 0.0, 400.0, 400.0)),
        BoundingBox::new(1, Roi::new(1000.0, 1000.0, 50.0, 50.0)),
    ];
    let results = cluster_kpt_matches_for_boxes(&mut boxes, &kpts, &kpts, &matches, 2.0);
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(results[1].as_ref().is_err_and(|e| e.is_insufficient_data()));
    assert_eq!(boxes[0].kpt_matches.len(), 20);
    assert!(boxes[1].kpt_matches.is_empty());
}
