#![allow(dead_code)]

use lidar_camera_ttc::{BoundingBox, Calibration, DataFrame, Keypoint, KeypointMatch, LidarPoint, Roi};
use nalgebra as na;

pub const F: f64 = 1000.0;
pub const CX: f64 = 640.0;
pub const CY: f64 = 360.0;

/// Pinhole camera at the lidar origin looking along the lidar x axis.
pub fn pinhole_calibration() -> Calibration {
    let p_rect = na::Matrix3x4::new(F, 0.0, CX, 0.0, 0.0, F, CY, 0.0, 0.0, 0.0, 1.0, 0.0);
    let rt = na::Matrix4::new(
        0.0, -1.0, 0.0, 0.0, //
        0.0, 0.0, -1.0, 0.0, //
        1.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    );
    Calibration::new(p_rect, na::Matrix4::identity(), rt)
}

/// Lidar point at `depth` meters that projects to pixel (u, v) with [`pinhole_calibration`].
pub fn lidar_at_pixel(u: f64, v: f64, depth: f64) -> LidarPoint {
    LidarPoint::new(depth, -(u - CX) * depth / F, -(v - CY) * depth / F, 0.5)
}

pub fn project(y: f64, z: f64, depth: f64) -> (f64, f64) {
    (CX - F * y / depth, CY - F * z / depth)
}

const HALF_WIDTH: f64 = 0.9;
const BOTTOM_Z: f64 = -1.5;
const TOP_Z: f64 = 0.3;

/// A vehicle rear at `depth`, seen by [`pinhole_calibration`], with lidar returns and
/// 25 keypoints on its surface. Matches relate keypoint `i` of the previous frame to `i`.
pub fn vehicle_frame(depth: f64, time_ns: i64, with_matches: bool) -> DataFrame {
    let (u0, v0) = project(HALF_WIDTH, TOP_Z, depth);
    let (u1, v1) = project(-HALF_WIDTH, BOTTOM_Z, depth);
    let roi = Roi::new(u0 - 10.0, v0 - 10.0, u1 - u0 + 20.0, v1 - v0 + 20.0);

    let mut lidar_points = Vec::new();
    for c in 0..17 {
        let y = -0.8 + 0.1 * c as f64;
        lidar_points.push(LidarPoint::new(depth, y, -1.2, 0.5));
    }

    let mut keypoints = Vec::new();
    for y in [-0.8, -0.4, 0.0, 0.4, 0.8] {
        for z in [-1.4, -1.0, -0.6, -0.2, 0.2] {
            let (u, v) = project(y, z, depth);
            keypoints.push(Keypoint::new(u, v));
        }
    }
    let kpt_matches = if with_matches {
        (0..keypoints.len()).map(|i| KeypointMatch::new(i, i)).collect()
    } else {
        Vec::new()
    };

    DataFrame {
        time_ns,
        bounding_boxes: vec![BoundingBox::new(0, roi)],
        keypoints,
        lidar_points,
        kpt_matches,
    }
}
