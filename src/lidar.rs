use crate::config::LidarCropConfig;
use crate::types::LidarPoint;

/// Keeps the lidar points inside the ego-lane volume described by `crop`.
pub fn crop_lidar_points(points: &[LidarPoint], crop: &LidarCropConfig) -> Vec<LidarPoint> {
    let cropped: Vec<LidarPoint> = points
        .iter()
        .filter(|p| {
            p.x >= crop.min_x
                && p.x <= crop.max_x
                && p.y.abs() <= crop.max_y
                && p.z >= crop.min_z
                && p.z <= crop.max_z
                && p.r >= crop.min_reflectivity
        })
        .copied()
        .collect();
    log::trace!("cropped lidar points {} -> {}", points.len(), cropped.len());
    cropped
}
