use glam::DVec2;
use log::{debug, trace};
use rayon::prelude::*;

use crate::error::{FusionError, Result};
use crate::projection::Calibration;
use crate::stats::mean_std;
use crate::types::{BoundingBox, Keypoint, KeypointMatch, LidarPoint, Roi};

pub(crate) fn keypoint_at(keypoints: &[Keypoint], index: usize) -> Result<DVec2> {
    keypoints
        .get(index)
        .map(Keypoint::pt)
        .ok_or(FusionError::InvalidMatchIndex {
            index,
            len: keypoints.len(),
        })
}

/// Appends every lidar point to the box whose shrunken roi contains its projection.
///
/// Points enclosed by no box or by several boxes are dropped.
pub fn cluster_lidar_with_roi(
    bounding_boxes: &mut [BoundingBox],
    lidar_points: &[LidarPoint],
    shrink_factor: f64,
    calibration: &Calibration,
) -> Result<()> {
    if !(0.0..1.0).contains(&shrink_factor) {
        return Err(FusionError::InvalidConfig(format!(
            "shrink_factor must be in [0, 1), got {}",
            shrink_factor
        )));
    }
    let smaller_boxes: Vec<Roi> = bounding_boxes
        .iter()
        .map(|b| b.roi.shrink(shrink_factor))
        .collect();

    let mut dropped = 0usize;
    for point in lidar_points {
        let pt = calibration.project(point);
        let mut enclosing = smaller_boxes
            .iter()
            .enumerate()
            .filter(|(_, roi)| roi.contains(pt))
            .map(|(i, _)| i);
        match (enclosing.next(), enclosing.next()) {
            (Some(i), None) => bounding_boxes[i].lidar_points.push(*point),
            _ => dropped += 1,
        }
    }
    debug!(
        "clustered {} lidar points into {} boxes, dropped {}",
        lidar_points.len() - dropped,
        bounding_boxes.len(),
        dropped
    );
    Ok(())
}

/// Replaces `bounding_box.kpt_matches` with the matches whose previous keypoint lies
/// in the box and whose x coordinate is within `std_factor` standard deviations of the mean.
pub fn cluster_kpt_matches_with_roi(
    bounding_box: &mut BoundingBox,
    kpts_prev: &[Keypoint],
    kpts_curr: &[Keypoint],
    kpt_matches: &[KeypointMatch],
    std_factor: f64,
) -> Result<()> {
    let mut enclosed: Vec<(KeypointMatch, f64)> = Vec::new();
    for m in kpt_matches {
        let prev = keypoint_at(kpts_prev, m.prev_idx)?;
        keypoint_at(kpts_curr, m.curr_idx)?;
        if bounding_box.roi.contains(prev) {
            enclosed.push((*m, prev.x));
        }
    }

    let xs: Vec<f64> = enclosed.iter().map(|(_, x)| *x).collect();
    let Some((mean, std_dev)) = mean_std(&xs) else {
        bounding_box.kpt_matches.clear();
        return Err(FusionError::InsufficientData {
            stage: "keypoint clustering",
            required: 2,
            found: xs.len(),
        });
    };
    let lower = mean - std_factor * std_dev;
    let upper = mean + std_factor * std_dev;

    bounding_box.kpt_matches = enclosed
        .into_iter()
        .filter(|(_, x)| *x >= lower && *x <= upper)
        .map(|(m, _)| m)
        .collect();
    trace!(
        "box {}: {} enclosed matches, kept {} in [{:.2}, {:.2}]",
        bounding_box.id,
        xs.len(),
        bounding_box.kpt_matches.len(),
        lower,
        upper
    );
    Ok(())
}

/// Runs [`cluster_kpt_matches_with_roi`] for every box in parallel.
///
/// The returned results are in the same order as `bounding_boxes`.
pub fn cluster_kpt_matches_for_boxes(
    bounding_boxes: &mut [BoundingBox],
    kpts_prev: &[Keypoint],
    kpts_curr: &[Keypoint],
    kpt_matches: &[KeypointMatch],
    std_factor: f64,
) -> Vec<Result<()>> {
    bounding_boxes
        .par_iter_mut()
        .map(|b| cluster_kpt_matches_with_roi(b, kpts_prev, kpts_curr, kpt_matches, std_factor))
        .collect()
}
