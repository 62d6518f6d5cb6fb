use log::debug;

use crate::cluster::keypoint_at;
use crate::config::validate_frame_rate;
use crate::error::{FusionError, Result};
use crate::stats::median_sorted;
use crate::types::{Keypoint, KeypointMatch, LidarPoint};

/// Pairs of previous keypoints closer than this are skipped to avoid dividing by zero.
const MIN_PREV_DISTANCE: f64 = f64::EPSILON;

fn median_forward_distance(points: &[LidarPoint], stage: &'static str) -> Result<f64> {
    if points.is_empty() {
        return Err(FusionError::InsufficientData {
            stage,
            required: 1,
            found: 0,
        });
    }
    let mut xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    xs.sort_by(f64::total_cmp);
    Ok(xs[xs.len() / 2])
}

/// Time-to-collision from the median forward distance of two lidar clusters.
///
/// The median is the element at index `n / 2` of the distances sorted ascending.
/// A receding or stationary object yields a negative or infinite value.
pub fn compute_ttc_lidar(
    lidar_points_prev: &[LidarPoint],
    lidar_points_curr: &[LidarPoint],
    frame_rate: f64,
) -> Result<f64> {
    validate_frame_rate(frame_rate)?;
    let prev_median_x = median_forward_distance(lidar_points_prev, "lidar ttc (previous)")?;
    let curr_median_x = median_forward_distance(lidar_points_curr, "lidar ttc (current)")?;
    let dt = 1.0 / frame_rate;
    let ttc = curr_median_x * dt / (prev_median_x - curr_median_x);
    debug!(
        "lidar ttc: prev x {:.3} m, curr x {:.3} m -> {:.3} s",
        prev_median_x, curr_median_x, ttc
    );
    Ok(ttc)
}

/// Time-to-collision from the scale change between matched keypoints.
///
/// Returns `f64::NAN` when no keypoint pair is at least `min_dist` pixels apart in the
/// current frame, which includes a single match. An empty match list is an error.
pub fn compute_ttc_camera(
    kpts_prev: &[Keypoint],
    kpts_curr: &[Keypoint],
    kpt_matches: &[KeypointMatch],
    frame_rate: f64,
    min_dist: f64,
) -> Result<f64> {
    validate_frame_rate(frame_rate)?;
    if kpt_matches.is_empty() {
        return Err(FusionError::InsufficientData {
            stage: "camera ttc",
            required: 1,
            found: 0,
        });
    }

    let mut pts = Vec::with_capacity(kpt_matches.len());
    for m in kpt_matches {
        pts.push((
            keypoint_at(kpts_prev, m.prev_idx)?,
            keypoint_at(kpts_curr, m.curr_idx)?,
        ));
    }

    let mut dist_ratios = Vec::new();
    for (i, &(outer_prev, outer_curr)) in pts.iter().enumerate() {
        for &(inner_prev, inner_curr) in &pts[i + 1..] {
            let dist_curr = outer_curr.distance(inner_curr);
            let dist_prev = outer_prev.distance(inner_prev);
            if dist_prev > MIN_PREV_DISTANCE && dist_curr >= min_dist {
                dist_ratios.push(dist_curr / dist_prev);
            }
        }
    }

    dist_ratios.sort_by(f64::total_cmp);
    let Some(median_dist_ratio) = median_sorted(&dist_ratios) else {
        debug!("camera ttc: no usable keypoint pairs");
        return Ok(f64::NAN);
    };
    let dt = 1.0 / frame_rate;
    let ttc = -dt / (1.0 - median_dist_ratio);
    debug!(
        "camera ttc: {} ratios, median {:.5} -> {:.3} s",
        dist_ratios.len(),
        median_dist_ratio,
        ttc
    );
    Ok(ttc)
}
