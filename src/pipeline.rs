use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::cluster::{cluster_kpt_matches_for_boxes, cluster_lidar_with_roi};
use crate::config::FusionConfig;
use crate::error::Result;
use crate::lidar::crop_lidar_points;
use crate::matching::match_bounding_boxes;
use crate::projection::Calibration;
use crate::ttc::{compute_ttc_camera, compute_ttc_lidar};
use crate::types::DataFrame;

/// Both time-to-collision estimates for one box tracked across two frames.
///
/// `None` means the estimator lacked data. `ttc_camera` may also hold `NaN` when no
/// keypoint pair passed the distance gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtcEstimate {
    pub prev_box_id: i32,
    pub curr_box_id: i32,
    pub ttc_lidar: Option<f64>,
    pub ttc_camera: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FramePairResult {
    pub time_ns: i64,
    pub bb_matches: BTreeMap<i32, i32>,
    pub estimates: Vec<TtcEstimate>,
}

fn skip_insufficient<T>(result: Result<T>, what: &str, curr_box_id: i32) -> Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_insufficient_data() => {
            warn!("box {}: skipping {}: {}", curr_box_id, what, e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Crops the frame's lidar points and distributes them over its bounding boxes.
pub fn prepare_frame(
    frame: &mut DataFrame,
    calibration: &Calibration,
    config: &FusionConfig,
) -> Result<()> {
    frame.lidar_points = crop_lidar_points(&frame.lidar_points, &config.crop);
    for b in frame.bounding_boxes.iter_mut() {
        b.lidar_points.clear();
    }
    cluster_lidar_with_roi(
        &mut frame.bounding_boxes,
        &frame.lidar_points,
        config.shrink_factor,
        calibration,
    )
}

/// Matches the boxes of two prepared frames and estimates both TTCs for every match.
///
/// The keypoint matches of every current box are clustered in place, in parallel,
/// before any estimate is computed.
pub fn estimate_ttc_for_pair(
    prev_frame: &DataFrame,
    curr_frame: &mut DataFrame,
    config: &FusionConfig,
) -> Result<FramePairResult> {
    config.validate()?;
    let bb_matches = match_bounding_boxes(&curr_frame.kpt_matches, prev_frame, curr_frame)?;
    let matched_curr_ids: BTreeSet<i32> = bb_matches.values().copied().collect();

    let cluster_results = cluster_kpt_matches_for_boxes(
        &mut curr_frame.bounding_boxes,
        &prev_frame.keypoints,
        &curr_frame.keypoints,
        &curr_frame.kpt_matches,
        config.outlier_std_factor,
    );
    let mut clustered = Vec::with_capacity(cluster_results.len());
    for (b, result) in curr_frame.bounding_boxes.iter().zip(cluster_results) {
        if matched_curr_ids.contains(&b.id) {
            clustered.push(skip_insufficient(result, "keypoint clustering", b.id)?.is_some());
        } else {
            match result {
                Err(e) if !e.is_insufficient_data() => return Err(e),
                _ => clustered.push(false),
            }
        }
    }

    let mut estimates = Vec::with_capacity(bb_matches.len());
    for (&prev_id, &curr_id) in &bb_matches {
        let Some(prev_box) = prev_frame.bounding_box(prev_id) else {
            continue;
        };
        let Some(curr_idx) = curr_frame
            .bounding_boxes
            .iter()
            .position(|b| b.id == curr_id)
        else {
            continue;
        };
        let curr_box = &curr_frame.bounding_boxes[curr_idx];

        let ttc_lidar = skip_insufficient(
            compute_ttc_lidar(
                &prev_box.lidar_points,
                &curr_box.lidar_points,
                config.frame_rate,
            ),
            "lidar ttc",
            curr_id,
        )?;
        let ttc_camera = if clustered[curr_idx] {
            skip_insufficient(
                compute_ttc_camera(
                    &prev_frame.keypoints,
                    &curr_frame.keypoints,
                    &curr_box.kpt_matches,
                    config.frame_rate,
                    config.min_keypoint_distance,
                ),
                "camera ttc",
                curr_id,
            )?
        } else {
            None
        };

        debug!(
            "box {} -> {}: ttc lidar {:?}, camera {:?}",
            prev_id, curr_id, ttc_lidar, ttc_camera
        );
        estimates.push(TtcEstimate {
            prev_box_id: prev_id,
            curr_box_id: curr_id,
            ttc_lidar,
            ttc_camera,
        });
    }

    Ok(FramePairResult {
        time_ns: curr_frame.time_ns,
        bb_matches,
        estimates,
    })
}

/// [`prepare_frame`] followed by [`estimate_ttc_for_pair`].
pub fn process_frame(
    prev_frame: &DataFrame,
    curr_frame: &mut DataFrame,
    calibration: &Calibration,
    config: &FusionConfig,
) -> Result<FramePairResult> {
    prepare_frame(curr_frame, calibration, config)?;
    estimate_ttc_for_pair(prev_frame, curr_frame, config)
}
