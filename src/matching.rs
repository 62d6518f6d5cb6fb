use std::collections::BTreeMap;

use log::{debug, trace};

use crate::cluster::keypoint_at;
use crate::error::Result;
use crate::types::{DataFrame, KeypointMatch};

/// Associates every box of `prev_frame` with the box of `curr_frame` that shares the most
/// keypoint matches.
///
/// Current boxes are scanned in ascending id order and the first box to reach the
/// maximum vote count wins ties. Boxes without any vote are left out. Several previous
/// boxes may map to the same current box.
pub fn match_bounding_boxes(
    kpt_matches: &[KeypointMatch],
    prev_frame: &DataFrame,
    curr_frame: &DataFrame,
) -> Result<BTreeMap<i32, i32>> {
    let mut curr_order: Vec<usize> = (0..curr_frame.bounding_boxes.len()).collect();
    curr_order.sort_by_key(|&i| curr_frame.bounding_boxes[i].id);

    let mut bb_best_matches = BTreeMap::new();
    for prev_box in &prev_frame.bounding_boxes {
        let mut votes: BTreeMap<i32, usize> = BTreeMap::new();
        let mut max_count = 0usize;
        let mut max_id = None;

        for m in kpt_matches {
            let prev_pt = keypoint_at(&prev_frame.keypoints, m.prev_idx)?;
            if !prev_box.roi.contains(prev_pt) {
                continue;
            }
            let curr_pt = keypoint_at(&curr_frame.keypoints, m.curr_idx)?;
            for &i in &curr_order {
                let curr_box = &curr_frame.bounding_boxes[i];
                if curr_box.roi.contains(curr_pt) {
                    let count = votes.entry(curr_box.id).or_insert(0);
                    *count += 1;
                    if *count > max_count {
                        max_count = *count;
                        max_id = Some(curr_box.id);
                    }
                }
            }
        }

        trace!("prev box {} votes {:?}", prev_box.id, votes);
        if let Some(curr_id) = max_id {
            debug!(
                "best match: prev {} -> curr {} with {} matches",
                prev_box.id, curr_id, max_count
            );
            bb_best_matches.insert(prev_box.id, curr_id);
        }
    }
    Ok(bb_best_matches)
}
