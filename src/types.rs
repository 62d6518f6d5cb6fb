use glam::DVec2;
use serde::{Deserialize, Serialize};

/// A single lidar return in the sensor frame.
///
/// `x` points forward, `y` to the left and `z` up, all in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LidarPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub r: f64,
}

impl LidarPoint {
    pub fn new(x: f64, y: f64, z: f64, r: f64) -> LidarPoint {
        LidarPoint { x, y, z, r }
    }
}

/// A detected image feature, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
}

impl Keypoint {
    pub fn new(x: f64, y: f64) -> Keypoint {
        Keypoint { x, y }
    }
    pub fn pt(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }
}

/// Correspondence between a keypoint of the previous frame and one of the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeypointMatch {
    pub prev_idx: usize,
    pub curr_idx: usize,
}

impl KeypointMatch {
    pub fn new(prev_idx: usize, curr_idx: usize) -> KeypointMatch {
        KeypointMatch { prev_idx, curr_idx }
    }
}

/// Axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Roi {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Roi {
        Roi {
            x,
            y,
            width,
            height,
        }
    }

    /// Half-open containment: the left and top edges are inside, the right and bottom are not.
    /// Non-finite points are never contained.
    pub fn contains(&self, p: DVec2) -> bool {
        self.x <= p.x && p.x < self.x + self.width && self.y <= p.y && p.y < self.y + self.height
    }

    /// Contracts the rectangle symmetrically toward its center by `shrink_factor`.
    pub fn shrink(&self, shrink_factor: f64) -> Roi {
        Roi {
            x: self.x + shrink_factor * self.width / 2.0,
            y: self.y + shrink_factor * self.height / 2.0,
            width: self.width * (1.0 - shrink_factor),
            height: self.height * (1.0 - shrink_factor),
        }
    }
}

/// An object detection together with the sensor data associated to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub id: i32,
    pub roi: Roi,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lidar_points: Vec<LidarPoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kpt_matches: Vec<KeypointMatch>,
}

impl BoundingBox {
    pub fn new(id: i32, roi: Roi) -> BoundingBox {
        BoundingBox {
            id,
            roi,
            lidar_points: Vec::new(),
            kpt_matches: Vec::new(),
        }
    }
}

/// Everything known about one sensor frame.
///
/// `kpt_matches` relate the keypoints of the previous frame (`prev_idx`)
/// to the keypoints of this frame (`curr_idx`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    #[serde(default)]
    pub time_ns: i64,
    pub bounding_boxes: Vec<BoundingBox>,
    #[serde(default)]
    pub keypoints: Vec<Keypoint>,
    #[serde(default)]
    pub lidar_points: Vec<LidarPoint>,
    #[serde(default)]
    pub kpt_matches: Vec<KeypointMatch>,
}

impl DataFrame {
    pub fn bounding_box(&self, id: i32) -> Option<&BoundingBox> {
        self.bounding_boxes.iter().find(|b| b.id == id)
    }
}
