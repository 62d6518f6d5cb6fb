use serde::{Deserialize, Serialize};

use crate::error::{FusionError, Result};

/// Region in front of the vehicle kept by [`crate::lidar::crop_lidar_points`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LidarCropConfig {
    pub min_x: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
    pub min_reflectivity: f64,
}

impl Default for LidarCropConfig {
    fn default() -> Self {
        Self {
            min_x: 2.0,
            max_x: 20.0,
            max_y: 2.0,
            min_z: -1.5,
            max_z: -0.9,
            min_reflectivity: 0.1,
        }
    }
}

/// Birds-eye rendering of lidar clusters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopViewConfig {
    /// (lateral width, forward depth) covered by the image, in meters.
    pub world_size: (f64, f64),
    /// (width, height) of the image, in pixels.
    pub image_size: (u32, u32),
    pub marker_spacing: f64,
}

impl Default for TopViewConfig {
    fn default() -> Self {
        Self {
            world_size: (4.0, 20.0),
            image_size: (2000, 2000),
            marker_spacing: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Fraction by which boxes are contracted before lidar association, in [0, 1).
    pub shrink_factor: f64,
    /// Pairs of keypoints closer than this in the current frame are ignored by the camera TTC.
    pub min_keypoint_distance: f64,
    /// Width of the band, in standard deviations, kept by keypoint outlier removal.
    pub outlier_std_factor: f64,
    pub frame_rate: f64,
    pub crop: LidarCropConfig,
    pub top_view: TopViewConfig,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            shrink_factor: 0.10,
            min_keypoint_distance: 100.0,
            outlier_std_factor: 2.0,
            frame_rate: 10.0,
            crop: LidarCropConfig::default(),
            top_view: TopViewConfig::default(),
        }
    }
}

impl FusionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.shrink_factor) {
            return Err(FusionError::InvalidConfig(format!(
                "shrink_factor must be in [0, 1), got {}",
                self.shrink_factor
            )));
        }
        validate_frame_rate(self.frame_rate)?;
        if !(self.min_keypoint_distance > 0.0) {
            return Err(FusionError::InvalidConfig(format!(
                "min_keypoint_distance must be positive, got {}",
                self.min_keypoint_distance
            )));
        }
        if !(self.outlier_std_factor > 0.0) {
            return Err(FusionError::InvalidConfig(format!(
                "outlier_std_factor must be positive, got {}",
                self.outlier_std_factor
            )));
        }
        let (w, h) = self.top_view.world_size;
        if !(w > 0.0 && h > 0.0 && self.top_view.marker_spacing > 0.0) {
            return Err(FusionError::InvalidConfig(
                "top view world size and marker spacing must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_frame_rate(frame_rate: f64) -> Result<()> {
    if frame_rate.is_finite() && frame_rate > 0.0 {
        Ok(())
    } else {
        Err(FusionError::InvalidConfig(format!(
            "frame_rate must be positive and finite, got {}",
            frame_rate
        )))
    }
}
