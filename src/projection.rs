use glam::DVec2;
use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::types::LidarPoint;

/// Row-major calibration matrices as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// 3x4 projection matrix of the rectified camera.
    pub p_rect: [[f64; 4]; 3],
    /// 3x3 rectifying rotation.
    pub r_rect: [[f64; 3]; 3],
    /// 3x4 rigid transform from lidar to camera coordinates.
    pub rt: [[f64; 4]; 3],
}

impl Default for CalibrationConfig {
    /// KITTI raw sequence 2011_09_26 camera 00 calibration.
    fn default() -> Self {
        Self {
            p_rect: [
                [7.215377e+02, 0.000000e+00, 6.095593e+02, 0.000000e+00],
                [0.000000e+00, 7.215377e+02, 1.728540e+02, 0.000000e+00],
                [0.000000e+00, 0.000000e+00, 1.000000e+00, 0.000000e+00],
            ],
            r_rect: [
                [9.999239e-01, 9.837760e-03, -7.445048e-03],
                [-9.869795e-03, 9.999421e-01, -4.278459e-03],
                [7.402527e-03, 4.351614e-03, 9.999631e-01],
            ],
            rt: [
                [7.533745e-03, -9.999714e-01, -6.166020e-04, -4.069766e-03],
                [1.480249e-02, 7.280733e-04, -9.998902e-01, -7.631618e-02],
                [9.998621e-01, 7.523790e-03, 1.480755e-02, -2.717806e-01],
            ],
        }
    }
}

/// Lidar to image projection chain `P * R * RT`.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    pub p_rect: na::Matrix3x4<f64>,
    pub r_rect: na::Matrix4<f64>,
    pub rt: na::Matrix4<f64>,
    composed: na::Matrix3x4<f64>,
}

impl Calibration {
    pub fn new(
        p_rect: na::Matrix3x4<f64>,
        r_rect: na::Matrix4<f64>,
        rt: na::Matrix4<f64>,
    ) -> Calibration {
        let composed = p_rect * r_rect * rt;
        Calibration {
            p_rect,
            r_rect,
            rt,
            composed,
        }
    }

    pub fn from_config(config: &CalibrationConfig) -> Calibration {
        let p_rect = na::Matrix3x4::from_fn(|r, c| config.p_rect[r][c]);
        let mut r_rect = na::Matrix4::identity();
        r_rect
            .fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&na::Matrix3::from_fn(|r, c| config.r_rect[r][c]));
        let mut rt = na::Matrix4::identity();
        rt.fixed_view_mut::<3, 4>(0, 0)
            .copy_from(&na::Matrix3x4::from_fn(|r, c| config.rt[r][c]));
        Calibration::new(p_rect, r_rect, rt)
    }

    pub fn to_config(&self) -> CalibrationConfig {
        let mut config = CalibrationConfig {
            p_rect: [[0.0; 4]; 3],
            r_rect: [[0.0; 3]; 3],
            rt: [[0.0; 4]; 3],
        };
        for r in 0..3 {
            for c in 0..4 {
                config.p_rect[r][c] = self.p_rect[(r, c)];
                config.rt[r][c] = self.rt[(r, c)];
            }
            for c in 0..3 {
                config.r_rect[r][c] = self.r_rect[(r, c)];
            }
        }
        config
    }

    /// Projects a lidar point to pixel coordinates.
    ///
    /// Points on the camera plane (`w == 0`) yield non-finite coordinates.
    pub fn project(&self, point: &LidarPoint) -> DVec2 {
        project_lidar_point(&self.composed, point)
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Calibration::from_config(&CalibrationConfig::default())
    }
}

pub fn project_lidar_point(projection: &na::Matrix3x4<f64>, point: &LidarPoint) -> DVec2 {
    let x = na::Vector4::new(point.x, point.y, point.z, 1.0);
    let y = projection * x;
    DVec2::new(y[0] / y[2], y[1] / y[2])
}
