pub mod cluster;
pub mod config;
pub mod data_loader;
pub mod error;
pub mod io;
pub mod lidar;
pub mod matching;
pub mod pipeline;
pub mod projection;
pub mod stats;
pub mod ttc;
pub mod types;
pub mod visualization;

pub use config::FusionConfig;
pub use error::{FusionError, Result};
pub use projection::Calibration;
pub use types::{BoundingBox, DataFrame, Keypoint, KeypointMatch, LidarPoint, Roi};
