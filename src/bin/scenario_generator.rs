use clap::{Parser, Subcommand};
use lidar_camera_ttc::io::object_to_json;
use lidar_camera_ttc::projection::{Calibration, CalibrationConfig};
use lidar_camera_ttc::{BoundingBox, DataFrame, FusionConfig, Keypoint, KeypointMatch, LidarPoint, Roi};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::path::Path;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic sequence of a vehicle approaching at constant speed
    Generate {
        /// Output directory
        #[arg(short, long)]
        output: String,

        /// Number of frames to generate
        #[arg(short, long, default_value = "20")]
        num_frames: usize,

        /// Distance to the rear of the vehicle in the first frame, in meters
        #[arg(long, default_value = "12.0")]
        start_distance: f64,

        /// Closing speed in m/s
        #[arg(long, default_value = "3.0")]
        speed: f64,

        /// Frame rate in Hz
        #[arg(long, default_value = "10.0")]
        frame_rate: f64,

        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,
    },
}

const VEHICLE_HALF_WIDTH: f64 = 0.9;
const VEHICLE_BOTTOM_Z: f64 = -1.5;
const VEHICLE_TOP_Z: f64 = 0.3;
const BOX_MARGIN_PX: f64 = 10.0;
const NUM_FEATURES: usize = 60;
const LIDAR_ROWS: usize = 4;
const LIDAR_COLS: usize = 40;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Commands::Generate {
            output,
            num_frames,
            start_distance,
            speed,
            frame_rate,
            seed,
        } => {
            generate_scenario(&output, num_frames, start_distance, speed, frame_rate, seed)?;
        }
    }

    Ok(())
}

fn vehicle_roi(calibration: &Calibration, distance: f64) -> Roi {
    let corners = [
        (VEHICLE_HALF_WIDTH, VEHICLE_BOTTOM_Z),
        (VEHICLE_HALF_WIDTH, VEHICLE_TOP_Z),
        (-VEHICLE_HALF_WIDTH, VEHICLE_BOTTOM_Z),
        (-VEHICLE_HALF_WIDTH, VEHICLE_TOP_Z),
    ];
    let (mut min_u, mut min_v, mut max_u, mut max_v) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for (y, z) in corners {
        let p = calibration.project(&LidarPoint::new(distance, y, z, 0.0));
        min_u = min_u.min(p.x);
        min_v = min_v.min(p.y);
        max_u = max_u.max(p.x);
        max_v = max_v.max(p.y);
    }
    Roi::new(
        min_u - BOX_MARGIN_PX,
        min_v - BOX_MARGIN_PX,
        max_u - min_u + 2.0 * BOX_MARGIN_PX,
        max_v - min_v + 2.0 * BOX_MARGIN_PX,
    )
}

fn generate_scenario(
    output_dir: &str,
    num_frames: usize,
    start_distance: f64,
    speed: f64,
    frame_rate: f64,
    seed: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    use std::fs;

    let calibration_config = CalibrationConfig::default();
    let calibration = Calibration::from_config(&calibration_config);
    let config = FusionConfig {
        frame_rate,
        ..Default::default()
    };
    config.validate()?;

    let frames_dir = Path::new(output_dir).join("frames");
    fs::create_dir_all(&frames_dir)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    // Features are fixed on the rear surface of the vehicle: (y, z).
    let features: Vec<(f64, f64)> = (0..NUM_FEATURES)
        .map(|_| {
            (
                rng.random_range(-VEHICLE_HALF_WIDTH..VEHICLE_HALF_WIDTH),
                rng.random_range(VEHICLE_BOTTOM_Z..VEHICLE_TOP_Z),
            )
        })
        .collect();

    let dt_ns = (1e9 / frame_rate) as i64;
    let mut frames_written = 0usize;
    for frame_idx in 0..num_frames {
        let distance = start_distance - speed * frame_idx as f64 / frame_rate;
        if distance <= config.crop.min_x {
            log::warn!("vehicle reached {:.2} m, stopping at frame {}", distance, frame_idx);
            break;
        }

        let mut lidar_points = Vec::with_capacity(LIDAR_ROWS * LIDAR_COLS);
        for r in 0..LIDAR_ROWS {
            let z = config.crop.min_z + 0.1 + 0.1 * r as f64;
            for c in 0..LIDAR_COLS {
                let y = -0.8 + 1.6 * c as f64 / (LIDAR_COLS - 1) as f64;
                let x = distance + rng.random_range(-0.02..0.02);
                lidar_points.push(LidarPoint::new(x, y, z, rng.random_range(0.3..0.9)));
            }
        }

        let keypoints: Vec<Keypoint> = features
            .iter()
            .map(|&(y, z)| {
                let p = calibration.project(&LidarPoint::new(distance, y, z, 0.0));
                Keypoint::new(
                    p.x + rng.random_range(-0.3..0.3),
                    p.y + rng.random_range(-0.3..0.3),
                )
            })
            .collect();

        let kpt_matches = if frame_idx == 0 {
            Vec::new()
        } else {
            (0..NUM_FEATURES).map(|i| KeypointMatch::new(i, i)).collect()
        };

        let time_ns = frame_idx as i64 * dt_ns;
        let frame = DataFrame {
            time_ns,
            bounding_boxes: vec![BoundingBox::new(0, vehicle_roi(&calibration, distance))],
            keypoints,
            lidar_points,
            kpt_matches,
        };
        object_to_json(frames_dir.join(format!("{:019}.json", time_ns)), &frame)?;
        frames_written += 1;
    }

    object_to_json(Path::new(output_dir).join("calibration.json"), &calibration_config)?;
    object_to_json(Path::new(output_dir).join("config.json"), &config)?;

    println!("Generated {} frames in {}", frames_written, frames_dir.display());
    Ok(())
}
