use clap::Parser;
use lidar_camera_ttc::data_loader::load_frame_sequence;
use lidar_camera_ttc::io::{object_from_json, write_ttc_report};
use lidar_camera_ttc::pipeline::{estimate_ttc_for_pair, prepare_frame};
use lidar_camera_ttc::projection::{Calibration, CalibrationConfig};
use lidar_camera_ttc::visualization::{log_frame_pair, render_top_view};
use lidar_camera_ttc::FusionConfig;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(version, about, author)]
struct TtcCli {
    /// path to the folder of frame json files
    path: String,

    /// calibration json, defaults to the KITTI camera 00 calibration
    #[arg(long)]
    calibration: Option<String>,

    /// fusion config json
    #[arg(long)]
    config: Option<String>,

    /// output report path
    #[arg(long, default_value = "ttc_report.json")]
    report: String,

    /// write a lidar top view png per frame into this folder
    #[arg(long)]
    top_view_dir: Option<String>,

    /// save a rerun recording to this file
    #[arg(long)]
    rerun: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = TtcCli::parse();

    let calibration = match &cli.calibration {
        Some(p) => Calibration::from_config(&object_from_json::<CalibrationConfig, _>(p)?),
        None => Calibration::default(),
    };
    let config: FusionConfig = match &cli.config {
        Some(p) => object_from_json(p)?,
        None => FusionConfig::default(),
    };
    config.validate()?;

    let recording = match &cli.rerun {
        Some(p) => Some(rerun::RecordingStreamBuilder::new("lidar_camera_ttc").save(p)?),
        None => None,
    };
    if let Some(dir) = &cli.top_view_dir {
        std::fs::create_dir_all(dir)?;
    }

    let now = Instant::now();
    let mut frames = load_frame_sequence(&cli.path)?;
    log::info!("loaded {} frames in {:.3} sec", frames.len(), now.elapsed().as_secs_f64());

    let now = Instant::now();
    let mut results = Vec::new();
    for frame_idx in 0..frames.len() {
        prepare_frame(&mut frames[frame_idx], &calibration, &config)?;
        if frame_idx > 0 {
            let (head, tail) = frames.split_at_mut(frame_idx);
            let prev_frame = &head[frame_idx - 1];
            let curr_frame = &mut tail[0];
            let result = estimate_ttc_for_pair(prev_frame, curr_frame, &config)?;
            for e in &result.estimates {
                println!(
                    "frame {:4} box {} -> {}: ttc lidar {:>8.3?} s, camera {:>8.3?} s",
                    frame_idx, e.prev_box_id, e.curr_box_id, e.ttc_lidar, e.ttc_camera
                );
            }
            if let Some(recording) = &recording {
                log_frame_pair(recording, frame_idx as i64, curr_frame, &result)?;
            }
            results.push(result);
        }
        if let Some(dir) = &cli.top_view_dir {
            let img = render_top_view(&frames[frame_idx].bounding_boxes, &config.top_view)?;
            img.save(PathBuf::from(dir).join(format!("{:06}.png", frame_idx)))?;
        }
    }
    let duration_sec = now.elapsed().as_secs_f64();
    println!("estimating ttc took {:.6} sec", duration_sec);
    if !frames.is_empty() {
        println!("avg: {} sec", duration_sec / frames.len() as f64);
    }

    write_ttc_report(&cli.report, config.frame_rate, &results)?;
    Ok(())
}
