use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut,
};
use imageproc::rect::Rect;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rerun::RecordingStream;

use crate::config::TopViewConfig;
use crate::error::Result;
use crate::pipeline::FramePairResult;
use crate::types::{BoundingBox, DataFrame};

const FONT_DATA: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
const POINT_RADIUS: i32 = 4;
const RECT_THICKNESS: i32 = 2;
/// Estimates at or above this many seconds are drawn fully green.
const TTC_COLOR_RANGE_SEC: f64 = 10.0;

/// Deterministic dark color for a box id.
pub fn id_to_color(id: i32) -> (u8, u8, u8, u8) {
    let mut rng = ChaCha8Rng::seed_from_u64(id as u64);
    (
        rng.random_range(0..150u8),
        rng.random_range(0..150u8),
        rng.random_range(0..150u8),
        255,
    )
}

/// Red for imminent collisions, green for distant ones, gray when there is no usable estimate.
pub fn ttc_to_color(ttc: Option<f64>) -> (u8, u8, u8, u8) {
    match ttc {
        Some(t) if t.is_finite() && t > 0.0 => {
            let c = colorous::RED_YELLOW_GREEN
                .eval_continuous((t / TTC_COLOR_RANGE_SEC).clamp(0.0, 1.0));
            (c.r, c.g, c.b, 255)
        }
        _ => (128, 128, 128, 255),
    }
}

/// Birds-eye view of the lidar clusters: forward distance grows upward, left is left.
///
/// Each box gets its own color, an enclosing rectangle and two labels underneath: the
/// box id with its point count, then the closest forward distance and the lateral
/// width of the cluster. Horizontal lines mark every `marker_spacing` meters.
/// Points projecting outside the image are not drawn.
pub fn render_top_view(bounding_boxes: &[BoundingBox], config: &TopViewConfig) -> Result<RgbImage> {
    let font = FontRef::try_from_slice(FONT_DATA)?;
    let (world_w, world_h) = config.world_size;
    let (img_w, img_h) = config.image_size;
    let mut img = RgbImage::from_pixel(img_w, img_h, Rgb([255, 255, 255]));

    let to_pixel = |xw: f64, yw: f64| -> (f64, f64) {
        let y = (-xw * img_h as f64 / world_h) + img_h as f64;
        let x = (-yw * img_w as f64 / world_w) + img_w as f64 / 2.0;
        (x, y)
    };
    let margin = POINT_RADIUS as f64;
    let in_view = |(x, y): (f64, f64)| {
        (-margin..=img_w as f64 + margin).contains(&x)
            && (-margin..=img_h as f64 + margin).contains(&y)
    };
    let label_scale = PxScale::from(img_h as f32 / 40.0);

    for b in bounding_boxes {
        let (r, g, bl, _) = id_to_color(b.id);
        let color = Rgb([r, g, bl]);
        let (mut top, mut left, mut bottom, mut right) = (i32::MAX, i32::MAX, i32::MIN, i32::MIN);
        let (mut xw_min, mut yw_min, mut yw_max) = (f64::MAX, f64::MAX, f64::MIN);
        for p in &b.lidar_points {
            xw_min = xw_min.min(p.x);
            yw_min = yw_min.min(p.y);
            yw_max = yw_max.max(p.y);

            let pixel = to_pixel(p.x, p.y);
            if !in_view(pixel) {
                continue;
            }
            let (x, y) = (pixel.0 as i32, pixel.1 as i32);
            top = top.min(y);
            left = left.min(x);
            bottom = bottom.max(y);
            right = right.max(x);
            draw_filled_circle_mut(&mut img, (x, y), POINT_RADIUS, color);
        }
        if top > bottom {
            continue;
        }

        for t in 0..RECT_THICKNESS {
            let rect = Rect::at(left - t, top - t).of_size(
                (right - left + 2 * t + 1) as u32,
                (bottom - top + 2 * t + 1) as u32,
            );
            draw_hollow_rect_mut(&mut img, rect, Rgb([0, 0, 0]));
        }

        let label_x = left - img_w as i32 / 8;
        let label_y = bottom + label_scale.y as i32;
        draw_text_mut(
            &mut img,
            color,
            label_x,
            label_y,
            label_scale,
            &font,
            &format!("id={}, #pts={}", b.id, b.lidar_points.len()),
        );
        draw_text_mut(
            &mut img,
            color,
            label_x,
            label_y + (1.5 * label_scale.y) as i32,
            label_scale,
            &font,
            &format!("xmin={:.2} m, yw={:.2} m", xw_min, yw_max - yw_min),
        );
    }

    let n_markers = (world_h / config.marker_spacing).floor() as usize;
    for i in 0..n_markers {
        let (_, y) = to_pixel(i as f64 * config.marker_spacing, 0.0);
        draw_line_segment_mut(
            &mut img,
            (0.0, y as f32),
            (img_w as f32, y as f32),
            Rgb([0, 0, 255]),
        );
    }
    Ok(img)
}

/// Streams one processed frame to rerun: boxes colored by lidar TTC, keypoints and lidar clusters.
pub fn log_frame_pair(
    recording: &RecordingStream,
    frame_idx: i64,
    frame: &DataFrame,
    result: &FramePairResult,
) -> std::result::Result<(), rerun::RecordingStreamError> {
    recording.set_time("frame", rerun::TimeCell::from_sequence(frame_idx));

    let (mins, sizes): (Vec<_>, Vec<_>) = frame
        .bounding_boxes
        .iter()
        .map(|b| {
            (
                (b.roi.x as f32, b.roi.y as f32),
                (b.roi.width as f32, b.roi.height as f32),
            )
        })
        .unzip();
    let (colors, labels): (Vec<_>, Vec<_>) = frame
        .bounding_boxes
        .iter()
        .map(|b| {
            let estimate = result.estimates.iter().find(|e| e.curr_box_id == b.id);
            let ttc_lidar = estimate.and_then(|e| e.ttc_lidar);
            let ttc_camera = estimate.and_then(|e| e.ttc_camera);
            (
                ttc_to_color(ttc_lidar),
                format!(
                    "id={} lidar={:.2?} camera={:.2?}",
                    b.id, ttc_lidar, ttc_camera
                ),
            )
        })
        .unzip();
    recording.log(
        "camera/boxes",
        &rerun::Boxes2D::from_mins_and_sizes(mins, sizes)
            .with_colors(colors)
            .with_labels(labels),
    )?;

    let keypoints: Vec<(f32, f32)> = frame
        .keypoints
        .iter()
        .map(|k| (k.x as f32 + 0.5, k.y as f32 + 0.5))
        .collect();
    recording.log(
        "camera/keypoints",
        &rerun::Points2D::new(keypoints).with_radii([rerun::Radius::new_ui_points(2.0)]),
    )?;

    for b in &frame.bounding_boxes {
        let pts: Vec<[f32; 3]> = b
            .lidar_points
            .iter()
            .map(|p| [p.x as f32, p.y as f32, p.z as f32])
            .collect();
        recording.log(
            format!("lidar/box{}", b.id),
            &rerun::Points3D::new(pts).with_colors([id_to_color(b.id)]),
        )?;
    }
    Ok(())
}
