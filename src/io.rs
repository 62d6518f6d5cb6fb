use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::Result;
use crate::pipeline::FramePairResult;

/// Serializes an object to a JSON file.
pub fn object_to_json<T: Serialize, P: AsRef<Path>>(output_path: P, object: &T) -> Result<()> {
    let j = serde_json::to_string_pretty(object)?;
    std::fs::write(output_path, j)?;
    Ok(())
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned, P: AsRef<Path>>(file_path: P) -> Result<T> {
    let contents = std::fs::read_to_string(file_path)?;
    Ok(serde_json::from_str(&contents)?)
}

#[derive(Serialize)]
struct TtcReport<'a> {
    timestamp: String,
    frame_rate: f64,
    frame_pairs: usize,
    results: &'a [FramePairResult],
}

/// Writes all per-frame TTC estimates to a JSON report.
///
/// Estimates without a value are written as `null`, including the camera "no estimate" NaN.
pub fn write_ttc_report<P: AsRef<Path>>(
    output_path: P,
    frame_rate: f64,
    results: &[FramePairResult],
) -> Result<()> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let report = TtcReport {
        timestamp: now.format(&Rfc3339).unwrap_or_default(),
        frame_rate,
        frame_pairs: results.len(),
        results,
    };
    object_to_json(output_path, &report)
}
