use std::path::{Path, PathBuf};

use glob::glob;
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

use crate::error::Result;
use crate::io::object_from_json;
use crate::types::DataFrame;

/// Parses the timestamp from a file path.
///
/// Assumes the filename (without extension) is a timestamp in nanoseconds.
fn path_to_timestamp(path: &Path) -> Option<i64> {
    path.file_stem()?.to_str()?.parse().ok()
}

/// Loads every `*.json` frame in `root_folder`, ordered by time.
///
/// Frames whose file name is a nanosecond timestamp take it as `time_ns`; the others
/// keep the value stored in the file. Files are parsed in parallel.
pub fn load_frame_sequence<P: AsRef<Path>>(root_folder: P) -> Result<Vec<DataFrame>> {
    let root = root_folder.as_ref();
    if !root.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", root.display()),
        )
        .into());
    }
    let pattern = format!("{}/*.json", root.display());
    let mut sorted_path: Vec<PathBuf> = glob(&pattern)?.filter_map(|p| p.ok()).collect();
    sorted_path.sort();
    log::trace!("loading {} frames from {}", sorted_path.len(), root.display());

    let mut frames = sorted_path
        .par_iter()
        .progress_count(sorted_path.len() as u64)
        .map(|path| -> Result<DataFrame> {
            let mut frame: DataFrame = object_from_json(path)?;
            if let Some(time_ns) = path_to_timestamp(path) {
                frame.time_ns = time_ns;
            }
            Ok(frame)
        })
        .collect::<Result<Vec<_>>>()?;
    frames.sort_by_key(|f| f.time_ns);
    Ok(frames)
}
