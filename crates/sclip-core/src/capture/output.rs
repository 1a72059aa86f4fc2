use crate::{CaptureError, CaptureMode, CoreResult};

use std::{
    panic::Location,
    path::{Path, PathBuf},
};

use chrono::{DateTime, TimeZone};
use error_location::ErrorLocation;

/// Files no larger than this are treated as truncated.
pub const MIN_OUTPUT_BYTES: u64 = 4096;

/// Artifact extension; matches the fixed container format.
pub const OUTPUT_EXTENSION: &str = "mp4";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Sortable artifact path for a session started at `started_at`.
///
/// An existing file is never reused: a numeric suffix (`_2`, `_3`, ...) is
/// appended until the name is free.
pub fn output_path<Tz>(dir: &Path, mode: CaptureMode, started_at: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let stem = format!("{}{}", mode.prefix(), started_at.format(TIMESTAMP_FORMAT));

    let candidate = dir.join(format!("{stem}.{OUTPUT_EXTENSION}"));
    if !candidate.exists() {
        return candidate;
    }

    (2u32..)
        .map(|n| dir.join(format!("{stem}_{n}.{OUTPUT_EXTENSION}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Create `dir` and its parents if missing.
#[track_caller]
pub(crate) fn ensure_dir(dir: &Path) -> CoreResult<()> {
    std::fs::create_dir_all(dir).map_err(|source| CaptureError::OutputDirectory {
        path: dir.to_path_buf(),
        source,
        location: ErrorLocation::from(Location::caller()),
    })
}

/// Size of the artifact at `path`, if it exists and exceeds `min_bytes`.
///
/// `Err(Some(n))` means the file exists but is only `n` bytes; `Err(None)`
/// means it does not exist.
pub(crate) async fn validate(path: &Path, min_bytes: u64) -> Result<u64, Option<u64>> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() > min_bytes => Ok(meta.len()),
        Ok(meta) => Err(Some(meta.len())),
        Err(_) => Err(None),
    }
}
