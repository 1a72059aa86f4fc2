use std::{fmt, time::Duration};

/// Total encoded duration of a clip.
pub const CLIP_DURATION: Duration = Duration::from_secs(30);

/// Leading skip applied to a clip before encoding starts.
pub const CLIP_LEADING_SKIP: Duration = Duration::from_secs(3);

/// Expected encoder run time for a clip: the skipped lead-in plus the clip.
pub const CLIP_RUN_TIME: Duration =
    Duration::from_secs(CLIP_LEADING_SKIP.as_secs() + CLIP_DURATION.as_secs());

/// Slack past [`CLIP_RUN_TIME`] before a clip encoder is considered stalled.
pub const CLIP_DEADLINE_MARGIN: Duration = Duration::from_secs(10);

/// How long a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureMode {
    /// Fixed-length, single-shot capture. The encoder exits on its own.
    Clip,
    /// Unbounded capture, ended by an explicit stop request.
    Manual,
}

impl CaptureMode {
    /// Filename prefix for artifacts produced in this mode.
    pub fn prefix(self) -> &'static str {
        match self {
            CaptureMode::Clip => "clip_",
            CaptureMode::Manual => "record_",
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureMode::Clip => f.write_str("clip"),
            CaptureMode::Manual => f.write_str("manual"),
        }
    }
}
