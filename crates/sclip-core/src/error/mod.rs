use crate::capture::SessionPhase;

use std::{panic::Location, path::PathBuf};

use error_location::ErrorLocation;
use thiserror::Error;
use uuid::Uuid;

/// Capture controller errors with source location tracking.
///
/// These are the errors raised synchronously to the caller of a session
/// operation. Anything that goes wrong after the encoder is running is
/// reported through [`SessionOutcome`](crate::SessionOutcome) instead.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// Malformed resolution, frame rate, monitor label, or encoder/preset pair.
    #[error("Invalid capture configuration: {reason} {location}")]
    InvalidConfig {
        /// Description of the offending value.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No encoder binary exists at any searched location.
    #[error("Encoder not found (searched {} locations) {location}", .searched.len())]
    EncoderNotFound {
        /// Every path that was searched, in search order.
        searched: Vec<PathBuf>,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The encoder binary exists but could not be spawned.
    #[error("Failed to launch encoder {program:?}: {source} {location}")]
    LaunchFailed {
        /// Encoder binary that failed to start.
        program: PathBuf,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A process-launching operation was called outside a tokio runtime.
    #[error("No async runtime available to supervise the encoder {location}")]
    NoRuntime {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Another session is still recording or stopping.
    #[error("A capture session is already active: {session_id} {location}")]
    AlreadyActive {
        /// Identifier of the session that is still active.
        session_id: Uuid,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Operation is not valid in the session's current phase.
    #[error("Cannot {operation} a session in phase {phase:?} {location}")]
    InvalidState {
        /// Name of the rejected operation.
        operation: &'static str,
        /// Phase the session was in.
        phase: SessionPhase,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The output directory could not be created.
    #[error("Failed to prepare output directory {path:?}: {source} {location}")]
    OutputDirectory {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// IO error from filesystem or process operations.
    #[error("IO error: {source} {location}")]
    Io {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl CaptureError {
    /// Build an [`CaptureError::InvalidConfig`] at the caller's location.
    #[track_caller]
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        CaptureError::InvalidConfig {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<std::io::Error> for CaptureError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        CaptureError::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Result type alias using [`CaptureError`].
pub type Result<T> = std::result::Result<T, CaptureError>;
