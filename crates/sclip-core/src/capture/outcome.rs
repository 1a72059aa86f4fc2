use std::{fmt, path::PathBuf, time::Duration};

use thiserror::Error;

/// Why a session ended without a usable artifact.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The encoder could not be spawned.
    #[error("encoder failed to launch: {reason}")]
    Launch {
        /// Spawn error text.
        reason: String,
    },

    /// The encoder exited before it was asked to, or before a clip's
    /// expected duration with an error status.
    #[error("encoder exited early after {elapsed:?} (status {status:?})")]
    EarlyExit {
        /// Exit code, if the process exited normally.
        status: Option<i32>,
        /// Time between launch and exit.
        elapsed: Duration,
        /// Last lines of the encoder's diagnostic stream.
        diagnostics: Vec<String>,
    },

    /// The artifact is absent or below the size sanity threshold.
    #[error("output {path:?} missing or truncated ({bytes:?} bytes)")]
    OutputMissingOrTruncated {
        /// Expected artifact path.
        path: PathBuf,
        /// Size found on disk; `None` when the file does not exist.
        bytes: Option<u64>,
    },

    /// Supervision itself failed (waiting on or reaping the process).
    #[error("supervision failed: {reason}")]
    Supervision {
        /// Error text.
        reason: String,
    },
}

/// Terminal result of a capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A playable-sized artifact exists.
    Success {
        /// Artifact path.
        path: PathBuf,
        /// Artifact size.
        bytes: u64,
    },
    /// No usable artifact.
    Failed(FailureReason),
}

impl SessionOutcome {
    /// True for [`SessionOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, SessionOutcome::Success { .. })
    }
}

/// Lifecycle state of a capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Created, not started.
    Idle,
    /// Spawning the encoder.
    Launching,
    /// Encoder running.
    Recording,
    /// Stop protocol in progress.
    Stopping,
    /// Terminal.
    Stopped(SessionOutcome),
}

impl SessionState {
    /// Discriminant without the outcome payload.
    pub fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Idle => SessionPhase::Idle,
            SessionState::Launching => SessionPhase::Launching,
            SessionState::Recording => SessionPhase::Recording,
            SessionState::Stopping => SessionPhase::Stopping,
            SessionState::Stopped(_) => SessionPhase::Stopped,
        }
    }

    /// True while an encoder process is owned by the session.
    pub fn is_active(&self) -> bool {
        self.phase().is_active()
    }
}

/// [`SessionState`] without payload, for histories and error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// See [`SessionState::Idle`].
    Idle,
    /// See [`SessionState::Launching`].
    Launching,
    /// See [`SessionState::Recording`].
    Recording,
    /// See [`SessionState::Stopping`].
    Stopping,
    /// See [`SessionState::Stopped`].
    Stopped,
}

impl SessionPhase {
    /// True for `Launching`, `Recording`, and `Stopping`.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SessionPhase::Launching | SessionPhase::Recording | SessionPhase::Stopping
        )
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub(crate) fn can_advance_to(self, next: SessionPhase) -> bool {
        use SessionPhase::*;

        matches!(
            (self, next),
            (Idle, Launching)
                | (Launching, Recording | Stopping | Stopped)
                | (Recording, Stopping | Stopped)
                | (Stopping, Stopped)
        )
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
