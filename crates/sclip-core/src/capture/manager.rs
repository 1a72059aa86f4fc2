use crate::{
    capture::{CaptureConfig, CaptureMode, CaptureSession, CaptureSettings, SessionContext},
    devices::DeviceEnumerator,
    {CaptureError, CoreResult},
};

use std::{
    panic::Location,
    sync::{Arc, Mutex},
};

use error_location::ErrorLocation;
use tracing::{info, instrument};

/// Result of a hotkey clip request.
#[derive(Debug, Clone)]
pub enum ClipTrigger {
    /// A clip session was started.
    Started(Arc<CaptureSession>),
    /// Clip saving is disabled; nothing was captured.
    NotSaved,
}

/// Holds at most one active capture session.
///
/// Start requests are single-flight: the lock is held from the activity
/// check until the new session is running, so two concurrent requests can
/// never both spawn an encoder.
#[derive(Debug)]
pub struct SessionManager {
    context: SessionContext,
    active: Mutex<Option<Arc<CaptureSession>>>,
}

impl SessionManager {
    /// Sessions created by this manager share `context`.
    pub fn new(context: SessionContext) -> Self {
        Self {
            context,
            active: Mutex::new(None),
        }
    }

    /// Start an unbounded recording.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::AlreadyActive`] while another session runs,
    /// or any error from [`CaptureSession::start`].
    #[track_caller]
    #[instrument(skip_all)]
    pub fn start_recording(&self, config: &CaptureConfig) -> CoreResult<Arc<CaptureSession>> {
        self.start(CaptureMode::Manual, config)
    }

    /// Capture a fixed-length clip now.
    ///
    /// # Errors
    ///
    /// Same as [`start_recording`](Self::start_recording).
    #[track_caller]
    #[instrument(skip_all)]
    pub fn capture_clip(&self, config: &CaptureConfig) -> CoreResult<Arc<CaptureSession>> {
        self.start(CaptureMode::Clip, config)
    }

    /// Hotkey entry point: capture a clip if clip saving is enabled.
    ///
    /// Settings are validated only when the trigger is allowed to act.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::InvalidConfig`] for invalid settings, or any
    /// error from [`capture_clip`](Self::capture_clip).
    #[track_caller]
    #[instrument(skip_all, fields(replay_buffer = settings.replay_buffer))]
    pub fn trigger_clip(&self, settings: &CaptureSettings) -> CoreResult<ClipTrigger> {
        if !settings.replay_buffer {
            info!("Clip not saved: clip saving is disabled");
            return Ok(ClipTrigger::NotSaved);
        }

        let config = CaptureConfig::try_from(settings)?;
        self.capture_clip(&config).map(ClipTrigger::Started)
    }

    /// Stop the active session, if any. Idempotent.
    #[instrument(skip(self))]
    pub fn stop(&self) {
        if let Some(session) = self.current() {
            session.request_stop();
        }
    }

    /// True while a session owns a running encoder.
    pub fn is_active(&self) -> bool {
        self.current().is_some()
    }

    /// The active session, if any.
    pub fn current(&self) -> Option<Arc<CaptureSession>> {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .filter(|s| s.is_active())
            .cloned()
    }

    /// Device enumerator bound to this manager's encoder and displays.
    pub fn devices(&self) -> DeviceEnumerator {
        DeviceEnumerator::new(
            self.context.encoder().clone(),
            Arc::clone(self.context.displays()),
        )
    }

    /// Shared session context.
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    #[track_caller]
    fn start(&self, mode: CaptureMode, config: &CaptureConfig) -> CoreResult<Arc<CaptureSession>> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = active.as_ref().filter(|s| s.is_active()) {
            return Err(CaptureError::AlreadyActive {
                session_id: existing.id(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let session = Arc::new(CaptureSession::new(mode, config.clone(), self.context.clone()));
        session.start()?;

        info!(session_id = %session.id(), %mode, "Capture session started");
        *active = Some(Arc::clone(&session));

        Ok(session)
    }
}
