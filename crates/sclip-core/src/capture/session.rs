//! Capture session state machine.
//!
//! A [`CaptureSession`] owns one encoder process for its lifetime. The
//! process itself lives inside the supervisor task; the session handle only
//! holds the shared state and the stop signal, so it is cheap to share and
//! never blocks its caller.

use crate::{
    capture::{
        CaptureConfig, CaptureMode, EncoderBinary, EncoderCommand, FailureReason,
        SessionOutcome, SessionPhase, SessionState,
        mode::{CLIP_DEADLINE_MARGIN, CLIP_RUN_TIME},
        output::{self, MIN_OUTPUT_BYTES},
        supervisor::Supervisor,
    },
    {CaptureError, CoreResult, DisplaySource, MonitorMap},
};

use std::{
    fmt,
    panic::Location,
    path::{Path, PathBuf},
    process::Stdio,
    sync::{
        Arc, Mutex, OnceLock,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use chrono::{DateTime, Local};
use error_location::ErrorLocation;
use tokio::{runtime::Handle, sync::watch};
use tracing::{Instrument, debug, info, info_span, instrument};
use uuid::Uuid;

/// Default wait between the quit request and forced termination.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Supervision tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// How long to wait for a graceful exit before killing the encoder.
    pub grace_period: Duration,
    /// Artifacts that do not exceed this size are reported as truncated.
    pub min_output_bytes: u64,
    /// A clip encoder still running after this long is stopped with the
    /// same quit, grace, and kill protocol as a requested stop.
    pub clip_deadline: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
            min_output_bytes: MIN_OUTPUT_BYTES,
            clip_deadline: CLIP_RUN_TIME + CLIP_DEADLINE_MARGIN,
        }
    }
}

/// Everything a session needs from its host besides the capture config.
#[derive(Clone)]
pub struct SessionContext {
    encoder: EncoderBinary,
    displays: Arc<dyn DisplaySource>,
    output_dir: PathBuf,
    options: SessionOptions,
}

impl SessionContext {
    /// Sessions launch `encoder`, query `displays`, and write into `output_dir`.
    pub fn new(
        encoder: EncoderBinary,
        displays: Arc<dyn DisplaySource>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            encoder,
            displays,
            output_dir: output_dir.into(),
            options: SessionOptions::default(),
        }
    }

    /// Override supervision tunables.
    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Encoder binary.
    pub fn encoder(&self) -> &EncoderBinary {
        &self.encoder
    }

    /// Host display query.
    pub fn displays(&self) -> &Arc<dyn DisplaySource> {
        &self.displays
    }

    /// Artifact directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Supervision tunables.
    pub fn options(&self) -> SessionOptions {
        self.options
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("encoder", &self.encoder)
            .field("output_dir", &self.output_dir)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Session state plus its phase history.
///
/// Every transition goes through [`advance`](Self::advance), which checks the
/// move against the state machine under the watch lock. A stop request
/// racing a natural exit therefore resolves to exactly one terminal state.
#[derive(Debug)]
pub(crate) struct StateMachine {
    tx: watch::Sender<SessionState>,
    history: Mutex<Vec<SessionPhase>>,
    /// Set once the encoder has exited on its own; later stop requests are
    /// refused so they cannot change how that exit is classified.
    exited: AtomicBool,
}

impl StateMachine {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::Idle);
        Self {
            tx,
            history: Mutex::new(vec![SessionPhase::Idle]),
            exited: AtomicBool::new(false),
        }
    }

    /// Move to `next` if the state machine allows it. Returns whether it moved.
    pub(crate) fn advance(&self, next: SessionState) -> bool {
        let phase = next.phase();
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());

        self.tx.send_if_modified(|state| {
            if phase == SessionPhase::Stopping && self.exited.load(Ordering::Acquire) {
                return false;
            }
            if state.phase().can_advance_to(phase) {
                *state = next;
                history.push(phase);
                true
            } else {
                false
            }
        })
    }

    /// Record a natural encoder exit. Returns whether a stop had already
    /// been accepted; any later request is ignored.
    pub(crate) fn mark_exited(&self) -> bool {
        let mut stopping = false;

        self.tx.send_if_modified(|state| {
            self.exited.store(true, Ordering::Release);
            stopping = state.phase() == SessionPhase::Stopping;
            false
        });

        stopping
    }

    pub(crate) fn current(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub(crate) fn phase(&self) -> SessionPhase {
        self.tx.borrow().phase()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    pub(crate) fn history(&self) -> Vec<SessionPhase> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// One encoder process producing one artifact.
pub struct CaptureSession {
    id: Uuid,
    started_at: DateTime<Local>,
    mode: CaptureMode,
    config: CaptureConfig,
    context: SessionContext,
    output_path: OnceLock<PathBuf>,
    state: Arc<StateMachine>,
    stop_tx: watch::Sender<bool>,
}

impl CaptureSession {
    /// Create an idle session.
    pub fn new(mode: CaptureMode, config: CaptureConfig, context: SessionContext) -> Self {
        let (stop_tx, _stop_rx) = watch::channel(false);

        Self {
            id: Uuid::new_v4(),
            started_at: Local::now(),
            mode,
            config,
            context,
            output_path: OnceLock::new(),
            state: Arc::new(StateMachine::new()),
            stop_tx,
        }
    }

    /// Launch the encoder and hand it to a supervisor task.
    ///
    /// Valid only from `Idle`. Returns once the process is running; the
    /// recording itself continues in the background.
    ///
    /// # Errors
    ///
    /// - [`CaptureError::InvalidState`] if the session was already started
    /// - [`CaptureError::NoRuntime`] outside a tokio runtime
    /// - [`CaptureError::InvalidConfig`] if the encoder/preset pair is invalid
    /// - [`CaptureError::OutputDirectory`] if the output directory cannot be created
    /// - [`CaptureError::LaunchFailed`] if the encoder cannot be spawned
    ///
    /// Every error after the `Idle` check leaves the session `Stopped`.
    #[track_caller]
    #[instrument(skip(self), fields(session_id = %self.id, mode = %self.mode))]
    pub fn start(&self) -> CoreResult<()> {
        let runtime = Handle::try_current().map_err(|_| CaptureError::NoRuntime {
            location: ErrorLocation::from(Location::caller()),
        })?;

        if !self.state.advance(SessionState::Launching) {
            return Err(CaptureError::InvalidState {
                operation: "start",
                phase: self.state.phase(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        match self.launch(&runtime) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.state
                    .advance(SessionState::Stopped(SessionOutcome::Failed(FailureReason::Launch {
                        reason: e.to_string(),
                    })));
                Err(e)
            }
        }
    }

    #[track_caller]
    fn launch(&self, runtime: &Handle) -> CoreResult<()> {
        let monitors = MonitorMap::from_displays(self.context.displays.displays());
        let dir = self.context.output_dir();
        output::ensure_dir(dir)?;

        let path = output::output_path(dir, self.mode, &self.started_at);
        let command = EncoderCommand::builder(&self.config, self.mode, &path)
            .with_backend(self.context.encoder.backend().clone())
            .with_monitors(&monitors)
            .build()?;

        let path = self.output_path.get_or_init(|| path).clone();
        let program = self.context.encoder.path();

        debug!(program = ?program, args = ?command.args(), "Encoder command");

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(command.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        let child = cmd.spawn().map_err(|source| CaptureError::LaunchFailed {
            program: program.to_path_buf(),
            source,
            location: ErrorLocation::from(Location::caller()),
        })?;
        let launched_at = Instant::now();

        info!(
            pid = ?child.id(),
            path = ?path,
            substituted = command.substituted(),
            "Encoder launched"
        );

        // A stop requested while launching already moved us to Stopping.
        self.state.advance(SessionState::Recording);

        let supervisor = Supervisor {
            child,
            mode: self.mode,
            output_path: path,
            options: self.context.options(),
            state: Arc::clone(&self.state),
            stop_rx: self.stop_tx.subscribe(),
            launched_at,
        };
        runtime.spawn(
            supervisor
                .run()
                .instrument(info_span!("supervisor", session_id = %self.id)),
        );

        Ok(())
    }

    /// Ask the encoder to finish.
    ///
    /// No-op unless the session is `Launching` or `Recording`, so callers
    /// may invoke it repeatedly or on a session that has already ended.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn request_stop(&self) {
        if self.state.advance(SessionState::Stopping) {
            self.stop_tx.send_replace(true);
            info!("Stop requested");
        } else {
            debug!(phase = %self.state.phase(), "Stop request ignored");
        }
    }

    /// True while the session owns a running encoder.
    pub fn is_active(&self) -> bool {
        self.state.phase().is_active()
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state.current()
    }

    /// Phases visited so far, starting with `Idle`.
    pub fn transitions(&self) -> Vec<SessionPhase> {
        self.state.history()
    }

    /// Resolve to the terminal outcome.
    ///
    /// Never resolves for a session that is never started.
    pub async fn wait(&self) -> SessionOutcome {
        let mut rx = self.state.subscribe();

        let outcome = match rx.wait_for(|s| matches!(s, SessionState::Stopped(_))).await {
            Ok(state) => match &*state {
                SessionState::Stopped(outcome) => Some(outcome.clone()),
                _ => None,
            },
            Err(_) => None,
        };

        outcome.unwrap_or_else(|| {
            SessionOutcome::Failed(FailureReason::Supervision {
                reason: "session state channel closed".to_string(),
            })
        })
    }

    /// Artifact path, assigned just before the encoder is launched.
    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.get().map(PathBuf::as_path)
    }

    /// Session identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Session mode.
    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    /// Creation time; also the artifact timestamp.
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Configuration the session was created with.
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }
}

impl fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureSession")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("phase", &self.state.phase())
            .field("output_path", &self.output_path.get())
            .finish_non_exhaustive()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        // The supervisor also treats the closed stop channel as a request.
        if self.is_active() {
            self.request_stop();
        }
    }
}
