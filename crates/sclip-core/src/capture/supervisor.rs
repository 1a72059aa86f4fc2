use crate::capture::{
    CaptureMode, FailureReason, SessionOptions, SessionOutcome, SessionState,
    mode::CLIP_RUN_TIME,
    output,
    progress::{DiagnosticTail, ProgressLine},
    session::StateMachine,
};

use std::{
    io,
    path::PathBuf,
    process::ExitStatus,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    process::{Child, ChildStdin},
    sync::watch,
    task::JoinHandle,
    time::timeout,
};
use tracing::{debug, info, warn};

/// Graceful quit token understood by the encoder on stdin.
const QUIT_COMMAND: &[u8] = b"q";

/// Minimum spacing between logged progress lines.
const PROGRESS_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// How long to wait for the diagnostic reader to drain after exit.
const DIAGNOSTIC_DRAIN_TIMEOUT: Duration = Duration::from_millis(250);

enum Exit {
    Natural(io::Result<ExitStatus>),
    Requested,
    Overran,
}

/// Owns the encoder process from launch until it has been reaped.
pub(crate) struct Supervisor {
    pub child: Child,
    pub mode: CaptureMode,
    pub output_path: PathBuf,
    pub options: SessionOptions,
    pub state: Arc<StateMachine>,
    pub stop_rx: watch::Receiver<bool>,
    pub launched_at: Instant,
}

impl Supervisor {
    pub(crate) async fn run(self) {
        let Supervisor {
            mut child,
            mode,
            output_path,
            options,
            state,
            mut stop_rx,
            launched_at,
        } = self;

        let stdin = child.stdin.take();
        let tail = Arc::new(Mutex::new(DiagnosticTail::default()));
        let reader = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(drain_diagnostics(stderr, Arc::clone(&tail))));

        if let Some(mut stdout) = child.stdout.take() {
            tokio::spawn(async move {
                let _ = tokio::io::copy(&mut stdout, &mut tokio::io::sink()).await;
            });
        }

        let deadline = async {
            match mode {
                CaptureMode::Clip => tokio::time::sleep(options.clip_deadline).await,
                CaptureMode::Manual => std::future::pending().await,
            }
        };

        let exit = tokio::select! {
            status = child.wait() => Exit::Natural(status),
            _ = stop_rx.wait_for(|stop| *stop) => Exit::Requested,
            _ = deadline => Exit::Overran,
        };

        let overran = matches!(exit, Exit::Overran);

        let outcome = match exit {
            Exit::Requested | Exit::Overran => {
                if overran {
                    warn!(
                        deadline_ms = options.clip_deadline.as_millis() as u64,
                        "Clip encoder still running past its deadline, stopping"
                    );
                }
                state.advance(SessionState::Stopping);
                match stop_encoder(&mut child, stdin, options.grace_period).await {
                    Ok(status) => {
                        debug!(?status, "Encoder stopped");
                        classify_output(&output_path, options.min_output_bytes).await
                    }
                    Err(e) => SessionOutcome::Failed(FailureReason::Supervision {
                        reason: e.to_string(),
                    }),
                }
            }
            Exit::Natural(Err(e)) => SessionOutcome::Failed(FailureReason::Supervision {
                reason: e.to_string(),
            }),
            Exit::Natural(Ok(status)) => {
                let elapsed = launched_at.elapsed();
                let stop_requested = state.mark_exited();
                drop(stdin);

                if is_early_exit(mode, status.success(), elapsed, stop_requested) {
                    wait_for_reader(reader).await;
                    let diagnostics = tail.lock().unwrap_or_else(|e| e.into_inner()).lines();
                    SessionOutcome::Failed(FailureReason::EarlyExit {
                        status: status.code(),
                        elapsed,
                        diagnostics,
                    })
                } else {
                    classify_output(&output_path, options.min_output_bytes).await
                }
            }
        };

        match &outcome {
            SessionOutcome::Success { path, bytes } => {
                info!(path = ?path, bytes, "Capture session finished")
            }
            SessionOutcome::Failed(reason) => warn!(%reason, "Capture session failed"),
        }

        state.advance(SessionState::Stopped(outcome));
    }
}

/// Whether a natural exit ended the session before it produced its artifact.
///
/// Manual recordings only end on request. A clip may end on its own, but a
/// failing exit inside the expected run time means the encoder gave up.
pub(crate) fn is_early_exit(
    mode: CaptureMode,
    success: bool,
    elapsed: Duration,
    stop_requested: bool,
) -> bool {
    if stop_requested {
        return false;
    }

    match mode {
        CaptureMode::Manual => true,
        CaptureMode::Clip => !success && elapsed < CLIP_RUN_TIME,
    }
}

/// Quit token, bounded wait, then forced termination.
async fn stop_encoder(
    child: &mut Child,
    stdin: Option<ChildStdin>,
    grace_period: Duration,
) -> io::Result<ExitStatus> {
    if let Some(status) = child.try_wait()? {
        return Ok(status);
    }

    if let Some(mut stdin) = stdin {
        let sent = async {
            stdin.write_all(QUIT_COMMAND).await?;
            stdin.flush().await
        }
        .await;

        if let Err(e) = sent {
            debug!(error = %e, "Quit token not delivered");
        }
    }

    match timeout(grace_period, child.wait()).await {
        Ok(status) => status,
        Err(_) => {
            warn!(
                grace_ms = grace_period.as_millis() as u64,
                "Encoder ignored quit request, terminating"
            );
            child.kill().await?;
            child.wait().await
        }
    }
}

async fn classify_output(path: &std::path::Path, min_bytes: u64) -> SessionOutcome {
    match output::validate(path, min_bytes).await {
        Ok(bytes) => SessionOutcome::Success {
            path: path.to_path_buf(),
            bytes,
        },
        Err(bytes) => SessionOutcome::Failed(FailureReason::OutputMissingOrTruncated {
            path: path.to_path_buf(),
            bytes,
        }),
    }
}

async fn wait_for_reader(reader: Option<JoinHandle<()>>) {
    if let Some(reader) = reader {
        let _ = timeout(DIAGNOSTIC_DRAIN_TIMEOUT, reader).await;
    }
}

/// Split the diagnostic stream on `\r` and `\n`, log it, and keep its tail.
async fn drain_diagnostics<R>(mut stream: R, tail: Arc<Mutex<DiagnosticTail>>)
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; 4096];
    let mut pending: Vec<u8> = Vec::new();
    let mut last_progress: Option<Instant> = None;

    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };

        for &byte in &chunk[..n] {
            if byte == b'\r' || byte == b'\n' {
                if !pending.is_empty() {
                    handle_line(&String::from_utf8_lossy(&pending), &tail, &mut last_progress);
                    pending.clear();
                }
            } else {
                pending.push(byte);
            }
        }
    }

    if !pending.is_empty() {
        handle_line(&String::from_utf8_lossy(&pending), &tail, &mut last_progress);
    }
}

fn handle_line(line: &str, tail: &Mutex<DiagnosticTail>, last_progress: &mut Option<Instant>) {
    if let Some(progress) = ProgressLine::parse(line) {
        let due = last_progress.is_none_or(|at| at.elapsed() >= PROGRESS_LOG_INTERVAL);
        if due {
            *last_progress = Some(Instant::now());
            debug!(
                frame = progress.frame.as_deref(),
                time = progress.time.as_deref(),
                bitrate = progress.bitrate.as_deref(),
                speed = progress.speed.as_deref(),
                "Encoder progress"
            );
        }
        return;
    }

    debug!(line, "encoder");
    tail.lock().unwrap_or_else(|e| e.into_inner()).push(line);
}
