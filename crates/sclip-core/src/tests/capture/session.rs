use crate::{
    CaptureError, CaptureMode, CaptureSession, EncoderBinary, FailureReason, SessionContext,
    SessionOutcome, SessionPhase, SessionState,
    tests::support::{
        FAILING, FakeEncoder, INSTANT_SUCCESS, OBEDIENT, SELF_EXITING, SHORT_GRACE, STUBBORN,
        TRUNCATED, VANISHING, WEDGED, config, files_in, single_monitor,
    },
};

use std::time::{Duration, Instant};

use tokio::time::{sleep, timeout};

/// Upper bound for any single session in these tests.
const TEST_DEADLINE: Duration = Duration::from_secs(10);

/// Fixed overhead allowed on top of the grace period.
const STOP_OVERHEAD: Duration = Duration::from_secs(2);

/// WHAT: A clip that runs to completion passes through every phase and succeeds
/// WHY: Clip sessions are never stopped by the caller and must still classify the artifact
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_clip_session_when_encoder_completes_then_success_with_clip_artifact() {
    // Given: An encoder that writes a full-size artifact and exits
    let encoder = FakeEncoder::new(INSTANT_SUCCESS);
    let session = CaptureSession::new(CaptureMode::Clip, config(), encoder.context());

    // When: Starting and waiting for the outcome
    session.start().unwrap();
    let outcome = timeout(TEST_DEADLINE, session.wait()).await.unwrap();

    // Then: Success, one clip_ artifact, full phase history
    assert!(
        matches!(&outcome, SessionOutcome::Success { bytes, .. } if *bytes >= 4096),
        "outcome: {outcome:?}"
    );
    let path = session.output_path().unwrap().to_path_buf();
    assert_eq!(files_in(&encoder.output_dir()), vec![path.clone()]);
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("clip_"), "unexpected name {name}");
    assert!(name.ends_with(".mp4"));
    assert_eq!(
        session.transitions(),
        vec![
            SessionPhase::Idle,
            SessionPhase::Launching,
            SessionPhase::Recording,
            SessionPhase::Stopped,
        ]
    );
    assert!(!session.is_active());
}

/// WHAT: A clip whose encoder fails immediately is reported as an early exit
/// WHY: Users need the encoder's own diagnostics when a clip cannot be produced
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_failing_encoder_when_clip_exits_early_then_early_exit_with_diagnostics() {
    // Given: An encoder that prints an error and exits with status 1
    let encoder = FakeEncoder::new(FAILING);
    let session = CaptureSession::new(CaptureMode::Clip, config(), encoder.context());

    // When: Running the clip
    session.start().unwrap();
    let outcome = timeout(TEST_DEADLINE, session.wait()).await.unwrap();

    // Then: EarlyExit carrying the status and the diagnostic line
    assert!(matches!(
        outcome,
        SessionOutcome::Failed(FailureReason::EarlyExit { status: Some(1), .. })
    ));
    let diagnostics = match &outcome {
        SessionOutcome::Failed(FailureReason::EarlyExit { diagnostics, .. }) => diagnostics.clone(),
        _ => Vec::new(),
    };
    assert!(
        diagnostics.iter().any(|l| l.contains("Unknown encoder")),
        "diagnostics: {diagnostics:?}"
    );
}

/// WHAT: A manual recording stops gracefully on request
/// WHY: The quit token must let the encoder finalize the file
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_manual_recording_when_stop_requested_then_success_with_record_artifact() {
    // Given: A running manual session with a cooperative encoder
    let encoder = FakeEncoder::new(OBEDIENT);
    let session = CaptureSession::new(CaptureMode::Manual, config(), encoder.context());
    session.start().unwrap();
    assert!(session.is_active());

    // When: Requesting stop
    session.request_stop();
    let outcome = timeout(TEST_DEADLINE, session.wait()).await.unwrap();

    // Then: Success via Stopping
    assert!(outcome.is_success(), "outcome: {outcome:?}");
    let name = session.output_path().unwrap().file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("record_"));
    assert_eq!(
        session.transitions(),
        vec![
            SessionPhase::Idle,
            SessionPhase::Launching,
            SessionPhase::Recording,
            SessionPhase::Stopping,
            SessionPhase::Stopped,
        ]
    );
}

/// WHAT: An encoder that ignores the quit token is killed after the grace period
/// WHY: A wedged encoder must never leave the session stuck in Stopping
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_stubborn_encoder_when_stop_requested_then_stopped_within_grace_plus_overhead() {
    // Given: A running session whose encoder never exits on its own
    let encoder = FakeEncoder::new(STUBBORN);
    let session = CaptureSession::new(CaptureMode::Manual, config(), encoder.context());
    session.start().unwrap();
    sleep(Duration::from_millis(100)).await;

    // When: Requesting stop
    let requested_at = Instant::now();
    session.request_stop();
    let outcome = timeout(TEST_DEADLINE, session.wait()).await.unwrap();

    // Then: Stopped in bounded time, and the artifact written before the kill is accepted
    assert!(requested_at.elapsed() < SHORT_GRACE + STOP_OVERHEAD);
    assert!(outcome.is_success(), "outcome: {outcome:?}");
    assert!(matches!(session.state(), SessionState::Stopped(_)));
}

/// WHAT: Stop requests outside Launching/Recording are silently ignored
/// WHY: Callers may stop idempotently without tracking session state
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_idle_or_stopped_session_when_stop_requested_then_no_op() {
    // Given: An idle session
    let encoder = FakeEncoder::new(INSTANT_SUCCESS);
    let session = CaptureSession::new(CaptureMode::Clip, config(), encoder.context());

    // When: Requesting stop before start
    session.request_stop();

    // Then: Still idle
    assert_eq!(session.state(), SessionState::Idle);

    // And when: Requesting stop after the session has finished
    session.start().unwrap();
    let outcome = timeout(TEST_DEADLINE, session.wait()).await.unwrap();
    session.request_stop();
    session.request_stop();

    // Then: Outcome unchanged, no extra transitions
    assert_eq!(session.state(), SessionState::Stopped(outcome));
    assert_eq!(session.transitions().last(), Some(&SessionPhase::Stopped));
    assert_eq!(session.transitions().len(), 4);
}

/// WHAT: Starting a session twice is rejected
/// WHY: A session owns exactly one encoder process
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_running_session_when_started_again_then_invalid_state() {
    // Given: A running session
    let encoder = FakeEncoder::new(OBEDIENT);
    let session = CaptureSession::new(CaptureMode::Manual, config(), encoder.context());
    session.start().unwrap();

    // When: Starting again
    let result = session.start();

    // Then: InvalidState naming the current phase
    assert!(matches!(
        result,
        Err(CaptureError::InvalidState {
            operation: "start",
            phase: SessionPhase::Recording,
            ..
        })
    ));

    session.request_stop();
    timeout(TEST_DEADLINE, session.wait()).await.unwrap();
}

/// WHAT: A missing encoder binary fails the start synchronously
/// WHY: Launch errors are fatal and must not leave a session half-started
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_missing_binary_when_starting_then_launch_failed_and_session_stopped() {
    // Given: A context pointing at a binary that does not exist
    let encoder = FakeEncoder::new(INSTANT_SUCCESS);
    let context = SessionContext::new(
        EncoderBinary::at("/nonexistent/sclip/ffmpeg"),
        single_monitor(),
        encoder.output_dir(),
    );
    let session = CaptureSession::new(CaptureMode::Clip, config(), context);

    // When: Starting
    let result = session.start();

    // Then: LaunchFailed and a terminal Launch failure
    assert!(matches!(result, Err(CaptureError::LaunchFailed { .. })));
    assert!(matches!(
        session.state(),
        SessionState::Stopped(SessionOutcome::Failed(FailureReason::Launch { .. }))
    ));
    assert_eq!(
        session.transitions(),
        vec![SessionPhase::Idle, SessionPhase::Launching, SessionPhase::Stopped]
    );
    assert!(!session.is_active());
}

/// WHAT: A tiny artifact is reported as truncated
/// WHY: A clean exit does not prove the file is playable
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_truncated_artifact_when_clip_completes_then_output_missing_or_truncated() {
    // Given: An encoder that writes five bytes and exits 0
    let encoder = FakeEncoder::new(TRUNCATED);
    let session = CaptureSession::new(CaptureMode::Clip, config(), encoder.context());

    // When: Running the clip
    session.start().unwrap();
    let outcome = timeout(TEST_DEADLINE, session.wait()).await.unwrap();

    // Then: Failed with the observed size
    assert!(matches!(
        outcome,
        SessionOutcome::Failed(FailureReason::OutputMissingOrTruncated { bytes: Some(5), .. })
    ));
}

/// WHAT: A manual recording that ends by itself is an early exit
/// WHY: Only a stop request may end a manual recording successfully
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_manual_recording_when_encoder_exits_unasked_then_early_exit() {
    // Given: An encoder that exits 0 right away
    let encoder = FakeEncoder::new(VANISHING);
    let session = CaptureSession::new(CaptureMode::Manual, config(), encoder.context());

    // When: Recording without a stop request
    session.start().unwrap();
    let outcome = timeout(TEST_DEADLINE, session.wait()).await.unwrap();

    // Then: EarlyExit with status 0
    assert!(matches!(
        outcome,
        SessionOutcome::Failed(FailureReason::EarlyExit { status: Some(0), .. })
    ));
}

/// WHAT: Dropping the last handle stops the encoder gracefully
/// WHY: An abandoned session must not leave a capture process running
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_running_session_when_last_handle_dropped_then_encoder_finalizes_output() {
    // Given: A running manual session
    let encoder = FakeEncoder::new(OBEDIENT);
    let session = CaptureSession::new(CaptureMode::Manual, config(), encoder.context());
    session.start().unwrap();
    let path = session.output_path().unwrap().to_path_buf();

    // When: Dropping the handle
    drop(session);

    // Then: The quit token reaches the encoder and the artifact appears
    let appeared = timeout(TEST_DEADLINE, async {
        while std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0) < 4096 {
            sleep(Duration::from_millis(50)).await;
        }
    })
    .await;
    assert!(appeared.is_ok());
}

/// WHAT: An unknown monitor falls back to full-desktop capture
/// WHY: A stale monitor choice must not abort the session
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_unknown_monitor_when_starting_then_session_still_records() {
    // Given: Monitor 9 selected while only one monitor exists
    let encoder = FakeEncoder::new(INSTANT_SUCCESS);
    let config = config().with_monitor("Monitor 9").unwrap();
    let session = CaptureSession::new(CaptureMode::Clip, config, encoder.context());

    // When: Starting
    let result = session.start();

    // Then: The session starts and completes normally
    assert!(result.is_ok());
    let outcome = timeout(TEST_DEADLINE, session.wait()).await.unwrap();
    assert!(outcome.is_success(), "outcome: {outcome:?}");
}

/// WHAT: Starting outside a tokio runtime is an error, not a panic
/// WHY: Supervision needs a runtime to run on
#[test]
fn given_no_runtime_when_starting_then_no_runtime_error() {
    // Given: A session created on a plain thread
    let encoder = FakeEncoder::new(INSTANT_SUCCESS);
    let session = CaptureSession::new(CaptureMode::Clip, config(), encoder.context());

    // When: Starting
    let result = session.start();

    // Then: NoRuntime and still idle
    assert!(matches!(result, Err(CaptureError::NoRuntime { .. })));
    assert_eq!(session.state(), SessionState::Idle);
}

/// WHAT: A clip whose encoder hangs is stopped once the clip deadline passes
/// WHY: A stalled capture device must not leave the session stuck in Recording
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_wedged_clip_encoder_when_deadline_passes_then_stopped_and_output_classified() {
    // Given: A clip encoder that writes its artifact and then never exits
    let encoder = FakeEncoder::new(WEDGED);
    let clip_deadline = Duration::from_millis(500);
    let session = CaptureSession::new(
        CaptureMode::Clip,
        config(),
        encoder.context_with_clip_deadline(clip_deadline),
    );

    // When: Starting and waiting without ever requesting a stop
    let started_at = Instant::now();
    session.start().unwrap();
    let outcome = timeout(TEST_DEADLINE, session.wait()).await.unwrap();

    // Then: Stopped within deadline + grace, judged by the artifact on disk
    assert!(started_at.elapsed() < clip_deadline + SHORT_GRACE + STOP_OVERHEAD);
    assert!(outcome.is_success(), "outcome: {outcome:?}");
    assert_eq!(
        session.transitions(),
        vec![
            SessionPhase::Idle,
            SessionPhase::Launching,
            SessionPhase::Recording,
            SessionPhase::Stopping,
            SessionPhase::Stopped,
        ]
    );
    assert!(!session.is_active());
}

/// WHAT: A stop request racing the encoder's own exit yields one consistent outcome
/// WHY: The process must be reaped and classified exactly once whichever side wins
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_encoder_exiting_on_its_own_when_stop_requested_concurrently_then_single_outcome() {
    // Given: Stop timings before, around, and after a ~50 ms natural exit
    for delay_ms in [0u64, 20, 40, 50, 60, 80, 150] {
        let encoder = FakeEncoder::new(SELF_EXITING);
        let session = CaptureSession::new(CaptureMode::Manual, config(), encoder.context());
        session.start().unwrap();

        // When: Requesting stop while the encoder may be exiting
        sleep(Duration::from_millis(delay_ms)).await;
        session.request_stop();
        let outcome = timeout(TEST_DEADLINE, session.wait()).await.unwrap();

        // Then: One terminal transition, agreeing views of the outcome
        let transitions = session.transitions();
        let stopped = transitions
            .iter()
            .filter(|p| **p == SessionPhase::Stopped)
            .count();
        assert_eq!(stopped, 1, "delay {delay_ms} ms: {transitions:?}");
        assert_eq!(
            session.state(),
            SessionState::Stopped(outcome.clone()),
            "delay {delay_ms} ms"
        );

        // A stop accepted before the exit was recorded is never an early exit
        if transitions.contains(&SessionPhase::Stopping) {
            assert!(
                outcome.is_success(),
                "delay {delay_ms} ms: stop accepted but outcome {outcome:?}"
            );
        } else {
            assert!(
                matches!(outcome, SessionOutcome::Failed(FailureReason::EarlyExit { .. })),
                "delay {delay_ms} ms: unexpected outcome {outcome:?}"
            );
        }
    }
}
