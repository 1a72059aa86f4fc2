mod backend;
mod command;
pub(crate) mod config;
mod locator;
mod manager;
pub(crate) mod mode;
mod outcome;
pub(crate) mod output;
pub(crate) mod progress;
mod session;
mod settings;
pub(crate) mod supervisor;

pub use {
    backend::CaptureBackend,
    command::{CaptureRegion, EncoderCommand, EncoderCommandBuilder},
    config::{CaptureConfig, FrameRate, MAX_FPS, MIN_FPS, Resolution, VideoEncoder},
    locator::{ENCODER_ENV_VAR, EncoderBinary, EncoderLocator},
    manager::{ClipTrigger, SessionManager},
    mode::{
        CLIP_DEADLINE_MARGIN, CLIP_DURATION, CLIP_LEADING_SKIP, CLIP_RUN_TIME, CaptureMode,
    },
    outcome::{FailureReason, SessionOutcome, SessionPhase, SessionState},
    output::{MIN_OUTPUT_BYTES, OUTPUT_EXTENSION, output_path},
    session::{CaptureSession, DEFAULT_GRACE_PERIOD, SessionContext, SessionOptions},
    settings::{
        CaptureSettings, DEFAULT_ENCODER, DEFAULT_FPS, DEFAULT_HOTKEY, DEFAULT_PRESET,
        DEFAULT_RESOLUTION,
    },
};
