//! Strongly typed capture configuration.
//!
//! Every value that reaches the command builder has been validated here;
//! nothing downstream falls back to a silent default.

use crate::{CaptureError, CaptureSettings, CoreResult};

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Lowest accepted frame rate.
pub const MIN_FPS: u32 = 1;
/// Highest accepted frame rate.
pub const MAX_FPS: u32 = 240;

const MONITOR_LABEL_PREFIX: &str = "Monitor ";

const X264_PRESETS: &[&str] = &[
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
];

const NVENC_PRESETS: &[&str] = &[
    "p1", "p2", "p3", "p4", "p5", "p6", "p7", "fast", "medium", "slow",
];

/// Output frame size, parsed from `"WxH"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FromStr for Resolution {
    type Err = CaptureError;

    #[track_caller]
    fn from_str(s: &str) -> CoreResult<Self> {
        let trimmed = s.trim();
        let (w, h) = trimmed
            .split_once(['x', 'X'])
            .ok_or_else(|| CaptureError::invalid_config(format!("resolution {s:?} is not WxH")))?;

        let parse = |part: &str| -> Option<u32> { part.trim().parse::<u32>().ok().filter(|v| *v > 0) };

        match (parse(w), parse(h)) {
            (Some(width), Some(height)) => Ok(Self { width, height }),
            _ => Err(CaptureError::invalid_config(format!(
                "resolution {s:?} must be two positive integers"
            ))),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Frames per second, bounded to `MIN_FPS..=MAX_FPS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRate(u32);

impl FrameRate {
    /// Frames per second.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for FrameRate {
    type Error = CaptureError;

    #[track_caller]
    fn try_from(fps: u32) -> CoreResult<Self> {
        if (MIN_FPS..=MAX_FPS).contains(&fps) {
            Ok(Self(fps))
        } else {
            Err(CaptureError::invalid_config(format!(
                "frame rate {fps} outside {MIN_FPS}..={MAX_FPS}"
            )))
        }
    }
}

/// Video encoders the controller knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VideoEncoder {
    /// Software H.264 (`libx264`).
    SoftwareH264,
    /// NVIDIA hardware H.264 (`h264_nvenc`).
    HardwareH264,
    /// NVIDIA hardware H.265 (`hevc_nvenc`).
    HardwareH265,
}

impl VideoEncoder {
    /// All supported encoders, in menu order.
    pub const ALL: [VideoEncoder; 3] = [
        VideoEncoder::SoftwareH264,
        VideoEncoder::HardwareH264,
        VideoEncoder::HardwareH265,
    ];

    /// Codec name passed to the encoder's `-c:v`.
    pub fn codec(self) -> &'static str {
        match self {
            VideoEncoder::SoftwareH264 => "libx264",
            VideoEncoder::HardwareH264 => "h264_nvenc",
            VideoEncoder::HardwareH265 => "hevc_nvenc",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            VideoEncoder::SoftwareH264 => "software H.264",
            VideoEncoder::HardwareH264 => "hardware H.264",
            VideoEncoder::HardwareH265 => "hardware H.265",
        }
    }

    /// Presets that are valid for this encoder.
    pub fn presets(self) -> &'static [&'static str] {
        match self {
            VideoEncoder::SoftwareH264 => X264_PRESETS,
            VideoEncoder::HardwareH264 | VideoEncoder::HardwareH265 => NVENC_PRESETS,
        }
    }

    /// Preset offered when the user has not chosen one.
    pub fn default_preset(self) -> &'static str {
        match self {
            VideoEncoder::SoftwareH264 => "ultrafast",
            VideoEncoder::HardwareH264 | VideoEncoder::HardwareH265 => "p4",
        }
    }

    /// Whether `preset` belongs to this encoder's preset set.
    pub fn supports_preset(self, preset: &str) -> bool {
        self.presets().contains(&preset)
    }

    /// Rate-control arguments; quality is fixed policy.
    pub(crate) fn quality_args(self) -> &'static [&'static str] {
        match self {
            VideoEncoder::SoftwareH264 => &["-crf", "18"],
            VideoEncoder::HardwareH264 | VideoEncoder::HardwareH265 => &["-rc", "vbr", "-cq", "18"],
        }
    }
}

impl FromStr for VideoEncoder {
    type Err = CaptureError;

    #[track_caller]
    fn from_str(s: &str) -> CoreResult<Self> {
        let wanted = s.trim();
        VideoEncoder::ALL
            .into_iter()
            .find(|e| e.codec().eq_ignore_ascii_case(wanted) || e.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CaptureError::invalid_config(format!("unknown encoder {s:?}")))
    }
}

impl TryFrom<String> for VideoEncoder {
    type Error = CaptureError;

    fn try_from(s: String) -> CoreResult<Self> {
        s.parse()
    }
}

impl From<VideoEncoder> for String {
    fn from(encoder: VideoEncoder) -> Self {
        encoder.codec().to_string()
    }
}

impl fmt::Display for VideoEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.codec())
    }
}

/// Validated capture configuration. Immutable once a session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    resolution: Resolution,
    frame_rate: FrameRate,
    encoder: VideoEncoder,
    preset: String,
    monitor: Option<String>,
    audio_input: Option<String>,
    audio_output: Option<String>,
}

impl CaptureConfig {
    /// Create a video-only, full-desktop configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::InvalidConfig`] when `preset` is not in the
    /// encoder's preset set.
    #[track_caller]
    pub fn new(
        resolution: Resolution,
        frame_rate: FrameRate,
        encoder: VideoEncoder,
        preset: impl Into<String>,
    ) -> CoreResult<Self> {
        let preset = preset.into();
        check_preset(encoder, &preset)?;

        Ok(Self {
            resolution,
            frame_rate,
            encoder,
            preset,
            monitor: None,
            audio_input: None,
            audio_output: None,
        })
    }

    /// Select a monitor by label (`Monitor N`).
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::InvalidConfig`] for a malformed label. A
    /// well-formed label that matches no monitor is accepted here and falls
    /// back to full-desktop capture at build time.
    #[track_caller]
    pub fn with_monitor(mut self, label: impl Into<String>) -> CoreResult<Self> {
        let label = label.into();
        monitor_index(&label)?;
        self.monitor = Some(label);
        Ok(self)
    }

    /// Record audio from the named input device.
    #[track_caller]
    pub fn with_audio_input(mut self, device: impl Into<String>) -> CoreResult<Self> {
        self.audio_input = Some(non_empty_device("audio input", device.into())?);
        Ok(self)
    }

    /// Remember the named output (loopback) device.
    #[track_caller]
    pub fn with_audio_output(mut self, device: impl Into<String>) -> CoreResult<Self> {
        self.audio_output = Some(non_empty_device("audio output", device.into())?);
        Ok(self)
    }

    /// Output frame size.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Capture frame rate.
    pub fn frame_rate(&self) -> FrameRate {
        self.frame_rate
    }

    /// Selected video encoder.
    pub fn encoder(&self) -> VideoEncoder {
        self.encoder
    }

    /// Selected preset (always valid for [`encoder`](Self::encoder)).
    pub fn preset(&self) -> &str {
        &self.preset
    }

    /// Selected monitor label.
    pub fn monitor(&self) -> Option<&str> {
        self.monitor.as_deref()
    }

    /// Audio input device.
    pub fn audio_input(&self) -> Option<&str> {
        self.audio_input.as_deref()
    }

    /// Audio output device.
    pub fn audio_output(&self) -> Option<&str> {
        self.audio_output.as_deref()
    }
}

impl TryFrom<&CaptureSettings> for CaptureConfig {
    type Error = CaptureError;

    #[track_caller]
    fn try_from(settings: &CaptureSettings) -> CoreResult<Self> {
        let mut config = CaptureConfig::new(
            settings.resolution.parse()?,
            FrameRate::try_from(settings.fps)?,
            settings.encoder.parse()?,
            settings.preset.trim(),
        )?;

        // The settings editor writes empty strings for "none".
        if let Some(label) = present(&settings.monitor) {
            config = config.with_monitor(label)?;
        }
        if let Some(device) = present(&settings.audio_input) {
            config = config.with_audio_input(device)?;
        }
        if let Some(device) = present(&settings.audio_output) {
            config = config.with_audio_output(device)?;
        }

        Ok(config)
    }
}

/// Zero-based monitor index encoded in a `Monitor N` label.
#[track_caller]
pub(crate) fn monitor_index(label: &str) -> CoreResult<usize> {
    label
        .strip_prefix(MONITOR_LABEL_PREFIX)
        .and_then(|n| n.parse::<usize>().ok())
        .filter(|n| *n >= 1)
        .map(|n| n - 1)
        .ok_or_else(|| CaptureError::invalid_config(format!("monitor label {label:?} is not 'Monitor N'")))
}

/// Label for the monitor at zero-based `index`.
pub(crate) fn monitor_label(index: usize) -> String {
    format!("{MONITOR_LABEL_PREFIX}{}", index + 1)
}

#[track_caller]
pub(crate) fn check_preset(encoder: VideoEncoder, preset: &str) -> CoreResult<()> {
    if encoder.supports_preset(preset) {
        Ok(())
    } else {
        Err(CaptureError::invalid_config(format!(
            "preset {preset:?} is not available for {} (expected one of: {})",
            encoder.codec(),
            encoder.presets().join(", ")
        )))
    }
}

#[track_caller]
fn non_empty_device(kind: &str, device: String) -> CoreResult<String> {
    let trimmed = device.trim();
    if trimmed.is_empty() {
        return Err(CaptureError::invalid_config(format!("{kind} device name is empty")));
    }
    Ok(trimmed.to_string())
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
