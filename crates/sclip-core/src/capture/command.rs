//! Encoder argument construction.
//!
//! Building is pure: no process is spawned and no file is touched. The only
//! side effect is a warning when a requested monitor has to be replaced by
//! full-desktop capture.

use crate::{
    capture::{
        CaptureBackend, CaptureConfig, CaptureMode,
        config::check_preset,
        mode::{CLIP_DURATION, CLIP_LEADING_SKIP},
    },
    {CoreResult, MonitorGeometry, MonitorMap},
};

use std::{
    ffi::{OsStr, OsString},
    path::Path,
};

use tracing::warn;

const PIXEL_FORMAT: &str = "yuv420p";
const AUDIO_CODEC: &str = "aac";
const AUDIO_BITRATE: &str = "160k";
const CONTAINER: &str = "mp4";

/// Screen area a command captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureRegion {
    /// A specific enumerated monitor.
    Monitor {
        /// Label such as `Monitor 2`.
        label: String,
        /// Geometry reported for that monitor.
        geometry: MonitorGeometry,
    },
    /// The whole virtual desktop from (0,0) at the configured resolution.
    FullDesktop {
        /// Monitor that was asked for but not found, if any.
        requested: Option<String>,
        /// Region actually captured.
        geometry: MonitorGeometry,
    },
}

impl CaptureRegion {
    /// True when a requested monitor was replaced by full-desktop capture.
    pub fn substituted(&self) -> bool {
        matches!(self, CaptureRegion::FullDesktop { requested: Some(_), .. })
    }

    /// Geometry actually captured.
    pub fn geometry(&self) -> MonitorGeometry {
        match self {
            CaptureRegion::Monitor { geometry, .. } | CaptureRegion::FullDesktop { geometry, .. } => {
                *geometry
            }
        }
    }
}

/// A complete encoder invocation, minus the program path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderCommand {
    args: Vec<OsString>,
    region: CaptureRegion,
}

impl EncoderCommand {
    /// Start building the invocation for `config` in `mode`, writing to `output`.
    pub fn builder<'a>(
        config: &'a CaptureConfig,
        mode: CaptureMode,
        output: &'a Path,
    ) -> EncoderCommandBuilder<'a> {
        EncoderCommandBuilder {
            config,
            mode,
            output,
            backend: CaptureBackend::host(),
            monitors: None,
        }
    }

    /// Argument vector, passed to the encoder without shell interpretation.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Region the command captures.
    pub fn region(&self) -> &CaptureRegion {
        &self.region
    }

    /// Whether a requested monitor was replaced by full-desktop capture.
    pub fn substituted(&self) -> bool {
        self.region.substituted()
    }

    /// Whether the invocation records an audio track.
    pub fn has_audio(&self) -> bool {
        self.args.iter().any(|a| a == "1:a")
    }
}

/// Builder for [`EncoderCommand`].
#[derive(Debug)]
pub struct EncoderCommandBuilder<'a> {
    config: &'a CaptureConfig,
    mode: CaptureMode,
    output: &'a Path,
    backend: CaptureBackend,
    monitors: Option<&'a MonitorMap>,
}

impl<'a> EncoderCommandBuilder<'a> {
    /// Override the host capture backend.
    pub fn with_backend(mut self, backend: CaptureBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Monitors available for resolving `config.monitor()`.
    pub fn with_monitors(mut self, monitors: &'a MonitorMap) -> Self {
        self.monitors = Some(monitors);
        self
    }

    /// Produce the argument vector.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::InvalidConfig`](crate::CaptureError::InvalidConfig)
    /// when the preset does not belong to the encoder.
    #[track_caller]
    pub fn build(self) -> CoreResult<EncoderCommand> {
        let config = self.config;
        let encoder = config.encoder();
        check_preset(encoder, config.preset())?;

        let (region, screen_index) = self.resolve_region();
        let resolution = config.resolution();

        let mut args: Vec<OsString> = vec!["-hide_banner".into(), "-y".into()];

        args.extend(
            self.backend
                .video_input(config.frame_rate().get(), region.geometry(), screen_index)
                .into_iter()
                .map(OsString::from),
        );

        let audio = config.audio_input();
        if let Some(device) = audio {
            args.extend(self.backend.audio_input(device).into_iter().map(OsString::from));
        }

        if self.mode == CaptureMode::Clip {
            let skip = CLIP_LEADING_SKIP.as_secs().to_string();
            let duration = CLIP_DURATION.as_secs().to_string();
            push_all(&mut args, &["-ss", skip.as_str(), "-t", duration.as_str()]);
        }

        push_all(&mut args, &["-map", "0:v"]);
        if audio.is_some() {
            push_all(&mut args, &["-map", "1:a"]);
        }

        push_all(&mut args, &["-c:v", encoder.codec(), "-preset", config.preset()]);
        push_all(&mut args, encoder.quality_args());
        let size = resolution.to_string();
        push_all(&mut args, &["-s", size.as_str(), "-pix_fmt", PIXEL_FORMAT]);

        if audio.is_some() {
            push_all(&mut args, &["-c:a", AUDIO_CODEC, "-b:a", AUDIO_BITRATE]);
        }

        push_all(&mut args, &["-movflags", "+faststart", "-f", CONTAINER]);
        args.push(self.output.as_os_str().to_os_string());

        Ok(EncoderCommand { args, region })
    }

    fn resolve_region(&self) -> (CaptureRegion, usize) {
        let resolution = self.config.resolution();
        let full_desktop = MonitorGeometry {
            x: 0,
            y: 0,
            width: resolution.width,
            height: resolution.height,
        };

        let Some(label) = self.config.monitor() else {
            return (
                CaptureRegion::FullDesktop {
                    requested: None,
                    geometry: full_desktop,
                },
                0,
            );
        };

        let found = self
            .monitors
            .and_then(|m| m.get(label).zip(m.position(label)));

        match found {
            Some((geometry, index)) => (
                CaptureRegion::Monitor {
                    label: label.to_string(),
                    geometry,
                },
                index,
            ),
            None => {
                warn!(
                    monitor = label,
                    available = self.monitors.map_or(0, MonitorMap::len),
                    "Monitor not found, substituting full-desktop capture"
                );
                (
                    CaptureRegion::FullDesktop {
                        requested: Some(label.to_string()),
                        geometry: full_desktop,
                    },
                    0,
                )
            }
        }
    }
}

fn push_all<S: AsRef<OsStr>>(args: &mut Vec<OsString>, items: &[S]) {
    args.extend(items.iter().map(|s| s.as_ref().to_os_string()));
}
