use crate::MonitorGeometry;

use std::fmt;

const DEFAULT_X11_DISPLAY: &str = ":0.0";

/// Encoder input devices used to grab the screen and audio on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureBackend {
    /// Windows: `gdigrab` for video, `dshow` for audio.
    Gdigrab,
    /// Linux/X11: `x11grab` for video, `pulse` for audio.
    X11grab {
        /// X display to grab, e.g. `:0.0`.
        display: String,
    },
    /// macOS: `avfoundation` for both.
    Avfoundation,
}

impl CaptureBackend {
    /// Backend for the platform this binary was built for.
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            CaptureBackend::Gdigrab
        } else if cfg!(target_os = "macos") {
            CaptureBackend::Avfoundation
        } else {
            let display = std::env::var("DISPLAY")
                .ok()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_X11_DISPLAY.to_string());
            CaptureBackend::X11grab { display }
        }
    }

    /// Input arguments for a screen region. `screen_index` is the
    /// enumeration position of the monitor, used by backends that address
    /// screens by index rather than by offset.
    pub(crate) fn video_input(
        &self,
        fps: u32,
        region: MonitorGeometry,
        screen_index: usize,
    ) -> Vec<String> {
        let fps = fps.to_string();
        let size = format!("{}x{}", region.width, region.height);

        match self {
            CaptureBackend::Gdigrab => vec![
                "-f".into(),
                "gdigrab".into(),
                "-framerate".into(),
                fps,
                "-offset_x".into(),
                region.x.to_string(),
                "-offset_y".into(),
                region.y.to_string(),
                "-video_size".into(),
                size,
                "-draw_mouse".into(),
                "1".into(),
                "-i".into(),
                "desktop".into(),
            ],
            CaptureBackend::X11grab { display } => vec![
                "-f".into(),
                "x11grab".into(),
                "-framerate".into(),
                fps,
                "-video_size".into(),
                size,
                "-draw_mouse".into(),
                "1".into(),
                "-i".into(),
                // x11grab offsets are unsigned root-window coordinates.
                format!("{display}+{},{}", region.x.max(0), region.y.max(0)),
            ],
            CaptureBackend::Avfoundation => vec![
                "-f".into(),
                "avfoundation".into(),
                "-framerate".into(),
                fps,
                "-capture_cursor".into(),
                "1".into(),
                "-i".into(),
                format!("Capture screen {screen_index}:none"),
            ],
        }
    }

    /// Input arguments for a named audio device.
    pub(crate) fn audio_input(&self, device: &str) -> Vec<String> {
        match self {
            CaptureBackend::Gdigrab => vec![
                "-f".into(),
                "dshow".into(),
                "-i".into(),
                format!("audio={device}"),
            ],
            CaptureBackend::X11grab { .. } => {
                vec!["-f".into(), "pulse".into(), "-i".into(), device.to_string()]
            }
            CaptureBackend::Avfoundation => vec![
                "-f".into(),
                "avfoundation".into(),
                "-i".into(),
                format!(":{device}"),
            ],
        }
    }

    /// Arguments that make the encoder print its audio device list.
    pub(crate) fn list_devices_args(&self) -> &'static [&'static str] {
        match self {
            CaptureBackend::Gdigrab => &[
                "-hide_banner",
                "-list_devices",
                "true",
                "-f",
                "dshow",
                "-i",
                "dummy",
            ],
            CaptureBackend::X11grab { .. } => &["-hide_banner", "-sources", "pulse"],
            CaptureBackend::Avfoundation => &[
                "-hide_banner",
                "-f",
                "avfoundation",
                "-list_devices",
                "true",
                "-i",
                "",
            ],
        }
    }
}

impl fmt::Display for CaptureBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureBackend::Gdigrab => f.write_str("gdigrab"),
            CaptureBackend::X11grab { display } => write!(f, "x11grab({display})"),
            CaptureBackend::Avfoundation => f.write_str("avfoundation"),
        }
    }
}
