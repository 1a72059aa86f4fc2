use serde::{Deserialize, Serialize};

/// Default capture resolution.
pub const DEFAULT_RESOLUTION: &str = "1920x1080";
/// Default capture frame rate.
pub const DEFAULT_FPS: u32 = 30;
/// Default video encoder (software H.264).
pub const DEFAULT_ENCODER: &str = "libx264";
/// Default preset for the default encoder.
pub const DEFAULT_PRESET: &str = "ultrafast";
/// Default clip hotkey label.
pub const DEFAULT_HOTKEY: &str = "F5";

/// Capture settings as persisted by the settings store.
///
/// Loosely typed on purpose: this is what a settings editor writes. Convert
/// to a [`CaptureConfig`](crate::CaptureConfig) with `TryFrom` before use;
/// that conversion is where every field gets validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Output resolution as `"WxH"`.
    #[serde(default = "default_resolution")]
    pub resolution: String,

    /// Frames per second.
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Encoder codec name or label (e.g. `libx264`, `hardware H.265`).
    #[serde(default = "default_encoder")]
    pub encoder: String,

    /// Encoder preset; must belong to the encoder's preset set.
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Audio input device name (None = no audio track).
    #[serde(default)]
    pub audio_input: Option<String>,

    /// Audio output (loopback) device name.
    #[serde(default)]
    pub audio_output: Option<String>,

    /// Monitor label such as `Monitor 1` (None = full desktop).
    #[serde(default)]
    pub monitor: Option<String>,

    /// Whether the clip hotkey is allowed to save clips.
    #[serde(default)]
    pub replay_buffer: bool,

    /// Hotkey label for the clip trigger.
    #[serde(default = "default_hotkey")]
    pub hotkey: String,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            fps: DEFAULT_FPS,
            encoder: default_encoder(),
            preset: default_preset(),
            audio_input: None,
            audio_output: None,
            monitor: None,
            replay_buffer: false,
            hotkey: default_hotkey(),
        }
    }
}

fn default_resolution() -> String {
    DEFAULT_RESOLUTION.to_string()
}

fn default_fps() -> u32 {
    DEFAULT_FPS
}

fn default_encoder() -> String {
    DEFAULT_ENCODER.to_string()
}

fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}

fn default_hotkey() -> String {
    DEFAULT_HOTKEY.to_string()
}
