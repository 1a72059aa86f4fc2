/// Commands sent from the hotkey handler and tray menu to the main application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Hotkey clip request; honoured only when clip saving is enabled.
    TriggerClip,
    /// Capture a clip now (tray menu), regardless of the hotkey gate.
    CaptureClip,
    /// Start an unbounded recording.
    StartRecording,
    /// Stop the active recording.
    StopRecording,
    /// Request application shutdown.
    Shutdown,
}
