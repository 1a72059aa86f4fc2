/// Tray icon states corresponding to capture activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayIconState {
    /// Nothing is being captured.
    Idle,
    /// A manual recording is running.
    Recording,
    /// A fixed-length clip is being captured.
    Clipping,
}

impl TrayIconState {
    /// Tooltip shown for this state.
    pub fn tooltip(self) -> &'static str {
        match self {
            TrayIconState::Idle => "S-Clip - Ready",
            TrayIconState::Recording => "S-Clip - Recording...",
            TrayIconState::Clipping => "S-Clip - Saving clip...",
        }
    }

    /// Whether a new clip or recording may be started from the menu.
    pub fn can_start(self) -> bool {
        self == TrayIconState::Idle
    }

    /// Whether "Stop Recording" is offered. A running clip can be stopped
    /// early too; it keeps whatever was encoded so far.
    pub fn can_stop(self) -> bool {
        self != TrayIconState::Idle
    }
}
