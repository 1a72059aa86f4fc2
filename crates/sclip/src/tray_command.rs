use crate::TrayIconState;

use std::sync::mpsc::SyncSender;

use sclip_core::MonitorGeometry;

/// Commands sent from the async runtime to the main UI thread.
///
/// The main thread owns `TrayManager` (because `TrayIcon` is `!Send`) and
/// the event loop that knows the display topology, so tray mutations and
/// monitor queries flow through this enum.
#[derive(Debug, Clone)]
pub enum TrayCommand {
    /// Update the tray icon to a new state.
    SetState(TrayIconState),
    /// Reply with the current display geometry.
    QueryMonitors(SyncSender<Vec<MonitorGeometry>>),
    /// Shut down the application. The main thread will exit the event loop.
    Shutdown,
}
