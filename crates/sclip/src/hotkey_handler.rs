//! Global clip hotkey.
//!
//! Registers the configured function key as a global hotkey and forwards
//! presses to the application as [`AppCommand::TriggerClip`]. Whether a
//! press actually saves a clip is decided by the session manager.

use crate::{AppCommand, AppError, AppResult};

use std::{panic::Location, time::Duration};

use error_location::ErrorLocation;
use global_hotkey::{
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
    hotkey::{Code, HotKey},
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

/// Map a hotkey label (`F1` through `F12`) to its key code.
///
/// Labels are matched case-insensitively. Anything else is a configuration
/// error; there is no fallback key.
#[track_caller]
pub fn parse_hotkey(label: &str) -> AppResult<Code> {
    let code = match label.trim().to_ascii_uppercase().as_str() {
        "F1" => Code::F1,
        "F2" => Code::F2,
        "F3" => Code::F3,
        "F4" => Code::F4,
        "F5" => Code::F5,
        "F6" => Code::F6,
        "F7" => Code::F7,
        "F8" => Code::F8,
        "F9" => Code::F9,
        "F10" => Code::F10,
        "F11" => Code::F11,
        "F12" => Code::F12,
        _ => {
            return Err(AppError::ConfigError {
                reason: format!("Unknown hotkey '{}': expected F1 through F12", label),
                location: ErrorLocation::from(Location::caller()),
            });
        }
    };

    Ok(code)
}

/// Listens for the registered clip hotkey.
pub struct HotkeyHandler {
    hotkey_id: u32,
    command_tx: mpsc::Sender<AppCommand>,
}

impl HotkeyHandler {
    /// Register `label` as the global clip hotkey.
    ///
    /// Must be called on a thread with a message pump (e.g. the main thread
    /// running a `tao` event loop) so that `WM_HOTKEY` messages are
    /// dispatched on Windows. The returned [`GlobalHotKeyManager`] must be
    /// kept alive on that thread for the hotkey to remain registered.
    #[track_caller]
    #[instrument]
    pub fn register_hotkey(label: &str) -> AppResult<(GlobalHotKeyManager, u32)> {
        let code = parse_hotkey(label)?;

        let manager =
            GlobalHotKeyManager::new().map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!("Failed to create manager: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let hotkey = HotKey::new(None, code);

        manager
            .register(hotkey)
            .map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!("Failed to register {}: {}", label, e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(hotkey = label, "Global hotkey registered");

        Ok((manager, hotkey.id()))
    }

    /// Create a handler for a previously registered hotkey.
    ///
    /// The `hotkey_id` should come from [`register_hotkey`](Self::register_hotkey).
    /// This struct is `Send` and can live on any thread; it only listens on
    /// the global [`GlobalHotKeyEvent`] channel.
    pub fn new(hotkey_id: u32, command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self {
            hotkey_id,
            command_tx,
        }
    }

    /// Run the hotkey handler event loop until shutdown is signalled.
    #[instrument(skip(self))]
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let receiver = GlobalHotKeyEvent::receiver().clone();
        let (event_tx, mut event_rx) = mpsc::channel(32);

        // GlobalHotKeyEvent::receiver() is a blocking crossbeam receiver, so a
        // single blocking task forwards events into the async world. It exits
        // on the first failed send after event_rx is dropped.
        let handle = tokio::task::spawn_blocking(move || {
            while let Ok(event) = receiver.recv() {
                if event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Hotkey handler shutting down");
                    break;
                }
                Some(event) = event_rx.recv() => {
                    self.handle_event(event).await?;
                }
            }
        }

        drop(event_rx);

        // Best-effort join: the forwarder may be parked in recv() until the
        // next hotkey event. The runtime reaps it on exit regardless.
        match tokio::time::timeout(Duration::from_secs(1), handle).await {
            Ok(Ok(())) => debug!("Hotkey event forwarder stopped cleanly"),
            Ok(Err(e)) => warn!(error = ?e, "Hotkey event forwarder task panicked"),
            Err(_) => debug!(
                "Hotkey event forwarder did not stop within timeout, \
                   will be cleaned up on exit"
            ),
        }

        Ok(())
    }

    /// Forward a press of the registered hotkey as a clip trigger.
    ///
    /// Releases and other hotkeys are ignored.
    pub(crate) async fn handle_event(&self, event: GlobalHotKeyEvent) -> AppResult<()> {
        if event.id != self.hotkey_id || event.state != HotKeyState::Pressed {
            return Ok(());
        }

        self.command_tx
            .send(AppCommand::TriggerClip)
            .await
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to send TriggerClip: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!("Clip hotkey pressed");

        Ok(())
    }
}
