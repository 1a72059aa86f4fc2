use crate::{
    AppCommand, AppResult, TrayCommand, TrayIconState, TrayMenuIds, config::Config,
};

use std::{path::PathBuf, sync::Arc, time::Duration};

use sclip_core::{
    CaptureSession, CaptureSettings, ClipTrigger, DeviceEnumerator, SessionManager, SessionOutcome,
};
use tao::event_loop::EventLoopProxy;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, error, info, instrument, warn};
use tray_icon::menu::MenuEvent;

/// Main application state.
///
/// Runs on the async runtime thread. Tray icon updates go back to the main
/// thread through `tray_proxy` because `TrayIcon` is `!Send` and must remain
/// on the UI thread.
pub struct App {
    pub(crate) manager: Arc<SessionManager>,
    pub(crate) tray_proxy: EventLoopProxy<TrayCommand>,
    pub(crate) config: Arc<Mutex<Config>>,
    pub(crate) config_path: PathBuf,
    pub(crate) command_tx: mpsc::Sender<AppCommand>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
    pub(crate) menu_ids: TrayMenuIds,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("S-Clip starting");

        let devices = self.manager.devices();
        let settings = self.config.lock().await.capture.clone();
        tokio::task::spawn_blocking(move || report_devices(&devices, &settings));

        // MenuEvent::receiver() is a blocking crossbeam receiver; one blocking
        // task forwards it and exits once tray_event_rx is dropped.
        let (tray_event_tx, mut tray_event_rx) = mpsc::channel(32);
        let tray_handle = tokio::task::spawn_blocking(move || {
            let receiver = MenuEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if tray_event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                Some(event) = tray_event_rx.recv() => {
                    self.handle_tray_event(event).await;
                }

                Some(cmd) = self.command_rx.recv() => {
                    if cmd == AppCommand::Shutdown {
                        info!("Shutdown requested");
                        break;
                    }
                    self.handle_command(cmd).await;
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        drop(tray_event_rx);

        match tokio::time::timeout(Duration::from_secs(1), tray_handle).await {
            Ok(Ok(())) => info!("Tray event forwarder stopped cleanly"),
            Ok(Err(e)) => error!(error = ?e, "Tray event forwarder task panicked"),
            Err(_) => info!(
                "Tray event forwarder did not stop within timeout, \
                     will be cleaned up on exit"
            ),
        }

        // Finalize an in-flight recording instead of abandoning it.
        if let Some(session) = self.manager.current() {
            info!(session_id = %session.id(), "Stopping active session before exit");
            session.request_stop();
            let outcome = session.wait().await;
            log_outcome(&session, &outcome);
        }

        let _ = self.shutdown_tx.send(true);
        let _ = self.tray_proxy.send_event(TrayCommand::Shutdown);
        info!("S-Clip shut down successfully");

        Ok(())
    }

    #[instrument(skip(self))]
    async fn handle_command(&self, cmd: AppCommand) {
        match cmd {
            AppCommand::TriggerClip => {
                let settings = self.refresh_config().await.capture;
                // Starting queries the displays through the event loop, which
                // blocks this worker for up to a second.
                let result = tokio::task::block_in_place(|| self.manager.trigger_clip(&settings));

                match result {
                    Ok(ClipTrigger::Started(session)) => {
                        self.watch_session(session, TrayIconState::Clipping);
                    }
                    Ok(ClipTrigger::NotSaved) => {
                        info!("Clip hotkey ignored: replay_buffer is disabled");
                    }
                    Err(e) => error!(error = ?e, "Failed to capture clip"),
                }
            }
            AppCommand::CaptureClip | AppCommand::StartRecording => {
                let config = match self.refresh_config().await.capture_config() {
                    Ok(config) => config,
                    Err(e) => {
                        error!(error = ?e, "Invalid capture settings");
                        return;
                    }
                };

                let clip = cmd == AppCommand::CaptureClip;
                let result = tokio::task::block_in_place(|| {
                    if clip {
                        self.manager.capture_clip(&config)
                    } else {
                        self.manager.start_recording(&config)
                    }
                });

                match result {
                    Ok(session) if clip => self.watch_session(session, TrayIconState::Clipping),
                    Ok(session) => self.watch_session(session, TrayIconState::Recording),
                    Err(e) => error!(command = ?cmd, error = ?e, "Failed to start capture"),
                }
            }
            AppCommand::StopRecording => {
                if !self.manager.is_active() {
                    debug!("Stop requested with no active session");
                }
                self.manager.stop();
            }
            AppCommand::Shutdown => {}
        }
    }

    /// Re-read the settings file so edits made through Settings apply to the
    /// next capture. A file that fails to load keeps the previous settings.
    async fn refresh_config(&self) -> Config {
        let mut config = self.config.lock().await;

        match Config::load_from(&self.config_path) {
            Ok(fresh) => *config = fresh,
            Err(e) => warn!(error = ?e, "Failed to reload config, keeping previous settings"),
        }

        config.clone()
    }

    /// Show `state` in the tray until `session` finishes, then log the outcome.
    fn watch_session(&self, session: Arc<CaptureSession>, state: TrayIconState) {
        let _ = self.tray_proxy.send_event(TrayCommand::SetState(state));

        let tray_proxy = self.tray_proxy.clone();
        tokio::spawn(async move {
            let outcome = session.wait().await;
            log_outcome(&session, &outcome);
            let _ = tray_proxy.send_event(TrayCommand::SetState(TrayIconState::Idle));
        });
    }

    /// Handle tray menu events.
    #[instrument(skip(self))]
    async fn handle_tray_event(&self, event: MenuEvent) {
        let event_id = &event.id;
        let ids = &self.menu_ids;

        let command = if *event_id == ids.start_recording {
            Some(AppCommand::StartRecording)
        } else if *event_id == ids.stop_recording {
            Some(AppCommand::StopRecording)
        } else if *event_id == ids.save_clip {
            Some(AppCommand::CaptureClip)
        } else if *event_id == ids.open_folder {
            self.open_output_folder().await;
            None
        } else if *event_id == ids.settings {
            match open::that(&self.config_path) {
                Ok(()) => info!(config_path = ?self.config_path, "Opened settings file"),
                Err(e) => error!(error = ?e, "Failed to open settings file"),
            }
            None
        } else if *event_id == ids.exit {
            info!("Exit requested from tray menu");
            Some(AppCommand::Shutdown)
        } else {
            None
        };

        if let Some(command) = command {
            if let Err(e) = self.command_tx.send(command).await {
                error!(command = ?command, error = ?e, "Failed to send command");
            }
        }
    }

    async fn open_output_folder(&self) {
        let dir = self.manager.context().output_dir().to_path_buf();

        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            error!(path = ?dir, error = ?e, "Failed to create clips folder");
            return;
        }

        match open::that(&dir) {
            Ok(()) => info!(path = ?dir, "Opened clips folder"),
            Err(e) => error!(path = ?dir, error = ?e, "Failed to open clips folder"),
        }
    }
}

/// Log what the host offers and flag configured audio devices it lacks.
fn report_devices(devices: &DeviceEnumerator, settings: &CaptureSettings) {
    let audio = devices.list_audio_devices();
    info!(count = audio.len(), devices = ?audio, "Audio devices");

    let monitors = devices.list_monitors();
    for (label, geometry) in monitors.iter() {
        info!(
            monitor = label,
            x = geometry.x,
            y = geometry.y,
            width = geometry.width,
            height = geometry.height,
            "Monitor"
        );
    }

    let configured = [
        ("audio_input", settings.audio_input.as_deref()),
        ("audio_output", settings.audio_output.as_deref()),
    ];
    for (field, device) in configured {
        let missing = device
            .filter(|d| !d.trim().is_empty())
            .filter(|d| !audio.iter().any(|known| known.as_str() == *d));

        if let Some(device) = missing {
            warn!(field, device, "Configured audio device not found");
        }
    }
}

fn log_outcome(session: &CaptureSession, outcome: &SessionOutcome) {
    match outcome {
        SessionOutcome::Success { path, bytes } => info!(
            session_id = %session.id(),
            mode = %session.mode(),
            path = ?path,
            bytes,
            "Capture saved"
        ),
        SessionOutcome::Failed(reason) => error!(
            session_id = %session.id(),
            mode = %session.mode(),
            reason = %reason,
            "Capture failed"
        ),
    }
}
