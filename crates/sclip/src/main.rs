//! S-Clip: desktop clip and screen recording from the system tray.

mod app;
mod app_command;
mod config;
mod displays;
mod error;
mod hotkey_handler;
mod tray_command;
mod tray_icon_state;
mod tray_manager;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    displays::TrayDisplays,
    error::{AppError, Result as AppResult},
    hotkey_handler::HotkeyHandler,
    tray_command::TrayCommand,
    tray_icon_state::TrayIconState,
    tray_manager::{TrayManager, TrayMenuIds},
};

use crate::config::Config;

use std::sync::Arc;

use global_hotkey::GlobalHotKeyManager;
use sclip_core::{EncoderBinary, MonitorGeometry, SessionContext, SessionManager};
use tao::{
    event::Event,
    event_loop::{ControlFlow, EventLoopBuilder},
};
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "sclip=debug,sclip_core=debug";

/// Application entry point.
fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let event_loop = EventLoopBuilder::<TrayCommand>::with_user_event().build();
    let tray_proxy = event_loop.create_proxy();

    // TrayManager lives on the main thread - TrayIcon is !Send on all platforms.
    let mut tray_manager = match TrayManager::new() {
        Ok(tm) => tm,
        Err(e) => {
            error!("Failed to create TrayManager: {:?}", e);
            std::process::exit(1);
        }
    };

    // Persists across event loop iterations; dropping it unregisters the hotkey.
    let mut hotkey_manager: Option<GlobalHotKeyManager> = None;

    event_loop.run(move |event, target, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(cmd) => {
                match cmd {
                    TrayCommand::SetState(state) => {
                        if let Err(e) = tray_manager.update_state(state) {
                            error!(error = ?e, "Failed to update tray icon");
                        }
                    }
                    TrayCommand::QueryMonitors(reply) => {
                        let monitors = target
                            .available_monitors()
                            .map(|monitor| {
                                let position = monitor.position();
                                let size = monitor.size();
                                MonitorGeometry {
                                    x: position.x,
                                    y: position.y,
                                    width: size.width,
                                    height: size.height,
                                }
                            })
                            .collect();
                        let _ = reply.try_send(monitors);
                    }
                    TrayCommand::Shutdown => {
                        *control_flow = ControlFlow::ExitWithCode(0);
                    }
                }
                return;
            }
            Event::NewEvents(tao::event::StartCause::Init) => {
                let config = match Config::load() {
                    Ok(c) => c,
                    Err(e) => {
                        error!("Failed to load config: {:?}", e);
                        std::process::exit(1);
                    }
                };

                let config_path = match Config::config_path() {
                    Ok(p) => p,
                    Err(e) => {
                        error!("Failed to resolve config path: {:?}", e);
                        std::process::exit(1);
                    }
                };

                let encoder = match EncoderBinary::locate(config.encoder.path.as_deref()) {
                    Ok(encoder) => encoder,
                    Err(e) => {
                        error!("Failed to locate ffmpeg: {}", e);
                        std::process::exit(1);
                    }
                };
                info!(
                    encoder = ?encoder.path(),
                    backend = %encoder.backend(),
                    "Encoder located"
                );

                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};
                    CFRunLoopWakeUp(CFRunLoopGetMain());
                }

                // Register the hotkey on the main thread: tao's event loop pumps
                // the Windows messages needed for WM_HOTKEY delivery. A bad or
                // taken key leaves the tray controls usable.
                let hotkey_id = match HotkeyHandler::register_hotkey(&config.capture.hotkey) {
                    Ok((manager, id)) => {
                        hotkey_manager = Some(manager);
                        Some(id)
                    }
                    Err(e) => {
                        warn!(error = %e, "Clip hotkey unavailable, use the tray menu");
                        None
                    }
                };

                let displays = Arc::new(TrayDisplays::new(tray_proxy.clone()));
                let context =
                    SessionContext::new(encoder, displays, config.output.directory.clone());
                let manager = Arc::new(SessionManager::new(context));

                let config = Arc::new(Mutex::new(config));
                let (command_tx, command_rx) = mpsc::channel(32);
                let (shutdown_tx, shutdown_rx) = watch::channel(false);

                let tray_proxy = tray_proxy.clone();
                let menu_ids = tray_manager.menu_ids().clone();

                // Tokio runtime on its own thread; TrayManager and
                // hotkey_manager stay on the main thread.
                std::thread::spawn(move || {
                    let rt = match tokio::runtime::Runtime::new() {
                        Ok(rt) => rt,
                        Err(e) => {
                            error!("Failed to create tokio runtime: {:?}", e);
                            std::process::exit(1);
                        }
                    };

                    rt.block_on(async {
                        let hotkey_handler =
                            hotkey_id.map(|id| HotkeyHandler::new(id, command_tx.clone()));

                        let app = App {
                            manager,
                            tray_proxy,
                            config,
                            config_path,
                            command_tx,
                            command_rx,
                            shutdown_tx,
                            menu_ids,
                        };

                        tokio::join!(
                            async {
                                let Some(handler) = hotkey_handler else {
                                    return;
                                };
                                if let Err(e) = handler.run(shutdown_rx).await {
                                    error!(error = ?e, "Hotkey handler error");
                                }
                            },
                            async {
                                if let Err(e) = app.run().await {
                                    error!(error = ?e, "App error");
                                }
                            }
                        );
                    });
                });
            }
            _ => {}
        }

        // Keep hotkey_manager alive in the closure for the app's lifetime.
        let _ = &hotkey_manager;
    });
}
