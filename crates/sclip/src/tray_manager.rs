//! System tray icon with state-based updates.
//!
//! Manages a system tray icon with three states (Idle, Recording, Clipping)
//! and a context menu driving the capture controls.

use crate::{AppError, AppResult, TrayIconState};

use std::panic::Location;

use error_location::ErrorLocation;
use tracing::{info, instrument};
use tray_icon::menu::{Menu, MenuId, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

/// Identifiers of the tray menu entries, handed to the async side so it can
/// route `MenuEvent`s without touching the `!Send` tray.
#[derive(Debug, Clone)]
pub struct TrayMenuIds {
    /// "Start Recording"
    pub start_recording: MenuId,
    /// "Stop Recording"
    pub stop_recording: MenuId,
    /// "Save Clip (30 s)"
    pub save_clip: MenuId,
    /// "Open Clips Folder"
    pub open_folder: MenuId,
    /// "Settings"
    pub settings: MenuId,
    /// "Exit"
    pub exit: MenuId,
}

/// System tray icon manager.
pub struct TrayManager {
    tray_icon: TrayIcon,
    start_item: MenuItem,
    stop_item: MenuItem,
    clip_item: MenuItem,
    menu_ids: TrayMenuIds,
}

impl TrayManager {
    /// Create a new tray manager in the Idle state.
    #[track_caller]
    #[instrument]
    pub fn new() -> AppResult<Self> {
        let menu = Menu::new();

        let start_item = MenuItem::new("Start Recording", true, None);
        let stop_item = MenuItem::new("Stop Recording", false, None);
        let clip_item = MenuItem::new("Save Clip (30 s)", true, None);
        let folder_item = MenuItem::new("Open Clips Folder", true, None);
        let settings_item = MenuItem::new("Settings", true, None);
        let exit_item = MenuItem::new("Exit", true, None);

        let menu_ids = TrayMenuIds {
            start_recording: start_item.id().clone(),
            stop_recording: stop_item.id().clone(),
            save_clip: clip_item.id().clone(),
            open_folder: folder_item.id().clone(),
            settings: settings_item.id().clone(),
            exit: exit_item.id().clone(),
        };

        let separator = PredefinedMenuItem::separator();

        menu.append_items(&[
            &start_item,
            &stop_item,
            &clip_item,
            &separator,
            &folder_item,
            &settings_item,
            &exit_item,
        ])
        .map_err(|e| AppError::TrayError {
            reason: format!("Failed to build tray menu: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let icon = Self::load_icon(TrayIconState::Idle)?;

        let tray_icon = TrayIconBuilder::new()
            .with_tooltip(TrayIconState::Idle.tooltip())
            .with_menu(Box::new(menu))
            .with_icon(icon)
            .build()
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to create tray icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("System tray icon initialized");

        Ok(Self {
            tray_icon,
            start_item,
            stop_item,
            clip_item,
            menu_ids,
        })
    }

    /// Update icon, tooltip, and which capture controls are enabled.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn update_state(&mut self, state: TrayIconState) -> AppResult<()> {
        let icon = Self::load_icon(state)?;

        self.tray_icon
            .set_icon(Some(icon))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.tray_icon
            .set_tooltip(Some(state.tooltip()))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update tooltip: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.start_item.set_enabled(state.can_start());
        self.clip_item.set_enabled(state.can_start());
        self.stop_item.set_enabled(state.can_stop());

        Ok(())
    }

    /// Load icon from compile-time embedded PNG bytes.
    #[track_caller]
    fn load_icon(state: TrayIconState) -> AppResult<Icon> {
        let png_bytes: &[u8] = match state {
            TrayIconState::Idle => include_bytes!("../resources/icons/idle.png"),
            TrayIconState::Recording => include_bytes!("../resources/icons/recording.png"),
            TrayIconState::Clipping => include_bytes!("../resources/icons/clipping.png"),
        };

        let img = image::load_from_memory(png_bytes).map_err(|e| AppError::TrayError {
            reason: format!("Failed to decode embedded icon: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let rgba = img.into_rgba8();
        let (width, height) = (rgba.width(), rgba.height());

        Icon::from_rgba(rgba.into_raw(), width, height).map_err(|e| AppError::TrayError {
            reason: format!("Failed to create icon from RGBA: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Menu entry identifiers.
    pub fn menu_ids(&self) -> &TrayMenuIds {
        &self.menu_ids
    }
}
