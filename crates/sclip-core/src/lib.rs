//! S-Clip Core Library
//!
//! Capture session controller for desktop recording: builds encoder
//! invocations, launches and supervises the encoder process, and enumerates
//! capture devices. Encoding itself is delegated to an external `ffmpeg`.
//!
//! # Example
//!
//! ```no_run
//! use sclip_core::{
//!     CaptureConfig, CaptureSettings, CoreResult, EncoderBinary, SessionContext,
//!     SessionManager, StaticDisplays,
//! };
//!
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let encoder = EncoderBinary::locate(None)?;
//!     let context = SessionContext::new(encoder, Arc::new(StaticDisplays::default()), "clips");
//!     let manager = SessionManager::new(context);
//!
//!     let config = CaptureConfig::try_from(&CaptureSettings::default())?;
//!     let session = manager.capture_clip(&config)?;
//!
//!     println!("Finished: {:?}", session.wait().await);
//!     Ok(())
//! }
//! ```

mod capture;
mod devices;
mod error;

pub use {
    capture::*,
    devices::{DeviceEnumerator, DisplaySource, MonitorGeometry, MonitorMap, StaticDisplays},
    error::CaptureError,
    error::Result as CoreResult,
};
