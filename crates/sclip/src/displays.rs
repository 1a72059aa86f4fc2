use crate::TrayCommand;

use std::{
    sync::{Mutex, mpsc},
    time::Duration,
};

use sclip_core::{DisplaySource, MonitorGeometry};
use tao::event_loop::EventLoopProxy;
use tracing::warn;

const QUERY_TIMEOUT: Duration = Duration::from_secs(1);

/// Host display query answered by the main thread.
///
/// Only the event loop knows the monitor topology, so each query is a round
/// trip through the event-loop proxy. A missing reply yields no displays,
/// which makes sessions fall back to full-desktop capture.
pub struct TrayDisplays {
    proxy: Mutex<EventLoopProxy<TrayCommand>>,
}

impl TrayDisplays {
    /// Query displays through `proxy`.
    pub fn new(proxy: EventLoopProxy<TrayCommand>) -> Self {
        Self {
            proxy: Mutex::new(proxy),
        }
    }
}

impl DisplaySource for TrayDisplays {
    fn displays(&self) -> Vec<MonitorGeometry> {
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);

        let sent = self
            .proxy
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .send_event(TrayCommand::QueryMonitors(reply_tx));

        if let Err(e) = sent {
            warn!(error = ?e, "Failed to query displays: event loop closed");
            return Vec::new();
        }

        match reply_rx.recv_timeout(QUERY_TIMEOUT) {
            Ok(displays) => displays,
            Err(e) => {
                warn!(error = ?e, "No display reply from the event loop");
                Vec::new()
            }
        }
    }
}
