pub(crate) mod audio;
mod monitor;

pub use monitor::{DisplaySource, MonitorGeometry, MonitorMap, StaticDisplays};

use crate::EncoderBinary;

use std::{
    process::{Command, Stdio},
    sync::Arc,
};

use tracing::{debug, instrument, warn};

/// Lists capture devices for the configuration UI.
///
/// Both queries are synchronous and cheap enough for a menu or settings
/// dialog, but each audio query spawns a short-lived encoder process, so
/// they should not run on every UI tick.
#[derive(Clone)]
pub struct DeviceEnumerator {
    encoder: EncoderBinary,
    displays: Arc<dyn DisplaySource>,
}

impl DeviceEnumerator {
    /// Enumerate through `encoder` and `displays`.
    pub fn new(encoder: EncoderBinary, displays: Arc<dyn DisplaySource>) -> Self {
        Self { encoder, displays }
    }

    /// Audio device names in the order the encoder reports them.
    ///
    /// Never fails: an encoder that cannot be run, or that lists nothing,
    /// yields an empty list, meaning "no audio available".
    #[instrument(skip(self), fields(backend = %self.encoder.backend()))]
    pub fn list_audio_devices(&self) -> Vec<String> {
        let mut cmd = Command::new(self.encoder.path());
        cmd.args(self.encoder.backend().list_devices_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.creation_flags(0x0800_0000);
        }

        let output = match cmd.output() {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, path = ?self.encoder.path(), "Device listing failed");
                return Vec::new();
            }
        };

        // The listing goes to stdout or stderr depending on the backend.
        let mut listing = String::from_utf8_lossy(&output.stdout).into_owned();
        listing.push('\n');
        listing.push_str(&String::from_utf8_lossy(&output.stderr));

        let devices = audio::parse_audio_devices(self.encoder.backend(), &listing);
        debug!(count = devices.len(), "Audio devices enumerated");
        devices
    }

    /// Current monitors, labelled `Monitor 1`, `Monitor 2`, ... in
    /// enumeration order. Re-queries the host on every call.
    pub fn list_monitors(&self) -> MonitorMap {
        MonitorMap::from_displays(self.displays.displays())
    }
}

impl std::fmt::Debug for DeviceEnumerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceEnumerator")
            .field("encoder", &self.encoder)
            .finish_non_exhaustive()
    }
}
