use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Encoder binary configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Explicit path to the encoder; searched locations are used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}
