#[allow(clippy::module_inception)]
mod config;
mod encoder_config;
mod output_config;

pub(crate) use {config::Config, encoder_config::EncoderConfig, output_config::OutputConfig};

use std::path::PathBuf;

use directories::UserDirs;

pub(crate) const OUTPUT_FOLDER_NAME: &str = "S-Clip";

/// `<Videos>/S-Clip`, falling back to `<data dir>/clips`.
pub(crate) fn default_output_directory() -> PathBuf {
    if let Some(videos) = UserDirs::new().and_then(|dirs| dirs.video_dir().map(PathBuf::from)) {
        return videos.join(OUTPUT_FOLDER_NAME);
    }

    config::project_dirs()
        .map(|dirs| dirs.data_dir().join("clips"))
        .unwrap_or_else(|_| PathBuf::from("clips"))
}
