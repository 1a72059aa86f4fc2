use crate::{CaptureBackend, CaptureError, CoreResult};

use std::{
    env,
    ffi::OsString,
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use tracing::{debug, instrument};

/// Environment variable naming an explicit encoder binary.
pub const ENCODER_ENV_VAR: &str = "SCLIP_FFMPEG";

#[cfg(windows)]
const ENCODER_FILE_NAME: &str = "ffmpeg.exe";
#[cfg(not(windows))]
const ENCODER_FILE_NAME: &str = "ffmpeg";

/// Directories, relative to the running executable, where a bundled
/// encoder may live.
const BUNDLED_DIRS: &[&str] = &["", "ffmpeg/bin", "ffmpeg-7.1-essentials_build/bin"];

/// A located encoder binary and the capture backend used with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderBinary {
    path: PathBuf,
    backend: CaptureBackend,
}

impl EncoderBinary {
    /// Find the encoder, honouring an explicit override first.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::EncoderNotFound`] listing every searched path.
    #[track_caller]
    pub fn locate(override_path: Option<&Path>) -> CoreResult<Self> {
        EncoderLocator::from_env().locate(override_path)
    }

    /// Use `path` as-is, without probing.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backend: CaptureBackend::host(),
        }
    }

    /// Replace the capture backend.
    pub fn with_backend(mut self, backend: CaptureBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Path of the binary.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Capture backend for this binary.
    pub fn backend(&self) -> &CaptureBackend {
        &self.backend
    }
}

/// Searches candidate locations for the encoder binary.
#[derive(Debug, Clone, Default)]
pub struct EncoderLocator {
    candidates: Vec<PathBuf>,
    search_path: Option<OsString>,
}

impl EncoderLocator {
    /// Search `candidates` in order, then each directory of `search_path`.
    pub fn new(candidates: Vec<PathBuf>, search_path: Option<OsString>) -> Self {
        Self {
            candidates,
            search_path,
        }
    }

    /// Candidates for this host: `SCLIP_FFMPEG`, directories next to the
    /// executable, fixed install locations, then `PATH`.
    pub fn from_env() -> Self {
        let mut candidates = Vec::new();

        if let Some(explicit) = env::var_os(ENCODER_ENV_VAR).filter(|v| !v.is_empty()) {
            candidates.push(PathBuf::from(explicit));
        }

        if let Some(exe_dir) = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            candidates.extend(
                BUNDLED_DIRS
                    .iter()
                    .map(|dir| exe_dir.join(dir).join(ENCODER_FILE_NAME)),
            );
        }

        candidates.extend(
            platform_dirs()
                .into_iter()
                .map(|dir| dir.join(ENCODER_FILE_NAME)),
        );

        Self::new(candidates, env::var_os("PATH"))
    }

    /// Return the first candidate that exists.
    ///
    /// An override is authoritative: when given and missing, nothing else is
    /// searched.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::EncoderNotFound`] listing every searched path.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn locate(&self, override_path: Option<&Path>) -> CoreResult<EncoderBinary> {
        if let Some(path) = override_path {
            return if path.is_file() {
                debug!(path = ?path, "Using configured encoder");
                Ok(EncoderBinary::at(path))
            } else {
                Err(CaptureError::EncoderNotFound {
                    searched: vec![path.to_path_buf()],
                    location: ErrorLocation::from(Location::caller()),
                })
            };
        }

        let mut searched = Vec::new();
        for candidate in self.candidates.iter().cloned().chain(self.path_entries()) {
            if candidate.is_file() {
                debug!(path = ?candidate, checked = searched.len() + 1, "Encoder located");
                return Ok(EncoderBinary::at(candidate));
            }
            searched.push(candidate);
        }

        Err(CaptureError::EncoderNotFound {
            searched,
            location: ErrorLocation::from(Location::caller()),
        })
    }

    fn path_entries(&self) -> Vec<PathBuf> {
        self.search_path
            .as_deref()
            .map(|paths| {
                env::split_paths(paths)
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .map(|dir| dir.join(ENCODER_FILE_NAME))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(windows)]
fn platform_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from(r"C:\ffmpeg\bin")];
    if let Some(program_files) = env::var_os("ProgramFiles") {
        dirs.push(PathBuf::from(program_files).join("ffmpeg").join("bin"));
    }
    dirs
}

#[cfg(not(windows))]
fn platform_dirs() -> Vec<PathBuf> {
    ["/usr/bin", "/usr/local/bin", "/opt/homebrew/bin"]
        .into_iter()
        .map(PathBuf::from)
        .collect()
}
