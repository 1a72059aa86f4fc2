//! Parsers for the encoder's device-listing output.

use crate::CaptureBackend;

const DSHOW_AUDIO_MARKER: &str = "\" (audio)";
const AVFOUNDATION_AUDIO_HEADER: &str = "audio devices:";
const AVFOUNDATION_HEADER_SUFFIX: &str = "devices:";

/// Audio device names in the listing produced for `backend`.
pub(crate) fn parse_audio_devices(backend: &CaptureBackend, listing: &str) -> Vec<String> {
    match backend {
        CaptureBackend::Gdigrab => parse_dshow(listing),
        CaptureBackend::X11grab { .. } => parse_pulse(listing),
        CaptureBackend::Avfoundation => parse_avfoundation(listing),
    }
}

/// `[dshow @ 0x...] "Microphone (USB Audio)" (audio)`
pub(crate) fn parse_dshow(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter_map(|line| {
            let end = line.find(DSHOW_AUDIO_MARKER)?;
            let start = line[..end].find('"')?;
            let name = &line[start + 1..end];
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

/// Indented `name [description]` entries, the default marked with `*`.
pub(crate) fn parse_pulse(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter(|line| line.starts_with(char::is_whitespace) || line.starts_with('*'))
        .filter_map(|line| {
            line.trim()
                .trim_start_matches('*')
                .split_whitespace()
                .next()
                .map(str::to_string)
        })
        .collect()
}

/// `[AVFoundation indev @ 0x...] [0] MacBook Pro Microphone`, after the
/// audio header.
pub(crate) fn parse_avfoundation(listing: &str) -> Vec<String> {
    let mut in_audio = false;
    let mut devices = Vec::new();

    for line in listing.lines() {
        if line.contains(AVFOUNDATION_AUDIO_HEADER) {
            in_audio = true;
            continue;
        }
        if line.contains(AVFOUNDATION_HEADER_SUFFIX) {
            in_audio = false;
            continue;
        }
        if !in_audio {
            continue;
        }

        let Some(index_start) = line.find("] [") else {
            continue;
        };
        let rest = &line[index_start + 3..];
        if let Some(name_start) = rest.find("] ") {
            let name = rest[name_start + 2..].trim();
            if !name.is_empty() {
                devices.push(name.to_string());
            }
        }
    }

    devices
}
