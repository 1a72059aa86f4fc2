use crate::{
    CaptureBackend, DeviceEnumerator, EncoderBinary, StaticDisplays,
    devices::audio::{parse_audio_devices, parse_avfoundation, parse_dshow, parse_pulse},
};

use std::sync::Arc;

const DSHOW_LISTING: &str = r#"[dshow @ 000001c8] "HD Webcam" (video)
[dshow @ 000001c8]   Alternative name "@device_pnp_\\?\usb#vid_0c45"
[dshow @ 000001c8] "Microphone (USB Audio Device)" (audio)
[dshow @ 000001c8]   Alternative name "@device_cm_{33D9A762}\wave_{6A7A2B2E}"
[dshow @ 000001c8] "Stereo Mix (Realtek(R) Audio)" (audio)
dummy: Immediate exit requested"#;

const PULSE_LISTING: &str = "Auto-detected sources for pulse:
* alsa_input.pci-0000_00_1f.3.analog-stereo [Built-in Audio Analog Stereo]
  alsa_output.pci-0000_00_1f.3.analog-stereo.monitor [Monitor of Built-in Audio]
";

const AVFOUNDATION_LISTING: &str = "[AVFoundation indev @ 0x7f] AVFoundation video devices:
[AVFoundation indev @ 0x7f] [0] FaceTime HD Camera
[AVFoundation indev @ 0x7f] [1] Capture screen 0
[AVFoundation indev @ 0x7f] AVFoundation audio devices:
[AVFoundation indev @ 0x7f] [0] MacBook Pro Microphone
[AVFoundation indev @ 0x7f] [1] BlackHole 2ch
: Input/output error";

/// WHAT: dshow listings yield only the quoted audio device names, in order
/// WHY: Video devices and alternative names must not be offered as audio inputs
#[test]
fn given_dshow_listing_when_parsing_then_audio_names_in_order() {
    let devices = parse_dshow(DSHOW_LISTING);

    assert_eq!(
        devices,
        vec![
            "Microphone (USB Audio Device)".to_string(),
            "Stereo Mix (Realtek(R) Audio)".to_string(),
        ]
    );
}

/// WHAT: pulse listings yield source names without the default marker
/// WHY: The marker is decoration, not part of the device name
#[test]
fn given_pulse_listing_when_parsing_then_source_names() {
    let devices = parse_pulse(PULSE_LISTING);

    assert_eq!(
        devices,
        vec![
            "alsa_input.pci-0000_00_1f.3.analog-stereo".to_string(),
            "alsa_output.pci-0000_00_1f.3.analog-stereo.monitor".to_string(),
        ]
    );
}

/// WHAT: avfoundation listings yield only entries under the audio header
/// WHY: Cameras and screens are listed in the same output
#[test]
fn given_avfoundation_listing_when_parsing_then_audio_section_only() {
    let devices = parse_avfoundation(AVFOUNDATION_LISTING);

    assert_eq!(
        devices,
        vec!["MacBook Pro Microphone".to_string(), "BlackHole 2ch".to_string()]
    );
}

/// WHAT: The backend selects the matching parser
/// WHY: Each platform prints its device list differently
#[test]
fn given_backend_when_parsing_then_dispatches_to_its_format() {
    assert_eq!(parse_audio_devices(&CaptureBackend::Gdigrab, DSHOW_LISTING).len(), 2);
    assert_eq!(parse_audio_devices(&CaptureBackend::Gdigrab, PULSE_LISTING).len(), 0);
    assert_eq!(
        parse_audio_devices(
            &CaptureBackend::X11grab {
                display: ":0".to_string()
            },
            PULSE_LISTING
        )
        .len(),
        2
    );
}

/// WHAT: An encoder that cannot run yields no devices rather than an error
/// WHY: Empty means "no audio available", never a failure for the caller
#[test]
fn given_missing_encoder_when_listing_audio_devices_then_empty() {
    let enumerator = DeviceEnumerator::new(
        EncoderBinary::at("/nonexistent/sclip/ffmpeg"),
        Arc::new(StaticDisplays::default()),
    );

    assert!(enumerator.list_audio_devices().is_empty());
}

/// WHAT: Listing runs the encoder and parses its output
/// WHY: End-to-end check of the diagnostic-mode invocation
#[cfg(unix)]
#[test]
fn given_encoder_printing_dshow_listing_when_listing_then_names_returned() {
    use crate::tests::support::FakeEncoder;

    // Given: A fake encoder that prints a dshow listing on stderr
    let encoder = FakeEncoder::new(r#"echo '[dshow @ 01] "Line In (Audio)" (audio)' >&2
exit 1"#);
    let enumerator = DeviceEnumerator::new(
        encoder.binary().clone().with_backend(CaptureBackend::Gdigrab),
        Arc::new(StaticDisplays::default()),
    );

    // When: Listing audio devices
    let devices = enumerator.list_audio_devices();

    // Then: The quoted name is returned
    assert_eq!(devices, vec!["Line In (Audio)".to_string()]);
}
