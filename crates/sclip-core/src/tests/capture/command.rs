use crate::{
    CaptureBackend, CaptureConfig, CaptureMode, CaptureRegion, CaptureSettings, EncoderCommand,
    MonitorGeometry, MonitorMap,
};

use std::{ffi::OsString, path::Path};

const OUTPUT: &str = "/tmp/clips/clip_2025-01-01_12-00-00.mp4";

fn monitors() -> MonitorMap {
    MonitorMap::from_displays([
        MonitorGeometry {
            x: 0,
            y: 0,
            width: 1920,
            height: 1080,
        },
        MonitorGeometry {
            x: 1920,
            y: -200,
            width: 2560,
            height: 1440,
        },
    ])
}

#[allow(clippy::unwrap_used)]
fn config(settings: CaptureSettings) -> CaptureConfig {
    CaptureConfig::try_from(&settings).unwrap()
}

#[allow(clippy::unwrap_used)]
fn build(config: &CaptureConfig, mode: CaptureMode, backend: CaptureBackend) -> EncoderCommand {
    let monitors = monitors();
    EncoderCommand::builder(config, mode, Path::new(OUTPUT))
        .with_backend(backend)
        .with_monitors(&monitors)
        .build()
        .unwrap()
}

fn strings(command: &EncoderCommand) -> Vec<String> {
    command
        .args()
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

/// True when `pair` appears as adjacent arguments.
fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
    args.windows(2).any(|w| w[0] == flag && w[1] == value)
}

fn count(args: &[String], needle: &str) -> usize {
    args.iter().filter(|a| *a == needle).count()
}

/// WHAT: A video-only clip has one input, the clip window, and fixed policy flags
/// WHY: Missing audio must yield a valid video-only invocation
#[test]
fn given_video_only_clip_config_when_building_then_single_input_and_clip_window() {
    // Given: Default settings on Windows capture devices
    let config = config(CaptureSettings::default());

    // When: Building a clip command
    let command = build(&config, CaptureMode::Clip, CaptureBackend::Gdigrab);
    let args = strings(&command);

    // Then: Exactly one input, clip window, fixed policy, output last
    assert_eq!(count(&args, "-i"), 1);
    assert!(has_pair(&args, "-i", "desktop"));
    assert!(has_pair(&args, "-ss", "3"));
    assert!(has_pair(&args, "-t", "30"));
    assert!(has_pair(&args, "-c:v", "libx264"));
    assert!(has_pair(&args, "-preset", "ultrafast"));
    assert!(has_pair(&args, "-crf", "18"));
    assert!(has_pair(&args, "-pix_fmt", "yuv420p"));
    assert!(has_pair(&args, "-movflags", "+faststart"));
    assert!(has_pair(&args, "-s", "1920x1080"));
    assert!(!args.iter().any(|a| a == "-c:a"));
    assert!(!command.has_audio());
    assert_eq!(command.args().last(), Some(&OsString::from(OUTPUT)));
}

/// WHAT: Manual recordings carry no duration bound
/// WHY: Manual sessions end only through the stop protocol
#[test]
fn given_manual_mode_when_building_then_no_duration_flags() {
    let config = config(CaptureSettings::default());

    let args = strings(&build(&config, CaptureMode::Manual, CaptureBackend::Gdigrab));

    assert!(!args.iter().any(|a| a == "-t" || a == "-ss"));
}

/// WHAT: An audio input adds exactly one audio source and an AAC track
/// WHY: Audio presence must be reflected exactly once in the invocation
#[test]
fn given_audio_input_when_building_then_one_audio_source_mapped() {
    // Given: An input and an output device
    let config = config(CaptureSettings {
        audio_input: Some("Microphone (USB Audio)".to_string()),
        audio_output: Some("Speakers (Realtek)".to_string()),
        ..CaptureSettings::default()
    });

    // When: Building on each backend
    let gdi = strings(&build(&config, CaptureMode::Clip, CaptureBackend::Gdigrab));
    let x11 = strings(&build(
        &config,
        CaptureMode::Clip,
        CaptureBackend::X11grab {
            display: ":1".to_string(),
        },
    ));

    // Then: Two inputs, the second the audio device; output device adds nothing
    assert_eq!(count(&gdi, "-i"), 2);
    assert!(has_pair(&gdi, "-i", "audio=Microphone (USB Audio)"));
    assert!(has_pair(&gdi, "-map", "1:a"));
    assert!(has_pair(&gdi, "-c:a", "aac"));
    assert!(has_pair(&gdi, "-b:a", "160k"));
    assert!(!gdi.iter().any(|a| a.contains("Speakers")));

    assert_eq!(count(&x11, "-i"), 2);
    assert!(has_pair(&x11, "-f", "pulse"));
    assert!(has_pair(&x11, "-i", "Microphone (USB Audio)"));
}

/// WHAT: A known monitor is captured at its own offset and size
/// WHY: Multi-monitor users pick one screen to record
#[test]
fn given_second_monitor_when_building_then_offset_region_captured() {
    // Given: Monitor 2 selected
    let config = config(CaptureSettings {
        monitor: Some("Monitor 2".to_string()),
        ..CaptureSettings::default()
    });

    // When: Building on gdigrab and x11grab
    let gdi_command = build(&config, CaptureMode::Manual, CaptureBackend::Gdigrab);
    let gdi = strings(&gdi_command);
    let x11 = strings(&build(
        &config,
        CaptureMode::Manual,
        CaptureBackend::X11grab {
            display: ":0.0".to_string(),
        },
    ));

    // Then: Region follows the monitor, output scaled to configured size
    assert!(!gdi_command.substituted());
    assert!(matches!(
        gdi_command.region(),
        CaptureRegion::Monitor { label, .. } if label == "Monitor 2"
    ));
    assert!(has_pair(&gdi, "-offset_x", "1920"));
    assert!(has_pair(&gdi, "-offset_y", "-200"));
    assert!(has_pair(&gdi, "-video_size", "2560x1440"));
    assert!(has_pair(&gdi, "-s", "1920x1080"));
    assert!(has_pair(&x11, "-i", ":0.0+1920,0"));
}

/// WHAT: x11grab offsets left of or above the primary screen are clamped to zero
/// WHY: x11grab rejects negative root-window offsets and exits immediately
#[test]
#[allow(clippy::unwrap_used)]
fn given_monitor_at_negative_offset_when_building_x11grab_then_offset_clamped() {
    // Given: A monitor placed left of and above the origin
    let monitors = MonitorMap::from_displays([MonitorGeometry {
        x: -2560,
        y: -300,
        width: 2560,
        height: 1440,
    }]);
    let config = config(CaptureSettings {
        monitor: Some("Monitor 1".to_string()),
        ..CaptureSettings::default()
    });

    // When: Building for x11grab and gdigrab
    let build_for = |backend: CaptureBackend| {
        EncoderCommand::builder(&config, CaptureMode::Manual, Path::new(OUTPUT))
            .with_backend(backend)
            .with_monitors(&monitors)
            .build()
            .unwrap()
    };
    let x11 = strings(&build_for(CaptureBackend::X11grab {
        display: ":1".to_string(),
    }));
    let gdi = strings(&build_for(CaptureBackend::Gdigrab));

    // Then: x11grab gets a non-negative origin, gdigrab keeps the signed offsets
    assert!(has_pair(&x11, "-i", ":1+0,0"));
    assert!(has_pair(&x11, "-video_size", "2560x1440"));
    assert!(has_pair(&gdi, "-offset_x", "-2560"));
    assert!(has_pair(&gdi, "-offset_y", "-300"));
}

/// WHAT: An unknown monitor falls back to full desktop at the configured size
/// WHY: A stale selection must not abort the session
#[test]
fn given_unknown_monitor_when_building_then_full_desktop_substituted() {
    // Given: Monitor 9 with only two monitors present
    let config = config(CaptureSettings {
        monitor: Some("Monitor 9".to_string()),
        resolution: "1280x720".to_string(),
        ..CaptureSettings::default()
    });

    // When: Building
    let command = build(&config, CaptureMode::Clip, CaptureBackend::Gdigrab);
    let args = strings(&command);

    // Then: Full desktop from origin at 1280x720, flagged as substituted
    assert!(command.substituted());
    assert!(matches!(
        command.region(),
        CaptureRegion::FullDesktop { requested: Some(label), .. } if label == "Monitor 9"
    ));
    assert!(has_pair(&args, "-offset_x", "0"));
    assert!(has_pair(&args, "-offset_y", "0"));
    assert!(has_pair(&args, "-video_size", "1280x720"));
}

/// WHAT: Hardware encoders use constant-quality VBR instead of CRF
/// WHY: NVENC does not understand -crf
#[test]
fn given_nvenc_encoder_when_building_then_vbr_quality_flags() {
    let config = config(CaptureSettings {
        encoder: "hardware H.265".to_string(),
        preset: "p5".to_string(),
        ..CaptureSettings::default()
    });

    let args = strings(&build(&config, CaptureMode::Clip, CaptureBackend::Gdigrab));

    assert!(has_pair(&args, "-c:v", "hevc_nvenc"));
    assert!(has_pair(&args, "-preset", "p5"));
    assert!(has_pair(&args, "-rc", "vbr"));
    assert!(has_pair(&args, "-cq", "18"));
    assert!(!args.iter().any(|a| a == "-crf"));
}

/// WHAT: macOS capture addresses screens by index
/// WHY: avfoundation has no offset-based region grab
#[test]
fn given_avfoundation_backend_when_building_then_screen_index_used() {
    let config = config(CaptureSettings {
        monitor: Some("Monitor 2".to_string()),
        audio_input: Some("MacBook Pro Microphone".to_string()),
        ..CaptureSettings::default()
    });

    let args = strings(&build(&config, CaptureMode::Manual, CaptureBackend::Avfoundation));

    assert!(has_pair(&args, "-i", "Capture screen 1:none"));
    assert!(has_pair(&args, "-i", ":MacBook Pro Microphone"));
}
