use tokio_util::sync::CancellationToken;

use super::{Pipeline, PipelineConfig};
use crate::encoder::Settings;
use crate::error::PipelineError;
use crate::input::CaptureSpec;
use crate::metadata::probe;
use crate::session::CaptureSession;

/// Virtual test picture via the lavfi device; no real display or camera
/// needed.
fn testsrc_spec(duration_sec: u32, size: &str, rate: u32) -> CaptureSpec {
    CaptureSpec {
        format: "lavfi".to_string(),
        target: format!(
            "testsrc=duration={}:size={}:rate={}",
            duration_sec, size, rate
        ),
        framerate: None,
        frame_size: None,
        probesize: None,
    }
}

/// mpeg4 is compiled into every FFmpeg build, unlike libx264.
fn mpeg4_settings(width: u32, height: u32) -> Settings {
    Settings {
        codec: "mpeg4".to_string(),
        width,
        height,
        pixel_format: ffmpeg_next::format::Pixel::YUV420P,
        bit_rate: 400_000,
        keyframe_interval: 10,
    }
}

fn out_path(name: &str) -> String {
    let path = std::env::temp_dir().join(name);
    if path.exists() {
        std::fs::remove_file(&path).unwrap();
    }
    path.to_string_lossy().into_owned()
}

fn config(spec: CaptureSpec, settings: Settings, output_path: &str) -> PipelineConfig {
    PipelineConfig {
        capture: spec,
        encoder: settings,
        output_path: output_path.to_string(),
        packet_limit: None,
    }
}

#[test]
fn test_transcode_lavfi_to_mp4() {
    crate::init().unwrap();
    let path = out_path("pipe_transcode.mp4");
    let cfg = config(testsrc_spec(2, "320x240", 10), mpeg4_settings(320, 240), &path);

    let stats = Pipeline::new(cfg).run(&CancellationToken::new()).unwrap();

    assert!(stats.trailer_written);
    // 2s @ 10fps of raw video decodes 1:1; allow slack for demuxer rounding.
    assert!(stats.frames_decoded >= 15, "decoded {}", stats.frames_decoded);
    assert!(stats.packets_muxed > 0);
    assert!(std::fs::metadata(&path).unwrap().len() > 0);

    let info = probe(&path).unwrap();
    assert_eq!(info.format.nb_streams, 1);
    assert_eq!(info.streams[0].codec_type, "video");
}

#[test]
fn test_packet_limit_bounds_the_run() {
    crate::init().unwrap();
    let path = out_path("pipe_limited.mp4");
    let mut cfg = config(testsrc_spec(5, "320x240", 10), mpeg4_settings(320, 240), &path);
    cfg.packet_limit = Some(30);

    let stats = Pipeline::new(cfg).run(&CancellationToken::new()).unwrap();

    assert_eq!(stats.video_packets, 30);
    assert!(stats.trailer_written);
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
}

#[test]
fn test_downscale_hits_exact_target() {
    crate::init().unwrap();
    let path = out_path("pipe_downscale.mp4");
    let cfg = config(testsrc_spec(2, "320x240", 10), mpeg4_settings(160, 120), &path);

    let stats = Pipeline::new(cfg).run(&CancellationToken::new()).unwrap();
    assert!(stats.trailer_written);

    let info = probe(&path).unwrap();
    let video = &info.streams[0];
    assert_eq!(video.width, Some(160));
    assert_eq!(video.height, Some(120));
}

#[test]
fn test_cancel_skips_trailer() {
    crate::init().unwrap();
    let path = out_path("pipe_cancelled.mp4");
    let cfg = config(testsrc_spec(5, "320x240", 10), mpeg4_settings(320, 240), &path);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let stats = Pipeline::new(cfg).run(&cancel).unwrap();

    // Draining still completes; only the trailer is skipped.
    assert!(!stats.trailer_written);
    assert_eq!(stats.video_packets, 0);
    // Header was written during Opening, so the file exists regardless.
    assert!(std::path::Path::new(&path).exists());
}

#[test]
fn test_unsupported_encoder_codec_leaves_no_file() {
    crate::init().unwrap();
    let path = out_path("pipe_badcodec.mp4");
    let cfg = config(
        testsrc_spec(1, "320x240", 10),
        Settings {
            codec: "definitely-not-a-codec".to_string(),
            ..mpeg4_settings(320, 240)
        },
        &path,
    );

    let err = Pipeline::new(cfg).run(&CancellationToken::new()).unwrap_err();
    assert!(matches!(err, PipelineError::UnsupportedCodec(_)));
    assert!(!std::path::Path::new(&path).exists());
}

#[test]
fn test_double_header_is_invalid_state() {
    crate::init().unwrap();
    let path = out_path("pipe_header.mp4");
    let spec = testsrc_spec(1, "320x240", 10);
    let settings = mpeg4_settings(320, 240);

    let mut session = CaptureSession::open(&spec, &settings, &path).unwrap();

    let err = session.output.write_header().unwrap_err();
    assert!(matches!(err, PipelineError::InvalidState(_)));

    let err = session.output.add_stream(&session.encoder).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidState(_)));
}
