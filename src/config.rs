use std::sync::LazyLock;

use ffmpeg_pipe::Pixel;
use ffmpeg_pipe::encoder::Settings;
use ffmpeg_pipe::input::CaptureSpec;
use ffmpeg_pipe::pipeline::PipelineConfig;

pub struct AppConfig {
    pipeline: PipelineConfig,
}

impl AppConfig {
    fn new() -> Self {
        let display = std::env::var("DISPLAY").unwrap_or_else(|_| ":0.0".to_string());
        Self {
            pipeline: PipelineConfig {
                capture: CaptureSpec {
                    format: "x11grab".to_string(),
                    target: display,
                    framerate: Some(10),
                    frame_size: Some((1920, 1080)),
                    probesize: None,
                },
                encoder: Settings {
                    codec: "libx264".to_string(),
                    width: 1280,
                    height: 720,
                    pixel_format: Pixel::YUV420P,
                    bit_rate: 2_500_000,
                    keyframe_interval: 20,
                },
                output_path: "capture.mp4".to_string(),
                packet_limit: None,
            },
        }
    }

    pub fn pipeline(&self) -> PipelineConfig {
        self.pipeline.clone()
    }
}

pub fn config() -> &'static AppConfig {
    static CONFIG: LazyLock<AppConfig> = LazyLock::new(AppConfig::new);
    &CONFIG
}
