use anyhow::Context;
use tokio_util::sync::CancellationToken;

use ffmpeg_pipe::pipeline::{Pipeline, PipelineStats};

mod config;

fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .filter_module("ffmpeg_pipe", log::LevelFilter::Debug)
        .init();
}

async fn run(cancel: CancellationToken) -> anyhow::Result<PipelineStats> {
    ffmpeg_pipe::init().context("ffmpeg init")?;

    for device in ffmpeg_pipe::device::input_video_list() {
        log::debug!("capture backend available: {}", device);
    }

    let pipeline_cancel = cancel.clone();
    let pipeline_config = config::config().pipeline();
    let mut handle = tokio::task::spawn_blocking(move || {
        Pipeline::new(pipeline_config).run(&pipeline_cancel)
    });

    let result = tokio::select! {
        result = &mut handle => result,
        _ = tokio::signal::ctrl_c() => {
            log::info!("interrupt received, draining session");
            cancel.cancel();
            (&mut handle).await
        }
    };

    let stats = result.context("pipeline task join")??;
    Ok(stats)
}

#[tokio::main]
async fn main() -> ! {
    init_logging();

    let cancel = CancellationToken::new();
    match run(cancel).await {
        Ok(stats) => {
            log::info!(
                "capture session closed: {} packets muxed, trailer written: {}",
                stats.packets_muxed,
                stats.trailer_written
            );
            std::process::exit(0);
        }
        Err(e) => {
            log::error!("capture session failed: {e:#}");
            std::process::exit(1);
        }
    }
}
