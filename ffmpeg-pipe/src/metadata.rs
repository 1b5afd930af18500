//! Container metadata probing (similar to ffprobe).

use std::fmt;

use crate::error::{PipelineError, Result};
use crate::stream::AvStream;

/// Format-level info.
#[derive(Debug, Clone)]
pub struct FormatInfo {
    /// Format name, e.g. "mov,mp4,m4a,3gp,3g2,mj2"
    pub format_name: String,
    /// Duration in seconds; None if unknown.
    pub duration_sec: Option<f64>,
    /// Number of streams.
    pub nb_streams: u32,
}

/// Per-stream info.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub index: usize,
    /// "video" | "audio" | "subtitle" etc.
    pub codec_type: String,
    /// Codec name, e.g. "h264"
    pub codec_name: String,
    /// Time base, e.g. "1/90000"
    pub time_base: String,
    /// Frame rate / sample rate, e.g. "10/1"
    pub rate: String,
    /// Video only: width.
    pub width: Option<u32>,
    /// Video only: height.
    pub height: Option<u32>,
}

/// Full probe result (format + streams).
#[derive(Debug, Clone)]
pub struct MediaInfo {
    pub format: FormatInfo,
    pub streams: Vec<StreamInfo>,
}

impl fmt::Display for MediaInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[FORMAT]")?;
        writeln!(f, "format_name={}", self.format.format_name)?;
        if let Some(d) = self.format.duration_sec {
            writeln!(f, "duration_sec={:.3}", d)?;
        } else {
            writeln!(f, "duration_sec=N/A")?;
        }
        writeln!(f, "nb_streams={}", self.format.nb_streams)?;
        writeln!(f, "[/FORMAT]")?;
        for s in &self.streams {
            writeln!(f, "[STREAM]")?;
            writeln!(f, "index={}", s.index)?;
            writeln!(f, "codec_type={}", s.codec_type)?;
            writeln!(f, "codec_name={}", s.codec_name)?;
            writeln!(f, "time_base={}", s.time_base)?;
            writeln!(f, "rate={}", s.rate)?;
            if let Some(w) = s.width {
                writeln!(f, "width={}", w)?;
            }
            if let Some(h) = s.height {
                writeln!(f, "height={}", h)?;
            }
            writeln!(f, "[/STREAM]")?;
        }
        Ok(())
    }
}

/// Opens a finished container file and returns its metadata.
pub fn probe(path: &str) -> Result<MediaInfo> {
    let input = ffmpeg_next::format::input(&path).map_err(PipelineError::DeviceOpen)?;

    let format_name = input.format().name().to_string();
    let nb_streams = input.nb_streams();
    // AV_TIME_BASE = 1_000_000; duration is in 1/AV_TIME_BASE seconds
    let duration_sec = {
        let d = input.duration();
        if d == ffmpeg_next::ffi::AV_NOPTS_VALUE || d <= 0 {
            None
        } else {
            Some(d as f64 / 1_000_000.0)
        }
    };

    let mut streams = Vec::with_capacity(nb_streams as usize);
    for stream in input.streams() {
        let av_stream = AvStream::from(stream);
        let params = av_stream.parameters();
        let codec_type = format!("{:?}", params.medium()).to_lowercase();
        let codec_name = format!("{:?}", params.id()).to_lowercase();
        let time_base = av_stream.time_base();
        let rate = av_stream.rate();

        let (width, height) = if av_stream.is_video() {
            (Some(av_stream.width()), Some(av_stream.height()))
        } else {
            (None, None)
        };

        streams.push(StreamInfo {
            index: av_stream.index(),
            codec_type,
            codec_name,
            time_base: format!("{}/{}", time_base.numerator(), time_base.denominator()),
            rate: format!("{}/{}", rate.numerator(), rate.denominator()),
            width,
            height,
        });
    }

    Ok(MediaInfo {
        format: FormatInfo {
            format_name,
            duration_sec,
            nb_streams,
        },
        streams,
    })
}
