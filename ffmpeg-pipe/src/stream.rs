use ffmpeg_next::{Rational, codec::Parameters, format::stream};

use crate::error::{PipelineError, Result};

unsafe impl Send for AvStream {}
unsafe impl Sync for AvStream {}

/// One elementary stream as probed from the input. Immutable once built.
pub struct AvStream {
    index: usize,
    parameters: Parameters,
    time_base: Rational,
    rate: Rational,
}

impl AvStream {
    pub fn index(&self) -> usize {
        self.index
    }
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }
    pub fn time_base(&self) -> Rational {
        self.time_base
    }
    pub fn rate(&self) -> Rational {
        self.rate
    }

    pub fn is_video(&self) -> bool {
        self.parameters.medium() == ffmpeg_next::media::Type::Video
    }

    pub fn is_audio(&self) -> bool {
        self.parameters.medium() == ffmpeg_next::media::Type::Audio
    }

    pub fn width(&self) -> u32 {
        unsafe {
            let ptr = self.parameters.as_ptr() as *const ffmpeg_next::ffi::AVCodecParameters;
            (*ptr).width.max(0) as u32
        }
    }

    pub fn height(&self) -> u32 {
        unsafe {
            let ptr = self.parameters.as_ptr() as *const ffmpeg_next::ffi::AVCodecParameters;
            (*ptr).height.max(0) as u32
        }
    }

    pub fn bit_rate(&self) -> i64 {
        unsafe {
            let ptr = self.parameters.as_ptr() as *const ffmpeg_next::ffi::AVCodecParameters;
            (*ptr).bit_rate
        }
    }

    pub fn sample_rate(&self) -> u32 {
        unsafe {
            let ptr = self.parameters.as_ptr() as *const ffmpeg_next::ffi::AVCodecParameters;
            (*ptr).sample_rate.max(0) as u32
        }
    }

    pub fn channels(&self) -> u32 {
        unsafe {
            let ptr = self.parameters.as_ptr() as *const ffmpeg_next::ffi::AVCodecParameters;
            (*ptr).ch_layout.nb_channels.max(0) as u32
        }
    }
}

impl From<stream::Stream<'_>> for AvStream {
    fn from(stream: stream::Stream<'_>) -> Self {
        Self {
            index: stream.index(),
            parameters: stream.parameters(),
            time_base: stream.time_base(),
            rate: stream.avg_frame_rate(),
        }
    }
}

impl Clone for AvStream {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            parameters: self.parameters.clone(),
            time_base: self.time_base,
            rate: self.rate,
        }
    }
}

/// Picks the first video stream, logging what was probed for every stream
/// along the way. The diagnostics are observability only; the type filter is
/// the single control decision made here.
pub fn select_video_stream(streams: &[AvStream]) -> Result<usize> {
    let mut video_stream_index = None;

    for stream in streams {
        let params = stream.parameters();
        log::info!(
            "stream {}: codec {:?} id {} bit_rate {}, time_base {}/{}",
            stream.index(),
            params.id(),
            params.id() as i32,
            stream.bit_rate(),
            stream.time_base().numerator(),
            stream.time_base().denominator(),
        );
        if stream.is_video() {
            log::info!(
                "stream {}: video, resolution {} x {}",
                stream.index(),
                stream.width(),
                stream.height()
            );
            if video_stream_index.is_none() {
                video_stream_index = Some(stream.index());
            }
        } else if stream.is_audio() {
            log::info!(
                "stream {}: audio, {} channels, sample rate {}",
                stream.index(),
                stream.channels(),
                stream.sample_rate()
            );
        }
    }

    video_stream_index.ok_or(PipelineError::NoVideoStream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_video_stream_empty() {
        let err = select_video_stream(&[]).unwrap_err();
        assert!(matches!(err, PipelineError::NoVideoStream));
    }
}
