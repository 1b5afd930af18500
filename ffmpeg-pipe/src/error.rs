use thiserror::Error;

/// Failure kinds for a capture session. Each variant maps to exactly one
/// stage-level failure; none of them is retried at the pipeline level.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no capture backend matches {0:?}")]
    DeviceNotFound(String),

    #[error("opening capture device: {0}")]
    DeviceOpen(#[source] ffmpeg_next::Error),

    #[error("input has no video stream")]
    NoVideoStream,

    #[error("unsupported codec: {0}")]
    UnsupportedCodec(String),

    #[error("opening decoder: {0}")]
    DecoderInit(#[source] ffmpeg_next::Error),

    #[error("opening encoder: {0}")]
    EncoderInit(#[source] ffmpeg_next::Error),

    #[error("sending packet to decoder: {0}")]
    DecodeSubmit(#[source] ffmpeg_next::Error),

    #[error("sending frame to encoder: {0}")]
    EncodeSubmit(#[source] ffmpeg_next::Error),

    #[error("receiving frame from decoder: {0}")]
    Decode(#[source] ffmpeg_next::Error),

    #[error("receiving packet from encoder: {0}")]
    Encode(#[source] ffmpeg_next::Error),

    #[error("no conversion path between source and target formats: {0}")]
    UnsupportedConversion(#[source] ffmpeg_next::Error),

    #[error("opening output container: {0}")]
    OutputOpen(#[source] ffmpeg_next::Error),

    #[error("writing container header: {0}")]
    HeaderWrite(#[source] ffmpeg_next::Error),

    #[error("writing packet to container: {0}")]
    MuxWrite(#[source] ffmpeg_next::Error),

    #[error("invalid container state: {0}")]
    InvalidState(&'static str),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_operation_and_diagnostic() {
        let e = PipelineError::DeviceNotFound("x11grab".to_string());
        assert_eq!(format!("{e}"), "no capture backend matches \"x11grab\"");

        let e = PipelineError::UnsupportedCodec("libx999".to_string());
        assert_eq!(format!("{e}"), "unsupported codec: libx999");

        let e = PipelineError::InvalidState("header already written");
        assert!(format!("{e}").contains("header already written"));
    }

    #[test]
    fn backend_error_is_source() {
        use std::error::Error as _;
        let e = PipelineError::DeviceOpen(ffmpeg_next::Error::InvalidData);
        assert!(e.source().is_some());
        assert!(PipelineError::NoVideoStream.source().is_none());
    }
}
