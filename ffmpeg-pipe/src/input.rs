use std::path::Path;

use ffmpeg_next::Dictionary;

use crate::{
    device,
    error::{PipelineError, Result},
    packet::RawPacket,
    stream::AvStream,
};

/// Identifies a capture source: which FFmpeg input backend to use and what
/// to ask it for. Recognized negotiation options are the frame rate, the
/// frame size, and an optional probe-size hint for devices that need extra
/// data before they can report stream geometry.
#[derive(Clone, Debug)]
pub struct CaptureSpec {
    /// Input format name for the backend, e.g. "x11grab", "v4l2", "lavfi".
    pub format: String,
    /// Backend-specific target, e.g. ":0.0" for x11grab or a lavfi graph.
    pub target: String,
    /// Requested frames per second.
    pub framerate: Option<u32>,
    /// Requested frame size as (width, height).
    pub frame_size: Option<(u32, u32)>,
    /// Probe size hint in bytes.
    pub probesize: Option<u64>,
}

impl CaptureSpec {
    fn options(&self) -> Dictionary<'_> {
        let mut options = Dictionary::new();
        if let Some(rate) = self.framerate {
            options.set("framerate", &rate.to_string());
        }
        if let Some((width, height)) = self.frame_size {
            options.set("video_size", &format!("{}x{}", width, height));
        }
        if let Some(probesize) = self.probesize {
            options.set("probesize", &probesize.to_string());
        }
        options
    }
}

/// An opened capture device: the demux context plus the probed streams.
/// Stream-info probing happens during `open` and any probe failure is fatal.
pub struct CaptureInput {
    inner: ffmpeg_next::format::context::Input,
    streams: Vec<AvStream>,
}

impl CaptureInput {
    pub fn open(spec: &CaptureSpec) -> Result<Self> {
        use ffmpeg_next::format::format::Format;

        let format = device::find_input_format(&spec.format)?;
        let ctx = ffmpeg_next::format::open_with(
            Path::new(&spec.target),
            &Format::Input(format),
            spec.options(),
        )
        .map_err(PipelineError::DeviceOpen)?;
        let input = ctx.input();

        let streams: Vec<AvStream> = input.streams().map(AvStream::from).collect();
        log::info!(
            "capture device open: {} {:?}, {} stream(s)",
            spec.format,
            spec.target,
            streams.len()
        );

        Ok(Self {
            inner: input,
            streams,
        })
    }

    pub fn streams(&self) -> &[AvStream] {
        &self.streams
    }

    /// Pulls the next demuxed packet. Blocks on device I/O; `None` means the
    /// source is exhausted. This is the pipeline's sole blocking point.
    pub fn read_packet(&mut self) -> Option<RawPacket> {
        match self.inner.packets().next() {
            Some((stream, packet)) => Some((packet, stream.time_base()).into()),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_unknown_backend() {
        crate::init().unwrap();
        let spec = CaptureSpec {
            format: "no-such-grabber".to_string(),
            target: ":0.0".to_string(),
            framerate: None,
            frame_size: None,
            probesize: None,
        };
        let err = CaptureInput::open(&spec).unwrap_err();
        assert!(matches!(err, PipelineError::DeviceNotFound(_)));
    }
}
