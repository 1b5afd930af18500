use ffmpeg_next::Rational;

use crate::{
    error::{PipelineError, Result},
    frame::RawVideoFrame,
    packet::RawPacket,
    stream::AvStream,
};

/// Stateful video decode session bound to one input stream. Packets go in
/// through `send_packet`, frames come back out through `receive_frame` until
/// the codec reports it needs more input.
pub struct Decoder {
    inner: ffmpeg_next::codec::decoder::Video,
    decoder_time_base: Rational,
    frames_decoded: u64,
    warned_pixel_format: bool,
}

impl Decoder {
    pub fn new(stream: &AvStream) -> Result<Self> {
        let codec_id = stream.parameters().id();
        if ffmpeg_next::decoder::find(codec_id).is_none() {
            return Err(PipelineError::UnsupportedCodec(format!("{:?}", codec_id)));
        }

        let mut decoder_ctx = ffmpeg_next::codec::Context::new();
        unsafe {
            (*decoder_ctx.as_mut_ptr()).time_base = stream.time_base().into();
        }
        decoder_ctx
            .set_parameters(stream.parameters().clone())
            .map_err(PipelineError::DecoderInit)?;

        let video_decoder = decoder_ctx
            .decoder()
            .video()
            .map_err(PipelineError::DecoderInit)?;
        let decoder_time_base = video_decoder.time_base();

        if video_decoder.format() == ffmpeg_next::format::Pixel::None
            || video_decoder.width() == 0
            || video_decoder.height() == 0
        {
            return Err(PipelineError::DecoderInit(ffmpeg_next::Error::InvalidData));
        }

        log::info!(
            "decoder open: {:?}, {} x {}, format {:?}",
            codec_id,
            video_decoder.width(),
            video_decoder.height(),
            video_decoder.format()
        );

        Ok(Self {
            inner: video_decoder,
            decoder_time_base,
            frames_decoded: 0,
            warned_pixel_format: false,
        })
    }

    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    pub fn format(&self) -> ffmpeg_next::format::Pixel {
        self.inner.format()
    }

    pub fn send_packet(&mut self, mut packet: RawPacket) -> Result<()> {
        let time_base = packet.time_base();
        let packet = packet.get_mut();
        packet.rescale_ts(time_base, self.decoder_time_base);
        self.inner
            .send_packet(packet)
            .map_err(PipelineError::DecodeSubmit)
    }

    /// Signals end of stream; remaining buffered frames drain out through
    /// `receive_frame` afterwards.
    pub fn send_eof(&mut self) -> Result<()> {
        self.inner.send_eof().map_err(PipelineError::DecodeSubmit)
    }

    /// Pulls one decoded frame. `Ok(None)` means the codec needs more input
    /// (or has fully drained) and ends the current drain sequence; it is
    /// flow control, not a failure.
    pub fn receive_frame(&mut self) -> Result<Option<RawVideoFrame>> {
        let mut frame = ffmpeg_next::frame::Video::empty();
        match self.inner.receive_frame(&mut frame) {
            Ok(()) => {
                self.frames_decoded += 1;
                let frame = RawVideoFrame::from(frame);
                self.log_frame(&frame);
                Ok(Some(frame))
            }
            Err(ffmpeg_next::Error::Eof) => Ok(None),
            Err(ffmpeg_next::Error::Other { errno })
                if errno == ffmpeg_next::util::error::EAGAIN =>
            {
                Ok(None)
            }
            Err(err) => Err(PipelineError::Decode(err)),
        }
    }

    fn log_frame(&mut self, frame: &RawVideoFrame) {
        log::debug!(
            "frame {} (type {:?}, {} bytes, format {:?}) pts {:?} key_frame {}",
            self.frames_decoded,
            frame.kind(),
            frame.plane_size(),
            frame.format(),
            frame.pts(),
            frame.is_key()
        );
        if frame.format() != ffmpeg_next::format::Pixel::YUV420P && !self.warned_pixel_format {
            self.warned_pixel_format = true;
            log::warn!(
                "decoded pixel format is {:?}, not planar YUV 4:2:0; grayscale/plane assumptions downstream may not hold",
                frame.format()
            );
        }
    }
}
