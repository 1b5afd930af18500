use ffmpeg_next::{Dictionary, Rational};

use crate::{
    error::{PipelineError, Result},
    hw::find_hw_encoder,
    packet::RawPacket,
    stream::AvStream,
};

/// Target parameters for the encode session: codec, geometry, pixel format,
/// bit rate, and key-frame cadence. The frame rate and time base come from
/// the input stream at open time.
#[derive(Debug, Clone)]
pub struct Settings {
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub pixel_format: ffmpeg_next::format::Pixel,
    pub bit_rate: usize,
    pub keyframe_interval: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            width: 1920,
            height: 1080,
            pixel_format: ffmpeg_next::format::Pixel::YUV420P,
            bit_rate: 2_000_000,
            keyframe_interval: 25,
        }
    }
}

/// Stateful video encode session. Frames go in through `send_frame`, packets
/// come back out through `receive_packet` until the codec needs more input.
/// One frame may yield zero, one, or several packets.
pub struct Encoder {
    inner: ffmpeg_next::codec::encoder::Video,
    encoder_time_base: Rational,
    rate: Rational,
    frame_index: i64,
}

impl Encoder {
    pub fn new(stream: &AvStream, settings: &Settings) -> Result<Self> {
        // Try a hardware encoder first, then fall back to the named software
        // codec; an unknown name is UnsupportedCodec.
        let find_sw_codec = || {
            ffmpeg_next::encoder::find_by_name(&settings.codec)
                .ok_or_else(|| PipelineError::UnsupportedCodec(settings.codec.clone()))
        };
        let (encoder_context, selected_codec_name) = match find_hw_encoder(&settings.codec) {
            Some(hw_codec) => {
                let hw_name = hw_codec.name().to_string();
                log::info!("attempting hardware encoder: {}", hw_name);
                (ffmpeg_next::codec::Context::new_with_codec(hw_codec), hw_name)
            }
            None => (
                ffmpeg_next::codec::Context::new_with_codec(find_sw_codec()?),
                settings.codec.clone(),
            ),
        };

        let rate = if stream.rate().numerator() > 0 {
            stream.rate()
        } else {
            Rational(25, 1)
        };

        let open_encoder = |ctx: ffmpeg_next::codec::Context,
                            settings: &Settings|
         -> std::result::Result<
            ffmpeg_next::codec::encoder::Video,
            ffmpeg_next::Error,
        > {
            let mut encoder = ctx.encoder().video()?;
            encoder.set_width(settings.width);
            encoder.set_height(settings.height);
            encoder.set_format(settings.pixel_format);
            encoder.set_bit_rate(settings.bit_rate);
            encoder.set_gop(settings.keyframe_interval);
            encoder.set_frame_rate(Some(rate));
            encoder.set_time_base(Rational(rate.denominator(), rate.numerator()));

            let mut opts = Dictionary::new();
            opts.set("preset", "ultrafast");
            opts.set("tune", "zerolatency");
            encoder.open_with(opts)
        };

        let encoder = match open_encoder(encoder_context, settings) {
            Ok(enc) => {
                log::info!("encoder opened: {}", selected_codec_name);
                enc
            }
            Err(e) => {
                // Hardware encoders fail to open on machines without the
                // device; retry once with the software codec.
                if selected_codec_name != settings.codec {
                    log::warn!(
                        "hardware encoder {} failed: {}, falling back to {}",
                        selected_codec_name,
                        e,
                        settings.codec
                    );
                    let sw_ctx = ffmpeg_next::codec::Context::new_with_codec(find_sw_codec()?);
                    let enc = open_encoder(sw_ctx, settings).map_err(PipelineError::EncoderInit)?;
                    log::info!("encoder opened (fallback): {}", settings.codec);
                    enc
                } else {
                    return Err(PipelineError::EncoderInit(e));
                }
            }
        };

        let encoder_time_base: Rational = unsafe { (*encoder.0.as_ptr()).time_base.into() };

        Ok(Self {
            inner: encoder,
            encoder_time_base,
            rate,
            frame_index: 0,
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

    pub fn time_base(&self) -> Rational {
        self.encoder_time_base
    }

    pub(crate) fn inner(&self) -> &ffmpeg_next::codec::encoder::Video {
        &self.inner
    }

    /// Submits one frame. Presentation timestamps are assigned here as a
    /// running frame count in the encoder time base (one tick per frame).
    pub fn send_frame(&mut self, frame: &mut ffmpeg_next::frame::Video) -> Result<()> {
        frame.set_pts(Some(self.frame_index));
        self.inner
            .send_frame(frame)
            .map_err(PipelineError::EncodeSubmit)?;
        self.frame_index += 1;
        Ok(())
    }

    /// Signals end of stream; buffered packets drain out through
    /// `receive_packet` afterwards.
    pub fn send_eof(&mut self) -> Result<()> {
        self.inner.send_eof().map_err(PipelineError::EncodeSubmit)
    }

    /// Pulls one encoded packet. `Ok(None)` means the codec needs more
    /// input (or has fully drained); flow control, not a failure.
    pub fn receive_packet(&mut self) -> Result<Option<RawPacket>> {
        let mut packet = ffmpeg_next::codec::packet::Packet::empty();
        match self.inner.receive_packet(&mut packet) {
            Ok(()) => {
                let mut packet = RawPacket::from((packet, self.encoder_time_base));
                if self.rate.numerator() > 0 && self.encoder_time_base.numerator() > 0 {
                    let duration = self.rate.denominator() as i64
                        * self.encoder_time_base.denominator() as i64
                        / (self.rate.numerator() as i64
                            * self.encoder_time_base.numerator() as i64);
                    packet.set_duration(duration.max(1));
                }
                Ok(Some(packet))
            }
            Err(ffmpeg_next::Error::Other { errno })
                if errno == ffmpeg_next::util::error::EAGAIN =>
            {
                Ok(None)
            }
            Err(ffmpeg_next::Error::Eof) => Ok(None),
            Err(err) => Err(PipelineError::Encode(err)),
        }
    }
}
