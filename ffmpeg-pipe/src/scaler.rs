use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;

use crate::error::{PipelineError, Result};

/// Fixed pixel-format and geometry conversion from decoder output to encoder
/// input. Configured once; the mapping is immutable afterwards.
pub struct Scaler {
    context: scaling::Context,
    dst_format: Pixel,
    dst_width: u32,
    dst_height: u32,
}

impl Scaler {
    pub fn new(
        src_format: Pixel,
        src_width: u32,
        src_height: u32,
        dst_format: Pixel,
        dst_width: u32,
        dst_height: u32,
    ) -> Result<Self> {
        let context = scaling::Context::get(
            src_format,
            src_width,
            src_height,
            dst_format,
            dst_width,
            dst_height,
            scaling::flag::Flags::BILINEAR,
        )
        .map_err(PipelineError::UnsupportedConversion)?;

        log::info!(
            "scaler configured: {:?} {}x{} -> {:?} {}x{}",
            src_format,
            src_width,
            src_height,
            dst_format,
            dst_width,
            dst_height
        );

        Ok(Self {
            context,
            dst_format,
            dst_width,
            dst_height,
        })
    }

    pub fn dst_format(&self) -> Pixel {
        self.dst_format
    }

    pub fn dst_width(&self) -> u32 {
        self.dst_width
    }

    pub fn dst_height(&self) -> u32 {
        self.dst_height
    }

    /// Converts `frame` into the caller-owned `dst` buffer. An empty `dst`
    /// is allocated to the configured destination geometry; a non-empty one
    /// must already match it.
    pub fn run(
        &mut self,
        frame: &ffmpeg_next::frame::Video,
        dst: &mut ffmpeg_next::frame::Video,
    ) -> Result<()> {
        self.context
            .run(frame, dst)
            .map_err(PipelineError::UnsupportedConversion)
    }
}

unsafe impl Send for Scaler {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dst_geometry_is_exact() {
        crate::init().unwrap();
        let mut scaler =
            Scaler::new(Pixel::RGB24, 320, 240, Pixel::YUV420P, 160, 120).unwrap();

        let src = ffmpeg_next::frame::Video::new(Pixel::RGB24, 320, 240);
        let mut dst = ffmpeg_next::frame::Video::empty();
        scaler.run(&src, &mut dst).unwrap();

        assert_eq!(dst.width(), scaler.dst_width());
        assert_eq!(dst.height(), scaler.dst_height());
        assert_eq!(dst.format(), scaler.dst_format());
        assert_eq!((dst.width(), dst.height()), (160, 120));
    }
}
