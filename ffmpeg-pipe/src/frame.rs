use bytes::Bytes;

/// A decoded video frame. Wraps the FFmpeg frame buffer together with the
/// geometry/format accessors the pipeline needs.
pub struct RawVideoFrame {
    frame: ffmpeg_next::frame::Video,
}

impl RawVideoFrame {
    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    pub fn format(&self) -> ffmpeg_next::format::Pixel {
        self.frame.format()
    }

    pub fn pts(&self) -> Option<i64> {
        self.frame.pts()
    }

    pub fn is_key(&self) -> bool {
        self.frame.is_key()
    }

    pub fn kind(&self) -> ffmpeg_next::picture::Type {
        self.frame.kind()
    }

    /// Byte size of the first data plane.
    pub fn plane_size(&self) -> usize {
        self.frame.data(0).len()
    }

    pub fn data(&self) -> Bytes {
        Bytes::copy_from_slice(self.frame.data(0))
    }

    pub fn as_video(&self) -> &ffmpeg_next::frame::Video {
        &self.frame
    }

    pub fn get_mut(&mut self) -> &mut ffmpeg_next::frame::Video {
        &mut self.frame
    }
}

impl From<ffmpeg_next::frame::Video> for RawVideoFrame {
    fn from(frame: ffmpeg_next::frame::Video) -> Self {
        Self { frame }
    }
}
