/// Registers FFmpeg components (format, device, etc.). Call once at startup
/// before opening device inputs like x11grab or lavfi.
pub fn init() -> Result<(), ffmpeg_next::Error> {
    ffmpeg_next::init()
}

pub mod decoder;
pub mod device;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod input;
pub mod metadata;
pub mod output;
pub mod packet;
pub mod pipeline;
pub mod scaler;
pub mod session;
pub mod stream;

mod hw;

pub use error::{PipelineError, Result};
pub use ffmpeg_next::format::Pixel;
