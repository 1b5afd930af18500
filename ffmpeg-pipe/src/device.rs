use std::ffi::CString;
use std::fmt::{Display, Formatter};

use crate::error::{PipelineError, Result};

/// Resolve a capture input format by name (e.g. "x11grab", "v4l2", "lavfi")
/// via FFmpeg's av_find_input_format. Fails when no backend of that name is
/// compiled into the linked FFmpeg.
pub fn find_input_format(name: &str) -> Result<ffmpeg_next::format::format::Input> {
    let cname =
        CString::new(name).map_err(|_| PipelineError::DeviceNotFound(name.to_string()))?;
    let ptr = unsafe { ffmpeg_next::ffi::av_find_input_format(cname.as_ptr()) };
    if ptr.is_null() {
        return Err(PipelineError::DeviceNotFound(name.to_string()));
    }
    Ok(unsafe { ffmpeg_next::format::format::Input::wrap(ptr as *mut _) })
}

/// Input video format usable as a capture backend (e.g. x11grab, v4l2, lavfi).
pub struct VideoDevice {
    inner: ffmpeg_next::Format,
}

impl VideoDevice {
    fn new(inner: ffmpeg_next::Format) -> Self {
        Self { inner }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn description(&self) -> &str {
        self.inner.description()
    }
}

impl Display for VideoDevice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "name: {}, description: {}", self.name(), self.description())
    }
}

/// All registered video input backends. Observability only; selection goes
/// through `find_input_format`.
pub fn input_video_list() -> Vec<VideoDevice> {
    ffmpeg_next::device::input::video()
        .map(VideoDevice::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_video_list() {
        crate::init().unwrap();
        let devices = input_video_list();
        for device in devices.iter() {
            println!("{}", device);
        }
        assert!(!devices.is_empty());
    }

    #[test]
    fn test_find_input_format_unknown() {
        crate::init().unwrap();
        let err = find_input_format("not-a-real-grabber").unwrap_err();
        assert!(matches!(err, PipelineError::DeviceNotFound(_)));
    }
}
