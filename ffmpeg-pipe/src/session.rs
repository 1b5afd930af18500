use crate::{
    decoder::Decoder,
    encoder::{Encoder, Settings},
    error::Result,
    input::{CaptureInput, CaptureSpec},
    output::FileOutput,
    scaler::Scaler,
    stream,
};

/// The top-level owned aggregate of one capture session: every native
/// context lives here, exclusively, and is released exactly once when the
/// session drops — on clean shutdown, cancellation, and every error path
/// alike.
///
/// Field order is drop order: encoder, scaler, decoder, output container,
/// input context — the reverse of acquisition.
pub struct CaptureSession {
    pub(crate) video_stream_index: usize,
    pub(crate) encoder: Encoder,
    pub(crate) scaler: Scaler,
    pub(crate) decoder: Decoder,
    pub(crate) output: FileOutput,
    pub(crate) input: CaptureInput,
}

impl CaptureSession {
    /// Runs the whole opening sequence: device open and stream probe,
    /// video stream selection, decoder, encoder, conversion context, output
    /// container with its single stream, and the container header. A
    /// failure at any step drops whatever was already acquired and surfaces
    /// the failing stage's error kind.
    ///
    /// The encoder opens before the output file is created, so a rejected
    /// codec leaves nothing on disk.
    pub fn open(spec: &CaptureSpec, settings: &Settings, output_path: &str) -> Result<Self> {
        let input = CaptureInput::open(spec)?;
        let video_stream_index = stream::select_video_stream(input.streams())?;
        let video_stream = input.streams()[video_stream_index].clone();

        let decoder = Decoder::new(&video_stream)?;
        let encoder = Encoder::new(&video_stream, settings)?;
        let scaler = Scaler::new(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            encoder.format(),
            encoder.width(),
            encoder.height(),
        )?;

        let mut output = FileOutput::open(output_path)?;
        output.add_stream(&encoder)?;
        output.write_header()?;

        Ok(Self {
            video_stream_index,
            encoder,
            scaler,
            decoder,
            output,
            input,
        })
    }

    pub fn video_stream_index(&self) -> usize {
        self.video_stream_index
    }
}
