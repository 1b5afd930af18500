use ffmpeg_next::Rational;

use crate::{
    encoder::Encoder,
    error::{PipelineError, Result},
    packet::RawPacket,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderState {
    NotWritten,
    Written,
    Finalized,
}

/// The output container file. Format is inferred from the path extension.
/// Header and trailer writes follow a strict NotWritten -> Written ->
/// Finalized progression; misuse is InvalidState, never silent.
pub struct FileOutput {
    inner: ffmpeg_next::format::context::Output,
    stream_index: Option<usize>,
    header: HeaderState,
}

impl FileOutput {
    pub fn open(path: &str) -> Result<Self> {
        let output = ffmpeg_next::format::output(&path).map_err(PipelineError::OutputOpen)?;
        log::info!("output container open: {}", path);
        Ok(Self {
            inner: output,
            stream_index: None,
            header: HeaderState::NotWritten,
        })
    }

    /// Declares the single output stream from the opened encoder. Must
    /// happen before the header is written.
    pub fn add_stream(&mut self, encoder: &Encoder) -> Result<()> {
        if self.header != HeaderState::NotWritten {
            return Err(PipelineError::InvalidState(
                "add_stream after header was written",
            ));
        }
        let parameters = ffmpeg_next::codec::Parameters::from(encoder.inner());
        let mut stream = self
            .inner
            .add_stream(ffmpeg_next::encoder::find(parameters.id()))
            .map_err(PipelineError::OutputOpen)?;
        stream.set_parameters(parameters);
        stream.set_time_base(encoder.time_base());
        self.stream_index = Some(stream.index());
        Ok(())
    }

    pub fn write_header(&mut self) -> Result<()> {
        match self.header {
            HeaderState::NotWritten => {
                self.inner
                    .write_header()
                    .map_err(PipelineError::HeaderWrite)?;
                self.header = HeaderState::Written;
                Ok(())
            }
            HeaderState::Written | HeaderState::Finalized => {
                Err(PipelineError::InvalidState("header already written"))
            }
        }
    }

    /// Interleaves one encoded packet into the container, rescaling its
    /// timestamps from the producer's time base to the muxer stream's. This
    /// is the single place timestamps are rewritten.
    pub fn write_packet(&mut self, mut packet: RawPacket) -> Result<()> {
        if self.header != HeaderState::Written {
            return Err(PipelineError::InvalidState(
                "write_packet without a written header",
            ));
        }
        let stream_index = self
            .stream_index
            .ok_or(PipelineError::InvalidState("no output stream declared"))?;
        let time_base = packet.time_base();
        let out_time_base = self.out_time_base(stream_index);

        let p = packet.get_mut();
        p.set_stream(stream_index);
        p.set_position(-1);
        p.rescale_ts(time_base, out_time_base);
        p.write_interleaved(&mut self.inner)
            .map_err(PipelineError::MuxWrite)
    }

    /// Finalizes the container. Exactly once, and only after the header;
    /// a cancelled session skips this entirely (the caller logs the skip).
    pub fn write_trailer(&mut self) -> Result<()> {
        match self.header {
            HeaderState::Written => {
                self.inner
                    .write_trailer()
                    .map_err(PipelineError::MuxWrite)?;
                self.header = HeaderState::Finalized;
                Ok(())
            }
            HeaderState::NotWritten => {
                Err(PipelineError::InvalidState("trailer before header"))
            }
            HeaderState::Finalized => {
                Err(PipelineError::InvalidState("trailer already written"))
            }
        }
    }

    pub fn stream_index(&self) -> Option<usize> {
        self.stream_index
    }

    fn out_time_base(&self, stream_index: usize) -> Rational {
        // The muxer may adjust the declared time base during write_header.
        self.inner
            .stream(stream_index)
            .map(|s| s.time_base())
            .unwrap_or(Rational(1, 1_000_000))
    }
}
