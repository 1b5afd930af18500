use std::fmt;

use tokio_util::sync::CancellationToken;

use crate::{
    encoder::Settings,
    error::Result,
    input::CaptureSpec,
    session::CaptureSession,
};

/// Everything one capture session needs: where to capture from, how to
/// encode, where to write, and an optional packet budget for bounded runs.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub capture: CaptureSpec,
    pub encoder: Settings,
    pub output_path: String,
    /// Stop after this many video packets have been decoded. None = run
    /// until end of input or cancellation.
    pub packet_limit: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Opening,
    Running,
    Draining,
    Closed,
    Failed,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Idle => "Idle",
            State::Opening => "Opening",
            State::Running => "Running",
            State::Draining => "Draining",
            State::Closed => "Closed",
            State::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Counters observable after a run. Encoded-packet and decoded-frame totals
/// may legitimately differ; the drain contract only guarantees nothing is
/// dropped before its drain sequence reports exhaustion.
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// All packets pulled from the capture source, any stream.
    pub packets_read: u64,
    /// Packets on the selected video stream submitted to the decoder.
    pub video_packets: u64,
    pub frames_decoded: u64,
    pub frames_encoded: u64,
    pub packets_muxed: u64,
    /// False when cancellation skipped the trailer; the file may be
    /// non-conformant in that case.
    pub trailer_written: bool,
}

/// Why the Running loop stopped reading.
enum StopReason {
    EndOfInput,
    PacketLimit,
    Cancelled,
}

/// Drives one capture session through Opening, Running, Draining and
/// Closed. Single-threaded and synchronous: the only blocking point is the
/// capture source's packet read, and the cancellation token is polled once
/// per loop iteration, never between a submit and its drain.
pub struct Pipeline {
    config: PipelineConfig,
    state: State,
    stats: PipelineStats,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            state: State::Idle,
            stats: PipelineStats::default(),
        }
    }

    /// Runs to completion. On failure the session still tears down before
    /// the error kind is surfaced to the caller.
    pub fn run(mut self, cancel: &CancellationToken) -> Result<PipelineStats> {
        match self.run_inner(cancel) {
            Ok(()) => {
                self.enter(State::Closed);
                Ok(self.stats)
            }
            Err(e) => {
                self.enter(State::Failed);
                log::error!("pipeline failed: {e}");
                Err(e)
            }
        }
    }

    fn run_inner(&mut self, cancel: &CancellationToken) -> Result<()> {
        self.enter(State::Opening);
        let mut session = CaptureSession::open(
            &self.config.capture,
            &self.config.encoder,
            &self.config.output_path,
        )?;

        self.enter(State::Running);
        let stop = self.run_loop(&mut session, cancel)?;

        self.enter(State::Draining);
        self.drain(&mut session, &stop)?;
        Ok(())
    }

    /// The frame loop: read one packet, discard other streams, decode,
    /// drain decoded frames through convert -> encode -> mux.
    fn run_loop(
        &mut self,
        session: &mut CaptureSession,
        cancel: &CancellationToken,
    ) -> Result<StopReason> {
        let mut converted = ffmpeg_next::frame::Video::empty();

        loop {
            // Between iterations nothing is half-processed; this is the
            // safe point to observe cancellation.
            if cancel.is_cancelled() {
                log::info!("cancellation observed after {} packets", self.stats.packets_read);
                return Ok(StopReason::Cancelled);
            }
            if let Some(limit) = self.config.packet_limit {
                if self.stats.video_packets >= limit {
                    log::info!("packet limit {} reached", limit);
                    return Ok(StopReason::PacketLimit);
                }
            }

            let packet = match session.input.read_packet() {
                Some(packet) => packet,
                None => return Ok(StopReason::EndOfInput),
            };
            self.stats.packets_read += 1;
            if packet.stream_index() != session.video_stream_index {
                continue;
            }

            log::debug!(
                "packet: stream {} pts {:?} dts {:?} size {}",
                packet.stream_index(),
                packet.pts(),
                packet.dts(),
                packet.size()
            );
            session.decoder.send_packet(packet)?;
            self.stats.video_packets += 1;
            self.pump_decoded(session, &mut converted)?;
        }
    }

    /// Drains every frame the decoder has ready, converting and encoding
    /// each, then drains every packet the encoder has ready into the muxer.
    /// Exhausts both lazy sequences before the caller submits again.
    fn pump_decoded(
        &mut self,
        session: &mut CaptureSession,
        converted: &mut ffmpeg_next::frame::Video,
    ) -> Result<()> {
        while let Some(frame) = session.decoder.receive_frame()? {
            self.stats.frames_decoded += 1;
            session.scaler.run(frame.as_video(), converted)?;
            session.encoder.send_frame(converted)?;
            self.stats.frames_encoded += 1;
            self.pump_encoded(session)?;
        }
        Ok(())
    }

    fn pump_encoded(&mut self, session: &mut CaptureSession) -> Result<()> {
        while let Some(packet) = session.encoder.receive_packet()? {
            session.output.write_packet(packet)?;
            self.stats.packets_muxed += 1;
        }
        Ok(())
    }

    /// Flushes both codec sessions and finalizes the container. No packets
    /// are read here. A cancelled run still flushes in-flight output but
    /// skips the trailer, leaving a possibly non-conformant file by design.
    fn drain(&mut self, session: &mut CaptureSession, stop: &StopReason) -> Result<()> {
        let mut converted = ffmpeg_next::frame::Video::empty();

        session.decoder.send_eof()?;
        self.pump_decoded(session, &mut converted)?;

        session.encoder.send_eof()?;
        self.pump_encoded(session)?;

        match stop {
            StopReason::Cancelled => {
                log::warn!(
                    "cancelled mid-stream: skipping container trailer, output may be non-conformant"
                );
            }
            StopReason::EndOfInput | StopReason::PacketLimit => {
                session.output.write_trailer()?;
                self.stats.trailer_written = true;
            }
        }

        log::info!(
            "session finished: {} packets read, {} video packets, {} frames decoded, {} frames encoded, {} packets muxed",
            self.stats.packets_read,
            self.stats.video_packets,
            self.stats.frames_decoded,
            self.stats.frames_encoded,
            self.stats.packets_muxed
        );
        Ok(())
    }

    fn enter(&mut self, next: State) {
        log::info!("pipeline state: {} -> {}", self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;
