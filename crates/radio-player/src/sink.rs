//! Output sink: per-frame processing and block batching.
//!
//! The decoder pushes raw stereo frames one at a time; the sink downmixes,
//! applies pause and gain, feeds the visualizer, and batches samples into
//! fixed-size blocks handed to the output backend with a bounded wait.

use std::sync::Arc;
use std::time::Duration;

use crate::status::{GainState, PlaybackStatus};
use crate::vis::{Extractor, VisualizerState};

/// Hardware-facing block consumer.
///
/// Implementations deliver fixed-size interleaved-stereo i16 blocks to a
/// real output (or a test recorder). `write_block` must give up after
/// `timeout`; a refused block is simply dropped by the caller.
pub trait BlockSink: Send {
    /// (Re)target the backend at a sample rate. Called once per session
    /// before any block is written.
    fn configure(&mut self, rate_hz: u32);

    /// Deliver one full block, waiting at most `timeout` for space.
    /// Returns `false` if the block could not be accepted in time.
    fn write_block(&mut self, samples: &[i16], timeout: Duration) -> bool;

    /// Drop any queued audio so the output goes quiet promptly.
    fn flush_silence(&mut self);
}

/// Per-frame processing stage in front of a [`BlockSink`].
pub struct OutputSink {
    backend: Box<dyn BlockSink>,
    status: Arc<PlaybackStatus>,
    gain: Arc<GainState>,
    vis: Arc<VisualizerState>,
    extractor: Extractor,
    block: Vec<i16>,
    block_samples: usize,
    write_timeout: Duration,
    dropped_blocks: u64,
}

impl OutputSink {
    pub fn new(
        backend: Box<dyn BlockSink>,
        status: Arc<PlaybackStatus>,
        gain: Arc<GainState>,
        vis: Arc<VisualizerState>,
        block_frames: usize,
        write_timeout: Duration,
    ) -> Self {
        let block_samples = block_frames.max(1) * 2;
        Self {
            backend,
            status,
            gain,
            vis,
            extractor: Extractor::new(),
            block: Vec::with_capacity(block_samples),
            block_samples,
            write_timeout,
            dropped_blocks: 0,
        }
    }

    /// Pass the session sample rate through to the backend.
    pub fn configure(&mut self, rate_hz: u32) {
        self.backend.configure(rate_hz);
    }

    /// Consume one raw stereo frame from the decoder.
    ///
    /// While paused the frame is replaced with silence but still flows, so
    /// the backend stays paced and the visualizer decays to zero.
    pub fn push_frame(&mut self, left: i16, right: i16) {
        let mono = if self.status.is_paused() {
            0
        } else {
            let mixed = (i32::from(left) + i32::from(right)) / 2;
            self.gain.apply(mixed)
        };

        self.extractor.feed(mono, &self.vis);

        self.block.push(mono);
        self.block.push(mono);
        if self.block.len() >= self.block_samples {
            if !self.backend.write_block(&self.block, self.write_timeout) {
                self.dropped_blocks += 1;
                tracing::trace!(dropped = self.dropped_blocks, "output block dropped");
            }
            self.block.clear();
        }
    }

    /// Session teardown: forget the partial block, reset the extractor
    /// windows, and tell the backend to go quiet.
    pub fn reset(&mut self) {
        self.block.clear();
        self.extractor = Extractor::new();
        self.backend.flush_silence();
    }

    /// Blocks that timed out against the backend since construction.
    pub fn dropped_blocks(&self) -> u64 {
        self.dropped_blocks
    }
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSink")
            .field("pending_samples", &self.block.len())
            .field("block_samples", &self.block_samples)
            .field("dropped_blocks", &self.dropped_blocks)
            .finish()
    }
}
