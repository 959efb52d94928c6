//! Streaming-radio playback engine.
//!
//! One dedicated playback thread owns the whole pipeline for the current
//! session: network byte source -> ring buffer -> decoder -> output sink.
//! The control side talks to it through a single-slot command mailbox and a
//! handful of shared atomic cells (status, gain, visualizer); there are no
//! locks between the two sides.
//!
//! The engine is backend-agnostic: callers supply a [`Connect`] impl for the
//! network, a [`DecoderFactory`] for the codec, and a [`BlockSink`] for the
//! hardware. The `tuner` binary wires in ureq/symphonia/cpal; tests wire in
//! scripted fakes.

mod config;
mod decoder;
mod mailbox;
mod ring;
mod sink;
mod source;
mod status;
mod target;
mod task;
mod vis;

pub use config::EngineConfig;
pub use decoder::{DecoderFactory, StreamDecoder};
pub use mailbox::Command;
pub use ring::ByteRing;
pub use sink::{BlockSink, OutputSink};
pub use source::{BufferedSource, Connect};
pub use status::{GainState, PlaybackStatus, StatusSnapshot};
pub use target::StreamTarget;
pub use vis::{VIS_BINS, VIS_WAVE_LEN, VisualizerState};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use mailbox::Mailbox;
use task::PlaybackTask;

/// Handle to a running playback engine.
///
/// All methods are non-blocking; commands are applied by the playback
/// thread within one scheduling quantum. Dropping the handle shuts the
/// thread down.
pub struct Engine {
    mailbox: Arc<Mailbox>,
    status: Arc<PlaybackStatus>,
    gain: Arc<GainState>,
    vis: Arc<VisualizerState>,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Engine {
    /// Spawn the playback thread over the given target list and backends.
    pub fn spawn(
        targets: Vec<StreamTarget>,
        connector: Box<dyn Connect>,
        decoders: Box<dyn DecoderFactory>,
        block_sink: Box<dyn BlockSink>,
        config: EngineConfig,
    ) -> Self {
        let mailbox = Arc::new(Mailbox::new());
        let status = Arc::new(PlaybackStatus::new());
        let gain = Arc::new(GainState::default());
        let vis = Arc::new(VisualizerState::new());
        let shutdown = Arc::new(AtomicBool::new(false));

        let sink = OutputSink::new(
            block_sink,
            status.clone(),
            gain.clone(),
            vis.clone(),
            config.block_frames,
            config.write_timeout,
        );
        let mut task = PlaybackTask::new(
            targets,
            connector,
            decoders,
            sink,
            mailbox.clone(),
            status.clone(),
            shutdown.clone(),
            config,
        );
        let thread = std::thread::spawn(move || task.run());

        Self {
            mailbox,
            status,
            gain,
            vis,
            shutdown,
            thread: Some(thread),
        }
    }

    /// Request playback of the target at `index`. Replaces any pending
    /// command; an out-of-range index is ignored by the playback thread.
    pub fn play(&self, index: usize) {
        self.mailbox.post(Command::Play(index));
    }

    /// Request teardown of the current session.
    pub fn stop(&self) {
        self.mailbox.post(Command::Stop);
    }

    /// Set the user volume (0-255, unity at 200). Takes effect within one
    /// output block, without rebuilding the session.
    pub fn set_gain(&self, volume: u8) {
        self.gain.set(volume);
    }

    pub fn gain(&self) -> u8 {
        self.gain.volume()
    }

    /// Pause or resume. While paused the session keeps consuming the
    /// stream but emits silence.
    pub fn set_paused(&self, paused: bool) {
        self.status.set_paused(paused);
    }

    pub fn status(&self) -> StatusSnapshot {
        self.status.snapshot()
    }

    /// Shared visualization cells, safe to read from any thread.
    pub fn visualizer(&self) -> Arc<VisualizerState> {
        self.vis.clone()
    }

    /// Stop the playback thread and wait for it to exit.
    pub fn shutdown(mut self) {
        self.join_thread();
    }

    fn join_thread(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("playback thread panicked");
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.join_thread();
    }
}
