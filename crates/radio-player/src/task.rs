//! The playback task: a single-threaded state machine driving one pipeline
//! session at a time.
//!
//! Each call to [`PlaybackTask::tick`] is one scheduling quantum: drain the
//! mailbox first, then advance whatever state we are in by one bounded unit
//! of work. The thread entry point is just `tick` in a loop; tests drive
//! quanta directly for deterministic coverage.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::decoder::{DecoderFactory, StreamDecoder};
use crate::mailbox::{Command, Mailbox};
use crate::sink::OutputSink;
use crate::source::{BufferedSource, Connect};
use crate::status::PlaybackStatus;
use crate::target::StreamTarget;

#[derive(Clone, Copy)]
enum State {
    /// No session, waiting for a command.
    Idle,
    /// A `Play` has been accepted; the next quantum builds the pipeline.
    Building(usize),
    /// A live session is decoding this target.
    Streaming(usize),
    /// The stream went away; rebuild the same target once the deadline
    /// passes, unless a command arrives first.
    RetryWait { target: usize, deadline: Instant },
    /// Explicitly stopped; quiet until told otherwise.
    Stopped,
}

pub struct PlaybackTask {
    targets: Vec<StreamTarget>,
    connector: Box<dyn Connect>,
    decoders: Box<dyn DecoderFactory>,
    sink: OutputSink,
    mailbox: Arc<Mailbox>,
    status: Arc<PlaybackStatus>,
    shutdown: Arc<AtomicBool>,
    config: EngineConfig,
    state: State,
    session: Option<Box<dyn StreamDecoder>>,
}

impl PlaybackTask {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        targets: Vec<StreamTarget>,
        connector: Box<dyn Connect>,
        decoders: Box<dyn DecoderFactory>,
        sink: OutputSink,
        mailbox: Arc<Mailbox>,
        status: Arc<PlaybackStatus>,
        shutdown: Arc<AtomicBool>,
        config: EngineConfig,
    ) -> Self {
        Self {
            targets,
            connector,
            decoders,
            sink,
            mailbox,
            status,
            shutdown,
            config,
            state: State::Idle,
            session: None,
        }
    }

    /// Thread entry point: tick until the owner asks the thread to exit.
    pub fn run(&mut self) {
        tracing::debug!(targets = self.targets.len(), "playback task started");
        while !self.shutdown.load(Ordering::Relaxed) {
            let pause = self.tick();
            if !pause.is_zero() {
                std::thread::sleep(pause);
            }
        }
        self.teardown();
        tracing::debug!("playback task exited");
    }

    /// Advance one scheduling quantum.
    ///
    /// Returns how long the caller may sleep before the next quantum;
    /// zero means there is immediate work pending.
    pub fn tick(&mut self) -> Duration {
        if let Some(cmd) = self.mailbox.take() {
            self.handle_command(cmd);
            return Duration::ZERO;
        }

        match self.state {
            State::Building(target) => {
                self.state = if self.build_session(target) {
                    State::Streaming(target)
                } else {
                    State::Idle
                };
                Duration::ZERO
            }
            State::Streaming(target) => {
                let alive = match self.session.as_mut() {
                    Some(decoder) => decoder.step(&mut self.sink),
                    None => false,
                };
                if alive {
                    Duration::ZERO
                } else {
                    tracing::info!(
                        target_index = target,
                        retry_ms = self.config.retry_wait.as_millis() as u64,
                        "stream ended, scheduling retry"
                    );
                    self.teardown();
                    self.state = State::RetryWait {
                        target,
                        deadline: Instant::now() + self.config.retry_wait,
                    };
                    self.config.retry_poll
                }
            }
            State::RetryWait { target, deadline } => {
                if Instant::now() >= deadline {
                    tracing::info!(target_index = target, "retrying target");
                    self.state = State::Building(target);
                    Duration::ZERO
                } else {
                    self.config.retry_poll
                }
            }
            State::Idle | State::Stopped => self.config.idle_poll,
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Stop => {
                tracing::info!("stop requested");
                self.teardown();
                self.status.set_paused(false);
                self.state = State::Stopped;
            }
            Command::Play(index) if index < self.targets.len() => {
                tracing::info!(target_index = index, "play requested");
                self.teardown();
                self.state = State::Building(index);
            }
            Command::Play(index) => {
                tracing::warn!(
                    target_index = index,
                    targets = self.targets.len(),
                    "play ignored, target index out of range"
                );
            }
        }
    }

    /// Connect and probe. Any failure lands back in `Idle`, logged and
    /// otherwise swallowed; a later command can try again.
    fn build_session(&mut self, target_index: usize) -> bool {
        let target = &self.targets[target_index];
        tracing::info!(target_index, url = target.url(), "building pipeline");

        let reader = match self.connector.connect(target) {
            Ok(reader) => reader,
            Err(e) => {
                tracing::warn!(target_index, error = %e, "connect failed");
                return false;
            }
        };

        let source = BufferedSource::new(reader, self.config.ring_capacity);
        let mut decoder = self.decoders.new_decoder();
        if !decoder.begin(source, &mut self.sink) {
            tracing::warn!(target_index, "decoder init failed");
            self.sink.reset();
            return false;
        }

        self.session = Some(decoder);
        self.status.set_running(target_index);
        true
    }

    fn teardown(&mut self) {
        if self.session.take().is_some() {
            tracing::debug!("session torn down");
        }
        self.sink.reset();
        self.status.clear_running();
    }
}
