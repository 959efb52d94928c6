//! CPAL block sink.
//!
//! Blocks travel over a bounded channel; the CPAL callback drains them at
//! device pace and fills silence on underrun. The channel bound is what
//! backpressures the decode pipeline: `write_block` waits (up to the
//! engine's timeout) for a free slot.
//!
//! CPAL streams are not `Send`, so each configured stream lives on its own
//! worker thread that builds it, starts it, and holds it until told to stop.

use std::time::Duration;

use anyhow::{Result, anyhow};
use cpal::traits::{DeviceTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender, bounded};
use radio_player::BlockSink;

use crate::device;

/// Queue depth in blocks; at 256 frames per block this is roughly 50 ms of
/// audio at 44.1 kHz.
const QUEUE_BLOCKS: usize = 8;

pub struct CpalBlockSink {
    device: cpal::Device,
    rate: Option<u32>,
    tx: Option<Sender<Vec<i16>>>,
    drain: Option<Receiver<Vec<i16>>>,
    worker: Option<Worker>,
}

struct Worker {
    stop: Sender<()>,
    thread: std::thread::JoinHandle<()>,
}

impl CpalBlockSink {
    pub fn new(device: cpal::Device) -> Self {
        Self {
            device,
            rate: None,
            tx: None,
            drain: None,
            worker: None,
        }
    }

    fn stop_worker(&mut self) {
        self.tx = None;
        self.drain = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop.send(());
            let _ = worker.thread.join();
        }
        self.rate = None;
    }
}

impl BlockSink for CpalBlockSink {
    fn configure(&mut self, rate_hz: u32) {
        if self.rate == Some(rate_hz) && self.worker.is_some() {
            return;
        }
        self.stop_worker();

        let (tx, rx) = bounded::<Vec<i16>>(QUEUE_BLOCKS);
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let device = self.device.clone();
        let callback_rx = rx.clone();
        let thread = std::thread::spawn(move || {
            match open_stream(&device, rate_hz, callback_rx) {
                Ok(stream) => {
                    if let Err(e) = stream.play() {
                        tracing::warn!(error = %e, "output stream start failed");
                        return;
                    }
                    tracing::debug!(rate_hz, "output stream running");
                    // Park until asked to stop; dropping the stream here
                    // releases the device.
                    let _ = stop_rx.recv();
                }
                Err(e) => tracing::warn!(error = %e, "output stream setup failed"),
            }
        });

        self.rate = Some(rate_hz);
        self.tx = Some(tx);
        self.drain = Some(rx);
        self.worker = Some(Worker {
            stop: stop_tx,
            thread,
        });
    }

    fn write_block(&mut self, samples: &[i16], timeout: Duration) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        tx.send_timeout(samples.to_vec(), timeout).is_ok()
    }

    fn flush_silence(&mut self) {
        // Drop queued blocks so stale audio stops promptly; the stream keeps
        // running and the callback emits silence.
        if let Some(rx) = &self.drain {
            while rx.try_recv().is_ok() {}
        }
    }
}

impl Drop for CpalBlockSink {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

fn open_stream(
    device: &cpal::Device,
    rate_hz: u32,
    rx: Receiver<Vec<i16>>,
) -> Result<cpal::Stream> {
    let supported = device::pick_output_config(device, rate_hz)?;
    let sample_format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();
    tracing::info!(
        rate_hz = config.sample_rate,
        channels = config.channels,
        format = ?sample_format,
        "output stream config"
    );

    match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(device, &config, rx),
        cpal::SampleFormat::I16 => build_stream::<i16>(device, &config, rx),
        cpal::SampleFormat::I32 => build_stream::<i32>(device, &config, rx),
        cpal::SampleFormat::U16 => build_stream::<u16>(device, &config, rx),
        other => Err(anyhow!("Unsupported sample format: {other:?}")),
    }
}

/// Type-specialized stream builder.
///
/// The callback maps interleaved stereo blocks onto the device channel
/// layout: channels 0/1 carry the block, extra channels get silence, a mono
/// device gets the two channels mixed.
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<Vec<i16>>,
) -> Result<cpal::Stream>
where
    T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels_out = config.channels as usize;
    let mut pending: Vec<i16> = Vec::new();
    let mut pos: usize = 0;

    let err_fn = |err| tracing::warn!("stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _| {
            for frame in data.chunks_mut(channels_out) {
                if pos + 1 >= pending.len() {
                    if let Ok(block) = rx.try_recv() {
                        pending = block;
                        pos = 0;
                    }
                }
                if pos + 1 >= pending.len() {
                    frame.fill(<T as cpal::Sample>::from_sample::<f32>(0.0));
                    continue;
                }
                let left = f32::from(pending[pos]) / 32768.0;
                let right = f32::from(pending[pos + 1]) / 32768.0;
                pos += 2;
                if channels_out == 1 {
                    frame[0] = <T as cpal::Sample>::from_sample::<f32>((left + right) * 0.5);
                    continue;
                }
                for (ch, slot) in frame.iter_mut().enumerate() {
                    let v = match ch {
                        0 => left,
                        1 => right,
                        _ => 0.0,
                    };
                    *slot = <T as cpal::Sample>::from_sample::<f32>(v);
                }
            }
        },
        err_fn,
        None,
    )?;
    Ok(stream)
}
