//! Tuner — a small CLI internet-radio player.
//!
//! ## Pipeline
//! 1. **Fetch**: a streaming HTTP GET against the station's icecast mount.
//! 2. **Decode**: Symphonia decodes the compressed stream incrementally.
//! 3. **Playback**: fixed-size i16 stereo blocks are handed to CPAL through
//!    a bounded queue; the output callback never blocks.
//!
//! The whole pipeline runs on the engine's playback thread (`radio-player`);
//! this binary only wires up the concrete backends and waits for Ctrl-C.

mod cli;
mod codec;
mod config;
mod device;
mod http;
mod output;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use radio_player::{Engine, EngineConfig, StreamTarget, VisualizerState};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tuner=info")),
        )
        .init();
    let host = cpal::default_host();

    match &args.cmd {
        cli::Command::ListDevices => device::list_devices(&host),
        cli::Command::Play { station } => {
            let settings = config::PlaySettings::from_args(&args, station)?;
            play(&host, settings)
        }
    }
}

fn play(host: &cpal::Host, settings: config::PlaySettings) -> Result<()> {
    use cpal::traits::DeviceTrait;

    let device = device::pick_device(host, settings.device.as_deref())?;
    tracing::info!(device = %device.description()?, "output device");

    let target = StreamTarget::for_station(&settings.station, settings.bitrate, &settings.format);
    tracing::info!(station = %settings.station, url = target.url(), "tuning");

    let engine = Engine::spawn(
        vec![target],
        Box::new(http::HttpConnect::new(settings.timeout)),
        Box::new(codec::SymphoniaDecoderFactory::new(&settings.format)),
        Box::new(output::CpalBlockSink::new(device)),
        EngineConfig {
            ring_capacity: settings.buffer_bytes,
            ..EngineConfig::default()
        },
    );
    engine.set_gain(settings.volume);
    engine.play(0);

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
            .context("install Ctrl-C handler")?;
    }

    let vis = engine.visualizer();
    while !stop.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(500));
        log_status(&engine, &vis);
    }

    tracing::info!("shutting down");
    engine.stop();
    engine.shutdown();
    Ok(())
}

fn log_status(engine: &Engine, vis: &VisualizerState) {
    let snap = engine.status();
    tracing::debug!(
        running = snap.running,
        paused = snap.paused,
        peak = vis.peak(),
        bars = %bar_line(&vis.bins()),
        "status"
    );
}

/// Render bin levels as a one-line bar meter for the log.
fn bar_line(bins: &[u8]) -> String {
    const GLYPHS: [char; 5] = [' ', '.', ':', '|', '#'];
    bins.iter()
        .map(|&b| GLYPHS[(usize::from(b) * (GLYPHS.len() - 1) + 127) / 255])
        .collect()
}
