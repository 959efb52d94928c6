use std::time::Duration;

use anyhow::{Result, bail};

use crate::cli::Args;

/// Validated settings for one `play` run.
#[derive(Clone, Debug)]
pub struct PlaySettings {
    pub station: String,
    pub format: String,
    pub bitrate: u32,
    pub volume: u8,
    pub buffer_bytes: usize,
    pub device: Option<String>,
    pub timeout: Duration,
}

impl PlaySettings {
    pub fn from_args(args: &Args, station: &str) -> Result<Self> {
        match args.format.as_str() {
            "mp3" | "aac" => {}
            other => bail!("unsupported stream format: {other} (expected mp3 or aac)"),
        }
        if args.buffer_bytes < 512 {
            bail!("--buffer-bytes must be at least 512");
        }
        Ok(Self {
            station: station.to_string(),
            format: args.format.clone(),
            bitrate: args.bitrate,
            volume: args.volume,
            buffer_bytes: args.buffer_bytes,
            device: args.device.clone(),
            timeout: Duration::from_secs(args.timeout_secs),
        })
    }
}
