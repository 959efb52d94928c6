use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tuner", version)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Use a specific output device by substring match
    #[arg(long)]
    pub device: Option<String>,

    /// Network stream buffer capacity in bytes
    #[arg(long, default_value_t = 4096)]
    pub buffer_bytes: usize,

    /// Initial volume, 0-255 (unity gain at 200)
    #[arg(long, default_value_t = 100)]
    pub volume: u8,

    /// Stream bitrate in kbps
    #[arg(long, default_value_t = 128)]
    pub bitrate: u32,

    /// Stream format: mp3 or aac
    #[arg(long, default_value = "mp3")]
    pub format: String,

    /// HTTP connect/response timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream a station until Ctrl-C
    Play {
        /// Station id, e.g. groovesalad
        station: String,
    },

    /// List output devices and exit
    ListDevices,
}
