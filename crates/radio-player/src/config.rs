//! Engine tuning knobs.

use std::time::Duration;

/// Playback engine configuration.
///
/// The defaults are sized for compressed internet-radio streams at typical
/// bitrates and fit comfortably in a small fixed memory footprint.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Capacity of the network byte ring, in bytes.
    pub ring_capacity: usize,
    /// Frames per output block (each frame is one stereo sample pair).
    pub block_frames: usize,
    /// How long a full block may wait for the output backend before it is
    /// dropped.
    pub write_timeout: Duration,
    /// Total wait before auto-retrying the same target after the stream ends.
    pub retry_wait: Duration,
    /// Poll interval while waiting out a retry (commands are still taken at
    /// this cadence).
    pub retry_poll: Duration,
    /// Poll interval while idle or stopped.
    pub idle_poll: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ring_capacity: 4096,
            block_frames: 256,
            write_timeout: Duration::from_millis(50),
            retry_wait: Duration::from_secs(2),
            retry_poll: Duration::from_millis(100),
            idle_poll: Duration::from_millis(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_block_is_512_samples() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.block_frames * 2, 512);
    }

    #[test]
    fn retry_wait_covers_multiple_polls() {
        let cfg = EngineConfig::default();
        assert!(cfg.retry_wait.as_millis() / cfg.retry_poll.as_millis() >= 10);
    }
}
