//! Visualization taps on the playback sample stream.
//!
//! The playback task is the single writer; readers take advisory snapshots
//! at their own cadence. Values are decimated summaries, so torn reads
//! across cells are harmless.

use std::sync::atomic::{AtomicI8, AtomicU8, AtomicU16, AtomicUsize, Ordering};

/// Number of spectrum-style level bins.
pub const VIS_BINS: usize = 16;
/// Length of the waveform sample ring.
pub const VIS_WAVE_LEN: usize = 120;

/// Mono samples averaged per bin flush.
const BIN_WINDOW: u32 = 92;
/// Mono samples averaged per peak flush (~60 Hz at 44.1 kHz).
const PEAK_WINDOW: u32 = 735;
/// Every Nth mono sample lands in the waveform ring.
const WAVE_STRIDE: u32 = 11;

/// Shared visualization cells.
#[derive(Debug)]
pub struct VisualizerState {
    bins: [AtomicU8; VIS_BINS],
    peak: AtomicU16,
    wave: [AtomicI8; VIS_WAVE_LEN],
    wave_cursor: AtomicUsize,
}

impl VisualizerState {
    pub fn new() -> Self {
        Self {
            bins: std::array::from_fn(|_| AtomicU8::new(0)),
            peak: AtomicU16::new(0),
            wave: std::array::from_fn(|_| AtomicI8::new(0)),
            wave_cursor: AtomicUsize::new(0),
        }
    }

    /// Current bin levels, each in `0..=255`.
    pub fn bins(&self) -> [u8; VIS_BINS] {
        std::array::from_fn(|i| self.bins[i].load(Ordering::Relaxed))
    }

    /// Smoothed peak level in `0..=32767`.
    pub fn peak(&self) -> u16 {
        self.peak.load(Ordering::Relaxed)
    }

    /// Waveform ring contents, each in `-128..=127`.
    pub fn waveform(&self) -> [i8; VIS_WAVE_LEN] {
        std::array::from_fn(|i| self.wave[i].load(Ordering::Relaxed))
    }

    /// Index the next waveform sample will be written to.
    pub fn waveform_cursor(&self) -> usize {
        self.wave_cursor.load(Ordering::Relaxed)
    }
}

impl Default for VisualizerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-session decimation counters feeding a [`VisualizerState`].
///
/// `feed` runs once per output frame on the playback thread, so it stays
/// O(1): three counters, an add each, a flush when a window fills.
#[derive(Debug, Default)]
pub struct Extractor {
    bin_acc: u32,
    bin_count: u32,
    bin_index: usize,
    peak_acc: u32,
    peak_count: u32,
    wave_skip: u32,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account one post-gain mono sample.
    pub fn feed(&mut self, mono: i16, vis: &VisualizerState) {
        let mag = i32::from(mono).unsigned_abs();

        self.bin_acc += mag;
        self.bin_count += 1;
        if self.bin_count >= BIN_WINDOW {
            let level = ((self.bin_acc / self.bin_count) >> 5).min(255) as u8;
            vis.bins[self.bin_index].store(level, Ordering::Relaxed);
            self.bin_index = (self.bin_index + 1) % VIS_BINS;
            self.bin_acc = 0;
            self.bin_count = 0;
        }

        self.peak_acc += mag;
        self.peak_count += 1;
        if self.peak_count >= PEAK_WINDOW {
            let peak = (self.peak_acc / self.peak_count).min(32767) as u16;
            vis.peak.store(peak, Ordering::Relaxed);
            self.peak_acc = 0;
            self.peak_count = 0;
        }

        self.wave_skip += 1;
        if self.wave_skip >= WAVE_STRIDE {
            self.wave_skip = 0;
            let at = vis.wave_cursor.load(Ordering::Relaxed);
            vis.wave[at].store((mono >> 8) as i8, Ordering::Relaxed);
            vis.wave_cursor
                .store((at + 1) % VIS_WAVE_LEN, Ordering::Relaxed);
        }
    }
}
