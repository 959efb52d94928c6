//! Shared playback status and gain cells.
//!
//! Plain atomics with relaxed ordering: every cell has a single writer, and
//! readers only need an eventually-fresh advisory view. `paused` is the one
//! cell the control side writes directly; everything else is owned by the
//! playback task.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU16, AtomicUsize, Ordering};

/// Sentinel for "no active target".
const NO_TARGET: usize = usize::MAX;

/// Volume value that maps to a unity gain factor.
const UNITY_VOLUME: u32 = 200;

/// Live playback status cells, shared between the playback task and any
/// number of readers.
#[derive(Debug)]
pub struct PlaybackStatus {
    running: AtomicBool,
    paused: AtomicBool,
    active_target: AtomicUsize,
}

/// Point-in-time copy of [`PlaybackStatus`] for display or assertions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub running: bool,
    pub paused: bool,
    pub active_target: Option<usize>,
}

impl PlaybackStatus {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            active_target: AtomicUsize::new(NO_TARGET),
        }
    }

    /// Mark a session live on the given target.
    pub(crate) fn set_running(&self, target_index: usize) {
        self.active_target.store(target_index, Ordering::Relaxed);
        self.running.store(true, Ordering::Relaxed);
    }

    /// Mark the session torn down.
    pub(crate) fn clear_running(&self) {
        self.running.store(false, Ordering::Relaxed);
        self.active_target.store(NO_TARGET, Ordering::Relaxed);
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let active = self.active_target.load(Ordering::Relaxed);
        StatusSnapshot {
            running: self.running.load(Ordering::Relaxed),
            paused: self.paused.load(Ordering::Relaxed),
            active_target: (active != NO_TARGET).then_some(active),
        }
    }
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// User volume plus its derived 2.6 fixed-point gain factor.
///
/// The factor is precomputed on `set` so the per-frame path is a single load
/// and multiply. Unity gain at volume 200; values above boost mildly.
#[derive(Debug)]
pub struct GainState {
    volume: AtomicU8,
    factor_f2p6: AtomicU16,
}

impl GainState {
    pub fn new(volume: u8) -> Self {
        Self {
            volume: AtomicU8::new(volume),
            factor_f2p6: AtomicU16::new(factor_for(volume)),
        }
    }

    pub fn set(&self, volume: u8) {
        self.volume.store(volume, Ordering::Relaxed);
        self.factor_f2p6.store(factor_for(volume), Ordering::Relaxed);
    }

    pub fn volume(&self) -> u8 {
        self.volume.load(Ordering::Relaxed)
    }

    pub fn factor_f2p6(&self) -> u16 {
        self.factor_f2p6.load(Ordering::Relaxed)
    }

    /// Scale a mono sample by the current gain, saturating at the i16 range.
    pub fn apply(&self, mono: i32) -> i16 {
        let scaled = (mono * i32::from(self.factor_f2p6())) >> 6;
        scaled.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
    }
}

impl Default for GainState {
    fn default() -> Self {
        Self::new(UNITY_VOLUME as u8)
    }
}

fn factor_for(volume: u8) -> u16 {
    (u32::from(volume) * 64 / UNITY_VOLUME) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_starts_idle() {
        let status = PlaybackStatus::new();
        let snap = status.snapshot();
        assert!(!snap.running);
        assert!(!snap.paused);
        assert_eq!(snap.active_target, None);
    }

    #[test]
    fn running_roundtrip() {
        let status = PlaybackStatus::new();
        status.set_running(4);
        assert_eq!(status.snapshot().active_target, Some(4));
        assert!(status.is_running());
        status.clear_running();
        assert!(!status.is_running());
        assert_eq!(status.snapshot().active_target, None);
    }

    #[test]
    fn unity_volume_gives_factor_64() {
        assert_eq!(factor_for(200), 64);
    }

    #[test]
    fn factor_scales_linearly_with_volume() {
        assert_eq!(factor_for(0), 0);
        assert_eq!(factor_for(100), 32);
        assert_eq!(factor_for(50), 16);
        assert_eq!(factor_for(255), 81);
    }

    #[test]
    fn unity_gain_is_identity() {
        let gain = GainState::new(200);
        assert_eq!(gain.apply(1000), 1000);
        assert_eq!(gain.apply(-1000), -1000);
        assert_eq!(gain.apply(0), 0);
    }

    #[test]
    fn half_volume_halves_samples() {
        let gain = GainState::new(100);
        assert_eq!(gain.apply(1000), 500);
        assert_eq!(gain.apply(-1000), -500);
    }

    #[test]
    fn boost_saturates_at_i16_range() {
        let gain = GainState::new(255);
        assert_eq!(gain.apply(i32::from(i16::MAX)), i16::MAX);
        assert_eq!(gain.apply(i32::from(i16::MIN)), i16::MIN);
    }

    #[test]
    fn set_updates_derived_factor() {
        let gain = GainState::new(0);
        assert_eq!(gain.factor_f2p6(), 0);
        gain.set(200);
        assert_eq!(gain.factor_f2p6(), 64);
        assert_eq!(gain.volume(), 200);
    }
}
