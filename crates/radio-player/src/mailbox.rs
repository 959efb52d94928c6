//! Single-slot command mailbox between the control side and the playback task.
//!
//! The mailbox holds at most one pending command. Posting overwrites whatever
//! is already there (last write wins); the playback task drains it once per
//! scheduling quantum. There is no queueing and no blocking on either side.

use std::sync::atomic::{AtomicU64, Ordering};

/// A control request for the playback task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Tear down the current session and go quiet.
    Stop,
    /// Tear down the current session and start streaming the target at this
    /// index in the engine's target list.
    Play(usize),
}

const SLOT_EMPTY: u64 = 0;
const TAG_STOP: u64 = 1;
const TAG_PLAY: u64 = 2;

/// Lock-free single-slot mailbox.
///
/// Both the command tag and the play-target index are packed into one
/// `AtomicU64` so a `Play` can never be observed with a stale index.
#[derive(Debug, Default)]
pub struct Mailbox {
    slot: AtomicU64,
}

impl Mailbox {
    pub fn new() -> Self {
        Self {
            slot: AtomicU64::new(SLOT_EMPTY),
        }
    }

    /// Post a command, replacing any command that has not been taken yet.
    pub fn post(&self, cmd: Command) {
        self.slot.store(encode(cmd), Ordering::Relaxed);
    }

    /// Take the pending command, leaving the mailbox empty.
    pub fn take(&self) -> Option<Command> {
        decode(self.slot.swap(SLOT_EMPTY, Ordering::Relaxed))
    }
}

fn encode(cmd: Command) -> u64 {
    match cmd {
        Command::Stop => TAG_STOP,
        Command::Play(index) => TAG_PLAY | ((index as u64) << 2),
    }
}

fn decode(raw: u64) -> Option<Command> {
    match raw & 0b11 {
        TAG_STOP => Some(Command::Stop),
        TAG_PLAY => Some(Command::Play((raw >> 2) as usize)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_mailbox_yields_nothing() {
        let mb = Mailbox::new();
        assert_eq!(mb.take(), None);
    }

    #[test]
    fn take_drains_the_slot() {
        let mb = Mailbox::new();
        mb.post(Command::Stop);
        assert_eq!(mb.take(), Some(Command::Stop));
        assert_eq!(mb.take(), None);
    }

    #[test]
    fn later_post_overwrites_earlier_one() {
        let mb = Mailbox::new();
        mb.post(Command::Play(0));
        mb.post(Command::Play(7));
        assert_eq!(mb.take(), Some(Command::Play(7)));
        assert_eq!(mb.take(), None);
    }

    #[test]
    fn stop_overwrites_pending_play() {
        let mb = Mailbox::new();
        mb.post(Command::Play(3));
        mb.post(Command::Stop);
        assert_eq!(mb.take(), Some(Command::Stop));
    }

    #[test]
    fn large_indexes_survive_packing() {
        let mb = Mailbox::new();
        mb.post(Command::Play(usize::MAX >> 2));
        assert_eq!(mb.take(), Some(Command::Play(usize::MAX >> 2)));
    }
}
