//! Decoder seam.
//!
//! The engine drives decoding one bounded step at a time so commands posted
//! to the mailbox are picked up between steps rather than mid-packet. A
//! fresh decoder instance backs each session; nothing carries over across
//! rebuilds.

use crate::sink::OutputSink;
use crate::source::BufferedSource;

/// One streaming decode session.
pub trait StreamDecoder: Send {
    /// Take ownership of the byte source, probe the container, and prepare
    /// for decoding. Configures the sink's output rate on success.
    ///
    /// Returns `false` if the stream cannot be decoded; the session is then
    /// discarded without further calls.
    fn begin(&mut self, source: BufferedSource, sink: &mut OutputSink) -> bool;

    /// Decode one bounded unit of work, pushing frames through the sink.
    ///
    /// Returns `false` when the stream has ended or failed; the two are not
    /// distinguished and both lead to a retry of the same target.
    fn step(&mut self, sink: &mut OutputSink) -> bool;
}

/// Supplies a fresh decoder per pipeline build.
pub trait DecoderFactory: Send {
    fn new_decoder(&self) -> Box<dyn StreamDecoder>;
}
