//! Network byte source plumbing.
//!
//! [`Connect`] abstracts "open a byte stream for a target" so the engine can
//! be driven by a real HTTP client or by a scripted reader in tests.
//! [`BufferedSource`] owns the open reader plus a fixed [`ByteRing`] and
//! serves `io::Read` to the decoder, refilling the ring opportunistically so
//! decoder reads are mostly satisfied from memory.

use std::io::{self, Read};

use anyhow::Result;

use crate::ring::ByteRing;
use crate::target::StreamTarget;

/// Opens a raw byte stream for a target.
pub trait Connect: Send {
    fn connect(&self, target: &StreamTarget) -> Result<Box<dyn Read + Send>>;
}

/// A live byte source buffered through a fixed-capacity ring.
pub struct BufferedSource {
    inner: Box<dyn Read + Send>,
    ring: ByteRing,
    scratch: Vec<u8>,
    ended: bool,
}

impl BufferedSource {
    pub fn new(inner: Box<dyn Read + Send>, ring_capacity: usize) -> Self {
        let ring = ByteRing::new(ring_capacity);
        let scratch = vec![0u8; ring.capacity()];
        Self {
            inner,
            ring,
            scratch,
            ended: false,
        }
    }

    /// Top up the ring from the underlying reader.
    ///
    /// Issues at most one inner read. A zero-length inner read marks the
    /// source as ended; subsequent reads drain whatever the ring still holds.
    fn refill(&mut self) -> io::Result<()> {
        if self.ended {
            return Ok(());
        }
        let free = self.ring.free();
        if free == 0 {
            return Ok(());
        }
        let got = self.inner.read(&mut self.scratch[..free])?;
        if got == 0 {
            self.ended = true;
        } else {
            self.ring.write(&self.scratch[..got]);
        }
        Ok(())
    }
}

impl Read for BufferedSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        // Serve from the ring when possible; only hit the network when the
        // ring has nothing buffered.
        if self.ring.is_empty() {
            self.refill()?;
        }
        let got = self.ring.read(buf);
        if got == 0 && self.ended {
            return Ok(0);
        }
        if got == 0 {
            // Inner reader returned no data without signalling EOF; try one
            // more refill so a short network read does not look like EOF.
            self.refill()?;
            return Ok(self.ring.read(buf));
        }
        Ok(got)
    }
}

impl std::fmt::Debug for BufferedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedSource")
            .field("buffered", &self.ring.len())
            .field("ended", &self.ended)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reader that hands out data in fixed-size dribbles.
    struct DribbleReader {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
    }

    impl Read for DribbleReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.chunk.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "gone"))
        }
    }

    #[test]
    fn serves_everything_across_refills() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let mut src = BufferedSource::new(
            Box::new(DribbleReader {
                data: data.clone(),
                pos: 0,
                chunk: 7,
            }),
            64,
        );
        let mut out = Vec::new();
        src.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn eof_after_buffered_bytes_are_drained() {
        let mut src = BufferedSource::new(Box::new(Cursor::new(b"abc".to_vec())), 16);
        let mut out = [0u8; 2];
        assert_eq!(src.read(&mut out).unwrap(), 2);
        assert_eq!(src.read(&mut out).unwrap(), 1);
        assert_eq!(src.read(&mut out).unwrap(), 0);
        assert_eq!(src.read(&mut out).unwrap(), 0);
    }

    #[test]
    fn inner_error_propagates() {
        let mut src = BufferedSource::new(Box::new(FailingReader), 16);
        let mut out = [0u8; 4];
        assert!(src.read(&mut out).is_err());
    }

    #[test]
    fn reads_larger_than_ring_still_complete() {
        let data: Vec<u8> = (0..200u8).collect();
        let mut src = BufferedSource::new(Box::new(Cursor::new(data.clone())), 32);
        let mut out = Vec::new();
        src.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }
}
