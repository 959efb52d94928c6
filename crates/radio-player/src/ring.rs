//! Fixed-capacity byte ring buffer.
//!
//! Owned backing storage and a cursor pair; capacity is set at construction
//! and never changes. Single-owner: the playback task both fills and drains
//! it, so no synchronization is involved.

/// Circular byte buffer with fixed capacity.
#[derive(Debug)]
pub struct ByteRing {
    buf: Vec<u8>,
    read_pos: usize,
    len: usize,
}

impl ByteRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity.max(1)],
            read_pos: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes currently buffered.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes that can still be written before the ring is full.
    pub fn free(&self) -> usize {
        self.buf.len() - self.len
    }

    /// Append up to `free()` bytes from `src`, returning how many were taken.
    pub fn write(&mut self, src: &[u8]) -> usize {
        let take = src.len().min(self.free());
        let cap = self.buf.len();
        let mut write_pos = (self.read_pos + self.len) % cap;
        for &b in &src[..take] {
            self.buf[write_pos] = b;
            write_pos = (write_pos + 1) % cap;
        }
        self.len += take;
        take
    }

    /// Copy up to `dst.len()` buffered bytes into `dst`, returning how many
    /// were produced.
    pub fn read(&mut self, dst: &mut [u8]) -> usize {
        let take = dst.len().min(self.len);
        let cap = self.buf.len();
        for slot in dst[..take].iter_mut() {
            *slot = self.buf[self.read_pos];
            self.read_pos = (self.read_pos + 1) % cap;
        }
        self.len -= take;
        take
    }

    /// Drop all buffered bytes.
    pub fn clear(&mut self) {
        self.read_pos = 0;
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let ring = ByteRing::new(8);
        assert!(ring.is_empty());
        assert_eq!(ring.free(), 8);
        assert_eq!(ring.capacity(), 8);
    }

    #[test]
    fn write_then_read_roundtrips() {
        let mut ring = ByteRing::new(8);
        assert_eq!(ring.write(b"abc"), 3);
        let mut out = [0u8; 8];
        assert_eq!(ring.read(&mut out), 3);
        assert_eq!(&out[..3], b"abc");
        assert!(ring.is_empty());
    }

    #[test]
    fn write_stops_at_capacity() {
        let mut ring = ByteRing::new(4);
        assert_eq!(ring.write(b"abcdef"), 4);
        assert_eq!(ring.free(), 0);
        assert_eq!(ring.write(b"x"), 0);
    }

    #[test]
    fn wraps_around_the_backing_buffer() {
        let mut ring = ByteRing::new(4);
        let mut out = [0u8; 4];
        assert_eq!(ring.write(b"abcd"), 4);
        assert_eq!(ring.read(&mut out[..2]), 2);
        assert_eq!(&out[..2], b"ab");
        assert_eq!(ring.write(b"ef"), 2);
        assert_eq!(ring.read(&mut out), 4);
        assert_eq!(&out, b"cdef");
    }

    #[test]
    fn partial_read_leaves_remainder() {
        let mut ring = ByteRing::new(8);
        ring.write(b"hello");
        let mut out = [0u8; 2];
        assert_eq!(ring.read(&mut out), 2);
        assert_eq!(&out, b"he");
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn clear_resets_cursors() {
        let mut ring = ByteRing::new(4);
        ring.write(b"abcd");
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.write(b"wxyz"), 4);
        let mut out = [0u8; 4];
        ring.read(&mut out);
        assert_eq!(&out, b"wxyz");
    }

    #[test]
    fn many_interleaved_writes_and_reads_preserve_order() {
        let mut ring = ByteRing::new(7);
        let mut produced = Vec::new();
        let mut consumed = Vec::new();
        let mut next = 0u8;
        for round in 0..50 {
            for _ in 0..(round % 5 + 1) {
                if ring.write(&[next]) == 1 {
                    produced.push(next);
                    next = next.wrapping_add(1);
                }
            }
            let mut out = vec![0u8; round % 4 + 1];
            let got = ring.read(&mut out);
            consumed.extend_from_slice(&out[..got]);
        }
        let mut rest = vec![0u8; ring.len()];
        let got = ring.read(&mut rest);
        consumed.extend_from_slice(&rest[..got]);
        assert_eq!(consumed, produced);
    }
}
