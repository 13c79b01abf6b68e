//! Transactional, variable-length chunks on top of a [`RingBuffer`].
//!
//! Frame validity (CRC or checksum) is only known once the last byte has
//! arrived, so writers open a chunk, append bytes as they come in, and then
//! either publish it with [`ChunkedFifo::write_end`] or throw it away with
//! [`ChunkedFifo::write_abort`]. Readers never see a chunk that is still
//! being written or that was aborted.
//!
//! ## Layout
//!
//! Every chunk is stored as a one-byte length prefix followed by its bytes.
//! The prefix is reserved by [`write_start`](ChunkedFifo::write_start) and
//! patched by [`write_end`](ChunkedFifo::write_end), which limits a chunk to
//! [`MAX_CHUNK_LEN`] bytes.
//!
//! ## Overflow
//!
//! If the ring fills up while a chunk is open, the chunk is marked as
//! overflowed: further bytes are dropped and `write_end` aborts it instead of
//! committing. Committed chunks are never overwritten.

use crate::codec::{Sink, Source};
use crate::consts::MAX_CHUNK_LEN;
use crate::ring::RingBuffer;

/// A FIFO of committed, variable-length chunks.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct ChunkedFifo<const N: usize> {
    ring: RingBuffer<N>,
    writing: bool,
    overflowed: bool,
    /// Raw ring index of the length prefix of the open chunk.
    start: usize,
    /// Bytes written since `write_start`, prefix included.
    written: usize,
    chunks: usize,
}

impl<const N: usize> ChunkedFifo<N> {
    /// Creates an empty FIFO.
    pub const fn new() -> Self {
        Self {
            ring: RingBuffer::new(),
            writing: false,
            overflowed: false,
            start: 0,
            written: 0,
            chunks: 0,
        }
    }

    /// Opens a new chunk.
    ///
    /// A chunk that is still open is aborted first: an unterminated frame is
    /// abandoned as soon as the next one begins.
    pub fn write_start(&mut self) {
        if self.writing {
            trace!("chunk abandoned after {} bytes", self.written);
            self.write_abort();
        }
        self.writing = true;
        self.start = self.ring.write_index();
        self.written = 0;
        self.overflowed = !self.ring.write(0);
        if !self.overflowed {
            self.written = 1;
        }
    }

    /// Appends a byte to the open chunk. Ignored when no chunk is open.
    pub fn write(&mut self, byte: u8) {
        if !self.writing || self.overflowed {
            return;
        }
        if self.written > MAX_CHUNK_LEN || !self.ring.write(byte) {
            self.overflowed = true;
            return;
        }
        self.written += 1;
    }

    /// Publishes the open chunk.
    ///
    /// # Returns
    /// `true` if the chunk is now readable. An overflowed chunk is aborted and
    /// `false` is returned; so is a call without an open chunk.
    pub fn write_end(&mut self) -> bool {
        if !self.writing {
            return false;
        }
        if self.overflowed {
            warn!("chunk dropped, fifo full after {} bytes", self.written);
            self.write_abort();
            return false;
        }
        self.ring.overwrite(self.start, (self.written - 1) as u8);
        self.writing = false;
        self.written = 0;
        self.chunks += 1;
        true
    }

    /// Discards every byte written since [`write_start`](Self::write_start).
    pub fn write_abort(&mut self) {
        if !self.writing {
            return;
        }
        self.ring.rewind(self.written);
        self.writing = false;
        self.overflowed = false;
        self.written = 0;
    }

    /// Whether a chunk is currently open.
    pub fn is_writing(&self) -> bool {
        self.writing
    }

    /// Whether at least one committed chunk can be read.
    pub fn has_content(&self) -> bool {
        self.chunks > 0
    }

    /// Number of committed, unread chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Length of the oldest committed chunk.
    pub fn front_len(&self) -> Option<usize> {
        if self.chunks == 0 {
            return None;
        }
        self.ring.peek(0).map(usize::from)
    }

    /// Free bytes in the underlying ring.
    pub fn available_to_write(&self) -> usize {
        self.ring.available_to_write()
    }

    /// Opens the oldest committed chunk for reading.
    ///
    /// The chunk is consumed: bytes left unread when the returned
    /// [`ChunkReader`] is dropped are skipped.
    pub fn read_chunk(&mut self) -> Option<ChunkReader<'_, N>> {
        if self.chunks == 0 {
            return None;
        }
        let remaining = usize::from(self.ring.read()?);
        self.chunks -= 1;
        Some(ChunkReader {
            ring: &mut self.ring,
            remaining,
        })
    }

    /// Copies the oldest committed chunk out of the FIFO.
    ///
    /// A chunk longer than `M` is consumed and dropped, never truncated.
    pub fn pop_chunk<const M: usize>(&mut self) -> Option<heapless::Vec<u8, M>> {
        let reader = self.read_chunk()?;
        if reader.remaining() > M {
            warn!("chunk of {} bytes dropped, buffer holds {}", reader.remaining(), M);
            return None;
        }
        let mut out = heapless::Vec::new();
        for byte in reader {
            let _ = out.push(byte);
        }
        Some(out)
    }
}

/// Single-pass reader over the bytes of one committed chunk.
#[derive(Debug)]
pub struct ChunkReader<'a, const N: usize> {
    ring: &'a mut RingBuffer<N>,
    remaining: usize,
}

impl<const N: usize> ChunkReader<'_, N> {
    /// Number of bytes not read yet.
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl<const N: usize> Iterator for ChunkReader<'_, N> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.ring.read()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<const N: usize> Drop for ChunkReader<'_, N> {
    fn drop(&mut self) {
        while self.remaining > 0 {
            self.remaining -= 1;
            let _ = self.ring.read();
        }
    }
}

impl<const N: usize> Source for ChunkReader<'_, N> {
    fn next_byte(&mut self) -> Option<u8> {
        self.next()
    }
}

impl<const N: usize> Sink for ChunkedFifo<N> {
    fn begin(&mut self) {
        self.write_start();
    }

    fn space(&self) -> usize {
        if !self.writing || self.overflowed {
            return 0;
        }
        self.ring
            .available_to_write()
            .min(MAX_CHUNK_LEN + 1 - self.written)
    }

    fn put(&mut self, byte: u8) -> bool {
        self.write(byte);
        !self.overflowed
    }

    fn commit(&mut self) -> bool {
        self.write_end()
    }

    fn rollback(&mut self, _written: usize) {
        self.write_abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_chunk<const N: usize>(fifo: &mut ChunkedFifo<N>, bytes: &[u8]) -> bool {
        fifo.write_start();
        for b in bytes {
            fifo.write(*b);
        }
        fifo.write_end()
    }

    #[test]
    fn test_committed_chunk_is_readable() {
        let mut fifo: ChunkedFifo<16> = ChunkedFifo::new();
        assert!(write_chunk(&mut fifo, &[1, 2, 3]));
        assert!(fifo.has_content());
        assert_eq!(fifo.front_len(), Some(3));

        let reader = fifo.read_chunk().unwrap();
        assert_eq!(reader.remaining(), 3);
        let bytes: heapless::Vec<u8, 8> = reader.collect();
        assert_eq!(&bytes[..], &[1, 2, 3]);
        assert!(!fifo.has_content());
    }

    #[test]
    fn test_open_chunk_is_invisible() {
        let mut fifo: ChunkedFifo<16> = ChunkedFifo::new();
        fifo.write_start();
        fifo.write(42);
        assert!(fifo.is_writing());
        assert!(!fifo.has_content());
        assert!(fifo.read_chunk().is_none());
    }

    #[test]
    fn test_abort_leaves_no_trace_and_restores_space() {
        let mut fifo: ChunkedFifo<16> = ChunkedFifo::new();
        assert!(write_chunk(&mut fifo, &[9]));
        let free = fifo.available_to_write();

        fifo.write_start();
        for b in 0..6 {
            fifo.write(b);
        }
        fifo.write_abort();

        assert_eq!(fifo.available_to_write(), free);
        assert_eq!(fifo.chunk_count(), 1);
        assert_eq!(fifo.pop_chunk::<8>().unwrap(), [9]);
        assert!(fifo.pop_chunk::<8>().is_none());
    }

    #[test]
    fn test_nested_write_start_abandons_open_chunk() {
        let mut fifo: ChunkedFifo<16> = ChunkedFifo::new();
        fifo.write_start();
        fifo.write(1);
        fifo.write(2);
        assert!(write_chunk(&mut fifo, &[3]));
        assert_eq!(fifo.chunk_count(), 1);
        assert_eq!(fifo.pop_chunk::<8>().unwrap(), [3]);
    }

    #[test]
    fn test_overflow_drops_chunk_but_keeps_committed_data() {
        let mut fifo: ChunkedFifo<8> = ChunkedFifo::new();
        assert!(write_chunk(&mut fifo, &[1, 2, 3]));
        assert!(!write_chunk(&mut fifo, &[4, 5, 6, 7, 8]));
        assert!(!fifo.is_writing());
        assert_eq!(fifo.chunk_count(), 1);
        assert_eq!(fifo.available_to_write(), 4);
        assert_eq!(fifo.pop_chunk::<8>().unwrap(), [1, 2, 3]);
    }

    #[test]
    fn test_partially_read_chunk_is_consumed() {
        let mut fifo: ChunkedFifo<16> = ChunkedFifo::new();
        assert!(write_chunk(&mut fifo, &[1, 2, 3]));
        assert!(write_chunk(&mut fifo, &[4]));
        {
            let mut reader = fifo.read_chunk().unwrap();
            assert_eq!(reader.next(), Some(1));
        }
        assert_eq!(fifo.pop_chunk::<8>().unwrap(), [4]);
        assert_eq!(fifo.available_to_write(), 16);
    }

    #[test]
    fn test_empty_chunk() {
        let mut fifo: ChunkedFifo<4> = ChunkedFifo::new();
        assert!(write_chunk(&mut fifo, &[]));
        assert_eq!(fifo.front_len(), Some(0));
        assert!(fifo.pop_chunk::<4>().unwrap().is_empty());
        assert!(!fifo.has_content());
    }

    #[test]
    fn test_chunks_wrap_around_the_ring() {
        let mut fifo: ChunkedFifo<6> = ChunkedFifo::new();
        for round in 0..5u8 {
            assert!(write_chunk(&mut fifo, &[round, round + 1, round + 2]));
            assert_eq!(fifo.pop_chunk::<8>().unwrap(), [round, round + 1, round + 2]);
        }
    }

    #[test]
    fn test_pop_into_short_buffer_drops_chunk() {
        let mut fifo: ChunkedFifo<16> = ChunkedFifo::new();
        assert!(write_chunk(&mut fifo, &[1, 2, 3, 4]));
        assert!(write_chunk(&mut fifo, &[5]));
        assert!(fifo.pop_chunk::<3>().is_none());
        assert_eq!(fifo.chunk_count(), 1);
        assert_eq!(fifo.pop_chunk::<3>().unwrap(), [5]);
        assert_eq!(fifo.available_to_write(), 16);
    }

    #[test]
    fn test_chunk_longer_than_prefix_limit_is_dropped() {
        let mut fifo: ChunkedFifo<512> = ChunkedFifo::new();
        let bytes = [0xa5u8; MAX_CHUNK_LEN + 1];

        assert!(write_chunk(&mut fifo, &bytes[..MAX_CHUNK_LEN]));
        assert_eq!(fifo.front_len(), Some(255));
        let chunk = fifo.pop_chunk::<256>().unwrap();
        assert_eq!(chunk.len(), 255);

        assert!(!write_chunk(&mut fifo, &bytes));
        assert!(!fifo.has_content());
        assert!(!fifo.is_writing());
        assert_eq!(fifo.available_to_write(), 512);
    }

    #[test]
    fn test_zero_capacity_fifo_never_commits() {
        let mut fifo: ChunkedFifo<0> = ChunkedFifo::new();
        fifo.write_start();
        fifo.write(1);
        fifo.write_abort();
        assert!(!write_chunk(&mut fifo, &[1]));
        assert!(!fifo.has_content());
        assert_eq!(fifo.available_to_write(), 0);
    }

    #[test]
    fn test_write_outside_chunk_is_ignored() {
        let mut fifo: ChunkedFifo<4> = ChunkedFifo::new();
        fifo.write(1);
        assert!(!fifo.write_end());
        assert_eq!(fifo.available_to_write(), 4);
    }
}
