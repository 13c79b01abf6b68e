//! Fixed-capacity byte ring buffer.
//!
//! [`RingBuffer`] is the single storage primitive shared between the
//! interrupt-time producers (pulse and byte arrival) and the main-loop
//! consumer. It never allocates and never overwrites unread data: a write
//! into a full buffer fails and the byte is dropped.
//!
//! The buffer itself is not synchronized. Share it between an interrupt
//! handler and the main loop through [`crate::isr`], which keeps every access
//! inside a critical section.

/// A ring buffer holding up to `N` bytes.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct RingBuffer<const N: usize> {
    buf: [u8; N],
    read: usize,
    write: usize,
    count: usize,
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<N> {
    /// Creates an empty buffer.
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            read: 0,
            write: 0,
            count: 0,
        }
    }

    /// Total number of bytes the buffer can hold.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of unread bytes.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether there is no unread byte.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether there is at least one unread byte.
    pub fn has_content(&self) -> bool {
        self.count > 0
    }

    /// Number of bytes that can still be written.
    pub fn available_to_write(&self) -> usize {
        N - self.count
    }

    /// Appends a byte.
    ///
    /// # Returns
    /// `false` if the buffer is full, in which case the byte is dropped.
    pub fn write(&mut self, byte: u8) -> bool {
        if self.count >= N {
            return false;
        }
        self.buf[self.write] = byte;
        self.write = (self.write + 1) % N;
        self.count += 1;
        true
    }

    /// Removes and returns the oldest byte, or `None` if empty.
    pub fn read(&mut self) -> Option<u8> {
        if self.count == 0 {
            return None;
        }
        let byte = self.buf[self.read];
        self.read = (self.read + 1) % N;
        self.count -= 1;
        Some(byte)
    }

    /// Returns the byte `offset` positions after the oldest one without consuming anything.
    pub fn peek(&self, offset: usize) -> Option<u8> {
        if offset >= self.count {
            return None;
        }
        Some(self.buf[(self.read + offset) % N])
    }

    /// Index the next write will land on.
    pub(crate) fn write_index(&self) -> usize {
        self.write
    }

    /// Replaces an already written byte at a raw buffer index.
    pub(crate) fn overwrite(&mut self, index: usize, byte: u8) {
        self.buf[index % N] = byte;
    }

    /// Takes back the `n` most recently written bytes.
    pub(crate) fn rewind(&mut self, n: usize) {
        let n = n.min(self.count);
        if n == 0 {
            return;
        }
        self.write = (self.write + N - n) % N;
        self.count -= n;
    }
}
