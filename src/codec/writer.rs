use super::{Message, Sink, write_varint};
use crate::error::Error;

/// Transactional writer over a [`Sink`].
///
/// The writer opens a transaction on creation and keeps a validity flag.
/// Once any write fails, every following write is skipped and
/// [`finish`](Writer::finish) rolls the sink back, so a failed message
/// never leaves partial bytes behind. Dropping an unfinished writer ends the
/// transaction the same way.
///
/// ```rust
/// use rfnode::codec::{SliceSink, Writer};
///
/// let mut buf = [0u8; 3];
/// let mut sink = SliceSink::new(&mut buf);
/// let mut writer = Writer::new(&mut sink);
/// writer.write_u16(0x0102);
/// writer.write_u16(0x0304); // does not fit
/// assert!(writer.finish().is_err());
/// assert!(sink.is_empty());
/// ```
#[derive(Debug)]
pub struct Writer<'a, S: Sink + ?Sized> {
    sink: &'a mut S,
    written: usize,
    error: Option<Error>,
    finished: bool,
}

impl<'a, S: Sink + ?Sized> Writer<'a, S> {
    /// Begins a transaction on `sink`.
    pub fn new(sink: &'a mut S) -> Self {
        sink.begin();
        Self {
            sink,
            written: 0,
            error: None,
            finished: false,
        }
    }

    /// Whether every write so far succeeded.
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Number of bytes written in this transaction.
    pub fn written(&self) -> usize {
        self.written
    }

    fn fail(&mut self, error: Error) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn put(&mut self, byte: u8) {
        if !self.is_valid() {
            return;
        }
        if self.sink.put(byte) {
            self.written += 1;
        } else {
            self.fail(Error::Overflow);
        }
    }

    /// Writes raw bytes, all or none.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if !self.is_valid() {
            return;
        }
        if self.sink.space() < bytes.len() {
            self.fail(Error::Overflow);
            return;
        }
        for byte in bytes {
            self.put(*byte);
        }
    }

    /// Writes a single byte.
    pub fn write_u8(&mut self, value: u8) {
        self.write_bytes(&[value]);
    }

    /// Writes a `u16`, least significant byte first.
    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes a `u32`, least significant byte first.
    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes a base-128 varint.
    pub fn write_varint(&mut self, value: u64) {
        if !self.is_valid() {
            return;
        }
        let before = self.sink.space();
        let ok = write_varint(&mut *self.sink, value);
        // partial bytes still count, rollback has to remove them
        self.written += before.saturating_sub(self.sink.space());
        if !ok {
            self.fail(Error::Overflow);
        }
    }

    /// Writes a complete message.
    ///
    /// The sink must have room for [`Message::MAX_SIZE`] bytes up front, even
    /// if this particular value encodes shorter.
    pub fn write_message<M: Message>(&mut self, msg: &M) {
        if !self.is_valid() {
            return;
        }
        if self.sink.space() < M::MAX_SIZE {
            self.fail(Error::Overflow);
            return;
        }
        if let Err(e) = M::DESCRIPTOR.encode(msg, self) {
            self.fail(e);
        }
    }

    fn end(&mut self) -> Result<usize, Error> {
        self.finished = true;
        match self.error {
            None if self.sink.commit() => Ok(self.written),
            None => Err(Error::Overflow),
            Some(e) => {
                self.sink.rollback(self.written);
                Err(e)
            }
        }
    }

    /// Commits the transaction if every write succeeded, rolls it back otherwise.
    ///
    /// # Returns
    /// The number of bytes committed, or the first error encountered.
    pub fn finish(mut self) -> Result<usize, Error> {
        self.end()
    }
}

impl<S: Sink + ?Sized> Drop for Writer<'_, S> {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.end();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunked::ChunkedFifo;
    use crate::codec::SliceSink;

    #[test]
    fn test_writes_little_endian_integers() {
        let mut buf = [0u8; 8];
        let mut sink = SliceSink::new(&mut buf);
        let mut writer = Writer::new(&mut sink);
        writer.write_u8(1);
        writer.write_u16(0x0302);
        writer.write_u32(0x0706_0504);
        assert_eq!(writer.finish(), Ok(7));
        assert_eq!(sink.written(), &[1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_failure_skips_later_writes_and_rolls_back() {
        let mut buf = [0u8; 4];
        let mut sink = SliceSink::new(&mut buf);
        let mut writer = Writer::new(&mut sink);
        writer.write_u16(0xffff);
        writer.write_u32(1);
        assert!(!writer.is_valid());
        writer.write_u8(9);
        assert_eq!(writer.written(), 2);
        assert_eq!(writer.finish(), Err(Error::Overflow));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_failed_write_leaves_fifo_untouched() {
        let mut fifo: ChunkedFifo<8> = ChunkedFifo::new();
        {
            let mut writer = Writer::new(&mut fifo);
            writer.write_u32(1);
            writer.write_u32(2);
            assert!(writer.finish().is_err());
        }
        assert!(!fifo.has_content());
        assert_eq!(fifo.available_to_write(), 8);

        let mut writer = Writer::new(&mut fifo);
        writer.write_u16(0x0201);
        assert_eq!(writer.finish(), Ok(2));
        assert_eq!(fifo.pop_chunk::<4>().unwrap(), [1, 2]);
    }

    #[test]
    fn test_drop_commits_valid_writes() {
        let mut out: heapless::Vec<u8, 4> = heapless::Vec::new();
        {
            let mut writer = Writer::new(&mut out);
            writer.write_varint(300);
        }
        assert_eq!(out, [0xac, 0x02]);
    }

    #[test]
    fn test_varint_overflow_rolls_back_partial_bytes() {
        let mut out: heapless::Vec<u8, 2> = heapless::Vec::new();
        let mut writer = Writer::new(&mut out);
        writer.write_varint(u64::from(u32::MAX));
        assert_eq!(writer.finish(), Err(Error::Overflow));
        assert!(out.is_empty());
    }
}
