//! JeeLib-compatible RFM12 frame receiver.
//!
//! The RFM12 interrupt hands over one byte at a time. A frame on the air is
//!
//! ```text
//! [header][length][payload: length bytes][crc lo][crc hi]
//! ```
//!
//! The group id acts as the radio sync word and is never transmitted, but it is
//! folded into the CRC first, so frames of another group fail the check. Valid
//! frames are committed to a [`ChunkedFifo`] as `header ++ payload`; frames with
//! a bad CRC leave nothing behind.
//!
//! ```rust
//! use rfnode::jeelib::{JeeLibReceiver, encode_frame};
//!
//! let mut air: rfnode::heapless::Vec<u8, 16> = rfnode::heapless::Vec::new();
//! encode_frame(5, 0x21, &[1, 2, 3], &mut air).unwrap();
//!
//! let mut rx: JeeLibReceiver<32> = JeeLibReceiver::new(5);
//! rx.write_start(air[0]);
//! for byte in &air[1..] {
//!     rx.write(*byte);
//! }
//! assert_eq!(rx.pop_frame::<8>().unwrap(), [0x21, 1, 2, 3]);
//! ```

use crate::chunked::{ChunkReader, ChunkedFifo};
use crate::codec::{self, Message, Sink, Writer};
use crate::consts::{DEFAULT_FIFO_SIZE, JEELIB_CRC_LEN, JEELIB_DEFAULT_GROUP, JEELIB_MAX_LENGTH};
use crate::crc::Crc16;
use crate::error::Error;

/// Position of the receiver inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum JeeLibState {
    /// Waiting for the length byte that follows the header.
    Length,
    /// Receiving payload and CRC bytes.
    Data,
}

/// Byte-wise JeeLib frame receiver feeding a [`ChunkedFifo`] of `N` bytes.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct JeeLibReceiver<const N: usize = DEFAULT_FIFO_SIZE> {
    group_id: u8,
    check_crc: bool,
    crc: Crc16,
    fifo: ChunkedFifo<N>,
    state: JeeLibState,
    /// Payload plus CRC bytes still expected in the current frame.
    remaining: u8,

    /// Frames committed to the FIFO.
    pub rx_good: u16,
    /// Frames dropped because of a CRC mismatch or a full FIFO.
    pub rx_bad: u16,
}

impl<const N: usize> Default for JeeLibReceiver<N> {
    fn default() -> Self {
        Self::new(JEELIB_DEFAULT_GROUP)
    }
}

impl<const N: usize> JeeLibReceiver<N> {
    /// Creates a receiver for frames of `group_id`.
    pub const fn new(group_id: u8) -> Self {
        Self {
            group_id,
            check_crc: true,
            crc: Crc16::new(),
            fifo: ChunkedFifo::new(),
            state: JeeLibState::Length,
            remaining: 0,
            rx_good: 0,
            rx_bad: 0,
        }
    }

    /// Accepts every complete frame regardless of its CRC.
    pub const fn without_crc_check(mut self) -> Self {
        self.check_crc = false;
        self
    }

    /// The group id folded into the CRC.
    pub fn group_id(&self) -> u8 {
        self.group_id
    }

    /// Current position inside the frame.
    pub fn state(&self) -> JeeLibState {
        self.state
    }

    /// Starts a new frame with its first (header) byte.
    ///
    /// A frame still in progress is dropped.
    pub fn write_start(&mut self, header: u8) {
        self.crc.reset();
        self.crc.append(self.group_id);
        self.crc.append(header);
        self.fifo.write_start();
        self.fifo.write(header);
        self.state = JeeLibState::Length;
        self.remaining = 0;
    }

    /// Feeds the next byte of the current frame. Ignored between frames.
    pub fn write(&mut self, byte: u8) {
        if !self.fifo.is_writing() {
            return;
        }
        match self.state {
            JeeLibState::Length => {
                self.crc.append(byte);
                if byte > JEELIB_MAX_LENGTH {
                    trace!("jeelib length {} clamped", byte);
                }
                self.remaining = byte.min(JEELIB_MAX_LENGTH) + JEELIB_CRC_LEN;
                self.state = JeeLibState::Data;
            }
            JeeLibState::Data => {
                if self.remaining == 0 {
                    return;
                }
                if self.remaining > JEELIB_CRC_LEN {
                    self.fifo.write(byte);
                }
                self.crc.append(byte);
                self.remaining -= 1;
                if self.remaining == 0 {
                    self.finish_frame();
                }
            }
        }
    }

    fn finish_frame(&mut self) {
        if self.crc.is_valid() || !self.check_crc {
            if self.fifo.write_end() {
                self.rx_good = self.rx_good.wrapping_add(1);
                debug!("jeelib frame committed");
            } else {
                self.rx_bad = self.rx_bad.wrapping_add(1);
            }
        } else {
            debug!("jeelib frame dropped, crc residue {}", self.crc.value());
            self.fifo.write_abort();
            self.rx_bad = self.rx_bad.wrapping_add(1);
        }
    }

    /// Whether a frame is currently being received.
    pub fn is_writing(&self) -> bool {
        self.fifo.is_writing()
    }

    /// Drops the frame in progress, e.g. when the radio loses the carrier.
    pub fn write_abort(&mut self) {
        self.fifo.write_abort();
    }

    /// Whether a complete frame is ready.
    pub fn has_content(&self) -> bool {
        self.fifo.has_content()
    }

    /// Opens the oldest received frame (`header ++ payload`).
    pub fn read_frame(&mut self) -> Option<ChunkReader<'_, N>> {
        self.fifo.read_chunk()
    }

    /// Copies the oldest received frame out of the FIFO.
    ///
    /// A frame longer than `M` is dropped and `None` returned.
    pub fn pop_frame<const M: usize>(&mut self) -> Option<heapless::Vec<u8, M>> {
        self.fifo.pop_chunk()
    }

    /// Decodes the oldest received frame as a header byte followed by a message.
    ///
    /// # Returns
    /// - `Err(nb::Error::WouldBlock)` if no frame is ready
    /// - `Err(nb::Error::Other(_))` if the payload does not decode; the frame is consumed
    pub fn read_message<M: Message>(&mut self) -> nb::Result<(u8, M), Error> {
        let Some(mut reader) = self.fifo.read_chunk() else {
            return Err(nb::Error::WouldBlock);
        };
        let header = reader.next().ok_or(nb::Error::Other(Error::Truncated))?;
        let msg = codec::decode(&mut reader).map_err(nb::Error::Other)?;
        Ok((header, msg))
    }
}

/// Writes the on-air bytes of a frame into `sink`.
///
/// # Arguments
/// - `group_id`: the receiving group, only folded into the CRC
/// - `header`: first byte of the frame
/// - `payload`: at most [`JEELIB_MAX_LENGTH`] bytes
///
/// # Returns
/// The number of bytes written. Nothing is written on error.
pub fn encode_frame<S: Sink + ?Sized>(
    group_id: u8,
    header: u8,
    payload: &[u8],
    sink: &mut S,
) -> Result<usize, Error> {
    let len = match u8::try_from(payload.len()) {
        Ok(len) if len <= JEELIB_MAX_LENGTH => len,
        _ => return Err(Error::OutOfRange),
    };
    let mut crc = Crc16::new();
    for byte in [group_id, header, len].iter().chain(payload) {
        crc.append(*byte);
    }

    let mut writer = Writer::new(sink);
    writer.write_u8(header);
    writer.write_u8(len);
    writer.write_bytes(payload);
    writer.write_u16(crc.value());
    writer.finish()
}

/// Encodes `msg` and writes it as the payload of a frame.
pub fn encode_message_frame<M: Message, S: Sink + ?Sized>(
    group_id: u8,
    header: u8,
    msg: &M,
    sink: &mut S,
) -> Result<usize, Error> {
    let mut payload: heapless::Vec<u8, { JEELIB_MAX_LENGTH as usize }> = heapless::Vec::new();
    let _ = codec::encode(msg, &mut payload)?;
    encode_frame(group_id, header, &payload, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::JEELIB_MAX_FRAME_LEN;
    use crate::messages::{MEASUREMENT_HEADER, Measurement};

    type Frame = heapless::Vec<u8, 80>;

    fn frame(group: u8, header: u8, payload: &[u8]) -> Frame {
        let mut out = Frame::new();
        let _ = encode_frame(group, header, payload, &mut out).unwrap();
        out
    }

    fn feed<const N: usize>(rx: &mut JeeLibReceiver<N>, bytes: &[u8]) {
        rx.write_start(bytes[0]);
        for b in &bytes[1..] {
            rx.write(*b);
        }
    }

    #[test]
    fn test_frame_layout() {
        let bytes = frame(5, 0x10, &[0xaa]);
        assert_eq!(bytes.len(), 5);
        assert_eq!(&bytes[..3], &[0x10, 1, 0xaa]);

        let mut crc = Crc16::new();
        for b in [5u8, 0x10].iter().chain(bytes.iter().skip(1)) {
            crc.append(*b);
        }
        assert!(crc.is_valid());
    }

    #[test]
    fn test_valid_frame_is_committed() {
        let mut rx: JeeLibReceiver = JeeLibReceiver::default();
        feed(&mut rx, &frame(JEELIB_DEFAULT_GROUP, 7, &[1, 2, 3]));
        assert!(!rx.is_writing());
        assert!(rx.has_content());
        assert_eq!(rx.rx_good, 1);
        assert_eq!(rx.pop_frame::<8>().unwrap(), [7, 1, 2, 3]);
    }

    #[test]
    fn test_corrupted_crc_commits_nothing() {
        let mut rx: JeeLibReceiver = JeeLibReceiver::default();
        let mut bytes = frame(JEELIB_DEFAULT_GROUP, 7, &[1, 2, 3]);
        let last = bytes.len() - 1;
        bytes[last] ^= 1;
        feed(&mut rx, &bytes);
        assert!(!rx.has_content());
        assert_eq!(rx.rx_bad, 1);
        assert_eq!(rx.read_frame().map(|r| r.remaining()), None);
    }

    #[test]
    fn test_other_group_fails_crc() {
        let mut rx: JeeLibReceiver = JeeLibReceiver::new(212);
        feed(&mut rx, &frame(5, 7, &[1]));
        assert!(!rx.has_content());
    }

    #[test]
    fn test_crc_check_can_be_disabled() {
        let mut rx: JeeLibReceiver = JeeLibReceiver::new(5).without_crc_check();
        let mut bytes = frame(5, 7, &[9]);
        bytes[3] ^= 0xff;
        feed(&mut rx, &bytes);
        assert_eq!(rx.pop_frame::<8>().unwrap(), [7, 9]);
    }

    #[test]
    fn test_empty_payload() {
        let mut rx: JeeLibReceiver = JeeLibReceiver::default();
        feed(&mut rx, &frame(JEELIB_DEFAULT_GROUP, 3, &[]));
        assert_eq!(rx.pop_frame::<8>().unwrap(), [3]);
    }

    #[test]
    fn test_maximum_payload() {
        let payload = [0x5a; JEELIB_MAX_LENGTH as usize];
        let mut rx: JeeLibReceiver<128> = JeeLibReceiver::default();
        let bytes = frame(JEELIB_DEFAULT_GROUP, 3, &payload);
        assert_eq!(bytes.len(), JEELIB_MAX_FRAME_LEN);
        feed(&mut rx, &bytes);
        let out = rx.pop_frame::<80>().unwrap();
        assert_eq!(out.len(), 1 + payload.len());
        assert_eq!(&out[1..], &payload[..]);
    }

    #[test]
    fn test_oversized_length_is_clamped() {
        let payload = [0x11; JEELIB_MAX_LENGTH as usize];
        let mut crc = Crc16::new();
        let mut bytes = Frame::new();
        for b in [3u8, JEELIB_MAX_LENGTH + 1].iter().chain(payload.iter()) {
            bytes.push(*b).unwrap();
        }
        crc.append(JEELIB_DEFAULT_GROUP);
        for b in bytes.iter() {
            crc.append(*b);
        }
        bytes.extend_from_slice(&crc.value().to_le_bytes()).unwrap();

        let mut rx: JeeLibReceiver<128> = JeeLibReceiver::default();
        feed(&mut rx, &bytes);
        let out = rx.pop_frame::<80>().unwrap();
        assert_eq!(out.len(), 1 + JEELIB_MAX_LENGTH as usize);
    }

    #[test]
    fn test_encode_rejects_long_payload() {
        let payload = [0u8; JEELIB_MAX_LENGTH as usize + 1];
        let mut out = Frame::new();
        assert_eq!(encode_frame(5, 1, &payload, &mut out), Err(Error::OutOfRange));
        assert!(out.is_empty());
    }

    #[test]
    fn test_frames_stay_in_order_around_bad_ones() {
        let mut rx: JeeLibReceiver<64> = JeeLibReceiver::default();
        let mut bad = frame(JEELIB_DEFAULT_GROUP, 2, &[0xbb]);
        bad[2] ^= 0x40;

        feed(&mut rx, &frame(JEELIB_DEFAULT_GROUP, 1, &[0xaa]));
        feed(&mut rx, &bad);
        feed(&mut rx, &frame(JEELIB_DEFAULT_GROUP, 3, &[0xcc]));
        feed(&mut rx, &bad);

        assert_eq!(rx.rx_good, 2);
        assert_eq!(rx.rx_bad, 2);
        assert_eq!(rx.pop_frame::<4>().unwrap(), [1, 0xaa]);
        assert_eq!(rx.pop_frame::<4>().unwrap(), [3, 0xcc]);
        assert!(rx.pop_frame::<4>().is_none());
    }

    #[test]
    fn test_restart_drops_unfinished_frame() {
        let mut rx: JeeLibReceiver = JeeLibReceiver::default();
        let bytes = frame(JEELIB_DEFAULT_GROUP, 1, &[1, 2, 3, 4]);
        feed(&mut rx, &bytes[..4]);
        assert!(rx.is_writing());
        feed(&mut rx, &frame(JEELIB_DEFAULT_GROUP, 2, &[5]));
        assert_eq!(rx.pop_frame::<8>().unwrap(), [2, 5]);
        assert!(!rx.has_content());
    }

    #[test]
    fn test_bytes_after_frame_are_ignored() {
        let mut rx: JeeLibReceiver = JeeLibReceiver::default();
        feed(&mut rx, &frame(JEELIB_DEFAULT_GROUP, 1, &[1]));
        rx.write(0xff);
        rx.write(0xff);
        assert_eq!(rx.pop_frame::<8>().unwrap(), [1, 1]);
        assert!(!rx.has_content());
    }

    #[test]
    fn test_full_fifo_drops_frame() {
        let mut rx: JeeLibReceiver<8> = JeeLibReceiver::default();
        feed(&mut rx, &frame(JEELIB_DEFAULT_GROUP, 1, &[1, 2, 3, 4, 5, 6, 7, 8]));
        assert!(!rx.has_content());
        assert_eq!(rx.rx_bad, 1);
        assert!(!rx.is_writing());
    }

    #[test]
    fn test_measurement_over_the_air() {
        let m = Measurement {
            has_soil: true,
            soil: 4_711,
            temp: -125,
            supply: 3_300,
            seq: 9,
            sender: Measurement::sender_id(b'O', 2),
        };
        let mut air = Frame::new();
        let _ = encode_message_frame(JEELIB_DEFAULT_GROUP, MEASUREMENT_HEADER, &m, &mut air).unwrap();

        let mut rx: JeeLibReceiver<64> = JeeLibReceiver::default();
        assert!(matches!(rx.read_message::<Measurement>(), Err(nb::Error::WouldBlock)));
        feed(&mut rx, &air);
        let (header, decoded) = rx.read_message::<Measurement>().unwrap();
        assert_eq!(header, MEASUREMENT_HEADER);
        assert_eq!(decoded, m);
        assert!(!rx.has_content());
    }

    #[test]
    fn test_frame_larger_than_pop_buffer_is_dropped() {
        let m = Measurement {
            has_soil: true,
            soil: 4_711,
            temp: -125,
            supply: 3_300,
            seq: 9,
            sender: Measurement::sender_id(b'O', 2),
        };
        let mut air = Frame::new();
        let _ = encode_message_frame(JEELIB_DEFAULT_GROUP, MEASUREMENT_HEADER, &m, &mut air).unwrap();

        let mut rx: JeeLibReceiver<64> = JeeLibReceiver::default();
        feed(&mut rx, &air);
        feed(&mut rx, &air);
        assert!(rx.pop_frame::<7>().is_none());

        let frame = rx.pop_frame::<32>().unwrap();
        assert_eq!(frame[0], MEASUREMENT_HEADER);
        let decoded: Measurement = codec::decode(&mut codec::SliceSource::new(&frame[1..])).unwrap();
        assert_eq!(decoded, m);
        assert!(!rx.has_content());
    }
}
