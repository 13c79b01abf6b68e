use crate::chunked::{ChunkReader, ChunkedFifo};
use crate::codec;
use crate::consts::{
    DEFAULT_FIFO_SIZE, FS20_CHECKSUM_SEED, FS20_COMMAND_EXT_FLAG, FS20_PACKET_LEN,
    FS20_PACKET_MAX_LEN, FS20_SYNC_MIN_ZEROS,
};
use crate::error::Error;
use crate::pulse::{PulseEvent, PulseTiming};

use super::Fs20Packet;

/// Bit-level state of the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Fs20State {
    /// Counting `0` bits while waiting for the sync `1` bit.
    Sync,
    /// Receiving parity-protected packet bytes.
    Data,
}

/// Reassembles FS20 packets from pulse durations.
///
/// Feed every edge of the demodulated signal to [`apply`](Self::apply);
/// packets with correct parity and checksum end up in an internal
/// [`ChunkedFifo`] of `N` bytes, everything else is silently dropped.
///
/// ```rust
/// use rfnode::fs20::{Fs20Decoder, Fs20Packet, PulseTrain};
/// use rfnode::pulse::{PulseEvent, PulseTiming};
///
/// let timing = PulseTiming::from_clock(16_000_000, 64);
/// let packet = Fs20Packet::new(0x12, 0x34, 1, 0x11, 0);
///
/// let mut decoder: Fs20Decoder<32> = Fs20Decoder::new(timing);
/// for pulse in PulseTrain::new(&packet, timing) {
///     decoder.apply(pulse);
/// }
/// decoder.apply(PulseEvent::empty());
/// assert_eq!(decoder.read_packet().unwrap(), packet);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Fs20Decoder<const N: usize = DEFAULT_FIFO_SIZE> {
    timing: PulseTiming,
    fifo: ChunkedFifo<N>,
    state: Fs20State,
    /// Class of the high half of the current bit, once it has been seen.
    pending: Option<bool>,
    zeros: u8,
    bits: u8,
    byte: u8,
    received: usize,
    expected: usize,
    sum: u8,

    /// Packets committed to the FIFO.
    pub rx_good: u16,
    /// Packets dropped after sync (parity, checksum, broken pulse or full FIFO).
    pub rx_bad: u16,
}

impl<const N: usize> Fs20Decoder<N> {
    /// Creates a decoder for pulses measured with `timing`.
    pub const fn new(timing: PulseTiming) -> Self {
        Self {
            timing,
            fifo: ChunkedFifo::new(),
            state: Fs20State::Sync,
            pending: None,
            zeros: 0,
            bits: 0,
            byte: 0,
            received: 0,
            expected: FS20_PACKET_LEN,
            sum: FS20_CHECKSUM_SEED,
            rx_good: 0,
            rx_bad: 0,
        }
    }

    /// Current bit-level state.
    pub fn state(&self) -> Fs20State {
        self.state
    }

    /// Processes one pulse.
    ///
    /// An empty event (timeout) or a pulse outside both timing windows drops
    /// any packet in progress and restarts the sync search.
    pub fn apply(&mut self, event: PulseEvent) {
        if event.is_empty() {
            self.reset();
            return;
        }
        let Some(long) = self.timing.classify(event.duration) else {
            self.reset();
            return;
        };
        if event.is_high {
            self.pending = Some(long);
            return;
        }
        match self.pending.take() {
            Some(first) if first == long => self.apply_bit(long),
            Some(_) => self.reset(),
            // a low pulse without its high half is line noise while idle
            None if self.state == Fs20State::Sync => {}
            None => self.reset(),
        }
    }

    fn apply_bit(&mut self, bit: bool) {
        match self.state {
            Fs20State::Sync if !bit => self.zeros = self.zeros.saturating_add(1),
            Fs20State::Sync if self.zeros >= FS20_SYNC_MIN_ZEROS => self.start_packet(),
            Fs20State::Sync => self.zeros = 0,
            Fs20State::Data if self.bits < 8 => {
                self.byte = (self.byte << 1) | u8::from(bit);
                self.bits += 1;
            }
            Fs20State::Data => self.apply_parity(bit),
        }
    }

    fn start_packet(&mut self) {
        trace!("fs20 sync after {} zeros", self.zeros);
        self.state = Fs20State::Data;
        self.zeros = 0;
        self.bits = 0;
        self.byte = 0;
        self.received = 0;
        self.expected = FS20_PACKET_LEN;
        self.sum = FS20_CHECKSUM_SEED;
        self.fifo.write_start();
    }

    fn apply_parity(&mut self, parity: bool) {
        let byte = self.byte;
        self.bits = 0;
        self.byte = 0;
        if (byte.count_ones() % 2 == 1) != parity {
            debug!("fs20 parity error in byte {}", self.received);
            self.drop_packet();
            return;
        }

        self.fifo.write(byte);
        self.received += 1;
        if self.received == 4 && byte & FS20_COMMAND_EXT_FLAG != 0 {
            self.expected = FS20_PACKET_LEN + 1;
        }
        if self.received < self.expected {
            self.sum = self.sum.wrapping_add(byte);
            return;
        }

        if byte != self.sum {
            debug!("fs20 checksum {} expected {}", byte, self.sum);
            self.drop_packet();
        } else if self.fifo.write_end() {
            debug!("fs20 packet committed");
            self.rx_good = self.rx_good.wrapping_add(1);
            self.restart_sync();
        } else {
            self.drop_packet();
        }
    }

    fn drop_packet(&mut self) {
        self.fifo.write_abort();
        self.rx_bad = self.rx_bad.wrapping_add(1);
        self.restart_sync();
    }

    fn restart_sync(&mut self) {
        self.state = Fs20State::Sync;
        self.pending = None;
        self.zeros = 0;
        self.bits = 0;
        self.byte = 0;
    }

    fn reset(&mut self) {
        if self.state == Fs20State::Data {
            trace!("fs20 packet broken off after {} bytes", self.received);
            self.drop_packet();
        } else {
            self.restart_sync();
        }
    }

    /// Whether a complete packet is ready.
    pub fn has_content(&self) -> bool {
        self.fifo.has_content()
    }

    /// Opens the raw bytes of the oldest received packet.
    pub fn read_chunk(&mut self) -> Option<ChunkReader<'_, N>> {
        self.fifo.read_chunk()
    }

    /// Copies the raw bytes of the oldest received packet out of the FIFO.
    pub fn pop_raw(&mut self) -> Option<heapless::Vec<u8, FS20_PACKET_MAX_LEN>> {
        self.fifo.pop_chunk()
    }

    /// Takes the oldest received packet.
    ///
    /// # Returns
    /// - `Err(nb::Error::WouldBlock)` if no packet is ready
    pub fn read_packet(&mut self) -> nb::Result<Fs20Packet, Error> {
        let Some(mut reader) = self.fifo.read_chunk() else {
            return Err(nb::Error::WouldBlock);
        };
        codec::decode(&mut reader).map_err(nb::Error::Other)
    }
}
