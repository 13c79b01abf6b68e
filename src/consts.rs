//! Constants used across the link protocol implementation.
//!
//! This module defines the protocol-wide constants used for buffer sizing,
//! JeeLib frame limits and FS20 pulse timing.
//!
//! ## Key Concepts
//!
//! - **JeeLib frames**: An RFM12 packet carries a header byte, a length byte,
//!   up to [`JEELIB_MAX_LENGTH`] payload bytes and a trailing CRC16.
//! - **FS20 timing**: Each bit is a high/low pulse pair. A `0` lasts
//!   [`FS20_ZERO_US`] per pulse, a `1` lasts [`FS20_ONE_US`] per pulse.
//! - **FS20 packets**: Five or six parity-protected bytes, the last being a
//!   checksum seeded with [`FS20_CHECKSUM_SEED`].
//!
//! These values should be used wherever framing or timing logic is implemented
//! so that the transmit and receive paths agree.

/// Default JeeLib group id, mixed into the CRC but never transmitted.
pub const JEELIB_DEFAULT_GROUP: u8 = 5;

/// Maximum payload length accepted from a JeeLib length byte.
///
/// Longer declared lengths are clamped to this value.
pub const JEELIB_MAX_LENGTH: u8 = 64;

/// Number of CRC bytes trailing every JeeLib frame.
pub const JEELIB_CRC_LEN: u8 = 2;

/// Size of a complete on-air JeeLib frame with a maximum payload
/// (header, length, payload and CRC).
pub const JEELIB_MAX_FRAME_LEN: usize = JEELIB_MAX_LENGTH as usize + 2 + JEELIB_CRC_LEN as usize;

/// Default capacity (in bytes) of the receive FIFOs.
pub const DEFAULT_FIFO_SIZE: usize = 32;

/// Largest chunk a [`ChunkedFifo`](crate::chunked::ChunkedFifo) can hold, limited by its one-byte prefix.
pub const MAX_CHUNK_LEN: usize = u8::MAX as usize;

/// Nominal duration of each pulse of an FS20 `0` bit.
pub const FS20_ZERO_US: u32 = 400;

/// Nominal duration of each pulse of an FS20 `1` bit.
pub const FS20_ONE_US: u32 = 600;

/// Shortest pulse still accepted as a `0` half-bit.
pub const FS20_SHORT_MIN_US: u32 = 280;

/// Boundary between `0` and `1` half-bits. Pulses at or above it are long.
pub const FS20_SHORT_MAX_US: u32 = 500;

/// Longest pulse still accepted as a `1` half-bit.
pub const FS20_LONG_MAX_US: u32 = 760;

/// Number of `0` bits an FS20 transmitter sends before the sync `1` bit.
pub const FS20_SYNC_ZEROS: u8 = 12;

/// Minimum number of `0` bits the decoder needs to see before a sync `1` bit.
///
/// Lower than [`FS20_SYNC_ZEROS`] because the first bits are often lost while
/// the receiver gain settles.
pub const FS20_SYNC_MIN_ZEROS: u8 = 6;

/// Value added to the byte sum to form the FS20 checksum.
pub const FS20_CHECKSUM_SEED: u8 = 6;

/// Command bit announcing an extension byte after the command.
pub const FS20_COMMAND_EXT_FLAG: u8 = 0x20;

/// Length of an FS20 packet without the extension byte.
pub const FS20_PACKET_LEN: usize = 5;

/// Length of an FS20 packet with the extension byte.
pub const FS20_PACKET_MAX_LEN: usize = FS20_PACKET_LEN + 1;

/// Pause between repetitions of an FS20 packet.
pub const FS20_REPEAT_GAP_US: u32 = 10_000;
