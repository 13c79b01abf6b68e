//! FS20 home-automation protocol over 868 MHz OOK.
//!
//! Every bit is a high pulse followed by a low pulse of the same length,
//! nominally 400 µs for a `0` and 600 µs for a `1`. A packet starts with a run
//! of `0` bits and a single `1` bit for sync, then carries 5 or 6 bytes, each
//! MSB first and followed by an even parity bit:
//!
//! | Byte | Content |
//! |------|---------|
//! | 0 | house code, high byte |
//! | 1 | house code, low byte |
//! | 2 | address |
//! | 3 | command |
//! | 4 | command extension, only if `command & 0x20` |
//! | last | checksum: `6 +` sum of the bytes above, modulo 256 |
//!
//! [`Fs20Decoder`] rebuilds packets from measured pulses on the receive side.
//! [`PulseTrain`] and [`Fs20Transmitter`] produce them on the transmit side.

mod decoder;
mod encoder;
mod packet;
mod transmit;

pub use decoder::{Fs20Decoder, Fs20State};
pub use encoder::PulseTrain;
pub use packet::Fs20Packet;
pub use transmit::Fs20Transmitter;
