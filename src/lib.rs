//! # rfnode
//!
//! The radio link core of a battery-powered sensor node, portable across
//! `no_std` targets such as the ATmega328P.
//!
//! Interrupt handlers hand over raw pulses or bytes. The main loop picks up
//! complete, verified frames. In between, everything lives in fixed-size
//! buffers and nothing allocates:
//!
//! - [`ring::RingBuffer`]: fixed-capacity byte ring that never overwrites unread data
//! - [`chunked::ChunkedFifo`]: transactional, variable-length chunks on top of it
//! - [`jeelib::JeeLibReceiver`]: CRC16-checked frames from a HopeRF RFM12 (JeeLib format)
//! - [`fs20::Fs20Decoder`]: FS20 packets decoded from 400/600 µs OOK pulse timings
//! - [`codec`]: declarative, `const` message descriptors with varint and fixed-width fields
//!
//! ## Crate features
//! | Feature         | Description |
//! |-----------------|-------------|
//! | `std`           | Disables `#![no_std]` support |
//! | `isr` (default) | Uses `critical_section::with` to share decoders with interrupt handlers |
//! | `defmt-0-3`     | Uses `defmt` logging |
//! | `log`           | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust
//! use rfnode::jeelib::{JeeLibReceiver, encode_message_frame};
//! use rfnode::messages::{MEASUREMENT_HEADER, Measurement};
//!
//! let reading = Measurement { temp: 215, supply: 3_100, seq: 1, sender: 0x4f01, ..Default::default() };
//!
//! // transmit side
//! let mut air: rfnode::heapless::Vec<u8, 32> = rfnode::heapless::Vec::new();
//! encode_message_frame(5, MEASUREMENT_HEADER, &reading, &mut air).unwrap();
//!
//! // receive side, normally fed byte by byte from the radio interrupt
//! let mut rx: JeeLibReceiver = JeeLibReceiver::new(5);
//! rx.write_start(air[0]);
//! for byte in &air[1..] {
//!     rx.write(*byte);
//! }
//! let (header, received) = rx.read_message::<Measurement>().unwrap();
//! assert_eq!(header, MEASUREMENT_HEADER);
//! assert_eq!(received, reading);
//! ```
//!
//! ## Integration Notes
//!
//! - Frames that fail parity, checksum or CRC never show up; they are only counted
//!   in `rx_bad` and logged.
//! - When a FIFO fills up, the frame being received is dropped; frames already
//!   committed are never overwritten.
//! - With the `isr` feature, see [`isr`] for sharing a decoder with an interrupt handler.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

// keep first, the logging macros are textually scoped
#[macro_use]
mod fmt;

#[cfg(feature = "isr")]
pub use critical_section;
pub use heapless;

pub use error::Error;

pub mod chunked;
pub mod codec;
pub mod consts;
pub(crate) mod crc;
pub mod error;
pub mod fs20;
#[cfg(feature = "isr")]
pub mod isr;
pub mod jeelib;
pub mod messages;
pub mod pulse;
pub mod ring;
