//! Base-128 varints and the integer types that can travel as one.
//!
//! Each byte carries seven value bits, least significant group first, and the
//! high bit flags that another byte follows. Unsigned integers are
//! zero-extended to `u64`; signed integers are zigzag-mapped first so that
//! small negative values stay short.

use super::{Sink, Source};
use crate::error::Error;

/// Longest possible varint (a full `u64`).
pub const MAX_VARINT_LEN: usize = 10;

/// Number of bytes needed to encode `value` as a varint.
pub const fn varint_len(value: u64) -> usize {
    let mut len = 1;
    let mut v = value >> 7;
    while v != 0 {
        len += 1;
        v >>= 7;
    }
    len
}

/// Writes `value` as a varint.
///
/// # Returns
/// `false` as soon as the sink rejects a byte.
pub fn write_varint<S: Sink + ?Sized>(sink: &mut S, mut value: u64) -> bool {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            return sink.put(byte);
        }
        if !sink.put(byte | 0x80) {
            return false;
        }
    }
}

/// Reads a varint.
///
/// # Returns
/// - `Ok(None)` if the source is exhausted before the first byte
/// - `Err(Error::Truncated)` if it ends in the middle of the varint
/// - `Err(Error::MalformedVarint)` if the varint runs past ten bytes
pub fn read_varint<S: Source + ?Sized>(source: &mut S) -> Result<Option<u64>, Error> {
    let mut value: u64 = 0;
    for i in 0..MAX_VARINT_LEN {
        let byte = match source.next_byte() {
            Some(b) => b,
            None if i == 0 => return Ok(None),
            None => return Err(Error::Truncated),
        };
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(Some(value));
        }
    }
    Err(Error::MalformedVarint)
}

/// Maps a signed value onto an unsigned one, `0, -1, 1, -2, ...` to `0, 1, 2, 3, ...`.
pub const fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode`].
pub const fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// An integer type that can be carried in a varint field.
pub trait VarintValue: Copy {
    /// Longest encoding a value of this type can produce.
    const MAX_LEN: usize;

    /// Converts the value into its wire representation.
    fn to_wire(self) -> u64;

    /// Converts a wire value back, or `None` if it does not fit the type.
    fn from_wire(wire: u64) -> Option<Self>;
}

macro_rules! unsigned_varint {
    ($($ty:ty => $len:expr),*) => {
        $(
            impl VarintValue for $ty {
                const MAX_LEN: usize = $len;

                fn to_wire(self) -> u64 {
                    u64::from(self)
                }

                fn from_wire(wire: u64) -> Option<Self> {
                    <$ty>::try_from(wire).ok()
                }
            }
        )*
    };
}

macro_rules! signed_varint {
    ($($ty:ty => $len:expr),*) => {
        $(
            impl VarintValue for $ty {
                const MAX_LEN: usize = $len;

                fn to_wire(self) -> u64 {
                    zigzag_encode(i64::from(self))
                }

                fn from_wire(wire: u64) -> Option<Self> {
                    <$ty>::try_from(zigzag_decode(wire)).ok()
                }
            }
        )*
    };
}

// Lengths are `varint_len` of the widest wire value of each type.
unsigned_varint!(u8 => 2, u16 => 3, u32 => 5, u64 => MAX_VARINT_LEN);
signed_varint!(i8 => 2, i16 => 3, i32 => 5, i64 => MAX_VARINT_LEN);

impl VarintValue for bool {
    const MAX_LEN: usize = 1;

    fn to_wire(self) -> u64 {
        u64::from(self)
    }

    fn from_wire(wire: u64) -> Option<Self> {
        match wire {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }
}
