//! Declarative binary serialization for link messages.
//!
//! Every message type describes its wire format once, as a `const`
//! [`Descriptor`] listing its fields in order. A field is an explicit pair of
//! accessor functions plus the adapter that puts the value on the wire:
//!
//! | Adapter | Wire representation |
//! |---|---|
//! | [`Field::Binary`] | fixed number of raw bytes, integers least significant byte first |
//! | [`Field::Varint`] | key (`tag << 3`) then a base-128 varint of the value |
//! | [`Field::Optional`] | the wrapped field, only while a presence flag is set |
//! | [`Field::Conditional`] | the wrapped field, only while a predicate over the struct holds |
//!
//! The [`Layout`] decides how the list is framed: [`Layout::Tagged`] messages
//! are protobuf-style key/value pairs that can be decoded in any order,
//! [`Layout::Sequence`] messages are positional bytes without keys.
//!
//! Descriptors are usually written with the [`varint!`](crate::varint),
//! [`binary!`](crate::binary), [`optional!`](crate::optional) and
//! [`conditional!`](crate::conditional) macros:
//!
//! ```rust
//! use rfnode::codec::{Descriptor, Layout, Message, SliceSink, SliceSource};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Reading {
//!     sender: u16,
//!     has_level: bool,
//!     level: i16,
//! }
//!
//! impl Message for Reading {
//!     const DESCRIPTOR: Descriptor<Self> = Descriptor {
//!         layout: Layout::Tagged,
//!         fields: &[
//!             rfnode::varint!(1, Reading, sender: u16),
//!             rfnode::optional!(Reading, has_level, rfnode::varint!(2, Reading, level: i16)),
//!         ],
//!     };
//! }
//!
//! let reading = Reading { sender: 7, has_level: true, level: -3 };
//! let mut buf = [0u8; Reading::MAX_SIZE];
//! let mut sink = SliceSink::new(&mut buf);
//! rfnode::codec::encode(&reading, &mut sink).unwrap();
//!
//! let decoded: Reading = rfnode::codec::decode(&mut SliceSource::new(sink.written())).unwrap();
//! assert_eq!(decoded, reading);
//! ```
//!
//! Messages carry no length prefix of their own; the outer transport (for
//! example a JeeLib frame) supplies the framing.

use core::fmt;

use crate::error::Error;

mod binary;
pub(crate) mod macros;
mod varint;
mod writer;

pub use binary::{BinaryValue, MAX_BINARY_LEN};
pub use varint::{
    MAX_VARINT_LEN, VarintValue, read_varint, varint_len, write_varint, zigzag_decode,
    zigzag_encode,
};
pub use writer::Writer;

/// Varint wire type of a tagged field key.
const WIRE_VARINT: u8 = 0;
const WIRE_FIXED64: u8 = 1;
const WIRE_LENGTH_DELIMITED: u8 = 2;
const WIRE_FIXED32: u8 = 5;

/// A byte destination that supports all-or-nothing writes.
///
/// [`Writer`] brackets every message between [`begin`](Sink::begin) and
/// either [`commit`](Sink::commit) or [`rollback`](Sink::rollback).
pub trait Sink {
    /// Number of bytes that can still be written.
    fn space(&self) -> usize;

    /// Appends a byte, returning `false` if it did not fit.
    fn put(&mut self, byte: u8) -> bool;

    /// Starts a transaction.
    fn begin(&mut self) {}

    /// Makes everything written since [`begin`](Sink::begin) visible.
    fn commit(&mut self) -> bool {
        true
    }

    /// Discards the `written` bytes put since [`begin`](Sink::begin).
    fn rollback(&mut self, written: usize);
}

/// A byte source read sequentially by the decoders.
pub trait Source {
    /// Next byte, or `None` once the source is exhausted.
    fn next_byte(&mut self) -> Option<u8>;
}

impl<const N: usize> Sink for heapless::Vec<u8, N> {
    fn space(&self) -> usize {
        self.capacity() - self.len()
    }

    fn put(&mut self, byte: u8) -> bool {
        self.push(byte).is_ok()
    }

    fn rollback(&mut self, written: usize) {
        let keep = self.len().saturating_sub(written);
        self.truncate(keep);
    }
}

/// A [`Sink`] writing into a caller-provided byte slice.
#[derive(Debug)]
pub struct SliceSink<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> SliceSink<'a> {
    /// Wraps an empty slice.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    /// Bytes written so far.
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Sink for SliceSink<'_> {
    fn space(&self) -> usize {
        self.buf.len() - self.len
    }

    fn put(&mut self, byte: u8) -> bool {
        match self.buf.get_mut(self.len) {
            Some(slot) => {
                *slot = byte;
                self.len += 1;
                true
            }
            None => false,
        }
    }

    fn rollback(&mut self, written: usize) {
        self.len = self.len.saturating_sub(written);
    }
}

/// A [`Source`] reading from a borrowed slice. The slice itself is never modified.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    /// Starts reading at the beginning of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }
}

impl Source for SliceSource<'_> {
    fn next_byte(&mut self) -> Option<u8> {
        let byte = *self.bytes.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }
}

/// How the fields of a [`Descriptor`] are framed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Layout {
    /// Key/value pairs, decoded in any order. Only varint fields are allowed.
    Tagged,
    /// Positional fields without keys.
    Sequence,
}

/// One field of a message descriptor.
///
/// Values are moved through plain function pointers, so descriptors can be
/// `const` and shared by every instance of the message type.
pub enum Field<T: 'static> {
    /// Fixed-width raw bytes (at most [`MAX_BINARY_LEN`]).
    Binary {
        /// Number of bytes on the wire.
        len: usize,
        /// Writes the value into the first `len` bytes of the buffer.
        get: fn(&T, &mut [u8]),
        /// Reads the value from a `len` byte slice.
        set: fn(&mut T, &[u8]),
    },
    /// A tagged base-128 integer.
    Varint {
        /// Field number, unique within the message.
        tag: u32,
        /// Longest varint the value can produce.
        max_len: usize,
        /// Returns the wire value.
        get: fn(&T) -> u64,
        /// Stores a wire value, returning `false` if it does not fit.
        set: fn(&mut T, u64) -> bool,
    },
    /// A field present iff a boolean flag on the struct is set.
    ///
    /// Only valid in [`Layout::Tagged`] messages, where the tag tells the
    /// decoder whether the field is there. Positional messages use
    /// [`Field::Conditional`] instead.
    Optional {
        /// Reads the presence flag.
        present: fn(&T) -> bool,
        /// Updates the presence flag while decoding.
        set_present: fn(&mut T, bool),
        /// The wrapped field.
        field: &'static Field<T>,
    },
    /// A field present iff a predicate over the other fields holds.
    Conditional {
        /// Presence predicate.
        when: fn(&T) -> bool,
        /// The wrapped field.
        field: &'static Field<T>,
    },
}

impl<T: 'static> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Binary { len, .. } => f.debug_struct("Binary").field("len", len).finish(),
            Field::Varint { tag, .. } => f.debug_struct("Varint").field("tag", tag).finish(),
            Field::Optional { field, .. } => f.debug_tuple("Optional").field(field).finish(),
            Field::Conditional { field, .. } => f.debug_tuple("Conditional").field(field).finish(),
        }
    }
}

type PresenceSetter<T> = fn(&mut T, bool);

impl<T: 'static> Field<T> {
    /// Largest number of bytes this field can occupy.
    pub const fn max_size(&self, layout: Layout) -> usize {
        match self {
            Field::Binary { len, .. } => *len,
            Field::Varint { tag, max_len, .. } => match layout {
                Layout::Tagged => varint_len((*tag as u64) << 3) + *max_len,
                Layout::Sequence => *max_len,
            },
            Field::Optional { field, .. } | Field::Conditional { field, .. } => {
                field.max_size(layout)
            }
        }
    }

    fn contains_optional(&self) -> bool {
        match self {
            Field::Optional { .. } => true,
            Field::Binary { .. } | Field::Varint { .. } => false,
            Field::Conditional { field, .. } => field.contains_optional(),
        }
    }

    fn contains_binary(&self) -> bool {
        match self {
            Field::Binary { .. } => true,
            Field::Varint { .. } => false,
            Field::Optional { field, .. } | Field::Conditional { field, .. } => {
                field.contains_binary()
            }
        }
    }

    fn encode<S: Sink + ?Sized>(&self, layout: Layout, msg: &T, writer: &mut Writer<'_, S>) {
        match self {
            Field::Binary { len, get, .. } => {
                let mut raw = [0u8; MAX_BINARY_LEN];
                get(msg, &mut raw[..*len]);
                writer.write_bytes(&raw[..*len]);
            }
            Field::Varint { tag, get, .. } => {
                if layout == Layout::Tagged {
                    writer.write_varint((u64::from(*tag) << 3) | u64::from(WIRE_VARINT));
                }
                writer.write_varint(get(msg));
            }
            Field::Optional { present, field, .. } => {
                if present(msg) {
                    field.encode(layout, msg, writer);
                }
            }
            Field::Conditional { when, field } => {
                if when(msg) {
                    field.encode(layout, msg, writer);
                }
            }
        }
    }

    fn decode_positional<S: Source + ?Sized>(&self, msg: &mut T, source: &mut S) -> Result<(), Error> {
        match self {
            Field::Binary { len, set, .. } => {
                let mut raw = [0u8; MAX_BINARY_LEN];
                for slot in raw[..*len].iter_mut() {
                    *slot = source.next_byte().ok_or(Error::Truncated)?;
                }
                set(msg, &raw[..*len]);
                Ok(())
            }
            Field::Varint { set, .. } => {
                let wire = read_varint(source)?.ok_or(Error::Truncated)?;
                if set(msg, wire) { Ok(()) } else { Err(Error::OutOfRange) }
            }
            Field::Optional { present, field, .. } => {
                if present(msg) {
                    field.decode_positional(msg, source)
                } else {
                    Ok(())
                }
            }
            Field::Conditional { when, field } => {
                if when(msg) {
                    field.decode_positional(msg, source)
                } else {
                    Ok(())
                }
            }
        }
    }

    fn clear_presence(&self, msg: &mut T) {
        if let Field::Optional { set_present, field, .. } = self {
            set_present(msg, false);
            field.clear_presence(msg);
        }
    }

    /// Finds the varint field carrying `tag`, along with the presence flag of
    /// an enclosing [`Field::Optional`].
    fn lookup(&'static self, tag: u64) -> Option<(&'static Field<T>, Option<PresenceSetter<T>>)> {
        match self {
            Field::Varint { tag: own, .. } if u64::from(*own) == tag => Some((self, None)),
            Field::Varint { .. } | Field::Binary { .. } => None,
            Field::Optional { set_present, field, .. } => {
                let (found, inner) = field.lookup(tag)?;
                Some((found, inner.or(Some(*set_present))))
            }
            Field::Conditional { field, .. } => field.lookup(tag),
        }
    }
}

/// The complete wire description of a message type.
pub struct Descriptor<T: 'static> {
    /// Framing of the fields.
    pub layout: Layout,
    /// Fields in encoding order.
    pub fields: &'static [Field<T>],
}

impl<T: 'static> fmt::Debug for Descriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("layout", &self.layout)
            .field("fields", &self.fields)
            .finish()
    }
}

impl<T: 'static> Descriptor<T> {
    /// Largest number of bytes an encoded message can occupy.
    pub const fn max_size(&self) -> usize {
        let mut total = 0;
        let mut i = 0;
        while i < self.fields.len() {
            total += self.fields[i].max_size(self.layout);
            i += 1;
        }
        total
    }

    fn check_layout(&self) -> Result<(), Error> {
        let rejected = match self.layout {
            Layout::Tagged => self.fields.iter().any(Field::contains_binary),
            Layout::Sequence => self.fields.iter().any(Field::contains_optional),
        };
        if rejected {
            return Err(Error::Layout);
        }
        Ok(())
    }

    pub(crate) fn encode<S: Sink + ?Sized>(&self, msg: &T, writer: &mut Writer<'_, S>) -> Result<(), Error> {
        self.check_layout()?;
        for field in self.fields {
            field.encode(self.layout, msg, writer);
        }
        Ok(())
    }

    /// Decodes a message from `source`.
    ///
    /// Fields missing from a tagged message keep their default value.
    /// On error nothing is returned: there is no partially decoded message.
    pub fn decode<S: Source + ?Sized>(&self, source: &mut S) -> Result<T, Error>
    where
        T: Default,
    {
        self.check_layout()?;
        let mut msg = T::default();
        match self.layout {
            Layout::Sequence => {
                for field in self.fields {
                    field.decode_positional(&mut msg, source)?;
                }
            }
            Layout::Tagged => {
                for field in self.fields {
                    field.clear_presence(&mut msg);
                }
                while let Some(key) = read_varint(source)? {
                    let wire_type = (key & 0x07) as u8;
                    match self.lookup(key >> 3) {
                        Some((Field::Varint { set, .. }, flag)) if wire_type == WIRE_VARINT => {
                            let wire = read_varint(source)?.ok_or(Error::Truncated)?;
                            if !set(&mut msg, wire) {
                                return Err(Error::OutOfRange);
                            }
                            if let Some(set_present) = flag {
                                set_present(&mut msg, true);
                            }
                        }
                        _ => skip_field(source, wire_type)?,
                    }
                }
            }
        }
        Ok(msg)
    }

    fn lookup(&self, tag: u64) -> Option<(&'static Field<T>, Option<PresenceSetter<T>>)> {
        self.fields.iter().find_map(|field| field.lookup(tag))
    }
}

fn skip_field<S: Source + ?Sized>(source: &mut S, wire_type: u8) -> Result<(), Error> {
    let len = match wire_type {
        WIRE_VARINT => {
            let _ = read_varint(source)?.ok_or(Error::Truncated)?;
            return Ok(());
        }
        WIRE_FIXED64 => 8,
        WIRE_FIXED32 => 4,
        WIRE_LENGTH_DELIMITED => read_varint(source)?.ok_or(Error::Truncated)?,
        other => return Err(Error::WireType(other)),
    };
    for _ in 0..len {
        let _ = source.next_byte().ok_or(Error::Truncated)?;
    }
    Ok(())
}

/// A type with a static wire description.
pub trait Message: Default + 'static {
    /// Field layout of the message.
    const DESCRIPTOR: Descriptor<Self>;

    /// Largest number of bytes an encoded message can occupy.
    const MAX_SIZE: usize = Self::DESCRIPTOR.max_size();
}

/// Encodes `msg` into `sink` as one transaction.
///
/// # Returns
/// The number of bytes written, or the error that made the sink roll back.
pub fn encode<M: Message, S: Sink + ?Sized>(msg: &M, sink: &mut S) -> Result<usize, Error> {
    let mut writer = Writer::new(sink);
    writer.write_message(msg);
    writer.finish()
}

/// Decodes a message of type `M` from `source`.
pub fn decode<M: Message, S: Source + ?Sized>(source: &mut S) -> Result<M, Error> {
    M::DESCRIPTOR.decode(source)
}
