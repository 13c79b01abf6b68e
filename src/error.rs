//! Error type for message encoding and decoding.
//!
//! Link-level failures (parity, checksum, CRC, FIFO overflow) are never
//! reported through this type: the affected frame is dropped and simply never
//! becomes readable. Only the wire codec surfaces errors to its caller.

/// Failures reported by the wire codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Error {
    /// The destination does not have room for the whole message.
    #[error("destination has no room for the message")]
    Overflow,
    /// The source ended in the middle of a field.
    #[error("source ended in the middle of a field")]
    Truncated,
    /// A value does not fit the type of its field or the frame it goes into.
    #[error("value out of range")]
    OutOfRange,
    /// A varint ran past ten bytes.
    #[error("varint longer than ten bytes")]
    MalformedVarint,
    /// A tagged field used a wire type that cannot be skipped.
    #[error("unsupported wire type {0}")]
    WireType(u8),
    /// A positional binary field appeared in a tagged message.
    #[error("binary field in a tagged message")]
    Layout,
}
