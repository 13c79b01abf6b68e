//! Fixed-width values copied to the wire as-is, least significant byte first.

/// Widest fixed-width value supported by [`Field::Binary`](super::Field::Binary).
pub const MAX_BINARY_LEN: usize = 8;

/// A value with a fixed little-endian wire representation.
pub trait BinaryValue: Copy {
    /// Number of bytes on the wire.
    const LEN: usize;

    /// Writes the value into `out[..Self::LEN]`.
    fn write_le(self, out: &mut [u8]);

    /// Reads the value from `bytes[..Self::LEN]`.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! binary_value {
    ($($ty:ty => $len:expr),*) => {
        $(
            impl BinaryValue for $ty {
                const LEN: usize = $len;

                fn write_le(self, out: &mut [u8]) {
                    out[..Self::LEN].copy_from_slice(&self.to_le_bytes());
                }

                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; $len];
                    raw.copy_from_slice(&bytes[..Self::LEN]);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

binary_value!(u8 => 1, i8 => 1, u16 => 2, i16 => 2, u32 => 4, i32 => 4, u64 => 8, i64 => 8);
