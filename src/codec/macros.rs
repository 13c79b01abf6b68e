//! Shorthands for building [`Field`](crate::codec::Field) descriptors.
//!
//! Each macro expands to a plain `Field` value whose accessors are
//! non-capturing closures, so the result can be used inside a `const`
//! [`Descriptor`](crate::codec::Descriptor).

/// Builds a [`Field::Varint`](crate::codec::Field::Varint) for a struct member.
///
/// # Arguments
/// - `$tag`: field number on the wire
/// - `$owner`: the message struct
/// - `$field: $ty`: the member and its integer type (any [`VarintValue`](crate::codec::VarintValue))
///
/// # Example
/// ```rust
/// # #[derive(Default)] struct Status { battery: u16 }
/// let field = rfnode::varint!(3, Status, battery: u16);
/// ```
#[macro_export]
macro_rules! varint {
    ( $tag:expr, $owner:ty, $field:ident : $ty:ty ) => {
        $crate::codec::Field::<$owner>::Varint {
            tag: $tag,
            max_len: <$ty as $crate::codec::VarintValue>::MAX_LEN,
            get: |msg: &$owner| <$ty as $crate::codec::VarintValue>::to_wire(msg.$field),
            set: |msg: &mut $owner, wire: u64| {
                match <$ty as $crate::codec::VarintValue>::from_wire(wire) {
                    Some(value) => {
                        msg.$field = value;
                        true
                    }
                    None => false,
                }
            },
        }
    };
}

/// Builds a [`Field::Binary`](crate::codec::Field::Binary) for a struct member.
///
/// Integers are written least significant byte first.
///
/// # Example
/// ```rust
/// # #[derive(Default)] struct Raw { house_code: u16 }
/// let field = rfnode::binary!(Raw, house_code: u16);
/// ```
#[macro_export]
macro_rules! binary {
    ( $owner:ty, $field:ident : $ty:ty ) => {
        $crate::codec::Field::<$owner>::Binary {
            len: <$ty as $crate::codec::BinaryValue>::LEN,
            get: |msg: &$owner, out: &mut [u8]| {
                <$ty as $crate::codec::BinaryValue>::write_le(msg.$field, out)
            },
            set: |msg: &mut $owner, bytes: &[u8]| {
                msg.$field = <$ty as $crate::codec::BinaryValue>::read_le(bytes)
            },
        }
    };
}

/// Wraps a field so it is only present while a `bool` member is set.
///
/// Tagged decoding clears the flag first and sets it again when the wrapped
/// field shows up on the wire.
#[macro_export]
macro_rules! optional {
    ( $owner:ty, $flag:ident, $inner:expr ) => {
        $crate::codec::Field::<$owner>::Optional {
            present: |msg: &$owner| msg.$flag,
            set_present: |msg: &mut $owner, present: bool| msg.$flag = present,
            field: &$inner,
        }
    };
}

/// Wraps a field so it is only present while `$when(&msg)` holds.
///
/// In a [`Layout::Sequence`](crate::codec::Layout::Sequence) message the
/// predicate may only look at fields that come earlier in the list.
#[macro_export]
macro_rules! conditional {
    ( $owner:ty, $when:expr, $inner:expr ) => {
        $crate::codec::Field::<$owner>::Conditional {
            when: $when,
            field: &$inner,
        }
    };
}
