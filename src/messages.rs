//! Application messages sent by the sensor node.

use crate::codec::{Descriptor, Layout, Message};

/// Header byte the garden sensor puts in front of its JeeLib frames.
pub const MEASUREMENT_HEADER: u8 = 42;

/// One round of sensor readings.
///
/// Encoded as a tagged message:
///
/// | Tag | Field | Type |
/// |-----|-------|------|
/// | 1 | `sender` | `u16` |
/// | 8 | `seq` | `u8` |
/// | 9 | `supply` | `u16` |
/// | 10 | `temp` | `i16` (zigzag) |
/// | 11 | `soil` | `u32`, only when `has_soil` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Measurement {
    /// Whether a soil moisture reading is included.
    pub has_soil: bool,
    /// Soil capacitor charge time.
    pub soil: u32,
    /// Temperature in 1/16 °C.
    pub temp: i16,
    /// Supply voltage in mV.
    pub supply: u16,
    /// Sequence number, incremented per measurement.
    pub seq: u8,
    /// Node id: the node type in the high byte, its id in the low byte.
    pub sender: u16,
}

impl Measurement {
    /// Builds the sender id of a node.
    ///
    /// # Example
    /// ```rust
    /// use rfnode::messages::Measurement;
    ///
    /// assert_eq!(Measurement::sender_id(b'O', 3), 0x4f03);
    /// ```
    pub const fn sender_id(kind: u8, id: u8) -> u16 {
        ((kind as u16) << 8) | id as u16
    }
}

impl Message for Measurement {
    const DESCRIPTOR: Descriptor<Self> = Descriptor {
        layout: Layout::Tagged,
        fields: &[
            crate::varint!(1, Measurement, sender: u16),
            crate::varint!(8, Measurement, seq: u8),
            crate::varint!(9, Measurement, supply: u16),
            crate::varint!(10, Measurement, temp: i16),
            crate::optional!(Measurement, has_soil, crate::varint!(11, Measurement, soil: u32)),
        ],
    };
}
