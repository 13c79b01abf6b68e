use crate::codec::{self, Descriptor, Layout, Message, SliceSource};
use crate::consts::{FS20_CHECKSUM_SEED, FS20_COMMAND_EXT_FLAG, FS20_PACKET_LEN, FS20_PACKET_MAX_LEN};
use crate::error::Error;

/// One FS20 home-automation command.
///
/// On the air the bytes follow each other in field order, `command_ext` only
/// when the command has [`FS20_COMMAND_EXT_FLAG`] set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Fs20Packet {
    /// High byte of the house code.
    pub house_code_hi: u8,
    /// Low byte of the house code.
    pub house_code_lo: u8,
    /// Device address within the house code.
    pub address: u8,
    /// Command byte.
    pub command: u8,
    /// Extension byte (e.g. a timer value), only sent with an extended command.
    pub command_ext: u8,
    /// Additive checksum over all preceding bytes.
    pub checksum: u8,
}

impl Fs20Packet {
    /// Creates a packet with a matching checksum.
    pub fn new(house_code_hi: u8, house_code_lo: u8, address: u8, command: u8, command_ext: u8) -> Self {
        let mut packet = Self {
            house_code_hi,
            house_code_lo,
            address,
            command,
            command_ext,
            checksum: 0,
        };
        packet.checksum = packet.expected_checksum();
        packet
    }

    /// Whether the command announces an extension byte.
    pub fn has_command_ext(&self) -> bool {
        self.command & FS20_COMMAND_EXT_FLAG != 0
    }

    /// Checksum the packet should carry.
    pub fn expected_checksum(&self) -> u8 {
        let sum = FS20_CHECKSUM_SEED
            .wrapping_add(self.house_code_hi)
            .wrapping_add(self.house_code_lo)
            .wrapping_add(self.address)
            .wrapping_add(self.command);
        if self.has_command_ext() {
            sum.wrapping_add(self.command_ext)
        } else {
            sum
        }
    }

    /// Whether the carried checksum matches the content.
    pub fn is_checksum_correct(&self) -> bool {
        self.checksum == self.expected_checksum()
    }

    /// Number of bytes on the air.
    pub fn wire_len(&self) -> usize {
        if self.has_command_ext() {
            FS20_PACKET_MAX_LEN
        } else {
            FS20_PACKET_LEN
        }
    }

    /// The bytes sent on the air, checksum last.
    pub fn to_bytes(&self) -> heapless::Vec<u8, FS20_PACKET_MAX_LEN> {
        let mut raw = [
            self.house_code_hi,
            self.house_code_lo,
            self.address,
            self.command,
            self.command_ext,
            self.checksum,
        ];
        if !self.has_command_ext() {
            raw[4] = self.checksum;
        }
        raw.into_iter().take(self.wire_len()).collect()
    }

    /// Parses the bytes of a packet. The checksum is not verified.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        codec::decode(&mut SliceSource::new(bytes))
    }
}

impl Message for Fs20Packet {
    const DESCRIPTOR: Descriptor<Self> = Descriptor {
        layout: Layout::Sequence,
        fields: &[
            crate::binary!(Fs20Packet, house_code_hi: u8),
            crate::binary!(Fs20Packet, house_code_lo: u8),
            crate::binary!(Fs20Packet, address: u8),
            crate::binary!(Fs20Packet, command: u8),
            crate::conditional!(
                Fs20Packet,
                Fs20Packet::has_command_ext,
                crate::binary!(Fs20Packet, command_ext: u8)
            ),
            crate::binary!(Fs20Packet, checksum: u8),
        ],
    };
}
