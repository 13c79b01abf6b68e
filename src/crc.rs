//! CRC16 as used by the RFM12 JeeLib radio driver.
//!
//! The polynomial is the reflected `0xA001` form with a `0xFFFF` seed and no
//! final XOR. Senders append the CRC low byte first, so folding a complete
//! frame including its CRC leaves a residue of zero.

/// Running CRC16 accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Crc16 {
    value: u16,
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc16 {
    /// Creates an accumulator holding the seed value.
    pub const fn new() -> Self {
        Self { value: 0xffff }
    }

    /// Restores the seed value.
    pub fn reset(&mut self) {
        self.value = 0xffff;
    }

    /// Folds one byte into the CRC.
    pub fn append(&mut self, byte: u8) {
        self.value = crc16_update(self.value, byte);
    }

    /// Current CRC value.
    pub fn value(&self) -> u16 {
        self.value
    }

    /// Whether the folded bytes (including a trailing CRC) check out.
    pub fn is_valid(&self) -> bool {
        self.value == 0
    }
}

pub(crate) fn crc16_update(crc: u16, data: u8) -> u16 {
    let mut crc = crc ^ u16::from(data);
    for _ in 0..8 {
        crc = if crc & 1 != 0 {
            (crc >> 1) ^ 0xa001
        } else {
            crc >> 1
        };
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc16_matches_reference_value() {
        // CRC-16/MODBUS check value for "123456789"
        let mut crc = Crc16::new();
        for b in b"123456789" {
            crc.append(*b);
        }
        assert_eq!(crc.value(), 0x4b37);
    }

    #[test]
    fn test_crc16_residue_is_zero_after_appending_crc() {
        let mut crc = Crc16::new();
        for b in [5u8, 42, 3, 1, 2, 3] {
            crc.append(b);
        }
        let value = crc.value();
        crc.append((value & 0xff) as u8);
        crc.append((value >> 8) as u8);
        assert!(crc.is_valid());
    }

    #[test]
    fn test_crc16_reset() {
        let mut crc = Crc16::new();
        crc.append(0x12);
        crc.reset();
        assert_eq!(crc, Crc16::default());
    }
}
