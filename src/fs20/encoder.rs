use crate::consts::{FS20_ONE_US, FS20_PACKET_MAX_LEN, FS20_SYNC_ZEROS, FS20_ZERO_US};
use crate::pulse::{PulseEvent, PulseTiming};

use super::Fs20Packet;

/// The pulses that carry one [`Fs20Packet`] on the air.
///
/// The train is [`FS20_SYNC_ZEROS`] `0` bits, a `1` bit, every packet byte MSB
/// first followed by its even parity bit, and a final `0` bit. Each bit is a
/// high pulse followed by a low pulse of the same length.
#[derive(Debug, Clone)]
pub struct PulseTrain {
    bytes: heapless::Vec<u8, FS20_PACKET_MAX_LEN>,
    zero: u16,
    one: u16,
    pulse: usize,
}

impl PulseTrain {
    /// Builds the train for `packet` with durations in `timing` counts.
    pub fn new(packet: &Fs20Packet, timing: PulseTiming) -> Self {
        Self {
            bytes: packet.to_bytes(),
            zero: ticks(timing, FS20_ZERO_US),
            one: ticks(timing, FS20_ONE_US),
            pulse: 0,
        }
    }

    fn bit_count(&self) -> usize {
        usize::from(FS20_SYNC_ZEROS) + 1 + 9 * self.bytes.len() + 1
    }

    fn bit(&self, index: usize) -> bool {
        let sync = usize::from(FS20_SYNC_ZEROS);
        if index <= sync {
            return index == sync;
        }
        let index = index - sync - 1;
        let Some(byte) = self.bytes.get(index / 9) else {
            return false;
        };
        match index % 9 {
            8 => byte.count_ones() % 2 == 1,
            bit => byte & (0x80 >> bit) != 0,
        }
    }
}

fn ticks(timing: PulseTiming, us: u32) -> u16 {
    u16::try_from(timing.us_to_ticks(us)).unwrap_or(u16::MAX)
}

impl Iterator for PulseTrain {
    type Item = PulseEvent;

    fn next(&mut self) -> Option<PulseEvent> {
        let bit = self.pulse / 2;
        if bit >= self.bit_count() {
            return None;
        }
        let duration = if self.bit(bit) { self.one } else { self.zero };
        let event = PulseEvent::new(self.pulse % 2 == 0, duration);
        self.pulse += 1;
        Some(event)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.bit_count() * 2 - self.pulse;
        (left, Some(left))
    }
}

impl ExactSizeIterator for PulseTrain {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_layout() {
        let packet = Fs20Packet::new(0x80, 0, 0, 0, 0);
        let train = PulseTrain::new(&packet, PulseTiming::MICROSECONDS);
        assert_eq!(train.len(), 2 * (12 + 1 + 5 * 9 + 1));

        let bits: heapless::Vec<bool, 64> = train.step_by(2).map(|p| p.duration == 600).collect();
        assert!(bits[..12].iter().all(|b| !*b));
        assert!(bits[12]);
        // 0x80 then its parity bit
        assert_eq!(&bits[13..22], &[true, false, false, false, false, false, false, false, true]);
        // 0x00 has even parity
        assert_eq!(&bits[22..31], &[false; 9]);
        assert!(!bits[bits.len() - 1]);
    }

    #[test]
    fn test_pulses_alternate_levels() {
        let packet = Fs20Packet::new(1, 2, 3, 4, 0);
        let timing = PulseTiming::from_clock(16_000_000, 64);
        for (i, pulse) in PulseTrain::new(&packet, timing).enumerate() {
            assert_eq!(pulse.is_high, i % 2 == 0);
            assert!(pulse.duration == 100 || pulse.duration == 150);
        }
    }
}
