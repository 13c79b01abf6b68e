use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::consts::FS20_REPEAT_GAP_US;
use crate::pulse::PulseTiming;

use super::{Fs20Packet, PulseTrain};

/// Bit-banged FS20 sender for an OOK transmitter such as the FS1000A.
///
/// `TX` keys the carrier: high is carrier on. Timing comes from a blocking
/// `DelayNs`, so interrupts that fire during a send stretch the pulses.
///
/// ```rust
/// # use embedded_hal_mock::eh1::delay::NoopDelay;
/// # use embedded_hal_mock::eh1::digital::{Mock as Pin, State as PinState, Transaction as PinTransaction};
/// use rfnode::fs20::{Fs20Packet, Fs20Transmitter};
///
/// # let mut expected = Vec::new();
/// # for _ in 0..12 + 1 + 5 * 9 + 1 {
/// #     expected.push(PinTransaction::set(PinState::High));
/// #     expected.push(PinTransaction::set(PinState::Low));
/// # }
/// # let pin = Pin::new(&expected);
/// let mut tx = Fs20Transmitter::new(pin, NoopDelay::new());
/// tx.send(&Fs20Packet::new(0x1b, 0xff, 0, 0x11, 0), 1).unwrap();
/// # let (mut pin, _) = tx.release();
/// # pin.done();
/// ```
#[derive(Debug)]
pub struct Fs20Transmitter<TX, D> {
    tx: TX,
    delay: D,
}

impl<TX: OutputPin, D: DelayNs> Fs20Transmitter<TX, D> {
    /// Wraps the transmitter pin and a delay source.
    pub fn new(tx: TX, delay: D) -> Self {
        Self { tx, delay }
    }

    /// Sends `packet` `repeats` times, pausing [`FS20_REPEAT_GAP_US`] in between.
    ///
    /// FS20 receivers usually act on a packet only after seeing it twice, so
    /// remotes send three copies.
    ///
    /// # Errors
    /// The first pin error aborts the send with the carrier state unknown.
    pub fn send(&mut self, packet: &Fs20Packet, repeats: u8) -> Result<(), TX::Error> {
        for i in 0..repeats {
            if i > 0 {
                self.delay.delay_us(FS20_REPEAT_GAP_US);
            }
            for pulse in PulseTrain::new(packet, PulseTiming::MICROSECONDS) {
                if pulse.is_high {
                    self.tx.set_high()?;
                } else {
                    self.tx.set_low()?;
                }
                self.delay.delay_us(u32::from(pulse.duration));
            }
        }
        debug!("fs20 packet sent {} times", repeats);
        Ok(())
    }

    /// Gives back the pin and the delay.
    pub fn release(self) -> (TX, D) {
        (self.tx, self.delay)
    }
}
