//! Sharing decoders between interrupt handlers and the main loop.
//!
//! The decoders are plain `&mut self` state machines. To feed them from an
//! interrupt and drain them from the main loop, park the instance in a
//! [`Shared`] static and go through the helpers below: each one runs inside
//! `critical_section::with`, so interrupts are held off for exactly one
//! pulse, one byte or one frame copy.
//!
//! ```rust
//! use rfnode::fs20::Fs20Decoder;
//! use rfnode::isr::{Shared, global_fs20_pulse, global_fs20_take, global_init, global_setup};
//! use rfnode::pulse::{PulseEvent, PulseTiming};
//!
//! static DECODER: Shared<Fs20Decoder<32>> = global_init();
//!
//! // main(), before enabling interrupts
//! global_setup(&DECODER, Fs20Decoder::new(PulseTiming::from_clock(16_000_000, 64)));
//!
//! // pin change interrupt
//! global_fs20_pulse(&DECODER, PulseEvent::new(true, 100));
//!
//! // main loop
//! assert!(global_fs20_take(&DECODER).is_err());
//! ```
//!
//! The `init_*` / `setup_*` macros wrap the same calls for a named static.

use core::cell::RefCell;
use critical_section::Mutex;

use crate::error::Error;
use crate::fs20::{Fs20Decoder, Fs20Packet};
use crate::jeelib::JeeLibReceiver;
use crate::pulse::PulseEvent;

mod macros;

/// A decoder parked in a static, reachable from interrupts.
pub type Shared<T> = Mutex<RefCell<Option<T>>>;

/// Used to initialize a [`Shared`] static. The slot starts out empty.
///
/// # Returns
/// * An empty mutable ref-cell
pub const fn global_init<T>() -> Shared<T> {
    Mutex::new(RefCell::new(None))
}

/// Puts `value` into the shared slot, replacing what was there.
///
/// Call from `main()` before the interrupts that use the slot are enabled.
pub fn global_setup<T>(global: &'static Shared<T>, value: T) {
    critical_section::with(|cs| {
        let _ = global.borrow(cs).replace(Some(value));
    });
}

/// Runs `f` on the shared value inside a critical section.
///
/// # Returns
/// `None` if the slot has not been set up yet.
pub fn global_with<T, R>(global: &'static Shared<T>, f: impl FnOnce(&mut T) -> R) -> Option<R> {
    critical_section::with(|cs| global.borrow(cs).borrow_mut().as_mut().map(f))
}

/// Feeds a pulse to a shared FS20 decoder. Call from the edge-capture interrupt.
pub fn global_fs20_pulse<const N: usize>(global: &'static Shared<Fs20Decoder<N>>, event: PulseEvent) {
    let _ = global_with(global, |decoder| decoder.apply(event));
}

/// Takes the oldest packet out of a shared FS20 decoder.
///
/// Only the copy of the raw bytes runs inside the critical section.
///
/// # Returns
/// `Err(nb::Error::WouldBlock)` while no packet is ready or the decoder is not set up.
pub fn global_fs20_take<const N: usize>(
    global: &'static Shared<Fs20Decoder<N>>,
) -> nb::Result<Fs20Packet, Error> {
    let Some(raw) = global_with(global, |decoder| decoder.pop_raw()).flatten() else {
        return Err(nb::Error::WouldBlock);
    };
    Fs20Packet::from_bytes(&raw).map_err(nb::Error::Other)
}

/// Starts a frame on a shared JeeLib receiver. Call when the radio signals sync.
pub fn global_jeelib_start<const N: usize>(global: &'static Shared<JeeLibReceiver<N>>, header: u8) {
    let _ = global_with(global, |rx| rx.write_start(header));
}

/// Feeds one received byte to a shared JeeLib receiver.
pub fn global_jeelib_byte<const N: usize>(global: &'static Shared<JeeLibReceiver<N>>, byte: u8) {
    let _ = global_with(global, |rx| rx.write(byte));
}

/// Drops the frame in progress, e.g. when the radio reports a lost carrier.
pub fn global_jeelib_abort<const N: usize>(global: &'static Shared<JeeLibReceiver<N>>) {
    let _ = global_with(global, |rx| rx.write_abort());
}

/// Copies the oldest frame out of a shared JeeLib receiver.
///
/// Only the copy runs inside the critical section, decode the returned bytes
/// afterwards.
pub fn global_jeelib_take<const N: usize, const M: usize>(
    global: &'static Shared<JeeLibReceiver<N>>,
) -> Option<heapless::Vec<u8, M>> {
    global_with(global, |rx| rx.pop_frame::<M>()).flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{SliceSource, decode};
    use crate::fs20::PulseTrain;
    use crate::jeelib::encode_message_frame;
    use crate::messages::{MEASUREMENT_HEADER, Measurement};
    use crate::pulse::PulseTiming;

    #[test]
    fn test_unset_slot_is_a_no_op() {
        static DECODER: Shared<Fs20Decoder<16>> = global_init();
        global_fs20_pulse(&DECODER, PulseEvent::new(true, 400));
        assert!(matches!(global_fs20_take(&DECODER), Err(nb::Error::WouldBlock)));
        assert_eq!(global_with(&DECODER, |d| d.rx_good), None);
    }

    #[test]
    fn test_fs20_through_shared_slot() {
        static DECODER: Shared<Fs20Decoder<32>> = global_init();
        let timing = PulseTiming::MICROSECONDS;
        global_setup(&DECODER, Fs20Decoder::new(timing));

        let packet = Fs20Packet::new(0x1b, 0xff, 2, 0x12, 0);
        for pulse in PulseTrain::new(&packet, timing) {
            global_fs20_pulse(&DECODER, pulse);
        }
        assert_eq!(global_with(&DECODER, |d| d.has_content()), Some(true));
        assert_eq!(global_fs20_take(&DECODER).unwrap(), packet);
        assert_eq!(global_with(&DECODER, |d| d.has_content()), Some(false));
        assert!(matches!(global_fs20_take(&DECODER), Err(nb::Error::WouldBlock)));

        let extended = Fs20Packet::new(0x1b, 0xff, 2, 0x32, 0x40);
        for pulse in PulseTrain::new(&extended, timing) {
            global_fs20_pulse(&DECODER, pulse);
        }
        assert_eq!(global_fs20_take(&DECODER).unwrap(), extended);
    }

    #[test]
    fn test_jeelib_through_shared_slot() {
        static RECEIVER: Shared<JeeLibReceiver<64>> = global_init();
        global_setup(&RECEIVER, JeeLibReceiver::default());

        let m = Measurement {
            has_soil: false,
            soil: 0,
            temp: 211,
            supply: 3_100,
            seq: 77,
            sender: Measurement::sender_id(b'O', 4),
        };
        let mut air: heapless::Vec<u8, 32> = heapless::Vec::new();
        let _ = encode_message_frame(5, MEASUREMENT_HEADER, &m, &mut air).unwrap();

        // a truncated frame first, then the real one
        global_jeelib_start(&RECEIVER, air[0]);
        global_jeelib_byte(&RECEIVER, air[1]);
        global_jeelib_abort(&RECEIVER);

        global_jeelib_start(&RECEIVER, air[0]);
        for b in &air[1..] {
            global_jeelib_byte(&RECEIVER, *b);
        }

        let frame: heapless::Vec<u8, 32> = global_jeelib_take(&RECEIVER).unwrap();
        assert_eq!(frame[0], MEASUREMENT_HEADER);
        let decoded: Measurement = decode(&mut SliceSource::new(&frame[1..])).unwrap();
        assert_eq!(decoded, m);
        assert!(global_jeelib_take::<64, 32>(&RECEIVER).is_none());
    }
}
