/// Declares a static FS20 decoder slot protected by a `critical_section` mutex.
///
/// # Arguments
/// - `$name`: name of the static
/// - `$size`: FIFO capacity in bytes
///
/// # Example
/// ```rust
/// rfnode::init_fs20_decoder!(FS20, 32);
/// ```
#[macro_export]
macro_rules! init_fs20_decoder {
    ( $name:ident, $size:expr ) => {
        pub static $name: $crate::isr::Shared<$crate::fs20::Fs20Decoder<{ $size }>> =
            $crate::isr::global_init();
    };
}

/// Fills a slot declared with [`init_fs20_decoder!`](crate::init_fs20_decoder).
///
/// # Arguments
/// - `$name`: the static
/// - `$timing`: a [`PulseTiming`](crate::pulse::PulseTiming) matching the capture timer
#[macro_export]
macro_rules! setup_fs20_decoder {
    ( $name:ident, $timing:expr ) => {
        $crate::isr::global_setup(&$name, $crate::fs20::Fs20Decoder::new($timing))
    };
}

/// Feeds one pulse to the decoder in `$name`.
///
/// Does nothing if the slot has not been set up yet.
///
/// # Example
/// ```rust
/// # use rfnode::pulse::{PulseEvent, PulseTiming};
/// rfnode::init_fs20_decoder!(FS20, 32);
///
/// rfnode::setup_fs20_decoder!(FS20, PulseTiming::from_clock(16_000_000, 64));
/// // from the capture interrupt
/// rfnode::fs20_pulse!(FS20, PulseEvent::new(true, 100));
/// ```
#[macro_export]
macro_rules! fs20_pulse {
    ( $name:ident, $event:expr ) => {
        $crate::isr::global_fs20_pulse(&$name, $event)
    };
}

/// Declares a static JeeLib receiver slot protected by a `critical_section` mutex.
///
/// # Arguments
/// - `$name`: name of the static
/// - `$size`: FIFO capacity in bytes
#[macro_export]
macro_rules! init_jeelib_receiver {
    ( $name:ident, $size:expr ) => {
        pub static $name: $crate::isr::Shared<$crate::jeelib::JeeLibReceiver<{ $size }>> =
            $crate::isr::global_init();
    };
}

/// Fills a slot declared with [`init_jeelib_receiver!`](crate::init_jeelib_receiver).
///
/// # Arguments
/// - `$name`: the static
/// - `$group`: the JeeLib group id
#[macro_export]
macro_rules! setup_jeelib_receiver {
    ( $name:ident, $group:expr ) => {
        $crate::isr::global_setup(&$name, $crate::jeelib::JeeLibReceiver::new($group))
    };
}

/// Feeds one byte from the radio to the receiver in `$name`.
///
/// With `start` the byte opens a new frame.
///
/// # Example
/// ```rust
/// rfnode::init_jeelib_receiver!(RFM12, 64);
///
/// rfnode::setup_jeelib_receiver!(RFM12, 5);
/// // from the RFM12 interrupt
/// rfnode::jeelib_byte!(RFM12, start 0x2a);
/// rfnode::jeelib_byte!(RFM12, 3);
/// ```
#[macro_export]
macro_rules! jeelib_byte {
    ( $name:ident, start $byte:expr ) => {
        $crate::isr::global_jeelib_start(&$name, $byte)
    };
    ( $name:ident, $byte:expr ) => {
        $crate::isr::global_jeelib_byte(&$name, $byte)
    };
}

#[cfg(test)]
mod tests {
    use crate::fs20::{Fs20Packet, PulseTrain};
    use crate::isr::{global_fs20_take, global_jeelib_take};
    use crate::jeelib::encode_frame;
    use crate::pulse::{PulseEvent, PulseTiming};

    crate::init_fs20_decoder!(TEST_FS20, 16);
    crate::init_jeelib_receiver!(TEST_RFM12, 16);

    #[test]
    fn test_fs20_macros() {
        crate::setup_fs20_decoder!(TEST_FS20, PulseTiming::MICROSECONDS);
        let packet = Fs20Packet::new(9, 8, 7, 6, 0);
        for pulse in PulseTrain::new(&packet, PulseTiming::MICROSECONDS) {
            crate::fs20_pulse!(TEST_FS20, pulse);
        }
        crate::fs20_pulse!(TEST_FS20, PulseEvent::empty());
        assert_eq!(global_fs20_take(&TEST_FS20).unwrap(), packet);
    }

    #[test]
    fn test_jeelib_macros() {
        crate::setup_jeelib_receiver!(TEST_RFM12, 212);
        let mut air: heapless::Vec<u8, 16> = heapless::Vec::new();
        let _ = encode_frame(212, 0x2a, &[1, 2], &mut air).unwrap();

        crate::jeelib_byte!(TEST_RFM12, start air[0]);
        for b in &air[1..] {
            crate::jeelib_byte!(TEST_RFM12, *b);
        }
        let frame: heapless::Vec<u8, 8> = global_jeelib_take(&TEST_RFM12).unwrap();
        assert_eq!(frame, [0x2a, 1, 2]);
    }
}
