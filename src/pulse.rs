//! Pulse events delivered by the receiver's edge-capture interrupt.
//!
//! The hardware side measures how long the demodulated signal stayed high or
//! low and hands the duration over as a [`PulseEvent`] in timer counts. A
//! [`PulseTiming`] converts the protocol windows from microseconds into those
//! counts once, so the decoder only compares integers.
//!
//! Common AVR timer setups at 16 MHz:
//!
//! | PRESCALER | COUNTS / ms | Resolution |
//! |-----------|-------------|------------|
//! |         8 |        2000 |     0.5 µs |
//! |        64 |         250 |       4 µs |
//! |       256 |        62.5 |      16 µs |

use libm::roundf;

use crate::consts::{FS20_LONG_MAX_US, FS20_SHORT_MAX_US, FS20_SHORT_MIN_US};

/// One high or low period of the demodulated signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct PulseEvent {
    /// Level of the signal during the pulse.
    pub is_high: bool,
    /// Duration in timer counts. `0` marks a timeout or end of transmission.
    pub duration: u16,
}

impl PulseEvent {
    /// Creates a pulse of `duration` timer counts.
    pub const fn new(is_high: bool, duration: u16) -> Self {
        Self { is_high, duration }
    }

    /// The timeout / end-of-transmission marker.
    pub const fn empty() -> Self {
        Self {
            is_high: false,
            duration: 0,
        }
    }

    /// Whether this is a timeout marker rather than a real pulse.
    pub const fn is_empty(&self) -> bool {
        self.duration == 0
    }
}

/// FS20 half-bit windows expressed in timer counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct PulseTiming {
    counts_per_ms: u32,
    short_min: u32,
    short_max: u32,
    long_max: u32,
}

impl PulseTiming {
    /// Durations measured directly in microseconds.
    pub const MICROSECONDS: Self = Self::from_counts_per_ms(1_000);

    /// Builds the windows for a timer running at `counts_per_ms` counts per millisecond.
    pub const fn from_counts_per_ms(counts_per_ms: u32) -> Self {
        Self {
            counts_per_ms,
            short_min: us_to_counts(counts_per_ms, FS20_SHORT_MIN_US),
            short_max: us_to_counts(counts_per_ms, FS20_SHORT_MAX_US),
            long_max: us_to_counts(counts_per_ms, FS20_LONG_MAX_US),
        }
    }

    /// Builds the windows for a timer clocked from the CPU through a prescaler.
    ///
    /// # Arguments
    /// - `f_cpu`: CPU frequency in Hz
    /// - `prescaler`: timer prescaler (e.g., 8, 64, 256)
    ///
    /// # Panics
    /// If `prescaler` is zero. In a `const` or `static` initializer this is a
    /// compile error instead.
    pub const fn from_clock(f_cpu: u32, prescaler: u32) -> Self {
        Self::from_counts_per_ms(f_cpu / prescaler / 1_000)
    }

    /// Builds the windows for a timer with a period of `tick_us` microseconds per count.
    ///
    /// The count rate is rounded to the nearest whole count per millisecond and
    /// saturates for periods too short to count.
    pub fn from_tick_period(tick_us: f32) -> Self {
        Self::from_counts_per_ms(roundf(1_000.0 / tick_us) as u32)
    }

    /// Timer counts per millisecond.
    pub const fn counts_per_ms(&self) -> u32 {
        self.counts_per_ms
    }

    /// Converts a duration in microseconds into timer counts, saturating at `u32::MAX`.
    pub const fn us_to_ticks(&self, us: u32) -> u32 {
        us_to_counts(self.counts_per_ms, us)
    }

    /// Classifies a pulse duration.
    ///
    /// # Returns
    /// - `Some(false)` for a short (`0`) half-bit
    /// - `Some(true)` for a long (`1`) half-bit
    /// - `None` if the duration fits neither window
    pub fn classify(&self, ticks: u16) -> Option<bool> {
        let ticks = u32::from(ticks);
        if ticks >= self.short_min && ticks < self.short_max {
            Some(false)
        } else if ticks >= self.short_max && ticks <= self.long_max {
            Some(true)
        } else {
            None
        }
    }
}

const fn us_to_counts(counts_per_ms: u32, us: u32) -> u32 {
    let counts = counts_per_ms as u64 * us as u64 / 1_000;
    if counts > u32::MAX as u64 { u32::MAX } else { counts as u32 }
}
