//! Tunable constants and small configuration objects.
//!
//! This core has no file- or environment-based configuration layer: the
//! host front-end owns that surface. What's here are the handful of values
//! the spec calls out as configuration constants rather than protocol facts.

/// Nominal CPU clock rate in Hz. Real hardware runs at ~1.79 MHz (NTSC);
/// this core is configured nominally at 2 MHz per the driving specification.
pub const DEFAULT_CYCLE_RATE: u64 = 2_000_000;

/// Nanoseconds in one second, used to convert the cycle rate into a period.
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Default palette row used by the debug palette-strip getter.
pub const DEFAULT_DEBUG_PALETTE_ID: u8 = 0;

/// Configuration for the clock driver.
///
/// Constructed once at startup (or per-test, to run the CPU/PPU at a
/// different ratio than production without touching the production
/// constants).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockConfig {
    /// CPU cycles per second.
    pub cycle_rate: u64,
}

impl ClockConfig {
    pub const fn new(cycle_rate: u64) -> Self {
        ClockConfig { cycle_rate }
    }

    /// Nanoseconds per CPU cycle at this rate.
    pub fn period_ns(&self) -> u64 {
        NANOS_PER_SEC / self.cycle_rate
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig::new(DEFAULT_CYCLE_RATE)
    }
}
