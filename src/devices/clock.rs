//! Clock driver (§4.1): converts elapsed wall-time into CPU/PPU cycles.

use crate::config::ClockConfig;

use super::cpu::WithCpu;
use super::ppu::WithPpu;
use super::{cartridge::WithCartridge, cpu, ppu};
use crate::devices::bus::Motherboard;

/// Drives the CPU and PPU from elapsed wall-clock nanoseconds.
///
/// `tick` never runs a partial CPU cycle: leftover nanoseconds remain in the
/// accumulator for the next call. For any single batch the CPU is always
/// advanced strictly before the PPU, at a fixed 1:3 ratio.
pub struct Clock {
    config: ClockConfig,
    accumulator_ns: u64,
}

impl Clock {
    pub fn new(config: ClockConfig) -> Clock {
        Clock {
            config,
            accumulator_ns: 0,
        }
    }

    pub fn config(&self) -> ClockConfig {
        self.config
    }

    /// Advance by `elapsed_ns` nanoseconds of wall-clock time.
    ///
    /// Returns the number of whole CPU cycles dispatched.
    pub fn tick<T>(&mut self, mb: &mut T, elapsed_ns: i64) -> u64
    where
        T: WithCpu + WithPpu + WithCartridge + Motherboard,
    {
        let elapsed_ns = elapsed_ns.max(0) as u64;
        self.accumulator_ns = self.accumulator_ns.saturating_add(elapsed_ns);

        let period = self.config.period_ns().max(1);
        let cpu_cycles = self.accumulator_ns / period;
        self.accumulator_ns %= period;

        if cpu_cycles == 0 {
            return 0;
        }

        cpu::tick(mb, cpu_cycles as u32);
        ppu::clock_cycles(mb, (cpu_cycles * 3) as u32);

        cpu_cycles
    }
}

impl Default for Clock {
    fn default() -> Self {
        Clock::new(ClockConfig::default())
    }
}
