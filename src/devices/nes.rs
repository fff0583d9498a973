//! The NES motherboard: wires the CPU, PPU, cartridge, RAM, and joypads
//! together into one `Motherboard` and drives them from the clock (§4).

use log::{info, warn};

use super::bus::{cpu_memory_map, BusDevice, Motherboard};
use super::cartridge::{self, ICartridge, RomError, WithCartridge};
use super::clock::Clock;
use super::cpu::{self, Cpu6502, CpuTrap, WithCpu};
use super::joypad::{Joypad, JoypadButton};
use super::mem::Ram;
use super::ppu::{self, Ppu2C02, WithPpu};
use crate::bytes_to_addr;

const RAM_SIZE: usize = 0x800;

/// A struct representing the NES as a whole unit
pub struct Nes {
    cpu: Cpu6502,
    ppu: Ppu2C02,
    cart: Box<dyn ICartridge>,
    ram: Ram,
    joypad1: Joypad,
    joypad2: Joypad,
    clock: Clock,
    last_bus_value: u8,
    /// Cycles still owed to the CPU for an in-flight OAM DMA (§9).
    dma_cycles_remaining: u32,
}

impl Nes {
    pub fn new(cart: Box<dyn ICartridge>) -> Nes {
        let mut nes = Nes {
            cpu: Cpu6502::new(),
            ppu: Ppu2C02::new(),
            cart,
            ram: Ram::new(RAM_SIZE),
            joypad1: Joypad::new(),
            joypad2: Joypad::new(),
            clock: Clock::default(),
            last_bus_value: 0,
            dma_cycles_remaining: 0,
        };
        cpu::reset(&mut nes);
        nes
    }

    pub fn new_from_buf(buf: &[u8]) -> Result<Nes, RomError> {
        let cart = cartridge::from_rom(buf)?;
        Ok(Nes::new(cart))
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn new_from_file(path: &str) -> std::io::Result<Result<Nes, RomError>> {
        let buf = std::fs::read(path)?;
        Ok(Nes::new_from_buf(&buf))
    }

    /// Trigger a hardware reset. This is _not_ the same as stopping the
    /// emulator and reloading a ROM: memory and mapper bank state keep
    /// whatever the cartridge says a reset does (mappers keep PRG-RAM, for
    /// instance), only the CPU and PPU's internal sequencing resets.
    pub fn reset(&mut self) {
        cpu::reset(self);
        self.ppu.reset();
        self.cart.reset();
        self.dma_cycles_remaining = 0;
    }

    /// Advance the system by `elapsed_ns` nanoseconds of wall-clock time.
    /// While an OAM DMA is in flight the CPU is stalled (§9): elapsed time
    /// is spent paying down that debt instead of dispatching instructions.
    pub fn tick(&mut self, elapsed_ns: i64) {
        if self.dma_cycles_remaining > 0 {
            self.pay_down_dma(elapsed_ns);
            return;
        }
        let mut clock = std::mem::take(&mut self.clock);
        clock.tick(self, elapsed_ns);
        self.clock = clock;
    }

    fn pay_down_dma(&mut self, elapsed_ns: i64) {
        let period = self.clock.config().period_ns().max(1) as i64;
        let cycles = (elapsed_ns.max(0) / period) as u32;
        self.dma_cycles_remaining = self.dma_cycles_remaining.saturating_sub(cycles);
    }

    /// Run whole frames until the PPU completes one, or a watchdog trips on
    /// a stalled CPU (trap, runaway loop, etc) (§7).
    pub fn tick_frame(&mut self) {
        const WATCHDOG_TICKS: u32 = 1_000_000;
        let period = self.clock.config().period_ns() as i64;
        let mut spent = 0;
        while !self.ppu.is_frame_ready() && spent < WATCHDOG_TICKS {
            self.tick(period);
            spent += 1;
            if self.cpu.trap.is_some() {
                warn!("CPU trapped mid-frame: {:?}", self.cpu.trap);
                break;
            }
        }
    }

    /// Run the CPU for one full instruction, stepping the PPU in lockstep,
    /// and return its disassembly. For debugging and testing only; this
    /// does not model DMA stalls or wall-clock pacing.
    pub fn dbg_step_cpu(&mut self) -> String {
        let debug_str = cpu::debug(self);
        let cycles = self.cpu.cycles;
        ppu::clock_cycles(self, cycles * 3);
        debug_str
    }

    /// A read-only snapshot of CPU register state for host debug UIs (§6).
    /// Unlike `dbg_step_cpu`, this never executes anything.
    pub fn debug_cpu(&self) -> String {
        let s = &self.cpu.state;
        let trap = match self.cpu.trap {
            Some(trap) => format!(" TRAP:{:?}", trap),
            None => String::new(),
        };
        format!(
            "A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} PC:{:04X} CYC:{}{}",
            s.acc, s.x, s.y, s.status.bits(), s.stack, s.pc, s.tot_cycles, trap
        )
    }

    pub fn trap(&self) -> Option<CpuTrap> {
        self.cpu.trap
    }

    /// Consuming read: once a frame is observed as ready, the flag clears,
    /// matching `Ppu2C02::is_frame_ready`'s pulse-then-sticky semantics.
    pub fn is_frame_ready(&mut self) -> bool {
        self.ppu.is_frame_ready()
    }

    pub fn get_screen_framebuffer(&self) -> &[u8] {
        self.ppu.get_buffer()
    }

    pub fn set_debug_palette_id(&mut self, id: u8) {
        self.ppu.set_debug_palette_id(id);
    }

    pub fn get_tile_bank_debug(&self) -> &[u8] {
        self.ppu.tile_bank_debug()
    }

    pub fn get_palette_debug(&self) -> &[u8] {
        self.ppu.palette_debug()
    }

    pub fn get_nametable_debug(&self, index: usize) -> &[u8] {
        self.ppu.nametable_debug(index)
    }

    pub fn get_chr_debug(&self) -> &[u8] {
        self.cart.dump_chr()
    }

    /// `controller` is 0 or 1. Any other value is treated as controller 0.
    pub fn set_button(&mut self, controller: u8, button: JoypadButton, pressed: bool) {
        match controller {
            1 => self.joypad2.set_button(button, pressed),
            _ => self.joypad1.set_button(button, pressed),
        }
    }

    /// A $4014 write copies 256 bytes from `bank << 8` into OAM. On real
    /// hardware this halts the CPU for 513 cycles (514 on an odd CPU
    /// cycle); this core bills that cost against the next `tick` calls
    /// rather than interleaving it with further CPU dispatch (§9,
    /// resolution 3).
    fn run_oam_dma(&mut self, bank: u8) {
        let base = (bank as u16) << 8;
        for i in 0..=0xFFu16 {
            let byte = self.read(base + i);
            ppu::write_oam(self, i as u8, byte);
        }
        let odd_cycle = self.cpu.state.tot_cycles % 2 == 1;
        self.dma_cycles_remaining += if odd_cycle { 514 } else { 513 };
        info!("OAM DMA from page ${:02X}00", bank);
    }
}

impl WithCpu for Nes {
    fn cpu(&self) -> &Cpu6502 {
        &self.cpu
    }
    fn cpu_mut(&mut self) -> &mut Cpu6502 {
        &mut self.cpu
    }
}

impl WithPpu for Nes {
    fn ppu(&self) -> &Ppu2C02 {
        &self.ppu
    }
    fn ppu_mut(&mut self) -> &mut Ppu2C02 {
        &mut self.ppu
    }
}

impl WithCartridge for Nes {
    fn cart(&self) -> &Box<dyn ICartridge> {
        &self.cart
    }
    fn cart_mut(&mut self) -> &mut Box<dyn ICartridge> {
        &mut self.cart
    }
}

impl Motherboard for Nes {
    fn read(&mut self, addr: u16) -> u8 {
        let (device, local) = cpu_memory_map::match_addr(addr);
        let last = self.last_bus_value;
        let value = match device {
            cpu_memory_map::Device::RAM => self.ram.read(local, last),
            cpu_memory_map::Device::PpuRegister => ppu::register_read(self, local),
            cpu_memory_map::Device::OamDma => last,
            cpu_memory_map::Device::Joypad1 => self.joypad1.read(local, last),
            cpu_memory_map::Device::Joypad2 => self.joypad2.read(local, last),
            cpu_memory_map::Device::Cartridge => self.cart.read_prg(local, last),
            cpu_memory_map::Device::Unmapped => last,
        };
        self.last_bus_value = value;
        value
    }

    fn peek(&self, addr: u16) -> Option<u8> {
        let (device, local) = cpu_memory_map::match_addr(addr);
        match device {
            cpu_memory_map::Device::RAM => self.ram.peek(local).to_optional(),
            cpu_memory_map::Device::Cartridge => self.cart.peek_prg(local).to_optional(),
            _ => None,
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        let (device, local) = cpu_memory_map::match_addr(addr);
        self.last_bus_value = data;
        match device {
            cpu_memory_map::Device::RAM => self.ram.write(local, data),
            cpu_memory_map::Device::PpuRegister => ppu::register_write(self, local, data),
            cpu_memory_map::Device::OamDma => self.run_oam_dma(data),
            cpu_memory_map::Device::Joypad1 => {
                // The strobe line at $4016 is shared by both controllers.
                self.joypad1.write(local, data);
                self.joypad2.write(local, data);
            }
            cpu_memory_map::Device::Joypad2 => {}
            cpu_memory_map::Device::Cartridge => self.cart.write_prg(local, data),
            cpu_memory_map::Device::Unmapped => {}
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_nes() -> Nes {
        let mut buf = vec![0u8; 16];
        buf[0..4].copy_from_slice(b"NES\x1A");
        buf[4] = 2; // 2 PRG banks
        buf[5] = 1; // 1 CHR bank
        let mut prg = vec![0u8; 0x8000];
        // Reset vector -> $8000
        prg[0x7FFC] = 0x00;
        prg[0x7FFD] = 0x80;
        buf.extend(prg);
        buf.extend(vec![0u8; 0x2000]);
        Nes::new_from_buf(&buf).expect("valid rom")
    }

    #[test]
    fn resets_pc_from_reset_vector() {
        let nes = make_nes();
        assert_eq!(nes.cpu.state.pc, bytes_to_addr!(0x00u8, 0x80u8));
    }

    #[test]
    fn oam_dma_copies_page_into_oam_and_bills_cycles() {
        let mut nes = make_nes();
        nes.write(0x0000, 0xAB);
        nes.write(0x4014, 0x00);
        assert_eq!(nes.ppu.state.oam[0], 0xAB);
        assert!(nes.dma_cycles_remaining == 513 || nes.dma_cycles_remaining == 514);
    }

    #[test]
    fn ram_mirrors_every_0x800() {
        let mut nes = make_nes();
        nes.write(0x0010, 0x42);
        assert_eq!(nes.read(0x0810), 0x42);
        assert_eq!(nes.read(0x1810), 0x42);
    }

    /// A ROM that spins on `JMP $8000` forever, so the CPU never traps and
    /// `tick_frame`'s watchdog never has a reason to trip.
    fn make_spinning_nes() -> Nes {
        let mut buf = vec![0u8; 16];
        buf[0..4].copy_from_slice(b"NES\x1A");
        buf[4] = 2; // 2 PRG banks
        buf[5] = 1; // 1 CHR bank
        let mut prg = vec![0u8; 0x8000];
        prg[0x0000] = 0x4C; // JMP $8000
        prg[0x0001] = 0x00;
        prg[0x0002] = 0x80;
        prg[0x7FFC] = 0x00; // Reset vector -> $8000
        prg[0x7FFD] = 0x80;
        buf.extend(prg);
        buf.extend(vec![0u8; 0x2000]);
        Nes::new_from_buf(&buf).expect("valid rom")
    }

    #[test]
    fn tick_frame_completes_one_frame_per_call_not_three() {
        // Dots-per-frame (89342) isn't a multiple of 3 PPU-dots-per-CPU-cycle,
        // so a `frame_ready` pulse that gets cleared on every dot (instead of
        // staying set until consumed) is only visible to a per-batch poll on
        // every third frame. Guard against that regression by checking how
        // many CPU cycles a single `tick_frame` call actually burns: roughly
        // one frame's worth (~29781), not three (~89342).
        let mut nes = make_spinning_nes();
        let before = nes.cpu.state.tot_cycles;
        nes.tick_frame();
        let spent = nes.cpu.state.tot_cycles.wrapping_sub(before);
        assert!(nes.cpu.trap.is_none(), "watchdog or trap should never fire on a spin loop");
        assert!(
            spent < 40_000,
            "tick_frame should stop at the first completed frame (~29781 cycles), spent {}",
            spent
        );
        assert!(spent > 20_000, "tick_frame should run close to a full frame, spent {}", spent);

        // A second call should behave identically, not accumulate drift.
        let before2 = nes.cpu.state.tot_cycles;
        nes.tick_frame();
        let spent2 = nes.cpu.state.tot_cycles.wrapping_sub(before2);
        assert!(spent2 < 40_000, "second tick_frame call spent {}", spent2);
    }

    #[test]
    fn joypad_strobe_is_shared_by_both_controllers() {
        let mut nes = make_nes();
        nes.set_button(0, JoypadButton::A, true);
        nes.set_button(1, JoypadButton::B, true);
        nes.write(0x4016, 1);
        nes.write(0x4016, 0);
        assert_eq!(nes.read(0x4016) & 1, 1);
        assert_eq!(nes.read(0x4017) & 1, 1);
    }
}
