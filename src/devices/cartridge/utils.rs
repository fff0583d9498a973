use crate::devices::bus::BusPeekResult;

use super::ines::Mirroring;

/// Trait for a cartridge device (§4.5).
///
/// Cartridges are attached to _both_ the PPU and CPU address busses, and thus
/// can't really use the IBusDevice interface. `read_chr`/`write_chr` only
/// cover the pattern-table window (PPU $0000-$1FFF); the PPU owns its own
/// physical nametable VRAM and asks the cartridge only for the mirroring
/// mode used to map the logical 4KiB nametable space down into it.
pub trait ICartridge {
    fn read_chr(&mut self, addr: u16, last_bus_value: u8) -> u8;

    fn peek_chr(&self, addr: u16) -> BusPeekResult;

    fn write_chr(&mut self, addr: u16, value: u8);

    fn read_prg(&mut self, addr: u16, last_bus_value: u8) -> u8;

    fn peek_prg(&self, addr: u16) -> BusPeekResult;

    fn write_prg(&mut self, addr: u16, value: u8);

    /// Nametable mirroring mode wired into this cartridge's mapper.
    fn mirroring(&self) -> Mirroring;

    /// Resets mapper-internal bank-select state on a hardware reset. NROM
    /// has none; bank-switched mappers like UxROM reset to bank 0.
    fn reset(&mut self);

    fn dump_chr(&self) -> &[u8];
}

/// A trait for devices that own a Cartridge
pub trait WithCartridge {
    /// Get a reference to a cartridge
    fn cart(&self) -> &Box<dyn ICartridge>;

    /// Get a mutable reference to a cartridge
    fn cart_mut(&mut self) -> &mut Box<dyn ICartridge>;
}
