//! Mapper 2 (UxROM) (§4.5): switchable 16 KiB PRG bank + fixed last bank,
//! 8 KiB CHR-RAM. Used by Mega Man, Castlevania, Contra and many others.

use super::ines::{INesHeader, Mirroring};
use super::utils::ICartridge;
use crate::devices::bus::BusPeekResult;

const PRG_BANK_SIZE: usize = 0x4000;
const CHR_RAM_SIZE: usize = 0x2000;
/// Local cartridge address (global - $4020) where the PRG window starts.
const PRG_WINDOW_OFFSET: u16 = 0x3FE0;

pub struct UxRomCartridge {
    prg: Vec<u8>,
    chr_ram: Vec<u8>,
    prg_bank: u8,
    prg_banks: usize,
    mirroring: Mirroring,
}

impl UxRomCartridge {
    pub fn new(header: INesHeader, buf: &[u8]) -> UxRomCartridge {
        let prg_start = header.prg_offset();
        let prg_end = prg_start + header.prg_len();
        let prg = Vec::from(&buf[prg_start..prg_end]);
        let prg_banks = prg.len() / PRG_BANK_SIZE;

        UxRomCartridge {
            prg,
            chr_ram: vec![0; CHR_RAM_SIZE],
            prg_bank: 0,
            prg_banks,
            mirroring: header.mirroring(),
        }
    }

    fn map_prg_addr(&self, local_addr: u16) -> usize {
        let offset_from_8000 = local_addr.wrapping_sub(PRG_WINDOW_OFFSET) as usize;
        if offset_from_8000 < PRG_BANK_SIZE {
            let bank = (self.prg_bank as usize) % self.prg_banks;
            bank * PRG_BANK_SIZE + offset_from_8000
        } else {
            let last_bank = self.prg_banks - 1;
            last_bank * PRG_BANK_SIZE + (offset_from_8000 - PRG_BANK_SIZE)
        }
    }
}

impl ICartridge for UxRomCartridge {
    fn read_chr(&mut self, addr: u16, last_bus_value: u8) -> u8 {
        self.peek_chr(addr).unwrap(last_bus_value)
    }

    fn peek_chr(&self, addr: u16) -> BusPeekResult {
        BusPeekResult::Result(self.chr_ram[(addr as usize) % CHR_RAM_SIZE])
    }

    fn write_chr(&mut self, addr: u16, value: u8) {
        let idx = (addr as usize) % CHR_RAM_SIZE;
        self.chr_ram[idx] = value;
    }

    fn read_prg(&mut self, addr: u16, last_bus_value: u8) -> u8 {
        self.peek_prg(addr).unwrap(last_bus_value)
    }

    fn peek_prg(&self, addr: u16) -> BusPeekResult {
        BusPeekResult::Result(self.prg[self.map_prg_addr(addr)])
    }

    fn write_prg(&mut self, _addr: u16, value: u8) {
        // Any write into $8000-$FFFF selects the switchable bank.
        self.prg_bank = value;
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn reset(&mut self) {
        self.prg_bank = 0;
    }

    fn dump_chr(&self) -> &[u8] {
        &self.chr_ram
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_rom(banks: u8) -> UxRomCartridge {
        let mut buf = vec![0u8; 16];
        buf[0..4].copy_from_slice(b"NES\x1A");
        buf[4] = banks;
        buf[5] = 0; // CHR-RAM only
        let mut prg = vec![0u8; banks as usize * PRG_BANK_SIZE];
        for bank in 0..banks as usize {
            prg[bank * PRG_BANK_SIZE] = bank as u8;
        }
        buf.extend(prg);
        let header = super::super::ines::parse_ines_header(&buf).unwrap();
        UxRomCartridge::new(header, &buf)
    }

    const GLOBAL_ADDR_OFFSET: u16 = 0x4020;

    #[test]
    fn powers_on_at_bank_zero() {
        let cart = make_rom(4);
        let data = cart.peek_prg(0x8000 - GLOBAL_ADDR_OFFSET).unwrap(0xFF);
        assert_eq!(data, 0);
    }

    #[test]
    fn last_bank_is_fixed_at_c000() {
        let mut cart = make_rom(4);
        cart.write_prg(0x8000 - GLOBAL_ADDR_OFFSET, 1);
        let data = cart.peek_prg(0xC000 - GLOBAL_ADDR_OFFSET).unwrap(0xFF);
        assert_eq!(data, 3, "last bank (3) should always sit at $C000");
    }

    #[test]
    fn switches_low_bank_on_any_prg_write() {
        let mut cart = make_rom(4);
        cart.write_prg(0xFFFF - GLOBAL_ADDR_OFFSET, 2);
        let data = cart.peek_prg(0x8000 - GLOBAL_ADDR_OFFSET).unwrap(0xFF);
        assert_eq!(data, 2);
    }

    #[test]
    fn bank_select_wraps_modulo_bank_count() {
        let mut cart = make_rom(4);
        cart.write_prg(0x8000 - GLOBAL_ADDR_OFFSET, 4);
        let data = cart.peek_prg(0x8000 - GLOBAL_ADDR_OFFSET).unwrap(0xFF);
        assert_eq!(data, 0, "bank 4 of 4 banks should wrap to bank 0");
    }

    #[test]
    fn chr_ram_is_writable_and_independent_of_prg_bank() {
        let mut cart = make_rom(2);
        cart.write_chr(0x1000, 0xAB);
        cart.write_prg(0x8000 - GLOBAL_ADDR_OFFSET, 1);
        assert_eq!(cart.peek_chr(0x1000).unwrap(0), 0xAB);
    }

    #[test]
    fn reset_reselects_bank_zero() {
        let mut cart = make_rom(4);
        cart.write_prg(0x8000 - GLOBAL_ADDR_OFFSET, 3);
        cart.reset();
        let data = cart.peek_prg(0x8000 - GLOBAL_ADDR_OFFSET).unwrap(0xFF);
        assert_eq!(data, 0);
    }
}
