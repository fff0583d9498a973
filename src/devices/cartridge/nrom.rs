//! Mapper 0 (§4.5): fixed PRG mapping, 8 KiB CHR ROM.

use super::ines::{INesHeader, Mirroring};
use super::utils::ICartridge;
use crate::devices::bus::BusPeekResult;

pub struct NROMCartridge {
    chr: Vec<u8>,
    prg: Vec<u8>,
    mirroring: Mirroring,
    /// True when the ROM carries a single 16 KiB PRG bank, which mirrors
    /// into both halves of the $8000-$FFFF window.
    is_16k: bool,
}

impl NROMCartridge {
    pub fn new(header: INesHeader, buf: &[u8]) -> NROMCartridge {
        let prg_start = header.prg_offset();
        let prg_end = prg_start + header.prg_len();
        let chr_start = header.chr_offset();
        let chr_end = chr_start + header.chr_len();

        NROMCartridge {
            prg: Vec::from(&buf[prg_start..prg_end]),
            chr: Vec::from(&buf[chr_start..chr_end]),
            mirroring: header.mirroring(),
            is_16k: header.prg_size == 1,
        }
    }
}

impl ICartridge for NROMCartridge {
    fn read_chr(&mut self, addr: u16, last_bus_value: u8) -> u8 {
        self.peek_chr(addr).unwrap(last_bus_value)
    }

    fn peek_chr(&self, addr: u16) -> BusPeekResult {
        BusPeekResult::Result(self.chr[(addr as usize) % self.chr.len()])
    }

    fn write_chr(&mut self, _addr: u16, _value: u8) {
        // no-op: NROM's CHR is ROM.
    }

    fn read_prg(&mut self, addr: u16, last_bus_value: u8) -> u8 {
        self.peek_prg(addr).unwrap(last_bus_value)
    }

    fn peek_prg(&self, addr: u16) -> BusPeekResult {
        // `addr` arrives in local cartridge-space ($4020-$FFFF mapped down
        // to 0x0000-0xDFDF); NROM's PRG window starts at global $8000,
        // i.e. local 0x3FE0.
        const NROM_OFFSET: u16 = 0x3FE0;
        let idx = if self.is_16k {
            (addr.wrapping_sub(NROM_OFFSET)) & 0x3FFF
        } else {
            addr.wrapping_sub(NROM_OFFSET)
        };
        BusPeekResult::Result(self.prg[idx as usize])
    }

    fn write_prg(&mut self, _addr: u16, _value: u8) {
        // no-op: NROM PRG is read-only.
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn reset(&mut self) {
        // NROM has no bank-select state to reset.
    }

    fn dump_chr(&self) -> &[u8] {
        &self.chr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_rom() -> NROMCartridge {
        let mut buf = vec![0u8; 16];
        buf[0..4].copy_from_slice(b"NES\x1A");
        buf[4] = 1; // 1 PRG bank
        buf[5] = 1; // 1 CHR bank
        let mut prg = vec![0u8; 0x4000];
        prg[0x3FFC] = 0x4C; // byte at global $C000
        prg[0x3FFF] = 0xC5; // byte at global $FFFF (mirror of $BFFF)
        buf.extend(prg);
        let mut chr = vec![0u8; 0x2000];
        chr[0x0020] = 0x80;
        buf.extend(chr);
        let header = super::super::ines::parse_ines_header(&buf).unwrap();
        NROMCartridge::new(header, &buf)
    }

    // local cartridge addresses are global minus $4020
    const GLOBAL_ADDR_OFFSET: u16 = 0x4020;

    #[test]
    fn maps_prg_reads_at_c000() {
        let cart = make_rom();
        let data = cart.peek_prg(0xC000 - GLOBAL_ADDR_OFFSET).unwrap(0);
        assert_eq!(data, 0x4C);
    }

    #[test]
    fn mirrors_16k_prg_into_upper_half() {
        let cart = make_rom();
        let left = cart.peek_prg(0xBFFF - GLOBAL_ADDR_OFFSET).unwrap(0);
        let right = cart.peek_prg(0xFFFF - GLOBAL_ADDR_OFFSET).unwrap(0);
        assert_eq!(left, 0xC5);
        assert_eq!(left, right, "16k PRG should mirror into the upper half");
    }

    #[test]
    fn reads_chr_rom() {
        let cart = make_rom();
        assert_eq!(cart.peek_chr(0x0020).unwrap(0), 0x80);
    }

    #[test]
    fn prg_writes_are_ignored() {
        let mut cart = make_rom();
        cart.write_prg(0xC000 - GLOBAL_ADDR_OFFSET, 0xFF);
        assert_eq!(cart.peek_prg(0xC000 - GLOBAL_ADDR_OFFSET).unwrap(0), 0x4C);
    }
}
