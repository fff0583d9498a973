//! Helpers for parsing iNES ROM files (§3, §6).

use std::fmt;

/// Mirroring mode for the PPU's 2 KiB physical nametable VRAM (§4.4).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
}

/// A fatal problem with a ROM image, surfaced to the host as
/// `LoadRomResult { valid: false, .. }` (§6, §7).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RomError {
    /// The first four bytes weren't "NES\x1A".
    BadSignature,
    /// `flags_7` claims NES 2.0 framing, which this core doesn't parse (§1 non-goal).
    Nes20NotSupported,
    /// The buffer is shorter than the header plus the PRG/CHR/trainer it declares.
    UnexpectedEof,
    /// `mapper` isn't one this core implements (§1 non-goal: only 0 and 2).
    UnsupportedMapper(u8),
}

impl fmt::Display for RomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RomError::BadSignature => write!(f, "not an iNES ROM: missing \"NES\\x1A\" signature"),
            RomError::Nes20NotSupported => write!(f, "NES 2.0 headers are not supported"),
            RomError::UnexpectedEof => write!(f, "ROM buffer is shorter than its header declares"),
            RomError::UnsupportedMapper(id) => write!(f, "unsupported mapper id {}", id),
        }
    }
}

const INES_SIGNATURE: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A]; // "NES\x1A"
pub const HEADER_SIZE: usize = 16;
pub const TRAINER_SIZE: usize = 512;
pub const PRG_BANK_SIZE: usize = 0x4000;
pub const CHR_BANK_SIZE: usize = 0x2000;

/// Interface for an iNES header
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct INesHeader {
    /// The size of the PRG chunk, in 16k chunks. Will not be 0.
    pub prg_size: usize,
    /// The size of the CHR chunk, in 8k chunks. Will not be 0.
    pub chr_size: usize,
    // TODO: Flag support
    /// Mapper, mirroring, battery, trainer
    pub flags_6: INesFlags6,
    /// Mapper, VS/PlayChoice, NES 2.0 indicator
    pub flags_7: INesFlags7,
    /// PRG-RAM size, rarely used.
    pub flags_8: u8,
    /// NTSC/PAL, rarely used
    pub flags_9: u8,
    /// NTSC/PAL (again?!?), PRG-RAM (again!?!), also rarely used
    pub flags_10: u8,
}

impl INesHeader {
    /// `(flags_7 & 0xF0) | (flags_6 >> 4)` per §3.
    pub fn mapper_id(&self) -> u8 {
        (self.flags_7.bits() & INesFlags7::UPPER_MAPPER_NIBBLE.bits())
            | (self.flags_6.bits() >> 4)
    }

    pub fn mirroring(&self) -> Mirroring {
        if self.flags_6.contains(INesFlags6::USE_FOUR_SCREEN_VRAM) {
            Mirroring::FourScreen
        } else if self.flags_6.contains(INesFlags6::MIRRORING) {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        }
    }

    pub fn has_trainer(&self) -> bool {
        self.flags_6.contains(INesFlags6::HAS_TRAINER)
    }

    /// Offset of the PRG chunk into the ROM buffer, past the header and any trainer.
    pub fn prg_offset(&self) -> usize {
        HEADER_SIZE + if self.has_trainer() { TRAINER_SIZE } else { 0 }
    }

    pub fn prg_len(&self) -> usize {
        self.prg_size * PRG_BANK_SIZE
    }

    pub fn chr_offset(&self) -> usize {
        self.prg_offset() + self.prg_len()
    }

    pub fn chr_len(&self) -> usize {
        self.chr_size * CHR_BANK_SIZE
    }
}

/** Given the first 16 bytes, parse out an iNES header (§3, §6). */
pub fn parse_ines_header(bytes: &[u8]) -> Result<INesHeader, RomError> {
    if bytes.len() < HEADER_SIZE || bytes[0..4] != INES_SIGNATURE {
        return Err(RomError::BadSignature);
    }
    let flags_7 = INesFlags7::from_bits_truncate(bytes[7]);
    if flags_7.contains(INesFlags7::IS_INES_2_0) {
        return Err(RomError::Nes20NotSupported);
    }
    let header = INesHeader {
        // A PRG/CHR size of 0 is not valid per the iNES spec; some very old
        // dumps use it to mean "1 bank" anyway, so this core is lenient here.
        prg_size: if bytes[4] == 0 { 1 } else { bytes[4] as usize },
        chr_size: if bytes[5] == 0 { 1 } else { bytes[5] as usize },
        flags_6: INesFlags6::from_bits_truncate(bytes[6]),
        flags_7,
        flags_8: bytes[8],
        flags_9: bytes[9],
        flags_10: bytes[10],
    };
    let needed = header.chr_offset() + header.chr_len();
    if bytes.len() < needed {
        return Err(RomError::UnexpectedEof);
    }
    Ok(header)
}

bitflags! {
    pub struct INesFlags6: u8 {
        /** The mirroring mode.
         *
         * If 0, use horizontal (vertical arrangement) mirroring
         * If 1, use vertical (horizontal arrangement) mirroring.
         *
         * Note that some mappers (like MMC3) ignore this setting, and it only
         * applies to cartridges where the mirroring is set in hardware (such as
         * NROM).
         */
        const MIRRORING = 0x01;
        /** Whether this rom contains a battery-backed RAM */
        const HAS_PERSISTENT_MEMORY = 0x02;
        /** Whether this ROM contains a 512-bit trainer program.
         *
         * Note: This emulator does not support trainers
         */
        const HAS_TRAINER = 0x04;
        /** Whether to use 4-screen VRAM instead of mirroring */
        const USE_FOUR_SCREEN_VRAM = 0x08;
        /** The lower nibble of the iNES mapper number */
        const LOWER_MAPPER_NIBBLE = 0xF0;
    }
}

bitflags! {
    pub struct INesFlags7: u8 {
        /** Whether this ROM was developed for the VS arcade */
        const VS_UNISYSTEM_ROM = 0x01;
        /** Whether this ROM was developed for the PlayChoice arcade.
         *
         * Note that this is rarely seen in the wild, but the presense of this bit
         * indicates that 8kb of hint screen data is included at the end of the
         * CHR section
         */
        const PLAYCHOICE_10 = 0x02;
        /** If equal to 10, the rest of this ROM's headers are in iNES 2.0 format. */
        const IS_INES_2_0 = 0x0C;
        /** The upper nibble of the iNES mapper number */
        const UPPER_MAPPER_NIBBLE = 0xF0;
    }
}

// todo: implement other flags as needed

#[cfg(test)]
mod tests {
    use super::*;

    fn rom_with(prg_banks: u8, chr_banks: u8, flags_6: u8, flags_7: u8) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&INES_SIGNATURE);
        buf[4] = prg_banks;
        buf[5] = chr_banks;
        buf[6] = flags_6;
        buf[7] = flags_7;
        buf.extend(vec![0u8; prg_banks as usize * PRG_BANK_SIZE]);
        buf.extend(vec![0u8; chr_banks as usize * CHR_BANK_SIZE]);
        buf
    }

    #[test]
    fn should_parse_header() {
        let buf = rom_with(1, 1, 0x02, 0x03);
        let header = parse_ines_header(&buf).expect("valid header");
        assert_eq!(header.prg_size, 1, "PRG size mismatch");
        assert_eq!(header.chr_size, 1, "CHR size mismatch");
        assert_eq!(header.flags_6.bits(), 2, "Flags6 mismatch");
        assert_eq!(header.flags_7.bits(), 3, "Flags7 mismatch");
    }

    #[test]
    fn rejects_bad_signature() {
        let mut buf = rom_with(1, 1, 0, 0);
        buf[0] = b'X';
        assert_eq!(parse_ines_header(&buf), Err(RomError::BadSignature));
    }

    #[test]
    fn rejects_nes_2_0() {
        let buf = rom_with(1, 1, 0, 0x0C);
        assert_eq!(parse_ines_header(&buf), Err(RomError::Nes20NotSupported));
    }

    #[test]
    fn rejects_truncated_rom() {
        let mut buf = rom_with(2, 1, 0, 0);
        buf.truncate(HEADER_SIZE + PRG_BANK_SIZE);
        assert_eq!(parse_ines_header(&buf), Err(RomError::UnexpectedEof));
    }

    #[test]
    fn computes_mapper_id() {
        // mapper 2 (UxROM): low nibble in flags_6 bits 4-7, high nibble in flags_7 bits 4-7
        let header = parse_ines_header(&rom_with(1, 1, 0x20, 0x00)).unwrap();
        assert_eq!(header.mapper_id(), 2);
    }

    #[test]
    fn horizontal_mirroring_by_default() {
        let header = parse_ines_header(&rom_with(1, 1, 0x00, 0x00)).unwrap();
        assert_eq!(header.mirroring(), Mirroring::Horizontal);
    }

    #[test]
    fn vertical_mirroring_bit() {
        let header = parse_ines_header(&rom_with(1, 1, 0x01, 0x00)).unwrap();
        assert_eq!(header.mirroring(), Mirroring::Vertical);
    }

    #[test]
    fn four_screen_overrides_mirroring_bit() {
        let header = parse_ines_header(&rom_with(1, 1, 0x09, 0x00)).unwrap();
        assert_eq!(header.mirroring(), Mirroring::FourScreen);
    }
}
