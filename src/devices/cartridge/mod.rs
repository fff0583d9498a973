mod ines;
mod nrom;
mod utils;
mod uxrom;

pub use ines::{INesHeader, Mirroring, RomError};
pub use utils::{ICartridge, WithCartridge};

/// Given a buffer to an iNES ROM, parse its header and construct the
/// mapper it names (§3, §6). Fails closed: an unparseable header or an
/// unsupported mapper id is a `RomError`, never a panic, since a bad ROM
/// is user-supplied input, not a programmer error.
pub fn from_rom(buf: &[u8]) -> Result<Box<dyn ICartridge>, RomError> {
    let header = ines::parse_ines_header(buf)?;
    let mapper = header.mapper_id();

    match mapper {
        0 => Ok(Box::new(nrom::NROMCartridge::new(header, buf))),
        2 => Ok(Box::new(uxrom::UxRomCartridge::new(header, buf))),
        _ => Err(RomError::UnsupportedMapper(mapper)),
    }
}
