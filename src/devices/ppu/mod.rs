mod ppu;
mod structs;
mod utils;

pub use ppu::*;
pub use structs::*;
