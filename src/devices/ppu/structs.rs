//! PPU register file, scanline/dot counters, framebuffers, and the system
//! palette (§3, §4.4).

/// Width/height of the primary framebuffer's backing allocation. The
/// visible picture is 256x240; the extra 16 rows keep the buffer a clean
/// square and give debug tooling slack, per the spec's "stored in a
/// 256x256 region" note.
pub const FRAME_WIDTH: usize = 256;
pub const FRAME_HEIGHT: usize = 240;
pub const FRAME_ALLOC_HEIGHT: usize = 256;
const BYTES_PER_PIXEL: usize = 4;

pub const TILE_BANK_DEBUG_WIDTH: usize = 256;
pub const TILE_BANK_DEBUG_HEIGHT: usize = 128;

pub const PALETTE_DEBUG_WIDTH: usize = 256;
pub const PALETTE_DEBUG_HEIGHT: usize = 16;

pub struct PpuState {
    //#region Loopy registers
    // Names follow Loopy's "The Skinny on NES Scrolling", which is also
    // where the nesdev wiki draws its terminology from.
    /// The 15-bit current VRAM address register.
    pub v: u16,
    /// The 15-bit temporary VRAM address register.
    pub t: u16,
    /// The 3-bit fine X scroll register.
    pub x: u8,
    /// The shared write latch for PPUSCROLL/PPUADDR.
    pub w: bool,
    //#endregion

    //#region PPU control registers, as exposed to the CPU bus
    pub control: u8,
    pub mask: u8,
    pub status: u8,
    //#endregion

    //#region OAM
    pub oam_addr: u8,
    pub oam: Vec<u8>,
    //#endregion

    /// 2 KiB of physical nametable VRAM; the 4 KiB logical nametable space
    /// is mirrored down into this by the cartridge's mirroring mode.
    pub nametable_vram: Vec<u8>,

    /// Buffered byte for PPUDATA reads below the palette range.
    pub ppudata_buffer: u8,
    /// The last byte written to any PPU control port, used as the
    /// open-bus fallback for write-only register reads.
    pub last_control_port_value: u8,

    /// The scanline currently being rendered, 0..=261.
    pub scanline: i16,
    /// The dot (column) within the current scanline, 0..=340.
    pub dot: u16,
    /// Set when a frame completes (wrap from scanline 261) and left set
    /// until `Ppu2C02::is_frame_ready` consumes it, so a poller that only
    /// checks between dot batches never misses the pulse.
    pub frame_ready: bool,
    /// Primary framebuffer, packed RGBA8, stride = FRAME_WIDTH * 4.
    pub frame_data: Vec<u8>,

    /// Scratch: background 2-bit color index for the scanline currently
    /// being composited, used for sprite priority and sprite-0 hit.
    pub bg_color_index: Vec<u8>,

    /// Set by the renderer when VBlank starts and PPUCTRL's NMI bit is
    /// enabled; serviced by the CPU at the next instruction boundary so
    /// the bus never calls back into the CPU synchronously.
    pub vblank_nmi_ready: bool,

    /// Palette row (0-7) used by the tile-bank debug surface.
    pub debug_palette_id: u8,
    /// One 256x240 RGBA8 debug render per logical nametable (0-3),
    /// ignoring scroll; refreshed once per frame at VBlank.
    pub nametable_debug: [Vec<u8>; 4],
    /// Both CHR pattern tables rendered side-by-side as 128x128 tiles,
    /// using `debug_palette_id`; refreshed once per frame at VBlank.
    pub tile_bank_debug: Vec<u8>,
    /// The 32-entry palette RAM rendered as a strip of color swatches;
    /// refreshed once per frame at VBlank.
    pub palette_debug: Vec<u8>,
}

impl PpuState {
    pub fn poweron() -> PpuState {
        PpuState {
            v: 0,
            t: 0,
            x: 0,
            w: false,
            control: 0,
            mask: 0,
            // Magic poweron value per nesdev's documented PPU behavior.
            status: 0xA0,
            oam_addr: 0,
            oam: vec![0u8; 256],
            nametable_vram: vec![0u8; 2048],
            ppudata_buffer: 0,
            last_control_port_value: 0,
            scanline: 0,
            dot: 0,
            frame_ready: false,
            frame_data: vec![0u8; FRAME_WIDTH * FRAME_ALLOC_HEIGHT * BYTES_PER_PIXEL],
            bg_color_index: vec![0u8; FRAME_WIDTH],
            vblank_nmi_ready: false,
            debug_palette_id: 0,
            nametable_debug: [
                vec![0u8; FRAME_WIDTH * FRAME_HEIGHT * BYTES_PER_PIXEL],
                vec![0u8; FRAME_WIDTH * FRAME_HEIGHT * BYTES_PER_PIXEL],
                vec![0u8; FRAME_WIDTH * FRAME_HEIGHT * BYTES_PER_PIXEL],
                vec![0u8; FRAME_WIDTH * FRAME_HEIGHT * BYTES_PER_PIXEL],
            ],
            tile_bank_debug: vec![0u8; TILE_BANK_DEBUG_WIDTH * TILE_BANK_DEBUG_HEIGHT * BYTES_PER_PIXEL],
            palette_debug: vec![0u8; PALETTE_DEBUG_WIDTH * PALETTE_DEBUG_HEIGHT * BYTES_PER_PIXEL],
        }
    }
}

bitflags! {
    /// Bitmasks for various components of a PPU address register (v/t).
    pub struct PpuAddressPart: u16 {
        const COARSE_X = 0x001F;
        const COARSE_Y = 0x03E0;
        const NAMETABLE_X = 0x0400;
        const NAMETABLE_Y = 0x0800;
        const FINE_Y = 0x7000;
    }
}

bitflags! {
    /// Bitmasks for fields of the PPU control register ($PPUCTRL)
    pub struct PpuControlFlags: u8 {
        /// Select which nametable to use. 0 = $2000, 1 = $2400, 2 = $2800, 3 = $2C00
        const NAMETABLE_BASE_SELECT = 0x03;
        /// Select the increment mode for writes to $PPUDATA. 0 = add 1, 1 = add 32
        const VRAM_INCREMENT_SELECT = 0x04;
        /// Select the base address for sprite tiles. 0 = $0000, 1 = $1000
        const SPRITE_TILE_SELECT = 0x08;
        /// Select the base address for background tiles. 0 = $0000, 1 = $1000
        const BG_TILE_SELECT = 0x10;
        /// If 1, use 8x16 sprites instead of the usual 8x8
        const SPRITE_MODE_SELECT = 0x20;
        /// PPU master/slave select; grounded on real NES hardware, unused here.
        const PPU_BG_COLOR_SELECT = 0x40;
        /// If 1, enable NMI generation on VBlank
        const VBLANK_NMI_ENABLE = 0x80;
    }
}

bitflags! {
    /// Bitmasks for the PPU mask register ($PPUMASK)
    pub struct PpuMaskFlags: u8 {
        /// If true, use the leftmost pallete colors only
        const USE_GRAYSCALE = 0x01;
        /// If false, don't render the background in the leftmost 8 columns
        const BG_LEFT_ENABLE = 0x02;
        /// If false, don't render sprites in the leftmost 8 columns
        const SPRITE_LEFT_ENABLE = 0x04;
        /// If false, don't render the background
        const BG_ENABLE = 0x08;
        /// If false, don't render sprites
        const SPRITE_ENABLE = 0x10;
        const COLOR_EMPHASIS_RED = 0x20;
        const COLOR_EMPHASIS_GREEN = 0x40;
        const COLOR_EMPHASIS_BLUE = 0x80;
    }
}

bitflags! {
    /// Bitmasks for the PPU status register ($PPUSTATUS)
    pub struct PpuStatusFlags: u8 {
        const STATUS_IGNORED = 0x1F;
        const SPRITE_OVERFLOW = 0x20;
        const SPRITE_0_HIT = 0x40;
        const VBLANK = 0x80;
    }
}

bitflags! {
    pub struct PpuOamAttributes: u8 {
        const PALETTE = 0x03;
        const UNUSED = 0x1C;
        const BACKGROUND_PRIORITY = 0x20;
        const FLIP_HORI = 0x40;
        const FLIP_VERT = 0x80;
    }
}

pub mod oam_offset {
    pub const Y_POS: usize = 0;
    pub const TILE: usize = 1;
    pub const ATTR: usize = 2;
    pub const X_POS: usize = 3;
}

/// The NES system palette, taken from nesdev's documented reference
/// palette. Each entry is an (R,G,B) triplet; multiply a color index by 3
/// to find its offset.
#[rustfmt::skip]
pub const PALETTE_TABLE: [u8; 64 * 3] = [
    //          0*
    /* *0 */    101, 101, 101,
    /* *1 */    0, 45, 105,
    /* *2 */    19, 31, 127,
    /* *3 */    60, 19, 124,
    /* *4 */    96, 11, 98,
    /* *5 */    115, 10, 55,
    /* *6 */    113, 15, 7,
    /* *7 */    90, 26, 0,
    /* *8 */    52, 40, 0,
    /* *9 */    11, 52, 0,
    /* *A */    0, 60, 0,
    /* *B */    0, 61, 16,
    /* *C */    0, 56, 64,
    /* *D */    0, 0, 0,
    /* *E */    0, 0, 0,
    /* *F */    0, 0, 0,

    //          1*
    /* *0 */    174, 174, 174,
    /* *1 */    15, 99, 179,
    /* *2 */    64, 81, 208,
    /* *3 */    120, 65, 204,
    /* *4 */    167, 54, 169,
    /* *5 */    192, 52, 112,
    /* *6 */    189, 60, 48,
    /* *7 */    159, 74, 0,
    /* *8 */    109, 92, 0,
    /* *9 */    54, 109, 0,
    /* *A */    7, 119, 4,
    /* *B */    0, 121, 61,
    /* *C */    0, 114, 125,
    /* *D */    0, 0, 0,
    /* *E */    0, 0, 0,
    /* *F */    0, 0, 0,

    //          2*
    /* *0 */    254, 254, 255,
    /* *1 */    93, 179, 255,
    /* *2 */    143, 161, 255,
    /* *3 */    200, 144, 255,
    /* *4 */    247, 133, 250,
    /* *5 */    255, 131, 192,
    /* *6 */    255, 139, 127,
    /* *7 */    239, 154, 73,
    /* *8 */    189, 172, 44,
    /* *9 */    133, 188, 47,
    /* *A */    85, 199, 83,
    /* *B */    60, 201, 140,
    /* *C */    62, 194, 205,
    /* *D */    78, 78, 78,
    /* *E */    0, 0, 0,
    /* *F */    0, 0, 0,

    //          3*
    /* *0 */    254, 254, 255,
    /* *1 */    188, 223, 255,
    /* *2 */    209, 216, 255,
    /* *3 */    232, 209, 255,
    /* *4 */    251, 205, 253,
    /* *5 */    255, 204, 229,
    /* *6 */    255, 207, 202,
    /* *7 */    248, 213, 180,
    /* *8 */    228, 220, 168,
    /* *9 */    204, 227, 169,
    /* *A */    185, 232, 184,
    /* *B */    174, 232, 208,
    /* *C */    175, 229, 234,
    /* *D */    182, 182, 182,
    /* *E */    0, 0, 0,
    /* *F */    0, 0, 0,
];
