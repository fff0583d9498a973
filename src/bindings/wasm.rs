//! WASM front-end for the NES emulator (§6).
//!
//! The host owns the tick clock, framebuffer presentation, and input
//! events; this module only exposes the operations SPEC_FULL §6 names as
//! the host API surface. ROM bytes are passed in directly as a
//! `Uint8Array`-backed slice rather than through a raw shared buffer and
//! pointer handshake, since wasm-bindgen already marshals that safely.

use log::warn;

use crate::devices::joypad::JoypadButton;
use crate::devices::nes::Nes;
use js_sys::Uint8Array;
use std::panic;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(getter_with_clone)]
pub struct LoadRomResult {
    pub valid: bool,
    pub error: String,
}

#[wasm_bindgen]
pub struct NesEmulator {
    nes: Option<Nes>,
}

#[wasm_bindgen]
impl NesEmulator {
    #[wasm_bindgen(constructor)]
    pub fn new() -> NesEmulator {
        NesEmulator { nes: None }
    }

    /// Parse and load an iNES ROM image, replacing whatever was loaded
    /// before. On failure the emulator is left unloaded and `tick`/`reset`
    /// become no-ops until a valid ROM is loaded (§7).
    #[wasm_bindgen]
    pub fn load_rom(&mut self, buf: &[u8]) -> LoadRomResult {
        match Nes::new_from_buf(buf) {
            Ok(nes) => {
                self.nes = Some(nes);
                LoadRomResult {
                    valid: true,
                    error: String::new(),
                }
            }
            Err(err) => {
                warn!("ROM load failed: {}", err);
                self.nes = None;
                LoadRomResult {
                    valid: false,
                    error: err.to_string(),
                }
            }
        }
    }

    #[wasm_bindgen]
    pub fn tick(&mut self, elapsed_ns: i64) {
        match &mut self.nes {
            Some(nes) => nes.tick(elapsed_ns),
            None => warn!("tick() called with no ROM loaded"),
        }
    }

    #[wasm_bindgen]
    pub fn tick_frame(&mut self) {
        match &mut self.nes {
            Some(nes) => nes.tick_frame(),
            None => warn!("tick_frame() called with no ROM loaded"),
        }
    }

    #[wasm_bindgen]
    pub fn reset(&mut self) {
        match &mut self.nes {
            Some(nes) => nes.reset(),
            None => warn!("reset() called with no ROM loaded"),
        }
    }

    /// Consuming read: returns `true` at most once per completed frame (§4.4,
    /// §5). The host is expected to poll this after every `tick`/`tick_frame`
    /// call and read the framebuffer when it returns `true`.
    #[wasm_bindgen]
    pub fn is_frame_ready(&mut self) -> bool {
        self.nes.as_mut().map_or(false, |nes| nes.is_frame_ready())
    }

    #[wasm_bindgen]
    pub fn get_screen_framebuffer(&self) -> Uint8Array {
        match &self.nes {
            Some(nes) => Uint8Array::from(nes.get_screen_framebuffer()),
            None => Uint8Array::new_with_length(0),
        }
    }

    #[wasm_bindgen]
    pub fn get_tile_bank_debug(&self) -> Uint8Array {
        match &self.nes {
            Some(nes) => Uint8Array::from(nes.get_tile_bank_debug()),
            None => Uint8Array::new_with_length(0),
        }
    }

    #[wasm_bindgen]
    pub fn get_palette_debug(&self) -> Uint8Array {
        match &self.nes {
            Some(nes) => Uint8Array::from(nes.get_palette_debug()),
            None => Uint8Array::new_with_length(0),
        }
    }

    /// `index` selects one of the four logical nametables, 0..=3.
    #[wasm_bindgen]
    pub fn get_nametable_debug(&self, index: usize) -> Uint8Array {
        match &self.nes {
            Some(nes) if index < 4 => Uint8Array::from(nes.get_nametable_debug(index)),
            _ => Uint8Array::new_with_length(0),
        }
    }

    #[wasm_bindgen]
    pub fn get_chr_debug(&self) -> Uint8Array {
        match &self.nes {
            Some(nes) => Uint8Array::from(nes.get_chr_debug()),
            None => Uint8Array::new_with_length(0),
        }
    }

    #[wasm_bindgen]
    pub fn set_debug_palette_id(&mut self, id: u8) {
        if let Some(nes) = &mut self.nes {
            nes.set_debug_palette_id(id);
        }
    }

    /// A read-only CPU register snapshot, for host debug overlays (§6).
    #[wasm_bindgen]
    pub fn debug_cpu(&self) -> String {
        match &self.nes {
            Some(nes) => nes.debug_cpu(),
            None => "no ROM loaded".to_string(),
        }
    }

    /// Executes exactly one CPU instruction and returns its disassembly.
    #[wasm_bindgen]
    pub fn dbg_step_cpu(&mut self) -> String {
        match &mut self.nes {
            Some(nes) => nes.dbg_step_cpu(),
            None => "no ROM loaded".to_string(),
        }
    }

    fn set_button(&mut self, button: JoypadButton, pressed: bool) {
        if let Some(nes) = &mut self.nes {
            nes.set_button(0, button, pressed);
        }
    }

    #[wasm_bindgen]
    pub fn keydown_a(&mut self) {
        self.set_button(JoypadButton::A, true);
    }
    #[wasm_bindgen]
    pub fn keyup_a(&mut self) {
        self.set_button(JoypadButton::A, false);
    }
    #[wasm_bindgen]
    pub fn keydown_b(&mut self) {
        self.set_button(JoypadButton::B, true);
    }
    #[wasm_bindgen]
    pub fn keyup_b(&mut self) {
        self.set_button(JoypadButton::B, false);
    }
    #[wasm_bindgen]
    pub fn keydown_select(&mut self) {
        self.set_button(JoypadButton::SELECT, true);
    }
    #[wasm_bindgen]
    pub fn keyup_select(&mut self) {
        self.set_button(JoypadButton::SELECT, false);
    }
    #[wasm_bindgen]
    pub fn keydown_start(&mut self) {
        self.set_button(JoypadButton::START, true);
    }
    #[wasm_bindgen]
    pub fn keyup_start(&mut self) {
        self.set_button(JoypadButton::START, false);
    }
    #[wasm_bindgen]
    pub fn keydown_up(&mut self) {
        self.set_button(JoypadButton::UP, true);
    }
    #[wasm_bindgen]
    pub fn keyup_up(&mut self) {
        self.set_button(JoypadButton::UP, false);
    }
    #[wasm_bindgen]
    pub fn keydown_down(&mut self) {
        self.set_button(JoypadButton::DOWN, true);
    }
    #[wasm_bindgen]
    pub fn keyup_down(&mut self) {
        self.set_button(JoypadButton::DOWN, false);
    }
    #[wasm_bindgen]
    pub fn keydown_left(&mut self) {
        self.set_button(JoypadButton::LEFT, true);
    }
    #[wasm_bindgen]
    pub fn keyup_left(&mut self) {
        self.set_button(JoypadButton::LEFT, false);
    }
    #[wasm_bindgen]
    pub fn keydown_right(&mut self) {
        self.set_button(JoypadButton::RIGHT, true);
    }
    #[wasm_bindgen]
    pub fn keyup_right(&mut self) {
        self.set_button(JoypadButton::RIGHT, false);
    }
}

impl Default for NesEmulator {
    fn default() -> Self {
        NesEmulator::new()
    }
}

/// Installs a global panic handler to make debugging easier in the browser
/// console.
#[wasm_bindgen]
pub fn init_debug_hooks() {
    panic::set_hook(Box::new(console_error_panic_hook::hook));
}
