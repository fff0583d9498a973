//! Standard NES controller (§4.6).
//!
//! A shift register latched by strobe writes and drained one bit per read,
//! in button order A, B, Select, Start, Up, Down, Left, Right.

use super::bus::{BusDevice, BusPeekResult};

bitflags! {
    pub struct JoypadButton: u8 {
        const A      = 0b0000_0001;
        const B      = 0b0000_0010;
        const SELECT = 0b0000_0100;
        const START  = 0b0000_1000;
        const UP     = 0b0001_0000;
        const DOWN   = 0b0010_0000;
        const LEFT   = 0b0100_0000;
        const RIGHT  = 0b1000_0000;
    }
}

pub struct Joypad {
    /// Live button mask, set by the host via keydown_*/keyup_* calls.
    button_state: JoypadButton,
    /// Strobe latch: while set, reads keep returning the A button's state
    /// and the shift index is held at 0.
    strobe: bool,
    /// Index of the next bit to shift out, 0..=7, then pinned to report 1.
    shift_index: u8,
}

impl Joypad {
    pub fn new() -> Joypad {
        Joypad {
            button_state: JoypadButton::empty(),
            strobe: false,
            shift_index: 0,
        }
    }

    pub fn set_button(&mut self, button: JoypadButton, pressed: bool) {
        if pressed {
            self.button_state.insert(button);
        } else {
            self.button_state.remove(button);
        }
    }

    fn current_bit(&self) -> u8 {
        let order = [
            JoypadButton::A,
            JoypadButton::B,
            JoypadButton::SELECT,
            JoypadButton::START,
            JoypadButton::UP,
            JoypadButton::DOWN,
            JoypadButton::LEFT,
            JoypadButton::RIGHT,
        ];
        if self.shift_index >= 8 {
            1
        } else if self.button_state.contains(order[self.shift_index as usize]) {
            1
        } else {
            0
        }
    }
}

impl Default for Joypad {
    fn default() -> Self {
        Joypad::new()
    }
}

impl BusDevice for Joypad {
    fn read(&mut self, _addr: u16, last_bus_value: u8) -> u8 {
        let bit = self.current_bit();
        if !self.strobe && self.shift_index < 8 {
            self.shift_index += 1;
        }
        // Only bit 0 is driven by the controller; the rest of the byte
        // reflects whatever was last on the bus (open-bus behavior).
        (last_bus_value & 0xFE) | bit
    }

    fn peek(&self, _addr: u16) -> BusPeekResult {
        // Reading the joypad port advances the shift register, so a
        // side-effect-free peek is not possible.
        BusPeekResult::MutableRead
    }

    fn write(&mut self, _addr: u16, value: u8) {
        let strobe = value & 0x01 != 0;
        if strobe {
            self.shift_index = 0;
        }
        self.strobe = strobe;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_register_reads_in_button_order() {
        let mut pad = Joypad::new();
        pad.set_button(JoypadButton::A, true);
        pad.set_button(JoypadButton::START, true);
        pad.set_button(JoypadButton::LEFT, true);

        pad.write(0x4016, 1);
        pad.write(0x4016, 0);

        let mut bits = Vec::new();
        for _ in 0..8 {
            bits.push(pad.read(0x4016, 0) & 1);
        }
        assert_eq!(bits, vec![1, 0, 0, 1, 0, 0, 1, 0]);

        // Ninth and onward reads return 1.
        assert_eq!(pad.read(0x4016, 0) & 1, 1);
        assert_eq!(pad.read(0x4016, 0) & 1, 1);
    }

    #[test]
    fn strobe_high_keeps_reporting_button_a() {
        let mut pad = Joypad::new();
        pad.set_button(JoypadButton::A, true);
        pad.write(0x4016, 1);

        for _ in 0..5 {
            assert_eq!(pad.read(0x4016, 0) & 1, 1);
        }
    }
}
