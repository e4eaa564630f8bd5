//! Vector-06C Port Bus
//!
//! Port reads are answered immediately. Port writes are two-phase: `OUT`
//! only records the port and value and arms a countdown measured in
//! 12 MHz pixel clocks; the write takes effect when the rasterizer has
//! counted it down through `try_to_commit`. Palette and display-mode writes
//! carry their own, longer countdowns.
//!
//! ## Port map
//!
//! | Port      | IN                                  | OUT (at commit)                 |
//! |:----------|:------------------------------------|:--------------------------------|
//! | 0x00      | 0xFF                                | PPI control word / port C BSR   |
//! | 0x01      | port C, keyboard modifiers          | port C (RUS/LAT, tape)          |
//! | 0x02      | keyboard columns or port B          | port B: border index, 512 mode  |
//! | 0x03      | port A                              | port A: vertical scroll, rows   |
//! | 0x04-0x07 | PPI2 (CW2, C2, B2, A2)              | PPI2                            |
//! | 0x08-0x0B | timer slot                          | timer slot                      |
//! | 0x0C-0x0F | 0x0E/0x0F joysticks                 | hardware color (palette)        |
//! | 0x10      | 0xFF                                | RAM-disk bank switch            |
//! | 0x14-0x15 | sound slot                          | sound slot                      |
//! | 0x18-0x1C | floppy controller slot              | floppy controller slot          |
//!
//! Unmapped ports read 0xFF and ignore writes.

pub mod keyboard;

#[cfg(test)]
mod tests_ports;

pub use keyboard::Keyboard;

use crate::debugger::Debuggable;
use crate::memory::{IoInterface, Memory};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Pixels from OUT until a port write lands
pub const OUT_COMMIT_TIME: i8 = 1;
/// Pixels from OUT until a palette entry is stored
pub const PALETTE_COMMIT_TIME: i8 = 5;
/// Pixels from OUT 0x02 until the 256/512 mode switches
pub const DISPLAY_MODE_COMMIT_TIME: i8 = 8;
/// Pixel (counted from the OUT) where colors start to get corrupted while
/// a palette write is in flight
pub const COLORS_POLLUTED_DELAY: i8 = 4;

pub const PALETTE_LEN: usize = 16;
pub const PORTS_LEN: usize = 256;

pub const PORT_OUT_BORDER_COLOR0: u8 = 0x0C;
pub const PORT_OUT_BORDER_COLOR3: u8 = 0x0F;
pub const PORT_OUT_DISPLAY_MODE: u8 = 0x02;
pub const PORT_BANK_SWITCH: u8 = 0x10;

/// A device wired to a range of ports
pub trait Peripheral: Send {
    fn read(&mut self, _port: u8) -> u8 {
        0xFF
    }

    fn write(&mut self, _port: u8, _value: u8) {}

    fn reset(&mut self) {}
}

/// Peripheral slot selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    Timer,
    Sound,
    Fdc,
}

/// External devices. Empty slots behave as unmapped ports.
#[derive(Default)]
pub struct Peripherals {
    pub timer: Option<Box<dyn Peripheral>>,
    pub sound: Option<Box<dyn Peripheral>>,
    pub fdc: Option<Box<dyn Peripheral>>,
}

impl Peripherals {
    fn slot(&mut self, slot: Slot) -> &mut Option<Box<dyn Peripheral>> {
        match slot {
            Slot::Timer => &mut self.timer,
            Slot::Sound => &mut self.sound,
            Slot::Fdc => &mut self.fdc,
        }
    }

    fn read(&mut self, slot: Slot, port: u8) -> u8 {
        self.slot(slot).as_mut().map_or(0xFF, |p| p.read(port))
    }

    fn write(&mut self, slot: Slot, port: u8, value: u8) {
        if let Some(p) = self.slot(slot).as_mut() {
            p.write(port, value);
        }
    }

    fn reset(&mut self) {
        for p in [&mut self.timer, &mut self.sound, &mut self.fdc].into_iter().flatten() {
            p.reset();
        }
    }
}

impl fmt::Debug for Peripherals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Peripherals")
            .field("timer", &self.timer.is_some())
            .field("sound", &self.sound.is_some())
            .field("fdc", &self.fdc.is_some())
            .finish()
    }
}

/// Screen mode selected by bit 4 of port B
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayMode {
    /// 256 x 256, 16 colors
    Mode256,
    /// 512 x 256, 4 colors
    Mode512,
}

impl DisplayMode {
    fn from_port_b(value: u8) -> Self {
        if value & 0x10 != 0 {
            DisplayMode::Mode512
        } else {
            DisplayMode::Mode256
        }
    }
}

/// Both KR580VV55 PPIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ports {
    pub cw: u8,
    pub port_a: u8,
    pub port_b: u8,
    pub port_c: u8,
    pub cw2: u8,
    pub port_a2: u8,
    pub port_b2: u8,
    pub port_c2: u8,
}

impl Default for Ports {
    fn default() -> Self {
        Self {
            cw: 0x08,
            port_a: 0xFF,
            port_b: 0xFF,
            port_c: 0xFF,
            cw2: 0,
            port_a2: 0xFF,
            port_b2: 0xFF,
            port_c2: 0xFF,
        }
    }
}

fn ports_data() -> Vec<u8> {
    vec![0; PORTS_LEN]
}

/// Port bus state
#[derive(Debug, Serialize, Deserialize)]
pub struct Io {
    pub ports: Ports,
    /// Raw palette entries, `BBGGGRRR`
    pub palette: [u8; PALETTE_LEN],
    /// Palette before the write in flight
    palette_prev: [u8; PALETTE_LEN],
    pub hw_color: u8,
    pub border_idx: u8,
    pub display_mode: DisplayMode,
    pub req_display_mode: DisplayMode,
    pub ruslat: u8,
    pub ruslat_history: u32,
    pub joy_0e: u8,
    pub joy_0f: u8,

    pub out_port: u8,
    pub out_byte: u8,
    /// Countdowns in pixels, 0 = nothing pending
    pub out_commit_timer: i8,
    pub palette_commit_timer: i8,
    pub display_mode_timer: i8,
    color_polluted: bool,

    pub keyboard: Keyboard,

    /// Last value read per port
    #[serde(skip, default = "ports_data")]
    pub ports_in_data: Vec<u8>,
    /// Last value written per port
    #[serde(skip, default = "ports_data")]
    pub ports_out_data: Vec<u8>,

    #[serde(skip)]
    pub peripherals: Peripherals,
}

impl Io {
    pub fn new() -> Self {
        Self {
            ports: Ports::default(),
            palette: [0; PALETTE_LEN],
            palette_prev: [0; PALETTE_LEN],
            hw_color: 0,
            border_idx: 0,
            display_mode: DisplayMode::Mode256,
            req_display_mode: DisplayMode::Mode256,
            ruslat: 0,
            ruslat_history: 0,
            joy_0e: 0xFF,
            joy_0f: 0xFF,
            out_port: 0,
            out_byte: 0,
            out_commit_timer: 0,
            palette_commit_timer: 0,
            display_mode_timer: 0,
            color_polluted: false,
            keyboard: Keyboard::new(),
            ports_in_data: ports_data(),
            ports_out_data: ports_data(),
            peripherals: Peripherals::default(),
        }
    }

    /// Power-on state. Attached peripherals stay attached and are reset.
    pub fn reset(&mut self) {
        let mut peripherals = std::mem::take(&mut self.peripherals);
        peripherals.reset();
        let keyboard = std::mem::take(&mut self.keyboard);
        *self = Self::new();
        self.peripherals = peripherals;
        self.keyboard = keyboard;
    }

    pub fn attach(&mut self, slot: Slot, peripheral: Box<dyn Peripheral>) {
        *self.peripherals.slot(slot) = Some(peripheral);
    }

    pub fn detach(&mut self, slot: Slot) -> Option<Box<dyn Peripheral>> {
        self.peripherals.slot(slot).take()
    }

    // ========== Getters used by the rasterizer ==========

    pub fn color(&self, idx: u8) -> u8 {
        self.palette[(idx & 0x0F) as usize]
    }

    /// Color of an active-area pixel drawn right after `try_to_commit`.
    /// While a palette write is about to land, the video bus sees the old
    /// entry wired-OR'ed with the new hardware color.
    pub fn active_color(&self, idx: u8) -> u8 {
        if self.color_polluted {
            self.palette_prev[(idx & 0x0F) as usize] | self.hw_color
        } else {
            self.color(idx)
        }
    }

    pub fn border_color(&self) -> u8 {
        self.color(self.border_idx)
    }

    pub fn scroll(&self) -> u8 {
        self.ports.port_a
    }

    /// Any countdown armed
    pub fn is_commit_pending(&self) -> bool {
        self.out_commit_timer > 0 || self.palette_commit_timer > 0 || self.display_mode_timer > 0
    }

    // ========== Port access ==========

    fn port_in_handling(&mut self, port: u8) -> u8 {
        match port {
            0x00 => 0xFF,
            0x01 => {
                let low = if self.ports.cw & 0x01 != 0 {
                    0x0B
                } else {
                    self.ports.port_c & 0x0F
                };
                let high = if self.ports.cw & 0x08 != 0 {
                    self.keyboard.modifiers()
                } else {
                    self.ports.port_c & 0xF0
                };
                low | high
            }
            0x02 => {
                if self.ports.cw & 0x02 != 0 {
                    self.keyboard.read(self.ports.port_a)
                } else {
                    self.ports.port_b
                }
            }
            0x03 => {
                if self.ports.cw & 0x10 == 0 {
                    self.ports.port_a
                } else {
                    0xFF
                }
            }
            0x04 => self.ports.cw2,
            0x05 => self.ports.port_c2,
            0x06 => self.ports.port_b2,
            0x07 => self.ports.port_a2,
            0x08..=0x0B => self.peripherals.read(Slot::Timer, port),
            0x0E => self.joy_0e,
            0x0F => self.joy_0f,
            0x14 | 0x15 => self.peripherals.read(Slot::Sound, port),
            0x18..=0x1C => self.peripherals.read(Slot::Fdc, port),
            _ => 0xFF,
        }
    }

    /// Apply a port write. Called at commit time.
    fn port_out_handling(&mut self, port: u8, value: u8, memory: &mut Memory) {
        match port {
            0x00 => {
                self.ruslat = (self.ports.port_c >> 3) & 1;
                if value & 0x80 == 0 {
                    // port C bit set/reset
                    let bit = (value >> 1) & 7;
                    if value & 1 == 1 {
                        self.ports.port_c |= 1 << bit;
                    } else {
                        self.ports.port_c &= !(1 << bit);
                    }
                } else {
                    self.ports.cw = value;
                    self.port_out_handling(1, 0, memory);
                    self.port_out_handling(2, 0, memory);
                    self.port_out_handling(3, 0, memory);
                }
            }
            0x01 => {
                self.ruslat = (self.ports.port_c >> 3) & 1;
                self.ruslat_history = (self.ruslat_history << 1) + self.ruslat as u32;
                self.ports.port_c = value;
            }
            0x02 => {
                self.ports.port_b = value;
                self.border_idx = value & 0x0F;
                self.req_display_mode = DisplayMode::from_port_b(value);
            }
            0x03 => self.ports.port_a = value,
            0x04 => self.ports.cw2 = value,
            0x05 => self.ports.port_c2 = value,
            0x06 => self.ports.port_b2 = value,
            0x07 => self.ports.port_a2 = value,
            0x08..=0x0B => self.peripherals.write(Slot::Timer, port, value),
            PORT_OUT_BORDER_COLOR0..=PORT_OUT_BORDER_COLOR3 => self.hw_color = value,
            PORT_BANK_SWITCH => {
                log::trace!("bank switch {:02X}", value);
                memory.set_bank_switch(value);
            }
            0x14 | 0x15 => self.peripherals.write(Slot::Sound, port, value),
            0x18..=0x1C => self.peripherals.write(Slot::Fdc, port, value),
            _ => {}
        }
    }

    /// Advance the pending countdowns by one pixel. `color_idx` is the
    /// palette entry being drawn; a palette write lands there.
    pub fn try_to_commit(&mut self, color_idx: u8, memory: &mut Memory) {
        self.color_polluted = false;

        if self.out_commit_timer > 0 {
            self.out_commit_timer -= 1;
            if self.out_commit_timer == 0 {
                self.port_out_handling(self.out_port, self.out_byte, memory);
            }
        }

        if self.palette_commit_timer > 0 {
            self.color_polluted =
                self.palette_commit_timer <= PALETTE_COMMIT_TIME - COLORS_POLLUTED_DELAY + 1;
            self.palette_commit_timer -= 1;
            if self.palette_commit_timer == 0 {
                self.palette[(color_idx & 0x0F) as usize] = self.hw_color;
            }
        }

        if self.display_mode_timer > 0 {
            self.display_mode_timer -= 1;
            if self.display_mode_timer == 0 {
                self.display_mode = self.req_display_mode;
            }
        }
    }
}

impl IoInterface for Io {
    fn port_in(&mut self, port: u8) -> u8 {
        let value = self.port_in_handling(port);
        self.ports_in_data[port as usize] = value;
        value
    }

    fn port_out(&mut self, port: u8, value: u8) {
        self.ports_out_data[port as usize] = value;

        self.out_port = port;
        self.out_byte = value;
        self.out_commit_timer = OUT_COMMIT_TIME;

        match port {
            PORT_OUT_BORDER_COLOR0..=PORT_OUT_BORDER_COLOR3 => {
                self.palette_prev = self.palette;
                self.palette_commit_timer = PALETTE_COMMIT_TIME;
            }
            PORT_OUT_DISPLAY_MODE => self.display_mode_timer = DISPLAY_MODE_COMMIT_TIME,
            _ => {}
        }
    }
}

impl Default for Io {
    fn default() -> Self {
        Self::new()
    }
}

impl Debuggable for Io {
    fn read_state(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn write_state(&mut self, state: &Value) {
        match serde_json::from_value::<Io>(state.clone()) {
            Ok(mut restored) => {
                restored.peripherals = std::mem::take(&mut self.peripherals);
                restored.ports_in_data = std::mem::take(&mut self.ports_in_data);
                restored.ports_out_data = std::mem::take(&mut self.ports_out_data);
                *self = restored;
            }
            Err(e) => log::warn!("io state rejected: {}", e),
        }
    }
}
