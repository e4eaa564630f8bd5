//! Bank-switch (RAM-disk) decoding
//!
//! | Bit(s) | Meaning                              |
//! |:-------|:-------------------------------------|
//! | 0-1    | RAM page for the data windows        |
//! | 2-3    | RAM page for stack accesses          |
//! | 4      | Stack overlay enable                 |
//! | 5      | Window 0xA000-0xDFFF enable          |
//! | 6      | Window 0x8000-0x9FFF enable          |
//! | 7      | Window 0xE000-0xFFFF enable          |

use super::{AddrSpace, GlobalAddr, MEMORY_LEN, RAM_DISK_PAGE_LEN};
use serde::{Deserialize, Serialize};

pub mod bits {
    pub const PAGE_RAM: u8 = 0b0000_0011;
    pub const PAGE_STACK: u8 = 0b0000_1100;
    pub const MODE_STACK: u8 = 0b0001_0000;
    pub const MODE_RAM_A: u8 = 0b0010_0000;
    pub const MODE_RAM_8: u8 = 0b0100_0000;
    pub const MODE_RAM_E: u8 = 0b1000_0000;
    pub const MODE_MASK: u8 = 0b1111_0000;
}

/// Decoded bank-switch byte
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub page_ram: u8,
    pub page_stack: u8,
    pub mode_stack: bool,
    pub mode_ram_a: bool,
    pub mode_ram_8: bool,
    pub mode_ram_e: bool,
}

impl Mapping {
    pub fn from_byte(data: u8) -> Self {
        Self {
            page_ram: data & bits::PAGE_RAM,
            page_stack: (data & bits::PAGE_STACK) >> 2,
            mode_stack: data & bits::MODE_STACK != 0,
            mode_ram_a: data & bits::MODE_RAM_A != 0,
            mode_ram_8: data & bits::MODE_RAM_8 != 0,
            mode_ram_e: data & bits::MODE_RAM_E != 0,
        }
    }

    pub fn to_byte(&self) -> u8 {
        (self.page_ram & 0x03)
            | (self.page_stack & 0x03) << 2
            | (self.mode_stack as u8) << 4
            | (self.mode_ram_a as u8) << 5
            | (self.mode_ram_8 as u8) << 6
            | (self.mode_ram_e as u8) << 7
    }

    pub fn is_enabled(&self) -> bool {
        self.to_byte() & bits::MODE_MASK != 0
    }

    /// Is `addr` inside an enabled data window. Priority A, 8, E.
    pub fn is_ram_mapped(&self, addr: u16) -> bool {
        if self.mode_ram_a && (0xA000..0xE000).contains(&addr) {
            return true;
        }
        if self.mode_ram_8 && (0x8000..0xA000).contains(&addr) {
            return true;
        }
        self.mode_ram_e && addr >= 0xE000
    }
}

fn page_base(page: u8) -> GlobalAddr {
    ((page as usize + 1) * RAM_DISK_PAGE_LEN) as GlobalAddr
}

/// Map an address to a physical offset. Depends on nothing but its inputs.
///
/// `Global` wraps modulo the physical size; `Ram` and `Stack` use the low
/// 16 bits of `addr`.
pub fn translate(addr: u32, space: AddrSpace, bank: u8) -> GlobalAddr {
    if space == AddrSpace::Global {
        return addr % MEMORY_LEN as GlobalAddr;
    }

    let addr = addr as u16;
    let mapping = Mapping::from_byte(bank);

    if space == AddrSpace::Stack && mapping.mode_stack {
        return addr as GlobalAddr + page_base(mapping.page_stack);
    }
    // data windows also catch stack accesses while the stack overlay is off
    if mapping.is_ram_mapped(addr) {
        return addr as GlobalAddr + page_base(mapping.page_ram);
    }
    addr as GlobalAddr
}
