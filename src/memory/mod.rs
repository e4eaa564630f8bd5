//! Vector-06C Memory
//!
//! Main RAM plus one RAM-disk, a boot ROM overlay and the bank-switch
//! translation that maps a CPU address onto a physical ("global") offset.
//!
//! ## Physical layout
//!
//! | Global range        | Size    | Description                       |
//! |:--------------------|:--------|:----------------------------------|
//! | 0x00000-0x0FFFF     | 64 KB   | Main RAM                          |
//! | 0x10000-0x1FFFF     | 64 KB   | RAM-disk page 0                   |
//! | 0x20000-0x2FFFF     | 64 KB   | RAM-disk page 1                   |
//! | 0x30000-0x3FFFF     | 64 KB   | RAM-disk page 2                   |
//! | 0x40000-0x4FFFF     | 64 KB   | RAM-disk page 3                   |
//!
//! ## Video planes (main RAM)
//!
//! | CPU range     | Plane |
//! |:--------------|:------|
//! | 0x8000-0x9FFF | 0     |
//! | 0xA000-0xBFFF | 1     |
//! | 0xC000-0xDFFF | 2     |
//! | 0xE000-0xFFFF | 3     |
//!
//! While the ROM overlay is enabled, reads below the ROM length return
//! ROM bytes. Writes always land in RAM.

pub mod mapping;

#[cfg(test)]
mod tests_property;

pub use mapping::{translate, Mapping};

use crate::debugger::Debuggable;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MEM_64K: usize = 0x10000;
pub const RAM_DISK_PAGE_LEN: usize = MEM_64K;
pub const RAM_DISK_PAGES: usize = 4;
pub const MEMORY_MAIN_LEN: usize = MEM_64K;
pub const MEMORY_RAMDISK_LEN: usize = RAM_DISK_PAGES * RAM_DISK_PAGE_LEN;
/// Total physical memory size
pub const MEMORY_LEN: usize = MEMORY_MAIN_LEN + MEMORY_RAMDISK_LEN;

/// Programs are loaded here when the boot ROM is skipped
pub const ROM_LOAD_ADDR: u16 = 0x100;

/// Physical memory offset, `0..MEMORY_LEN`
pub type GlobalAddr = u32;

/// Address space tag of a memory access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddrSpace {
    /// Regular data and instruction accesses
    Ram,
    /// PUSH/POP/CALL/RET/RST/XTHL accesses
    Stack,
    /// Physical offset, no translation
    Global,
}

/// CPU-side view of memory
pub trait MemoryInterface {
    /// M1 opcode fetch
    fn read_instr(&mut self, addr: u16) -> u8;
    fn read_byte(&mut self, addr: u16, space: AddrSpace) -> u8;
    fn write_byte(&mut self, addr: u16, value: u8, space: AddrSpace);
}

/// CPU-side view of the port bus
pub trait IoInterface {
    fn port_in(&mut self, port: u8) -> u8;
    fn port_out(&mut self, port: u8, value: u8);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemType {
    Rom,
    Ram,
}

/// Vector-06C memory: RAM, RAM-disk and the boot ROM overlay
#[derive(Debug, Serialize, Deserialize)]
pub struct Memory {
    #[serde(skip)]
    pub ram: Box<[u8]>,
    #[serde(skip)]
    pub rom: Vec<u8>,
    pub mapping: Mapping,
    pub mem_type: MemType,
}

impl Memory {
    pub fn new() -> Self {
        Self {
            ram: vec![0; MEMORY_LEN].into_boxed_slice(),
            rom: Vec::new(),
            mapping: Mapping::default(),
            mem_type: MemType::Rom,
        }
    }

    /// Power-on state: RAM cleared, mapping off, ROM overlay on
    pub fn reset(&mut self) {
        self.ram.fill(0);
        self.mapping = Mapping::default();
        self.mem_type = MemType::Rom;
    }

    /// Soft reboot: subsequent fetches come from RAM
    pub fn restart(&mut self) {
        self.mem_type = MemType::Ram;
    }

    pub fn set_mem_type(&mut self, mem_type: MemType) {
        self.mem_type = mem_type;
    }

    pub fn is_rom_enabled(&self) -> bool {
        self.mem_type == MemType::Rom
    }

    pub fn set_rom(&mut self, data: &[u8]) {
        self.rom = data.to_vec();
    }

    /// Copy `data` into physical RAM starting at `addr`. Bytes past the end
    /// of physical memory are dropped; `loader::load_ram` rejects such
    /// writes up front.
    pub fn set_ram(&mut self, addr: GlobalAddr, data: &[u8]) {
        let start = (addr as usize).min(MEMORY_LEN);
        let len = data.len().min(MEMORY_LEN - start);
        self.ram[start..start + len].copy_from_slice(&data[..len]);
    }

    pub fn set_bank_switch(&mut self, data: u8) {
        self.mapping = Mapping::from_byte(data);
    }

    pub fn bank_switch(&self) -> u8 {
        self.mapping.to_byte()
    }

    pub fn global_addr(&self, addr: u32, space: AddrSpace) -> GlobalAddr {
        translate(addr, space, self.mapping.to_byte())
    }

    pub fn get_byte(&self, addr: u32, space: AddrSpace) -> u8 {
        let global = self.global_addr(addr, space) as usize;
        if self.mem_type == MemType::Rom && global < self.rom.len() {
            return self.rom[global];
        }
        self.ram[global]
    }

    pub fn set_byte(&mut self, addr: u32, value: u8, space: AddrSpace) {
        let global = self.global_addr(addr, space) as usize;
        self.ram[global] = value;
    }

    /// Little-endian word, the high byte address wraps at 16 bits
    pub fn get_word(&self, addr: u16, space: AddrSpace) -> u16 {
        let lo = self.get_byte(addr as u32, space) as u16;
        let hi = self.get_byte(addr.wrapping_add(1) as u32, space) as u16;
        hi << 8 | lo
    }

    /// Four plane bytes at the same screen position
    pub fn screen_bytes(&self, offset: u16) -> u32 {
        let offset = (offset & 0x1FFF) as usize;
        let b8 = self.ram[0x8000 + offset] as u32;
        let ba = self.ram[0xA000 + offset] as u32;
        let bc = self.ram[0xC000 + offset] as u32;
        let be = self.ram[0xE000 + offset] as u32;
        b8 << 24 | ba << 16 | bc << 8 | be
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryInterface for Memory {
    fn read_instr(&mut self, addr: u16) -> u8 {
        self.get_byte(addr as u32, AddrSpace::Ram)
    }

    fn read_byte(&mut self, addr: u16, space: AddrSpace) -> u8 {
        self.get_byte(addr as u32, space)
    }

    fn write_byte(&mut self, addr: u16, value: u8, space: AddrSpace) {
        self.set_byte(addr as u32, value, space)
    }
}

impl Debuggable for Memory {
    fn read_state(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn write_state(&mut self, state: &Value) {
        match serde_json::from_value::<Memory>(state.clone()) {
            Ok(restored) => {
                self.mapping = restored.mapping;
                self.mem_type = restored.mem_type;
            }
            Err(e) => log::warn!("memory state rejected: {}", e),
        }
    }
}
