//! Debug hook slots
//!
//! Four nullable slots a debugger attaches to while the machine runs:
//!
//! | Slot          | Called                                   |
//! |:--------------|:-----------------------------------------|
//! | `check_break` | after every retired instruction in RUN   |
//! | `on_fetch`    | on every opcode fetch                    |
//! | `on_read`     | after every data read                    |
//! | `on_write`    | after every data write                   |
//!
//! Hooks run on the emulation thread. They must not block and must not
//! send requests to the `Hardware` they are attached to.

use crate::cpu::Cpu;
use crate::memory::{AddrSpace, GlobalAddr, MemType, Memory, MemoryInterface};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Register snapshot handed to the break check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuState {
    pub cc: u64,
    pub pc: u16,
    pub sp: u16,
    pub af: u16,
    pub bc: u16,
    pub de: u16,
    pub hl: u16,
    /// Interrupt bits, see `cpu::ints`
    pub ints: u8,
}

impl CpuState {
    pub fn capture(cpu: &Cpu) -> Self {
        Self {
            cc: cpu.cc,
            pc: cpu.pc,
            sp: cpu.sp,
            af: cpu.af(),
            bc: cpu.bc(),
            de: cpu.de(),
            hl: cpu.hl(),
            ints: cpu.ints(),
        }
    }
}

/// Memory snapshot at the next instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemState {
    pub bank_switch: u8,
    pub mem_type: MemType,
    /// Global address of PC
    pub global_pc: GlobalAddr,
    pub opcode: u8,
    pub data_l: u8,
    pub data_h: u8,
}

impl MemState {
    pub fn capture(memory: &Memory, pc: u16) -> Self {
        Self {
            bank_switch: memory.bank_switch(),
            mem_type: memory.mem_type,
            global_pc: memory.global_addr(pc as u32, AddrSpace::Ram),
            opcode: memory.get_byte(pc as u32, AddrSpace::Ram),
            data_l: memory.get_byte(pc.wrapping_add(1) as u32, AddrSpace::Ram),
            data_h: memory.get_byte(pc.wrapping_add(2) as u32, AddrSpace::Ram),
        }
    }
}

/// Decides whether the machine stops after the instruction just retired
pub trait BreakCheck: Send + Sync {
    fn check_break(&self, cpu: &CpuState, mem: &MemState) -> bool;
}

impl<F> BreakCheck for F
where
    F: Fn(&CpuState, &MemState) -> bool + Send + Sync,
{
    fn check_break(&self, cpu: &CpuState, mem: &MemState) -> bool {
        self(cpu, mem)
    }
}

/// Sees every opcode fetch together with the two bytes after it
pub trait FetchObserver: Send + Sync {
    fn on_fetch(&self, global_addr: GlobalAddr, opcode: u8, data_l: u8, data_h: u8);
}

impl<F> FetchObserver for F
where
    F: Fn(GlobalAddr, u8, u8, u8) + Send + Sync,
{
    fn on_fetch(&self, global_addr: GlobalAddr, opcode: u8, data_l: u8, data_h: u8) {
        self(global_addr, opcode, data_l, data_h)
    }
}

/// Sees a data read or write
pub trait AccessObserver: Send + Sync {
    fn on_access(&self, global_addr: GlobalAddr, value: u8);
}

impl<F> AccessObserver for F
where
    F: Fn(GlobalAddr, u8) + Send + Sync,
{
    fn on_access(&self, global_addr: GlobalAddr, value: u8) {
        self(global_addr, value)
    }
}

/// One swappable hook. The flag keeps the unattached path down to a
/// single atomic load.
pub struct HookSlot<T: ?Sized> {
    attached: AtomicBool,
    hook: RwLock<Option<Arc<T>>>,
}

impl<T: ?Sized> HookSlot<T> {
    pub fn new() -> Self {
        Self {
            attached: AtomicBool::new(false),
            hook: RwLock::new(None),
        }
    }

    pub fn attach(&self, hook: Arc<T>) {
        let mut slot = self.hook.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(hook);
        self.attached.store(true, Ordering::Release);
    }

    pub fn detach(&self) {
        self.attached.store(false, Ordering::Release);
        let mut slot = self.hook.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = None;
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    /// Run `f` with the attached hook, `None` when the slot is empty
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        if !self.is_attached() {
            return None;
        }
        let slot = self.hook.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.as_deref().map(f)
    }
}

impl<T: ?Sized> Default for HookSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> std::fmt::Debug for HookSlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookSlot")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// The four hook slots of one machine
#[derive(Debug, Default)]
pub struct DebugHooks {
    pub check_break: HookSlot<dyn BreakCheck>,
    pub on_fetch: HookSlot<dyn FetchObserver>,
    pub on_read: HookSlot<dyn AccessObserver>,
    pub on_write: HookSlot<dyn AccessObserver>,
}

impl DebugHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the break check about the instruction just retired
    pub fn should_break(&self, cpu: &Cpu, memory: &Memory) -> bool {
        self.check_break
            .with(|hook| hook.check_break(&CpuState::capture(cpu), &MemState::capture(memory, cpu.pc)))
            .unwrap_or(false)
    }

    pub fn detach_all(&self) {
        self.check_break.detach();
        self.on_fetch.detach();
        self.on_read.detach();
        self.on_write.detach();
    }
}

/// `Memory` as seen by the CPU, reporting every access to the hooks
pub struct HookedMemory<'a> {
    memory: &'a mut Memory,
    hooks: &'a DebugHooks,
}

impl<'a> HookedMemory<'a> {
    pub fn new(memory: &'a mut Memory, hooks: &'a DebugHooks) -> Self {
        Self { memory, hooks }
    }
}

impl MemoryInterface for HookedMemory<'_> {
    fn read_instr(&mut self, addr: u16) -> u8 {
        let opcode = self.memory.get_byte(addr as u32, AddrSpace::Ram);
        let memory = &*self.memory;
        self.hooks.on_fetch.with(|hook| {
            let data_l = memory.get_byte(addr.wrapping_add(1) as u32, AddrSpace::Ram);
            let data_h = memory.get_byte(addr.wrapping_add(2) as u32, AddrSpace::Ram);
            hook.on_fetch(memory.global_addr(addr as u32, AddrSpace::Ram), opcode, data_l, data_h);
        });
        opcode
    }

    fn read_byte(&mut self, addr: u16, space: AddrSpace) -> u8 {
        let value = self.memory.get_byte(addr as u32, space);
        let memory = &*self.memory;
        self.hooks
            .on_read
            .with(|hook| hook.on_access(memory.global_addr(addr as u32, space), value));
        value
    }

    fn write_byte(&mut self, addr: u16, value: u8, space: AddrSpace) {
        self.memory.set_byte(addr as u32, value, space);
        let memory = &*self.memory;
        self.hooks
            .on_write
            .with(|hook| hook.on_access(memory.global_addr(addr as u32, space), value));
    }
}
