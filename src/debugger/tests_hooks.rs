use super::*;
use crate::cpu::Cpu;
use crate::memory::{AddrSpace, GlobalAddr, Memory, MemoryInterface};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn memory_with(program: &[u8]) -> Memory {
    let mut memory = Memory::new();
    memory.restart();
    memory.set_ram(0, program);
    memory
}

#[test]
fn test_empty_slots_are_silent() {
    let hooks = DebugHooks::new();
    let mut memory = memory_with(&[0x3E, 0x12]);
    let mut hooked = HookedMemory::new(&mut memory, &hooks);
    assert_eq!(hooked.read_instr(0), 0x3E);
    assert!(!hooks.check_break.is_attached());
    assert!(!hooks.should_break(&Cpu::new(), &memory));
}

#[test]
fn test_fetch_hook_sees_operands() {
    let hooks = DebugHooks::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    hooks.on_fetch.attach(Arc::new(move |addr: GlobalAddr, op: u8, lo: u8, hi: u8| {
        sink.lock().unwrap().push((addr, op, lo, hi));
    }));

    let mut memory = memory_with(&[0xC3, 0x34, 0x12]);
    let mut hooked = HookedMemory::new(&mut memory, &hooks);
    hooked.read_instr(0);

    assert_eq!(*seen.lock().unwrap(), vec![(0, 0xC3, 0x34, 0x12)]);
}

#[test]
fn test_access_hooks_report_global_address() {
    let hooks = DebugHooks::new();
    let reads = Arc::new(Mutex::new(Vec::new()));
    let writes = Arc::new(Mutex::new(Vec::new()));
    let (r, w) = (Arc::clone(&reads), Arc::clone(&writes));
    hooks.on_read.attach(Arc::new(move |addr: GlobalAddr, value: u8| r.lock().unwrap().push((addr, value))));
    hooks.on_write.attach(Arc::new(move |addr: GlobalAddr, value: u8| w.lock().unwrap().push((addr, value))));

    let mut memory = memory_with(&[]);
    // stack on RAM-disk page 1
    memory.set_bank_switch(0b0001_0100);
    let mut hooked = HookedMemory::new(&mut memory, &hooks);
    hooked.write_byte(0x1000, 0x5A, AddrSpace::Stack);
    assert_eq!(hooked.read_byte(0x1000, AddrSpace::Stack), 0x5A);
    assert_eq!(hooked.read_byte(0x1000, AddrSpace::Ram), 0x00);

    assert_eq!(*writes.lock().unwrap(), vec![(0x21000, 0x5A)]);
    assert_eq!(*reads.lock().unwrap(), vec![(0x21000, 0x5A), (0x1000, 0x00)]);
}

#[test]
fn test_detach_stops_calls() {
    let hooks = DebugHooks::new();
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    hooks.on_read.attach(Arc::new(move |_: GlobalAddr, _: u8| {
        c.fetch_add(1, Ordering::SeqCst);
    }));

    let mut memory = memory_with(&[]);
    {
        let mut hooked = HookedMemory::new(&mut memory, &hooks);
        hooked.read_byte(0, AddrSpace::Ram);
    }
    hooks.on_read.detach();
    {
        let mut hooked = HookedMemory::new(&mut memory, &hooks);
        hooked.read_byte(0, AddrSpace::Ram);
    }
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_break_check_gets_state() {
    let hooks = DebugHooks::new();
    hooks
        .check_break
        .attach(Arc::new(|cpu: &CpuState, mem: &MemState| cpu.pc == 0x0003 && mem.opcode == 0x76));

    let memory = memory_with(&[0x00, 0x00, 0x00, 0x76]);
    let mut cpu = Cpu::new();
    assert!(!hooks.should_break(&cpu, &memory));
    cpu.pc = 3;
    assert!(hooks.should_break(&cpu, &memory));

    hooks.detach_all();
    assert!(!hooks.should_break(&cpu, &memory));
}

#[test]
fn test_cpu_state_capture() {
    let mut cpu = Cpu::new();
    cpu.set_bc(0x1234);
    cpu.set_hl(0xBEEF);
    cpu.sp = 0x8000;
    let state = CpuState::capture(&cpu);
    assert_eq!(state.bc, 0x1234);
    assert_eq!(state.hl, 0xBEEF);
    assert_eq!(state.sp, 0x8000);
    assert_eq!(state.af & 0x02, 0x02);
}
