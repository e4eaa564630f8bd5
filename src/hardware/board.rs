//! The machine itself: CPU, memory, ports and display stepped in lockstep
//!
//! Each machine cycle the display draws its 16 pixels first, then the CPU
//! runs one machine cycle with the display's interrupt line.

use crate::cpu::decoder::OPCODES;
use crate::cpu::instructions::{Condition, Op};
use crate::cpu::Cpu;
use crate::debugger::{DebugHooks, Debuggable, HookedMemory};
use crate::display::Display;
use crate::io::Io;
use crate::memory::{AddrSpace, Memory};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug)]
pub struct Board {
    pub cpu: Cpu,
    pub memory: Memory,
    pub io: Io,
    pub display: Display,
    hooks: Arc<DebugHooks>,
}

impl Board {
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            memory: Memory::new(),
            io: Io::new(),
            display: Display::new(),
            hooks: Arc::new(DebugHooks::new()),
        }
    }

    pub fn hooks(&self) -> &Arc<DebugHooks> {
        &self.hooks
    }

    /// Power-on: RAM cleared, ROM overlay on, ports and CPU registers
    /// reinitialized
    pub fn reset(&mut self) {
        self.memory.reset();
        self.display.reset();
        self.io.reset();
        self.cpu.init();
    }

    /// Soft reboot: CPU reset, execution continues from RAM
    pub fn restart(&mut self) {
        self.cpu.reset();
        self.memory.restart();
    }

    /// Run one instruction without consulting the break check
    pub fn step_instruction(&mut self) {
        loop {
            self.display.rasterize(&mut self.memory, &mut self.io);
            let mut memory = HookedMemory::new(&mut self.memory, &self.hooks);
            self.cpu
                .execute_machine_cycle(self.display.irq, &mut memory, &mut self.io);
            if self.cpu.is_instruction_executed() {
                break;
            }
        }
    }

    /// Run one instruction. Returns true if the break check asks to stop.
    pub fn execute_instruction(&mut self) -> bool {
        self.step_instruction();
        self.hooks.should_break(&self.cpu, &self.memory)
    }

    /// Run instructions until the frame counter moves. Stops early and
    /// returns true on a break.
    pub fn execute_frame(&mut self) -> bool {
        let frame_num = self.display.frame_num;
        while self.display.frame_num == frame_num {
            if self.execute_instruction() {
                return true;
            }
        }
        false
    }

    /// Run to the next frame boundary ignoring the break check
    pub fn execute_frame_no_breaks(&mut self) {
        let frame_num = self.display.frame_num;
        while self.display.frame_num == frame_num {
            self.step_instruction();
        }
    }

    /// Address the CPU stops at when stepping over the next instruction.
    /// Calls and restarts are stepped over, jumps and returns followed.
    pub fn step_over_addr(&self) -> u16 {
        let pc = self.cpu.pc;
        let opcode = self.memory.get_byte(pc as u32, AddrSpace::Ram);
        let info = &OPCODES[opcode as usize];
        let next_pc = pc.wrapping_add(info.len as u16);
        let imm = self.memory.get_word(pc.wrapping_add(1), AddrSpace::Ram);
        let ret_addr = self.memory.get_word(self.cpu.sp, AddrSpace::Stack);

        match info.op {
            Op::Jmp { cond } => self.taken(cond, imm, next_pc),
            Op::Ret { cond } => self.taken(cond, ret_addr, next_pc),
            Op::Pchl => self.cpu.hl(),
            _ => next_pc,
        }
    }

    fn taken(&self, cond: Condition, target: u16, next_pc: u16) -> u16 {
        if self.cpu.check_condition(cond) {
            target
        } else {
            next_pc
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Debuggable for Board {
    fn read_state(&self) -> Value {
        json!({
            "cpu": self.cpu.read_state(),
            "memory": self.memory.read_state(),
            "io": self.io.read_state(),
            "display": self.display.read_state(),
        })
    }

    fn write_state(&mut self, state: &Value) {
        if let Some(cpu) = state.get("cpu") {
            self.cpu.write_state(cpu);
        }
        if let Some(memory) = state.get("memory") {
            self.memory.write_state(memory);
        }
        if let Some(io) = state.get("io") {
            self.io.write_state(io);
        }
        if let Some(display) = state.get("display") {
            self.display.write_state(display);
        }
    }
}
