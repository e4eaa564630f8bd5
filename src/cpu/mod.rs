//! Intel 8080 CPU (KR580VM80A) Implementation
//!
//! The Vector-06C stretches every machine cycle to 4 clock cycles of its
//! 3 MHz clock. An instruction is executed as a sequence of separate
//! `execute_machine_cycle` calls; memory and port accesses happen on the
//! exact machine cycle the real chip performs them, so the video hardware
//! can observe memory mid-instruction.
//!
//! The scratch registers (`ir`, `tmp`, `act`, `w`, `z`) and the register
//! file are only consistent between instructions, i.e. when
//! `is_instruction_executed()` returns true.

pub mod decoder;
pub mod instructions;


use crate::debugger::Debuggable;
use crate::memory::{AddrSpace, IoInterface, MemoryInterface};
use decoder::{OPCODES, OPCODE_RST7};
use instructions::{reg, rp, AluOp, Condition, Op};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Clock cycles per machine cycle
pub const MACHINE_CC: u64 = 4;

/// Flag bits in the F register (PSW low byte: S Z 0 AC 0 P 1 C)
pub mod flags {
    pub const CARRY: u8 = 0b0000_0001;      // C
    pub const UNUSED_1: u8 = 0b0000_0010;   // always 1
    pub const PARITY: u8 = 0b0000_0100;     // P
    pub const AUX_CARRY: u8 = 0b0001_0000;  // AC
    pub const ZERO: u8 = 0b0100_0000;       // Z
    pub const SIGN: u8 = 0b1000_0000;       // S
    pub const MASK: u8 = CARRY | PARITY | AUX_CARRY | ZERO | SIGN;
}

/// Interrupt/machine-cycle status packed as in register dumps
pub mod ints {
    pub const MC_MASK: u8 = 0x0F;
    pub const INTE: u8 = 0x10;
    pub const IFF: u8 = 0x20;
    pub const HLTA: u8 = 0x40;
    pub const EI_PENDING: u8 = 0x80;
}

/// Precomputed parity: true when the number of set bits is even
pub static PARITY_TABLE: [bool; 256] = build_parity_table();

const fn build_parity_table() -> [bool; 256] {
    let mut table = [false; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8).count_ones() % 2 == 0;
        i += 1;
    }
    table
}

/// Carry out of bit `bit - 1` into `bit` while computing `a + b + cy`
fn carry_into(bit: u32, a: u8, b: u8, cy: bool) -> bool {
    let result = a as u32 + b as u32 + cy as u32;
    let carry = result ^ a as u32 ^ b as u32;
    carry & (1 << bit) != 0
}

/// i8080 CPU state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cpu {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,

    pub sp: u16,
    pub pc: u16,

    /// Instruction register
    pub ir: u8,
    pub tmp: u8,
    /// Temporary accumulator
    pub act: u8,
    /// Internal address latches
    pub w: u8,
    pub z: u8,

    /// Machine cycle index of the instruction in flight
    pub mc: u8,
    /// Interrupts enabled
    pub inte: bool,
    /// Interrupt request latched
    pub iff: bool,
    /// Halt acknowledged
    pub hlta: bool,
    /// EI delays interrupt acceptance by one instruction
    pub ei_pending: bool,

    /// Clock cycle counter
    pub cc: u64,
}

impl Cpu {
    pub fn new() -> Self {
        let mut cpu = Self {
            a: 0,
            f: flags::UNUSED_1,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            sp: 0,
            pc: 0,
            ir: 0,
            tmp: 0,
            act: 0,
            w: 0,
            z: 0,
            mc: 0,
            inte: false,
            iff: false,
            hlta: false,
            ei_pending: false,
            cc: 0,
        };
        cpu.init();
        cpu
    }

    /// Power-on register values
    pub fn init(&mut self) {
        self.set_bc(1);
        self.set_de(1);
        self.set_hl(1);
        self.set_af(flags::UNUSED_1 as u16);
        self.reset();
    }

    /// Reset the CPU. BC, DE, HL and A keep their values.
    pub fn reset(&mut self) {
        self.cc = 0;
        self.pc = 0;
        self.sp = 0;
        self.ir = 0;
        self.tmp = 0;
        self.act = 0;
        self.w = 0;
        self.z = 0;
        self.mc = 0;
        self.inte = false;
        self.iff = false;
        self.hlta = false;
        self.ei_pending = false;
    }

    // ========== Register pair getters/setters ==========

    pub fn af(&self) -> u16 {
        (self.a as u16) << 8 | self.f as u16
    }

    pub fn set_af(&mut self, val: u16) {
        self.a = (val >> 8) as u8;
        self.f = (val as u8 & flags::MASK) | flags::UNUSED_1;
    }

    pub fn bc(&self) -> u16 {
        (self.b as u16) << 8 | self.c as u16
    }

    pub fn set_bc(&mut self, val: u16) {
        self.b = (val >> 8) as u8;
        self.c = val as u8;
    }

    pub fn de(&self) -> u16 {
        (self.d as u16) << 8 | self.e as u16
    }

    pub fn set_de(&mut self, val: u16) {
        self.d = (val >> 8) as u8;
        self.e = val as u8;
    }

    pub fn hl(&self) -> u16 {
        (self.h as u16) << 8 | self.l as u16
    }

    pub fn set_hl(&mut self, val: u16) {
        self.h = (val >> 8) as u8;
        self.l = val as u8;
    }

    fn wz(&self) -> u16 {
        (self.w as u16) << 8 | self.z as u16
    }

    fn set_wz(&mut self, val: u16) {
        self.w = (val >> 8) as u8;
        self.z = val as u8;
    }

    // ========== Flag helpers ==========

    pub fn get_flag(&self, flag: u8) -> bool {
        (self.f & flag) != 0
    }

    pub fn set_flag(&mut self, flag: u8, value: bool) {
        if value {
            self.f |= flag;
        } else {
            self.f &= !flag;
        }
    }

    fn set_zsp(&mut self, value: u8) {
        self.set_flag(flags::ZERO, value == 0);
        self.set_flag(flags::SIGN, value & 0x80 != 0);
        self.set_flag(flags::PARITY, PARITY_TABLE[value as usize]);
    }

    /// Packed interrupt status, see [`ints`]
    pub fn ints(&self) -> u8 {
        (self.mc & ints::MC_MASK)
            | if self.inte { ints::INTE } else { 0 }
            | if self.iff { ints::IFF } else { 0 }
            | if self.hlta { ints::HLTA } else { 0 }
            | if self.ei_pending { ints::EI_PENDING } else { 0 }
    }

    /// True between instructions, and on every cycle while halted
    pub fn is_instruction_executed(&self) -> bool {
        self.mc == 0 || self.hlta
    }

    pub fn check_condition(&self, cond: Condition) -> bool {
        match cond {
            Condition::Always => true,
            Condition::NotZero => !self.get_flag(flags::ZERO),
            Condition::Zero => self.get_flag(flags::ZERO),
            Condition::NoCarry => !self.get_flag(flags::CARRY),
            Condition::Carry => self.get_flag(flags::CARRY),
            Condition::ParityOdd => !self.get_flag(flags::PARITY),
            Condition::ParityEven => self.get_flag(flags::PARITY),
            Condition::Plus => !self.get_flag(flags::SIGN),
            Condition::Minus => self.get_flag(flags::SIGN),
        }
    }

    // ========== Register access by index ==========

    fn get_reg(&self, index: u8) -> u8 {
        match index {
            reg::B => self.b,
            reg::C => self.c,
            reg::D => self.d,
            reg::E => self.e,
            reg::H => self.h,
            reg::L => self.l,
            reg::A => self.a,
            _ => 0,
        }
    }

    fn set_reg(&mut self, index: u8, value: u8) {
        match index {
            reg::B => self.b = value,
            reg::C => self.c = value,
            reg::D => self.d = value,
            reg::E => self.e = value,
            reg::H => self.h = value,
            reg::L => self.l = value,
            reg::A => self.a = value,
            _ => {}
        }
    }

    fn get_rp(&self, index: u8) -> u16 {
        match index {
            rp::BC => self.bc(),
            rp::DE => self.de(),
            rp::HL => self.hl(),
            _ => self.sp,
        }
    }

    fn set_rp(&mut self, index: u8, value: u16) {
        match index {
            rp::BC => self.set_bc(value),
            rp::DE => self.set_de(value),
            rp::HL => self.set_hl(value),
            _ => self.sp = value,
        }
    }

    /// Register pair for PUSH/POP, index 3 is PSW
    fn get_rp2(&self, index: u8) -> (u8, u8) {
        match index {
            rp::BC => (self.b, self.c),
            rp::DE => (self.d, self.e),
            rp::HL => (self.h, self.l),
            _ => (self.a, self.f),
        }
    }

    fn set_rp2_low(&mut self, index: u8, value: u8) {
        match index {
            rp::BC => self.c = value,
            rp::DE => self.e = value,
            rp::HL => self.l = value,
            _ => self.f = (value & flags::MASK) | flags::UNUSED_1,
        }
    }

    fn set_rp2_high(&mut self, index: u8, value: u8) {
        match index {
            rp::BC => self.b = value,
            rp::DE => self.d = value,
            rp::HL => self.h = value,
            _ => self.a = value,
        }
    }

    // ========== Memory access helpers ==========

    fn read_byte_move_pc<M: MemoryInterface>(&mut self, mem: &mut M) -> u8 {
        let value = mem.read_byte(self.pc, AddrSpace::Ram);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    fn read_instr_move_pc<M: MemoryInterface>(&mut self, mem: &mut M) -> u8 {
        let opcode = mem.read_instr(self.pc);
        self.pc = self.pc.wrapping_add(1);
        opcode
    }

    // ========== ALU operations ==========

    fn add(&mut self, a: u8, b: u8, cy: bool) {
        self.a = a.wrapping_add(b).wrapping_add(cy as u8);
        self.set_flag(flags::CARRY, carry_into(8, a, b, cy));
        self.set_flag(flags::AUX_CARRY, carry_into(4, a, b, cy));
        self.set_zsp(self.a);
    }

    fn sub(&mut self, a: u8, b: u8, cy: bool) {
        self.add(a, !b, !cy);
        let carry = self.get_flag(flags::CARRY);
        self.set_flag(flags::CARRY, !carry);
    }

    fn cmp(&mut self, a: u8, b: u8) {
        let result = (a as u16).wrapping_sub(b as u16);
        let low = result as u8;
        self.set_flag(flags::CARRY, result >> 8 & 1 != 0);
        self.set_flag(flags::AUX_CARRY, !(a ^ low ^ b) & 0x10 == 0x10);
        self.set_zsp(low);
    }

    /// Applies an ALU op to `act` and `tmp`, result lands in A
    fn alu(&mut self, op: AluOp) {
        let (act, tmp) = (self.act, self.tmp);
        let carry = self.get_flag(flags::CARRY);
        match op {
            AluOp::Add => self.add(act, tmp, false),
            AluOp::Adc => self.add(act, tmp, carry),
            AluOp::Sub => self.sub(act, tmp, false),
            AluOp::Sbb => self.sub(act, tmp, carry),
            AluOp::Ana => {
                self.a = act & tmp;
                self.set_flag(flags::CARRY, false);
                self.set_flag(flags::AUX_CARRY, (act | tmp) & 0x08 != 0);
                self.set_zsp(self.a);
            }
            AluOp::Xra => {
                self.a = act ^ tmp;
                self.set_flag(flags::CARRY, false);
                self.set_flag(flags::AUX_CARRY, false);
                self.set_zsp(self.a);
            }
            AluOp::Ora => {
                self.a = act | tmp;
                self.set_flag(flags::CARRY, false);
                self.set_flag(flags::AUX_CARRY, false);
                self.set_zsp(self.a);
            }
            AluOp::Cmp => self.cmp(act, tmp),
        }
    }

    fn inr(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.set_flag(flags::AUX_CARRY, result & 0x0F == 0);
        self.set_zsp(result);
        result
    }

    fn dcr(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.set_flag(flags::AUX_CARRY, result & 0x0F != 0x0F);
        self.set_zsp(result);
        result
    }

    fn daa(&mut self) {
        let mut cy = self.get_flag(flags::CARRY);
        let mut correction = 0u8;
        let lsb = self.a & 0x0F;
        let msb = self.a >> 4;

        if self.get_flag(flags::AUX_CARRY) || lsb > 9 {
            correction += 0x06;
        }
        if cy || msb > 9 || (msb >= 9 && lsb > 9) {
            correction += 0x60;
            cy = true;
        }
        self.add(self.a, correction, false);
        self.set_flag(flags::CARRY, cy);
    }

    fn rlc(&mut self) {
        let carry = self.a & 0x80 != 0;
        self.a = self.a.rotate_left(1);
        self.set_flag(flags::CARRY, carry);
    }

    fn rrc(&mut self) {
        let carry = self.a & 0x01 != 0;
        self.a = self.a.rotate_right(1);
        self.set_flag(flags::CARRY, carry);
    }

    fn ral(&mut self) {
        let old_carry = self.get_flag(flags::CARRY) as u8;
        let carry = self.a & 0x80 != 0;
        self.a = self.a << 1 | old_carry;
        self.set_flag(flags::CARRY, carry);
    }

    fn rar(&mut self) {
        let old_carry = self.get_flag(flags::CARRY) as u8;
        let carry = self.a & 0x01 != 0;
        self.a = self.a >> 1 | old_carry << 7;
        self.set_flag(flags::CARRY, carry);
    }

    // ========== Main execution ==========

    /// Execute one machine cycle (4 clock cycles) of the instruction in
    /// flight. The interrupt line is latched every cycle but only accepted
    /// at an instruction boundary.
    pub fn execute_machine_cycle<M, I>(&mut self, irq: bool, mem: &mut M, io: &mut I)
    where
        M: MemoryInterface,
        I: IoInterface,
    {
        self.iff |= irq && self.inte;

        if self.mc == 0 {
            if self.iff && !self.ei_pending {
                // interrupt acknowledge: RST 7 is jammed onto the bus
                self.inte = false;
                self.iff = false;
                self.hlta = false;
                self.ir = OPCODE_RST7;
            } else {
                self.ei_pending = false;
                self.ir = self.read_instr_move_pc(mem);
            }
        }

        let info = &OPCODES[self.ir as usize];
        self.step(info.op, mem, io);

        self.mc = self.mc.wrapping_add(1) % info.cycles;
        self.cc += MACHINE_CC;
    }

    /// Run machine cycles until the current instruction retires.
    /// Returns the number of clock cycles spent.
    pub fn execute_instruction<M, I>(&mut self, mem: &mut M, io: &mut I) -> u64
    where
        M: MemoryInterface,
        I: IoInterface,
    {
        let start = self.cc;
        loop {
            self.execute_machine_cycle(false, mem, io);
            if self.is_instruction_executed() {
                return self.cc - start;
            }
        }
    }

    /// One step of the instruction state machine, keyed by `self.mc`
    fn step<M, I>(&mut self, op: Op, mem: &mut M, io: &mut I)
    where
        M: MemoryInterface,
        I: IoInterface,
    {
        let mc = self.mc;
        match op {
            Op::Nop => {}

            Op::Mov { dst, src } => match mc {
                0 => self.tmp = self.get_reg(src),
                _ => self.set_reg(dst, self.tmp),
            },
            Op::MovFromMem { dst } => {
                if mc == 1 {
                    let value = mem.read_byte(self.hl(), AddrSpace::Ram);
                    self.set_reg(dst, value);
                }
            }
            Op::MovToMem { src } => match mc {
                0 => self.tmp = self.get_reg(src),
                _ => mem.write_byte(self.hl(), self.tmp, AddrSpace::Ram),
            },
            Op::Mvi { dst } => {
                if mc == 1 {
                    let value = self.read_byte_move_pc(mem);
                    self.set_reg(dst, value);
                }
            }
            Op::MviMem => match mc {
                1 => self.tmp = self.read_byte_move_pc(mem),
                2 => mem.write_byte(self.hl(), self.tmp, AddrSpace::Ram),
                _ => {}
            },
            Op::Lxi { rp } => match mc {
                1 => {
                    let low = self.read_byte_move_pc(mem) as u16;
                    let value = self.get_rp(rp) & 0xFF00 | low;
                    self.set_rp(rp, value);
                }
                2 => {
                    let high = self.read_byte_move_pc(mem) as u16;
                    let value = high << 8 | self.get_rp(rp) & 0x00FF;
                    self.set_rp(rp, value);
                }
                _ => {}
            },
            Op::Lda => match mc {
                1 => self.z = self.read_byte_move_pc(mem),
                2 => self.w = self.read_byte_move_pc(mem),
                3 => self.a = mem.read_byte(self.wz(), AddrSpace::Ram),
                _ => {}
            },
            Op::Sta => match mc {
                1 => self.z = self.read_byte_move_pc(mem),
                2 => self.w = self.read_byte_move_pc(mem),
                3 => mem.write_byte(self.wz(), self.a, AddrSpace::Ram),
                _ => {}
            },
            Op::Lhld => match mc {
                1 => self.z = self.read_byte_move_pc(mem),
                2 => self.w = self.read_byte_move_pc(mem),
                3 => {
                    self.l = mem.read_byte(self.wz(), AddrSpace::Ram);
                    self.set_wz(self.wz().wrapping_add(1));
                }
                4 => self.h = mem.read_byte(self.wz(), AddrSpace::Ram),
                _ => {}
            },
            Op::Shld => match mc {
                1 => self.z = self.read_byte_move_pc(mem),
                2 => self.w = self.read_byte_move_pc(mem),
                3 => {
                    mem.write_byte(self.wz(), self.l, AddrSpace::Ram);
                    self.set_wz(self.wz().wrapping_add(1));
                }
                4 => mem.write_byte(self.wz(), self.h, AddrSpace::Ram),
                _ => {}
            },
            Op::Ldax { rp } => {
                if mc == 1 {
                    self.a = mem.read_byte(self.get_rp(rp), AddrSpace::Ram);
                }
            }
            Op::Stax { rp } => {
                if mc == 1 {
                    mem.write_byte(self.get_rp(rp), self.a, AddrSpace::Ram);
                }
            }
            Op::Xchg => {
                std::mem::swap(&mut self.d, &mut self.h);
                std::mem::swap(&mut self.e, &mut self.l);
            }
            Op::Xthl => match mc {
                1 => self.z = mem.read_byte(self.sp, AddrSpace::Stack),
                2 => self.w = mem.read_byte(self.sp.wrapping_add(1), AddrSpace::Stack),
                3 => mem.write_byte(self.sp, self.l, AddrSpace::Stack),
                4 => mem.write_byte(self.sp.wrapping_add(1), self.h, AddrSpace::Stack),
                5 => {
                    self.h = self.w;
                    self.l = self.z;
                }
                _ => {}
            },
            Op::Sphl => {
                if mc == 1 {
                    self.sp = self.hl();
                }
            }
            Op::Pchl => {
                if mc == 1 {
                    self.pc = self.hl();
                }
            }

            Op::Alu { op, src } => {
                self.act = self.a;
                self.tmp = self.get_reg(src);
                self.alu(op);
            }
            Op::AluMem { op } => match mc {
                0 => self.act = self.a,
                _ => {
                    self.tmp = mem.read_byte(self.hl(), AddrSpace::Ram);
                    self.alu(op);
                }
            },
            Op::AluImm { op } => match mc {
                0 => self.act = self.a,
                _ => {
                    self.tmp = self.read_byte_move_pc(mem);
                    self.alu(op);
                }
            },
            Op::Inr { r } => match mc {
                0 => self.tmp = self.inr(self.get_reg(r)),
                _ => self.set_reg(r, self.tmp),
            },
            Op::InrMem => match mc {
                1 => {
                    let value = mem.read_byte(self.hl(), AddrSpace::Ram);
                    self.tmp = self.inr(value);
                }
                2 => mem.write_byte(self.hl(), self.tmp, AddrSpace::Ram),
                _ => {}
            },
            Op::Dcr { r } => match mc {
                0 => self.tmp = self.dcr(self.get_reg(r)),
                _ => self.set_reg(r, self.tmp),
            },
            Op::DcrMem => match mc {
                1 => {
                    let value = mem.read_byte(self.hl(), AddrSpace::Ram);
                    self.tmp = self.dcr(value);
                }
                2 => mem.write_byte(self.hl(), self.tmp, AddrSpace::Ram),
                _ => {}
            },
            Op::Inx { rp } => match mc {
                0 => self.set_wz(self.get_rp(rp).wrapping_add(1)),
                _ => self.set_rp(rp, self.wz()),
            },
            Op::Dcx { rp } => match mc {
                0 => self.set_wz(self.get_rp(rp).wrapping_sub(1)),
                _ => self.set_rp(rp, self.wz()),
            },
            Op::Dad { rp } => match mc {
                1 => {
                    self.act = self.get_rp(rp) as u8;
                    self.tmp = self.l;
                    let result = self.act as u16 + self.tmp as u16;
                    self.set_flag(flags::CARRY, result > 0xFF);
                    self.l = result as u8;
                }
                2 => {
                    self.act = (self.get_rp(rp) >> 8) as u8;
                    self.tmp = self.h;
                    let carry = self.get_flag(flags::CARRY) as u16;
                    let result = self.act as u16 + self.tmp as u16 + carry;
                    self.set_flag(flags::CARRY, result > 0xFF);
                    self.h = result as u8;
                }
                _ => {}
            },
            Op::Daa => self.daa(),
            Op::Cma => self.a = !self.a,
            Op::Stc => self.set_flag(flags::CARRY, true),
            Op::Cmc => {
                let carry = self.get_flag(flags::CARRY);
                self.set_flag(flags::CARRY, !carry);
            }
            Op::Rlc => self.rlc(),
            Op::Rrc => self.rrc(),
            Op::Ral => self.ral(),
            Op::Rar => self.rar(),

            Op::Jmp { cond } => match mc {
                1 => self.z = self.read_byte_move_pc(mem),
                2 => {
                    self.w = self.read_byte_move_pc(mem);
                    if self.check_condition(cond) {
                        self.pc = self.wz();
                    }
                }
                _ => {}
            },
            Op::Call { cond } => {
                let taken = self.check_condition(cond);
                match mc {
                    0 => {
                        if taken {
                            self.sp = self.sp.wrapping_sub(1);
                        }
                    }
                    1 => self.z = self.read_byte_move_pc(mem),
                    2 => self.w = self.read_byte_move_pc(mem),
                    3 => {
                        if taken {
                            mem.write_byte(self.sp, (self.pc >> 8) as u8, AddrSpace::Stack);
                            self.sp = self.sp.wrapping_sub(1);
                        } else {
                            // not taken: the instruction ends here
                            self.mc = 5;
                        }
                    }
                    4 => mem.write_byte(self.sp, self.pc as u8, AddrSpace::Stack),
                    5 => self.pc = self.wz(),
                    _ => {}
                }
            }
            Op::Ret { cond: Condition::Always } => match mc {
                1 => {
                    self.z = mem.read_byte(self.sp, AddrSpace::Stack);
                    self.sp = self.sp.wrapping_add(1);
                }
                2 => {
                    self.w = mem.read_byte(self.sp, AddrSpace::Stack);
                    self.sp = self.sp.wrapping_add(1);
                    self.pc = self.wz();
                }
                _ => {}
            },
            Op::Ret { cond } => match mc {
                1 => {
                    if !self.check_condition(cond) {
                        self.mc = 3;
                    }
                }
                2 => {
                    self.z = mem.read_byte(self.sp, AddrSpace::Stack);
                    self.sp = self.sp.wrapping_add(1);
                }
                3 => {
                    self.w = mem.read_byte(self.sp, AddrSpace::Stack);
                    self.sp = self.sp.wrapping_add(1);
                    self.pc = self.wz();
                }
                _ => {}
            },
            Op::Rst { n } => match mc {
                0 => self.sp = self.sp.wrapping_sub(1),
                1 => {
                    mem.write_byte(self.sp, (self.pc >> 8) as u8, AddrSpace::Stack);
                    self.sp = self.sp.wrapping_sub(1);
                }
                2 => {
                    self.w = 0;
                    self.z = n << 3;
                    mem.write_byte(self.sp, self.pc as u8, AddrSpace::Stack);
                }
                3 => self.pc = self.wz(),
                _ => {}
            },
            Op::Push { rp } => match mc {
                0 | 2 => self.sp = self.sp.wrapping_sub(1),
                1 => {
                    let (high, _) = self.get_rp2(rp);
                    mem.write_byte(self.sp, high, AddrSpace::Stack);
                }
                3 => {
                    let (_, low) = self.get_rp2(rp);
                    mem.write_byte(self.sp, low, AddrSpace::Stack);
                }
                _ => {}
            },
            Op::Pop { rp } => match mc {
                1 => {
                    let value = mem.read_byte(self.sp, AddrSpace::Stack);
                    self.set_rp2_low(rp, value);
                    self.sp = self.sp.wrapping_add(1);
                }
                2 => {
                    let value = mem.read_byte(self.sp, AddrSpace::Stack);
                    self.set_rp2_high(rp, value);
                    self.sp = self.sp.wrapping_add(1);
                }
                _ => {}
            },

            Op::In => match mc {
                1 => {
                    self.w = 0;
                    self.z = self.read_byte_move_pc(mem);
                }
                2 => self.a = io.port_in(self.z),
                _ => {}
            },
            Op::Out => match mc {
                1 => {
                    self.w = 0;
                    self.z = self.read_byte_move_pc(mem);
                }
                2 => io.port_out(self.z, self.a),
                _ => {}
            },
            Op::Ei => {
                self.inte = true;
                self.ei_pending = true;
            }
            Op::Di => self.inte = false,
            Op::Hlt => match mc {
                0 => self.pc = self.pc.wrapping_sub(1),
                _ => {
                    self.read_instr_move_pc(mem);
                    // loop on the second cycle until an interrupt arrives
                    if !self.iff {
                        self.hlta = true;
                        self.mc -= 1;
                        self.pc = self.pc.wrapping_sub(1);
                    }
                }
            },
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Debuggable for Cpu {
    fn read_state(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn write_state(&mut self, state: &Value) {
        match serde_json::from_value::<Cpu>(state.clone()) {
            Ok(mut cpu) => {
                if cpu.mc >= OPCODES[cpu.ir as usize].cycles {
                    log::warn!("cpu state: machine cycle {} out of range", cpu.mc);
                    cpu.mc = 0;
                }
                *self = cpu;
            }
            Err(e) => log::warn!("cpu state rejected: {}", e),
        }
    }
}
