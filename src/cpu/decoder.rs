//! i8080 Opcode Table
//!
//! Every one of the 256 opcodes decodes to an operation, its cycle count
//! in machine cycles (4 clock cycles each on the Vector-06C) and its length.
//! Undocumented encodings decode to the instruction they alias on real
//! hardware: 0x08/0x10/0x18/0x20/0x28/0x30/0x38 are NOP, 0xCB is JMP,
//! 0xD9 is RET and 0xDD/0xED/0xFD are CALL.

pub use crate::cpu::instructions::{AluOp, Condition, Op, OpInfo};

/// Opcode fetched instead of memory when an interrupt is accepted
pub const OPCODE_RST7: u8 = 0xFF;

/// Decoded table, indexed by opcode
pub static OPCODES: [OpInfo; 256] = build_table();

const fn build_table() -> [OpInfo; 256] {
    let mut table = [OpInfo { op: Op::Nop, cycles: 1, cycles_not_taken: 1, len: 1 }; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = decode(i as u8);
        i += 1;
    }
    table
}

/// Decode a single opcode
pub const fn decode(opcode: u8) -> OpInfo {
    let op = decode_op(opcode);
    let cycles = cycles(op);
    OpInfo {
        op,
        cycles,
        cycles_not_taken: cycles_not_taken(op, cycles),
        len: length(op),
    }
}

const fn decode_op(opcode: u8) -> Op {
    let x = opcode >> 6;
    let y = (opcode >> 3) & 0x07;
    let z = opcode & 0x07;
    let p = y >> 1;
    let q = y & 0x01;

    match x {
        0 => decode_group_0(y, z, p, q),
        1 => {
            if y == 6 && z == 6 {
                Op::Hlt
            } else if z == 6 {
                Op::MovFromMem { dst: y }
            } else if y == 6 {
                Op::MovToMem { src: z }
            } else {
                Op::Mov { dst: y, src: z }
            }
        }
        2 => {
            if z == 6 {
                Op::AluMem { op: AluOp::from_bits(y) }
            } else {
                Op::Alu { op: AluOp::from_bits(y), src: z }
            }
        }
        _ => decode_group_3(y, z, p, q),
    }
}

const fn decode_group_0(y: u8, z: u8, p: u8, q: u8) -> Op {
    match z {
        0 => Op::Nop,
        1 => {
            if q == 0 {
                Op::Lxi { rp: p }
            } else {
                Op::Dad { rp: p }
            }
        }
        2 => match (p, q) {
            (0, 0) | (1, 0) => Op::Stax { rp: p },
            (0, 1) | (1, 1) => Op::Ldax { rp: p },
            (2, 0) => Op::Shld,
            (2, 1) => Op::Lhld,
            (3, 0) => Op::Sta,
            _ => Op::Lda,
        },
        3 => {
            if q == 0 {
                Op::Inx { rp: p }
            } else {
                Op::Dcx { rp: p }
            }
        }
        4 => {
            if y == 6 {
                Op::InrMem
            } else {
                Op::Inr { r: y }
            }
        }
        5 => {
            if y == 6 {
                Op::DcrMem
            } else {
                Op::Dcr { r: y }
            }
        }
        6 => {
            if y == 6 {
                Op::MviMem
            } else {
                Op::Mvi { dst: y }
            }
        }
        _ => match y {
            0 => Op::Rlc,
            1 => Op::Rrc,
            2 => Op::Ral,
            3 => Op::Rar,
            4 => Op::Daa,
            5 => Op::Cma,
            6 => Op::Stc,
            _ => Op::Cmc,
        },
    }
}

const fn decode_group_3(y: u8, z: u8, p: u8, q: u8) -> Op {
    match z {
        0 => Op::Ret { cond: Condition::from_bits(y) },
        1 => {
            if q == 0 {
                Op::Pop { rp: p }
            } else {
                match p {
                    0 | 1 => Op::Ret { cond: Condition::Always },
                    2 => Op::Pchl,
                    _ => Op::Sphl,
                }
            }
        }
        2 => Op::Jmp { cond: Condition::from_bits(y) },
        3 => match y {
            0 | 1 => Op::Jmp { cond: Condition::Always },
            2 => Op::Out,
            3 => Op::In,
            4 => Op::Xthl,
            5 => Op::Xchg,
            6 => Op::Di,
            _ => Op::Ei,
        },
        4 => Op::Call { cond: Condition::from_bits(y) },
        5 => {
            if q == 0 {
                Op::Push { rp: p }
            } else {
                // 0xCD and its aliases 0xDD, 0xED, 0xFD
                Op::Call { cond: Condition::Always }
            }
        }
        6 => Op::AluImm { op: AluOp::from_bits(y) },
        _ => Op::Rst { n: y },
    }
}

const fn cycles(op: Op) -> u8 {
    match op {
        Op::Nop
        | Op::Xchg
        | Op::Alu { .. }
        | Op::Daa
        | Op::Cma
        | Op::Stc
        | Op::Cmc
        | Op::Rlc
        | Op::Rrc
        | Op::Ral
        | Op::Rar
        | Op::Ei
        | Op::Di => 1,
        Op::Mov { .. }
        | Op::MovFromMem { .. }
        | Op::MovToMem { .. }
        | Op::Mvi { .. }
        | Op::Ldax { .. }
        | Op::Stax { .. }
        | Op::Sphl
        | Op::Pchl
        | Op::AluMem { .. }
        | Op::AluImm { .. }
        | Op::Inr { .. }
        | Op::Dcr { .. }
        | Op::Inx { .. }
        | Op::Dcx { .. }
        | Op::Hlt => 2,
        Op::MviMem
        | Op::Lxi { .. }
        | Op::InrMem
        | Op::DcrMem
        | Op::Dad { .. }
        | Op::Jmp { .. }
        | Op::Pop { .. }
        | Op::In
        | Op::Out => 3,
        Op::Lda | Op::Sta | Op::Push { .. } | Op::Rst { .. } => 4,
        Op::Ret { cond: Condition::Always } => 3,
        Op::Ret { .. } => 4,
        Op::Lhld | Op::Shld => 5,
        Op::Xthl | Op::Call { .. } => 6,
    }
}

const fn cycles_not_taken(op: Op, cycles: u8) -> u8 {
    match op {
        Op::Call { cond } if !matches!(cond, Condition::Always) => 4,
        Op::Ret { cond } if !matches!(cond, Condition::Always) => 2,
        _ => cycles,
    }
}

const fn length(op: Op) -> u8 {
    match op {
        Op::Lxi { .. }
        | Op::Lda
        | Op::Sta
        | Op::Lhld
        | Op::Shld
        | Op::Jmp { .. }
        | Op::Call { .. } => 3,
        Op::Mvi { .. } | Op::MviMem | Op::AluImm { .. } | Op::In | Op::Out => 2,
        _ => 1,
    }
}
