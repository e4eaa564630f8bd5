//! i8080 instruction representation

/// Register index as encoded in opcode bits (B C D E H L M A)
pub mod reg {
    pub const B: u8 = 0;
    pub const C: u8 = 1;
    pub const D: u8 = 2;
    pub const E: u8 = 3;
    pub const H: u8 = 4;
    pub const L: u8 = 5;
    pub const M: u8 = 6;
    pub const A: u8 = 7;
}

/// Register pair index (BC DE HL SP, or PSW for PUSH/POP)
pub mod rp {
    pub const BC: u8 = 0;
    pub const DE: u8 = 1;
    pub const HL: u8 = 2;
    pub const SP: u8 = 3;
    pub const PSW: u8 = 3;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbb,
    Ana,
    Xra,
    Ora,
    Cmp,
}

impl AluOp {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => AluOp::Add,
            1 => AluOp::Adc,
            2 => AluOp::Sub,
            3 => AluOp::Sbb,
            4 => AluOp::Ana,
            5 => AluOp::Xra,
            6 => AluOp::Ora,
            _ => AluOp::Cmp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Always,
    NotZero,
    Zero,
    NoCarry,
    Carry,
    ParityOdd,
    ParityEven,
    Plus,
    Minus,
}

impl Condition {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Condition::NotZero,
            1 => Condition::Zero,
            2 => Condition::NoCarry,
            3 => Condition::Carry,
            4 => Condition::ParityOdd,
            5 => Condition::ParityEven,
            6 => Condition::Plus,
            _ => Condition::Minus,
        }
    }
}

/// Operation plus its addressing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Nop,
    /// MOV r,r
    Mov { dst: u8, src: u8 },
    /// MOV r,M
    MovFromMem { dst: u8 },
    /// MOV M,r
    MovToMem { src: u8 },
    Mvi { dst: u8 },
    MviMem,
    Lxi { rp: u8 },
    Lda,
    Sta,
    Lhld,
    Shld,
    Ldax { rp: u8 },
    Stax { rp: u8 },
    Xchg,
    Xthl,
    Sphl,
    Pchl,
    Alu { op: AluOp, src: u8 },
    AluMem { op: AluOp },
    AluImm { op: AluOp },
    Inr { r: u8 },
    InrMem,
    Dcr { r: u8 },
    DcrMem,
    Inx { rp: u8 },
    Dcx { rp: u8 },
    Dad { rp: u8 },
    Daa,
    Cma,
    Stc,
    Cmc,
    Rlc,
    Rrc,
    Ral,
    Rar,
    Jmp { cond: Condition },
    Call { cond: Condition },
    Ret { cond: Condition },
    Rst { n: u8 },
    Push { rp: u8 },
    Pop { rp: u8 },
    In,
    Out,
    Ei,
    Di,
    Hlt,
}

/// Opcode table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpInfo {
    pub op: Op,
    /// Machine cycles when a condition holds (or for unconditional ops)
    pub cycles: u8,
    /// Machine cycles of a conditional CALL/RET that is not taken
    pub cycles_not_taken: u8,
    /// Instruction length in bytes
    pub len: u8,
}
