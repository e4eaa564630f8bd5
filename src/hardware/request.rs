//! Request/response protocol of the emulation thread
//!
//! Every `Request` is answered by exactly one `Response`. Requests are
//! handled between instructions, so state read back is always at an
//! instruction boundary.
//!
//! Requests can also be built from JSON, `{"req": "GetByte", "data":
//! {"addr": 256, "space": "Ram"}}`. Tags this machine does not know become
//! `Request::Unknown` and are answered with `Response::Empty`.

use crate::debugger::CpuState;
use crate::io::{DisplayMode, Ports};
use crate::loader::LoadError;
use crate::memory::{AddrSpace, GlobalAddr, MemType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Emulation speed relative to a real machine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecSpeed {
    Percent1,
    Percent20,
    Percent50,
    #[default]
    Percent100,
    Percent200,
    /// As fast as the host allows
    Max,
}

impl ExecSpeed {
    /// Wall-clock budget of one frame
    pub fn frame_delay(self) -> Duration {
        let us = match self {
            ExecSpeed::Percent1 => 1_996_800,
            ExecSpeed::Percent20 => 99_840,
            ExecSpeed::Percent50 => 39_936,
            ExecSpeed::Percent100 => 19_968,
            ExecSpeed::Percent200 => 9_984,
            ExecSpeed::Max => 10,
        };
        Duration::from_micros(us)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "req", content = "data")]
pub enum Request {
    // run control
    Run,
    Stop,
    IsRunning,
    /// Terminate the emulation thread
    Exit,
    /// Power-on reset of memory, ports, display and CPU
    Reset,
    /// CPU reset with the ROM overlay switched off
    Restart,
    ExecuteInstr,
    /// Run to the next frame boundary, the break check is not consulted
    ExecuteFrameNoBreaks,
    SetCpuSpeed { speed: ExecSpeed },

    // inspection
    GetCc,
    GetRegs,
    GetRegPc,
    /// Where a step over the current instruction ends
    GetStepOverAddr,
    GetByte { addr: u32, space: AddrSpace },
    GetWord { addr: u16, space: AddrSpace },
    GetGlobalAddr { addr: u32, space: AddrSpace },
    GetRasterPos,
    GetBankState,
    GetPalette,
    GetScrollVert,
    GetIoPorts,
    GetPortsInData,
    GetPortsOutData,
    GetDisplayMode,
    IsRomEnabled,
    /// Copy of the frame being drawn
    GetLiveFrame,
    /// Combined JSON dump of all components
    GetState,

    // mutation
    /// Copy bytes into physical memory, rejected whole if they do not fit
    SetMem { addr: GlobalAddr, data: Vec<u8> },
    /// Copy a program into RAM, rejected whole if it does not fit
    LoadRom { addr: GlobalAddr, data: Vec<u8> },
    KeyHandling { row: u8, column: u8, pressed: bool },

    #[serde(skip)]
    Unknown(String),
}

impl Request {
    /// Parse a `{"req": tag, "data": payload}` object
    pub fn from_json(value: &Value) -> Self {
        match serde_json::from_value::<Request>(value.clone()) {
            Ok(req) => req,
            Err(_) => {
                let tag = value
                    .get("req")
                    .and_then(Value::as_str)
                    .unwrap_or("<malformed>");
                Request::Unknown(tag.to_string())
            }
        }
    }
}

#[derive(Debug)]
pub enum Response {
    /// Requests with nothing to report
    Empty,
    Bool(bool),
    Cc(u64),
    Regs { regs: CpuState, m: u8 },
    Addr(u16),
    GlobalAddr(GlobalAddr),
    Byte(u8),
    Word(u16),
    RasterPos { line: usize, pixel: usize, frame_num: u64 },
    BankState { bank_switch: u8, mem_type: MemType },
    Palette([u8; crate::io::PALETTE_LEN]),
    Scroll(u8),
    IoPorts(Ports),
    PortsData(Vec<u8>),
    DisplayMode(DisplayMode),
    Frame(Vec<u32>),
    State(Value),
    Loaded(Result<usize, LoadError>),
}
