//! Vector-06C Execution Scheduler
//!
//! `Hardware` owns the machine on a dedicated thread. Callers talk to it
//! only through a pair of bounded queues (one `Request` in, one `Response`
//! out) and through the debug hook slots; the last complete frame is the
//! only state read directly.
//!
//! ## Worker states
//!
//! | State | Behavior                                                      |
//! |:------|:--------------------------------------------------------------|
//! | Run   | executes frames paced to wall-clock time, polls requests and  |
//! |       | the break check after every instruction                       |
//! | Stop  | blocks on the request queue                                   |
//! | Exit  | leaves the loop after the current instruction                 |

pub mod board;
pub mod queue;
pub mod request;

#[cfg(test)]
mod tests_board;

pub use board::Board;
pub use queue::{BoundedQueue, QUEUE_CAPACITY};
pub use request::{ExecSpeed, Request, Response};

use crate::debugger::{AccessObserver, BreakCheck, CpuState, DebugHooks, Debuggable, FetchObserver};
use crate::display::SharedFrame;
use crate::loader::{self, LoadError};
use crate::memory::AddrSpace;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// How often a waiting caller checks that the worker is still alive
const RESPONSE_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Run,
    Stop,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// Boot ROM image, none boots straight from RAM
    pub boot_rom: Option<PathBuf>,
    pub speed: ExecSpeed,
    /// Start in RUN instead of STOP
    pub start_running: bool,
    /// Entries per queue direction
    pub queue_capacity: usize,
    /// Give up waiting for a response after this many ms, 0 waits forever
    pub request_timeout_ms: u64,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            boot_rom: None,
            speed: ExecSpeed::Percent100,
            start_running: false,
            queue_capacity: QUEUE_CAPACITY,
            request_timeout_ms: 0,
        }
    }
}

impl HardwareConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("no response within {0:?}")]
    Timeout(Duration),
    #[error("emulation thread is gone")]
    Disconnected,
}

#[derive(Debug, Error)]
pub enum HardwareError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("failed to start the emulation thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Handle to the emulation thread
pub struct Hardware {
    reqs: Arc<BoundedQueue<Request>>,
    resps: Arc<BoundedQueue<Response>>,
    hooks: Arc<DebugHooks>,
    frame: SharedFrame,
    /// One request in flight at a time. Counts requests that timed out
    /// and whose responses are still to come.
    caller: Mutex<usize>,
    timeout: Option<Duration>,
    worker: Option<JoinHandle<()>>,
}

impl Hardware {
    /// Build a machine from `config` and start its thread
    pub fn new(config: &HardwareConfig) -> Result<Self, HardwareError> {
        let mut board = Board::new();
        if let Some(path) = &config.boot_rom {
            let rom = loader::read_file(path)?;
            loader::load_boot_rom(&mut board.memory, &rom)?;
            log::info!("boot ROM {} loaded, {} bytes", path.display(), rom.len());
        } else {
            board.memory.restart();
        }
        Self::with_board(board, config)
    }

    /// Start a thread running an already prepared `board`
    pub fn with_board(board: Board, config: &HardwareConfig) -> Result<Self, HardwareError> {
        let reqs = Arc::new(BoundedQueue::new(config.queue_capacity));
        let resps = Arc::new(BoundedQueue::new(config.queue_capacity));
        let hooks = Arc::clone(board.hooks());
        let frame = board.display.shared_frame();

        let status = if config.start_running { Status::Run } else { Status::Stop };
        let worker = Worker {
            board,
            reqs: Arc::clone(&reqs),
            resps: Arc::clone(&resps),
            status,
            speed: config.speed,
        };
        let handle = thread::Builder::new()
            .name("devector-hw".into())
            .spawn(move || worker.execution())?;

        Ok(Self {
            reqs,
            resps,
            hooks,
            frame,
            caller: Mutex::new(0),
            timeout: config.request_timeout(),
            worker: Some(handle),
        })
    }

    /// Send a request and wait for its response
    pub fn request(&self, req: Request) -> Result<Response, RequestError> {
        let mut late = self.caller.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !self.is_alive() {
            return Err(RequestError::Disconnected);
        }
        if self.reqs.push(req).is_some() {
            // the oldest request is gone unanswered, it can only be a late one
            *late = late.saturating_sub(1);
        }

        let start = Instant::now();
        loop {
            let wait = match self.timeout {
                Some(timeout) => {
                    let left = timeout.saturating_sub(start.elapsed());
                    if left.is_zero() {
                        *late += 1;
                        return Err(RequestError::Timeout(timeout));
                    }
                    left.min(RESPONSE_POLL)
                }
                None => RESPONSE_POLL,
            };
            if let Some(resp) = self.resps.pop_timeout(wait) {
                if *late > 0 {
                    *late -= 1;
                    log::debug!("late response dropped");
                    continue;
                }
                return Ok(resp);
            }
            if !self.is_alive() {
                // the worker may have answered right before leaving
                while let Some(resp) = self.resps.try_pop() {
                    if *late > 0 {
                        *late -= 1;
                        continue;
                    }
                    return Ok(resp);
                }
                return Err(RequestError::Disconnected);
            }
        }
    }

    fn is_alive(&self) -> bool {
        self.worker.as_ref().map_or(false, |handle| !handle.is_finished())
    }

    /// Copy of the last complete frame, or of the frame in progress
    pub fn get_frame(&self, want_stable: bool) -> Result<Vec<u32>, RequestError> {
        if want_stable {
            let frame = self.frame.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            return Ok(frame.clone());
        }
        match self.request(Request::GetLiveFrame)? {
            Response::Frame(frame) => Ok(frame),
            _ => Err(RequestError::Disconnected),
        }
    }

    pub fn hooks(&self) -> &DebugHooks {
        &self.hooks
    }

    pub fn attach_check_break(&self, hook: Arc<dyn BreakCheck>) {
        self.hooks.check_break.attach(hook);
    }

    pub fn attach_on_fetch(&self, hook: Arc<dyn FetchObserver>) {
        self.hooks.on_fetch.attach(hook);
    }

    pub fn attach_on_read(&self, hook: Arc<dyn AccessObserver>) {
        self.hooks.on_read.attach(hook);
    }

    pub fn attach_on_write(&self, hook: Arc<dyn AccessObserver>) {
        self.hooks.on_write.attach(hook);
    }

    /// Stop the worker and wait for it
    pub fn exit(&mut self) {
        if let Some(handle) = self.worker.take() {
            self.reqs.push(Request::Exit);
            if handle.join().is_err() {
                log::error!("emulation thread panicked");
            }
        }
    }
}

impl Drop for Hardware {
    fn drop(&mut self) {
        self.exit();
    }
}

/// State owned by the emulation thread
struct Worker {
    board: Board,
    reqs: Arc<BoundedQueue<Request>>,
    resps: Arc<BoundedQueue<Response>>,
    status: Status,
    speed: ExecSpeed,
}

impl Worker {
    fn execution(mut self) {
        log::debug!("emulation thread started");
        while self.status != Status::Exit {
            let start_cc = self.board.cpu.cc;
            let start_frame = self.board.display.frame_num;
            let start_time = Instant::now();
            let mut end_frame_time = Instant::now();

            while self.status == Status::Run {
                let frame_start = Instant::now();
                self.run_frame();

                if self.status == Status::Run {
                    end_frame_time += frame_start.elapsed().max(self.speed.frame_delay());
                    self.wait_until(end_frame_time);
                }
            }

            let elapsed_cc = self.board.cpu.cc.wrapping_sub(start_cc);
            if elapsed_cc > 0 {
                log::info!(
                    "break: elapsed cpu cycles: {}, elapsed frames: {}, elapsed seconds: {:.3}",
                    elapsed_cc,
                    self.board.display.frame_num.wrapping_sub(start_frame),
                    start_time.elapsed().as_secs_f64()
                );
            }

            while self.status == Status::Stop {
                let req = self.reqs.pop();
                self.handle_request(req);
            }
        }
        log::debug!("emulation thread exits");
    }

    /// Execute until the frame counter moves or the status changes
    fn run_frame(&mut self) {
        let frame_num = self.board.display.frame_num;
        while self.status == Status::Run && self.board.display.frame_num == frame_num {
            if self.board.execute_instruction() {
                log::info!("break at {:04X}", self.board.cpu.pc);
                self.status = Status::Stop;
                break;
            }
            if let Some(req) = self.reqs.try_pop() {
                self.handle_request(req);
            }
        }
    }

    /// Serve requests until `deadline`
    fn wait_until(&mut self, deadline: Instant) {
        while self.status == Status::Run {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                break;
            }
            if let Some(req) = self.reqs.pop_timeout(left) {
                self.handle_request(req);
            }
        }
    }

    fn change_status(&mut self, status: Status) -> Response {
        if self.status != status {
            log::debug!("{:?} -> {:?}", self.status, status);
            self.status = status;
        }
        Response::Empty
    }

    fn handle_request(&mut self, req: Request) {
        let resp = self.dispatch(req);
        self.resps.push(resp);
    }

    fn dispatch(&mut self, req: Request) -> Response {
        match req {
            Request::Run => return self.change_status(Status::Run),
            Request::Stop => return self.change_status(Status::Stop),
            Request::Exit => return self.change_status(Status::Exit),
            Request::IsRunning => return Response::Bool(self.status == Status::Run),
            Request::SetCpuSpeed { speed } => {
                log::info!("speed {:?}", speed);
                self.speed = speed;
                return Response::Empty;
            }
            _ => {}
        }

        let board = &mut self.board;
        match req {
            Request::Reset => {
                board.reset();
                Response::Empty
            }
            Request::Restart => {
                board.restart();
                Response::Empty
            }
            Request::ExecuteInstr => {
                board.step_instruction();
                Response::Empty
            }
            Request::ExecuteFrameNoBreaks => {
                board.execute_frame_no_breaks();
                Response::Empty
            }

            Request::GetCc => Response::Cc(board.cpu.cc),
            Request::GetRegs => Response::Regs {
                regs: CpuState::capture(&board.cpu),
                m: board.memory.get_byte(board.cpu.hl() as u32, AddrSpace::Ram),
            },
            Request::GetRegPc => Response::Addr(board.cpu.pc),
            Request::GetStepOverAddr => Response::Addr(board.step_over_addr()),
            Request::GetByte { addr, space } => Response::Byte(board.memory.get_byte(addr, space)),
            Request::GetWord { addr, space } => Response::Word(board.memory.get_word(addr, space)),
            Request::GetGlobalAddr { addr, space } => {
                Response::GlobalAddr(board.memory.global_addr(addr, space))
            }
            Request::GetRasterPos => Response::RasterPos {
                line: board.display.raster_line(),
                pixel: board.display.raster_pixel(),
                frame_num: board.display.frame_num,
            },
            Request::GetBankState => Response::BankState {
                bank_switch: board.memory.bank_switch(),
                mem_type: board.memory.mem_type,
            },
            Request::GetPalette => Response::Palette(board.io.palette),
            Request::GetScrollVert => Response::Scroll(board.display.scroll_idx),
            Request::GetIoPorts => Response::IoPorts(board.io.ports),
            Request::GetPortsInData => Response::PortsData(board.io.ports_in_data.clone()),
            Request::GetPortsOutData => Response::PortsData(board.io.ports_out_data.clone()),
            Request::GetDisplayMode => Response::DisplayMode(board.io.display_mode),
            Request::IsRomEnabled => Response::Bool(board.memory.is_rom_enabled()),
            Request::GetLiveFrame => Response::Frame(board.display.get_frame(false)),
            Request::GetState => Response::State(board.read_state()),

            Request::SetMem { addr, data } => {
                let result = loader::load_ram(&mut board.memory, addr, &data);
                if let Err(e) = &result {
                    log::warn!("memory write rejected: {}", e);
                }
                Response::Loaded(result)
            }
            Request::LoadRom { addr, data } => {
                let result = loader::load_ram(&mut board.memory, addr, &data);
                match &result {
                    Ok(len) => log::info!("loaded {} bytes at {:05X}", len, addr),
                    Err(e) => log::warn!("load rejected: {}", e),
                }
                Response::Loaded(result)
            }
            Request::KeyHandling { row, column, pressed } => {
                board.io.keyboard.set_key(row, column, pressed);
                Response::Empty
            }

            Request::Unknown(tag) => {
                log::warn!("unknown request {}", tag);
                Response::Empty
            }
            // run control, answered above
            _ => Response::Empty,
        }
    }
}
