//! Devector - a cycle-accurate Vector-06C emulation core
//!
//! The Intel 8080 CPU, bank-switched memory, the deferred-commit port bus
//! and the raster display are stepped together one machine cycle at a
//! time. `hardware::Hardware` runs the machine on its own thread and is
//! driven through requests and debug hooks.

pub mod cpu;
pub mod debugger;
pub mod display;
pub mod frontend;
pub mod hardware;
pub mod io;
pub mod loader;
pub mod memory;

pub use cpu::Cpu;
pub use display::Display;
pub use hardware::{Board, Hardware, HardwareConfig, Request, Response};
pub use io::Io;
pub use memory::Memory;
