//! Debugger support
//!
//! State dumps for every emulated component and the hook slots a debugger
//! front end attaches to the running machine.

use serde_json::Value;

pub mod hooks;

#[cfg(test)]
mod tests_hooks;

pub use hooks::{
    AccessObserver, BreakCheck, CpuState, DebugHooks, FetchObserver, HookSlot, HookedMemory,
    MemState,
};

/// A trait for components that can be debugged.
pub trait Debuggable {
    /// Reads the component's state and returns it as a JSON value.
    fn read_state(&self) -> Value;

    /// Writes the component's state from a JSON value.
    fn write_state(&mut self, state: &Value);
}
