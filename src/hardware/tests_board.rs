use super::*;
use crate::debugger::{CpuState, MemState};
use crate::display::{FRAME_MACHINE_CYCLES, RASTERIZED_PXLS_MAX};
use crate::memory::{AddrSpace, MemType};

fn board_with(program: &[u8]) -> Board {
    let mut board = Board::new();
    board.memory.restart();
    board.memory.set_ram(0, program);
    board
}

#[test]
fn test_display_advances_with_every_machine_cycle() {
    // NOP is one machine cycle, LXI three
    let mut board = board_with(&[0x00, 0x21, 0x34, 0x12]);
    board.execute_instruction();
    assert_eq!(board.display.framebuffer_idx, RASTERIZED_PXLS_MAX);
    board.execute_instruction();
    assert_eq!(board.display.framebuffer_idx, 4 * RASTERIZED_PXLS_MAX);
    assert_eq!(board.cpu.hl(), 0x1234);
    assert_eq!(board.cpu.cc, 16);
}

#[test]
fn test_frame_irq_reaches_cpu() {
    // EI; HLT, the handler at 0x38 halts again
    let mut board = board_with(&[0xFB, 0x76]);
    board.memory.set_ram(0x38, &[0x76]);

    board.execute_frame_no_breaks();
    board.execute_frame_no_breaks();

    assert_eq!(board.cpu.pc, 0x38);
    assert_eq!(board.cpu.sp, 0xFFFE);
    assert_eq!(board.memory.get_word(0xFFFE, AddrSpace::Stack), 0x0002);
    assert!(!board.cpu.inte);
}

#[test]
fn test_frame_no_breaks_ignores_break_check() {
    let mut board = board_with(&[]);
    board
        .hooks()
        .check_break
        .attach(Arc::new(|_: &CpuState, _: &MemState| true));

    // start mid-frame
    for _ in 0..1000 {
        board.execute_instruction();
    }
    let frame = board.display.frame_num;
    board.execute_frame_no_breaks();
    assert_eq!(board.display.frame_num, frame + 1);
    assert!(board.display.framebuffer_idx < RASTERIZED_PXLS_MAX * 4);
}

#[test]
fn test_stepping_skips_break_check() {
    let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut board = board_with(&[]);
    board.hooks().check_break.attach(Arc::new(move |_: &CpuState, _: &MemState| {
        counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        false
    }));

    board.step_instruction();
    board.execute_frame_no_breaks();
    assert_eq!(calls.load(std::sync::atomic::Ordering::Relaxed), 0);

    assert!(!board.execute_instruction());
    assert_eq!(calls.load(std::sync::atomic::Ordering::Relaxed), 1);
}

#[test]
fn test_execute_frame_stops_on_break() {
    let mut board = board_with(&[]);
    board
        .hooks()
        .check_break
        .attach(Arc::new(|cpu: &CpuState, _: &MemState| cpu.pc == 0x0010));

    assert!(board.execute_frame());
    assert_eq!(board.cpu.pc, 0x0010);
    assert_eq!(board.display.frame_num, 0);

    board.hooks().check_break.detach();
    assert!(!board.execute_frame());
    assert_eq!(board.display.frame_num, 1);
}

#[test]
fn test_frame_of_nops() {
    let mut board = board_with(&[]);
    board.execute_frame_no_breaks();
    assert_eq!(board.cpu.cc, FRAME_MACHINE_CYCLES as u64 * 4);
}

#[test]
fn test_reset_is_power_on() {
    let mut board = board_with(&[0x3E, 0x01]);
    board.memory.set_bank_switch(0x20);
    board.io.palette[3] = 0x55;
    board.execute_instruction();
    board.cpu.set_bc(0xAAAA);

    board.reset();

    assert!(board.memory.is_rom_enabled());
    assert_eq!(board.memory.bank_switch(), 0);
    assert_eq!(board.memory.get_byte(0, AddrSpace::Global), 0);
    assert_eq!(board.io.palette[3], 0);
    assert_eq!(board.cpu.pc, 0);
    assert_eq!(board.cpu.bc(), 1);
    assert_eq!(board.display.framebuffer_idx, 0);
}

#[test]
fn test_restart_keeps_ram() {
    let mut board = Board::new();
    board.memory.set_ram(0x100, &[0xC3]);
    board.cpu.pc = 0x1234;
    board.cpu.set_de(0x4321);

    board.restart();

    assert_eq!(board.cpu.pc, 0);
    assert_eq!(board.cpu.de(), 0x4321);
    assert_eq!(board.memory.mem_type, MemType::Ram);
    assert_eq!(board.memory.get_byte(0x100, AddrSpace::Ram), 0xC3);
}

#[test]
fn test_step_over_addr() {
    let mut board = board_with(&[]);
    board.cpu.sp = 0x7000;
    board.memory.set_ram(0x7000, &[0x78, 0x56]);
    board.cpu.set_hl(0x4444);

    let cases: [(&[u8], u16); 6] = [
        (&[0xC3, 0x34, 0x12], 0x1234), // JMP
        (&[0xCD, 0x34, 0x12], 0x0203), // CALL is stepped over
        (&[0xC9], 0x5678),             // RET
        (&[0xE9], 0x4444),             // PCHL
        (&[0xFF], 0x0201),             // RST 7
        (&[0x3E, 0x00], 0x0202),       // MVI A
    ];
    for (code, expected) in cases {
        board.memory.set_ram(0x200, code);
        board.cpu.pc = 0x200;
        assert_eq!(board.step_over_addr(), expected, "{:02X}", code[0]);
    }

    // JZ follows the zero flag
    board.memory.set_ram(0x200, &[0xCA, 0x00, 0x30]);
    board.cpu.set_flag(crate::cpu::flags::ZERO, false);
    assert_eq!(board.step_over_addr(), 0x0203);
    board.cpu.set_flag(crate::cpu::flags::ZERO, true);
    assert_eq!(board.step_over_addr(), 0x3000);
}

#[test]
fn test_state_dump_has_every_component() {
    let mut board = board_with(&[0x00]);
    board.execute_instruction();
    let state = board.read_state();
    for key in ["cpu", "memory", "io", "display"] {
        assert!(state.get(key).is_some(), "{}", key);
    }
    assert_eq!(state["cpu"]["pc"], 1);

    let mut other = Board::new();
    other.write_state(&state);
    assert_eq!(other.cpu.pc, 1);
    assert_eq!(other.display.framebuffer_idx, RASTERIZED_PXLS_MAX);
}
