#![no_main]

use devector::display::FRAME_LEN;
use devector::hardware::Board;
use libfuzzer_sys::fuzz_target;

/// First bytes set up the CPU, the rest is the program at 0
fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let mut board = Board::new();
    board.memory.restart();

    let initial_a = data[0];
    let initial_sp = u16::from_le_bytes([data[1], data[2]]);
    let program = &data[3..];
    let copy_len = program.len().min(0x8000);
    board.memory.set_ram(0, &program[..copy_len]);

    board.cpu.a = initial_a;
    board.cpu.sp = initial_sp;

    // enough instructions to cross a frame boundary
    for _ in 0..20_000 {
        board.execute_instruction();
    }

    assert!(board.display.framebuffer_idx < FRAME_LEN);
    assert!(board.cpu.is_instruction_executed());
});
