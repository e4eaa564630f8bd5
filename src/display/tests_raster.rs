use super::*;
use crate::memory::IoInterface;

struct Rig {
    display: Display,
    memory: Memory,
    io: Io,
}

impl Rig {
    fn new() -> Self {
        let mut memory = Memory::new();
        memory.restart();
        Self { display: Display::new(), memory, io: Io::new() }
    }

    fn step(&mut self) -> bool {
        self.display.rasterize(&mut self.memory, &mut self.io);
        self.display.irq
    }

    /// Rasterize until the beam reaches `line`, `pixel`
    fn run_to(&mut self, line: usize, pixel: usize) {
        let target = line * FRAME_W + pixel;
        assert_eq!(target % RASTERIZED_PXLS_MAX, 0);
        while self.display.framebuffer_idx != target {
            self.step();
        }
    }

    fn pixel(&self, line: usize, pixel: usize) -> u32 {
        self.display.frame_buffer[line * FRAME_W + pixel]
    }
}

#[test]
fn test_frame_takes_14976_machine_cycles() {
    let mut rig = Rig::new();
    assert_eq!(FRAME_MACHINE_CYCLES, 14976);
    for _ in 0..FRAME_MACHINE_CYCLES - 1 {
        rig.step();
        assert_eq!(rig.display.frame_num, 0);
    }
    rig.step();
    assert_eq!(rig.display.frame_num, 1);
    assert_eq!(rig.display.framebuffer_idx, 0);
}

#[test]
fn test_one_irq_per_frame() {
    let mut rig = Rig::new();
    let mut irqs = Vec::new();
    for cycle in 0..FRAME_MACHINE_CYCLES * 2 {
        if rig.step() {
            irqs.push(cycle);
        }
    }
    // the cycle drawing pixels 96..112 raises it
    assert_eq!(irqs, vec![6, FRAME_MACHINE_CYCLES + 6]);
}

#[test]
fn test_irq_cleared_next_cycle() {
    let mut rig = Rig::new();
    rig.run_to(0, 96);
    assert!(rig.step());
    assert!(!rig.step());
}

#[test]
fn test_border_uses_palette_entry() {
    let mut rig = Rig::new();
    rig.io.palette[0] = 0x07;
    rig.run_to(100, 0);
    let red = vector_color_to_argb(0x07);
    assert_eq!(rig.pixel(10, 5), red);
    assert_eq!(rig.pixel(50, 700), red);
    assert_eq!(rig.pixel(99, 127), red);
}

#[test]
fn test_256_mode_pixel_decoding() {
    let mut rig = Rig::new();
    // leftmost pixel of the top screen row: plane 8 bit 7 -> color index 8
    rig.memory.set_ram(0x80FF, &[0x80]);
    // third and fourth pixel: planes E and C bit 6 -> color index 3
    rig.memory.set_ram(0xE0FF, &[0x40]);
    rig.memory.set_ram(0xC0FF, &[0x40]);
    rig.io.palette[8] = 0x07;
    rig.io.palette[3] = 0x38;
    rig.io.palette[0] = 0xC0;

    rig.run_to(SCAN_ACTIVE_AREA_TOP + 1, 0);
    let top = SCAN_ACTIVE_AREA_TOP;
    assert_eq!(rig.pixel(top, BORDER_LEFT), vector_color_to_argb(0x07));
    assert_eq!(rig.pixel(top, BORDER_LEFT + 1), vector_color_to_argb(0x07));
    assert_eq!(rig.pixel(top, BORDER_LEFT + 2), vector_color_to_argb(0x38));
    assert_eq!(rig.pixel(top, BORDER_LEFT + 3), vector_color_to_argb(0x38));
    assert_eq!(rig.pixel(top, BORDER_LEFT + 4), vector_color_to_argb(0xC0));
}

#[test]
fn test_screen_column_and_row_addressing() {
    let mut rig = Rig::new();
    // column 2, row 255 - 10 -> line 50, pixels 160..176
    rig.memory.set_ram(0x8000 + (2 << 8) + 245, &[0xFF]);
    rig.io.palette[8] = 0x3F;
    rig.run_to(51, 0);
    let color = vector_color_to_argb(0x3F);
    assert_eq!(rig.pixel(50, BORDER_LEFT + 32), color);
    assert_eq!(rig.pixel(50, BORDER_LEFT + 47), color);
    assert_ne!(rig.pixel(50, BORDER_LEFT + 48), color);
    assert_ne!(rig.pixel(49, BORDER_LEFT + 32), color);
}

#[test]
fn test_512_mode_after_commit() {
    let mut rig = Rig::new();
    rig.io.port_out(0x02, 0x10);
    rig.run_to(10, 0);
    assert_eq!(rig.io.display_mode, DisplayMode::Mode512);

    // plane E bit 7 -> odd pixel 15 of the column -> index 1
    rig.memory.set_ram(0xE0FF, &[0x80]);
    rig.io.palette[1] = 0x07;
    rig.run_to(SCAN_ACTIVE_AREA_TOP + 1, 0);
    let top = SCAN_ACTIVE_AREA_TOP;
    assert_eq!(rig.pixel(top, BORDER_LEFT), vector_color_to_argb(0x07));
    assert_ne!(rig.pixel(top, BORDER_LEFT + 1), vector_color_to_argb(0x07));
}

#[test]
fn test_scroll_latched_at_first_active_line() {
    let mut rig = Rig::new();
    rig.io.ports.port_a = 0xFE;
    rig.run_to(SCAN_ACTIVE_AREA_TOP, BORDER_LEFT);
    assert_eq!(rig.display.scroll_idx, SCROLL_DEFAULT);
    rig.step();
    assert_eq!(rig.display.scroll_idx, 0xFE);

    // later port A writes wait for the next frame
    rig.io.ports.port_a = 0x10;
    rig.run_to(200, 0);
    assert_eq!(rig.display.scroll_idx, 0xFE);
}

#[test]
fn test_scroll_shifts_rows() {
    let mut rig = Rig::new();
    rig.io.ports.port_a = 0xFE;
    // row 253 of video memory
    rig.memory.set_ram(0x80FD, &[0xFF]);
    rig.io.palette[8] = 0x07;
    rig.run_to(SCAN_ACTIVE_AREA_TOP + 2, 0);
    // shown one line earlier than without scroll
    let red = vector_color_to_argb(0x07);
    assert_eq!(rig.pixel(SCAN_ACTIVE_AREA_TOP + 1, BORDER_LEFT), red);
}

#[test]
fn test_border_palette_write_lands_on_fifth_pixel() {
    let mut rig = Rig::new();
    rig.io.palette[0] = 0x01;
    rig.run_to(10, 256);
    rig.io.port_out(0x0C, 0x40);
    rig.step();

    let old = vector_color_to_argb(0x01);
    let new = vector_color_to_argb(0x40);
    let drawn: Vec<u32> = (256..264).map(|p| rig.pixel(10, p)).collect();
    assert_eq!(drawn, vec![old, old, old, old, new, new, new, new]);
}

#[test]
fn test_active_area_palette_write_pollutes_two_pixels() {
    let mut rig = Rig::new();
    rig.io.palette[0] = 0x01;
    rig.run_to(100, 256);
    rig.io.port_out(0x0C, 0x40);
    rig.step();

    let old = vector_color_to_argb(0x01);
    let mixed = vector_color_to_argb(0x41);
    let new = vector_color_to_argb(0x40);
    let drawn: Vec<u32> = (256..263).map(|p| rig.pixel(100, p)).collect();
    assert_eq!(drawn, vec![old, old, old, mixed, mixed, new, new]);
}

#[test]
fn test_border_out_lands_after_one_pixel() {
    let mut rig = Rig::new();
    rig.io.palette[0] = 0x01;
    rig.io.palette[5] = 0x02;
    rig.run_to(5, 16);
    rig.io.port_out(0x02, 0x05);
    rig.step();
    assert_eq!(rig.pixel(5, 16), vector_color_to_argb(0x02));
    assert_eq!(rig.io.border_idx, 5);
}

#[test]
fn test_stable_frame_published_on_wrap() {
    let mut rig = Rig::new();
    rig.io.palette[0] = 0x07;
    let shared = rig.display.shared_frame();
    rig.run_to(200, 0);
    assert_eq!(rig.display.get_frame(true)[0], BLACK);
    assert_eq!(rig.display.get_frame(false)[0], vector_color_to_argb(0x07));

    for _ in 0..FRAME_MACHINE_CYCLES {
        rig.step();
    }
    let frame = shared.lock().unwrap();
    assert_eq!(frame.len(), FRAME_LEN);
    assert_eq!(frame[0], vector_color_to_argb(0x07));
}

#[test]
fn test_reset_restarts_beam() {
    let mut rig = Rig::new();
    rig.run_to(3, 0);
    rig.display.reset();
    assert_eq!(rig.display.framebuffer_idx, 0);
    assert!(rig.display.frame_buffer.iter().all(|&p| p == BLACK));
}

#[test]
fn test_state_roundtrip() {
    let mut rig = Rig::new();
    rig.run_to(7, 32);
    let state = rig.display.read_state();
    let mut other = Display::new();
    other.write_state(&state);
    assert_eq!(other.framebuffer_idx, 7 * FRAME_W + 32);
    assert_eq!(other.scroll_idx, rig.display.scroll_idx);
}
