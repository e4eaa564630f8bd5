use super::*;
use std::sync::{Arc, Mutex};

/// Records writes, answers reads with the port number
#[derive(Default)]
struct EchoDevice {
    writes: Arc<Mutex<Vec<(u8, u8)>>>,
}

impl Peripheral for EchoDevice {
    fn read(&mut self, port: u8) -> u8 {
        port
    }

    fn write(&mut self, port: u8, value: u8) {
        if let Ok(mut writes) = self.writes.lock() {
            writes.push((port, value));
        }
    }
}

fn commit_all(io: &mut Io, memory: &mut Memory) {
    for _ in 0..16 {
        io.try_to_commit(0, memory);
    }
}

#[test]
fn test_power_on_state() {
    let io = Io::new();
    assert_eq!(io.ports.cw, 0x08);
    assert_eq!(io.ports.port_a, 0xFF);
    assert_eq!(io.ports.port_b, 0xFF);
    assert_eq!(io.ports.port_c, 0xFF);
    assert_eq!(io.ports.cw2, 0x00);
    assert_eq!(io.display_mode, DisplayMode::Mode256);
    assert!(!io.is_commit_pending());
}

#[test]
fn test_unmapped_ports_read_ff() {
    let mut io = Io::new();
    for port in [0x00u8, 0x10, 0x11, 0x20, 0x7F, 0xFF, 0x08, 0x14, 0x18] {
        assert_eq!(io.port_in(port), 0xFF, "port {:02X}", port);
    }
}

#[test]
fn test_port_01_modifiers_active_low() {
    let mut io = Io::new();
    // CW = 0x08: high nibble is input, low nibble is port C
    assert_eq!(io.port_in(0x01), 0xE0 | 0x0F);
    io.keyboard.key_ss = true;
    io.keyboard.key_rus = true;
    assert_eq!(io.port_in(0x01) & 0xF0, 0x40);
}

#[test]
fn test_port_01_low_nibble_input() {
    let mut io = Io::new();
    io.ports.cw = 0x01;
    io.ports.port_c = 0x5A;
    assert_eq!(io.port_in(0x01), 0x5B);
}

#[test]
fn test_keyboard_rows_through_port_02() {
    let mut io = Io::new();
    let mut memory = Memory::new();
    io.keyboard.set_key(2, 5, true);

    // port B is input when CW bit 1 is set
    io.port_out(0x00, 0x8A);
    commit_all(&mut io, &mut memory);
    io.port_out(0x03, !(1 << 2));
    commit_all(&mut io, &mut memory);
    assert_eq!(io.port_in(0x02), !(1 << 5));

    io.port_out(0x03, !(1 << 3));
    commit_all(&mut io, &mut memory);
    assert_eq!(io.port_in(0x02), 0xFF);
}

#[test]
fn test_port_02_output_reads_back() {
    let mut io = Io::new();
    io.ports.cw = 0x80;
    io.ports.port_b = 0x35;
    assert_eq!(io.port_in(0x02), 0x35);
}

#[test]
fn test_port_03_direction() {
    let mut io = Io::new();
    io.ports.port_a = 0x12;
    assert_eq!(io.port_in(0x03), 0x12);
    io.ports.cw = 0x10;
    assert_eq!(io.port_in(0x03), 0xFF);
}

#[test]
fn test_ppi2_roundtrip() {
    let mut io = Io::new();
    let mut memory = Memory::new();
    for (port, value) in [(0x04u8, 0x9Bu8), (0x05, 0x11), (0x06, 0x22), (0x07, 0x33)] {
        io.port_out(port, value);
        commit_all(&mut io, &mut memory);
        assert_eq!(io.port_in(port), value);
    }
}

#[test]
fn test_joysticks() {
    let mut io = Io::new();
    assert_eq!(io.port_in(0x0E), 0xFF);
    io.joy_0f = 0xFE;
    assert_eq!(io.port_in(0x0F), 0xFE);
}

#[test]
fn test_ports_in_out_data_recorded() {
    let mut io = Io::new();
    io.joy_0e = 0x42;
    io.port_in(0x0E);
    io.port_out(0x55, 0x66);
    assert_eq!(io.ports_in_data[0x0E], 0x42);
    assert_eq!(io.ports_out_data[0x55], 0x66);
}

#[test]
fn test_peripheral_slots() {
    let mut io = Io::new();
    let mut memory = Memory::new();
    let writes = Arc::new(Mutex::new(Vec::new()));
    io.attach(Slot::Timer, Box::new(EchoDevice { writes: writes.clone() }));
    io.attach(Slot::Fdc, Box::new(EchoDevice::default()));

    assert_eq!(io.port_in(0x09), 0x09);
    assert_eq!(io.port_in(0x1B), 0x1B);
    // sound slot is empty
    assert_eq!(io.port_in(0x14), 0xFF);

    io.port_out(0x0B, 0x36);
    assert!(writes.lock().map(|w| w.is_empty()).unwrap_or(false));
    io.try_to_commit(0, &mut memory);
    assert_eq!(*writes.lock().unwrap(), vec![(0x0B, 0x36)]);

    assert!(io.detach(Slot::Timer).is_some());
    assert_eq!(io.port_in(0x09), 0xFF);
}

#[test]
fn test_reset_keeps_peripherals() {
    let mut io = Io::new();
    io.attach(Slot::Sound, Box::new(EchoDevice::default()));
    io.ports.port_a = 0;
    io.reset();
    assert_eq!(io.ports.port_a, 0xFF);
    assert_eq!(io.port_in(0x15), 0x15);
}

#[test]
fn test_keyboard_matrix() {
    let mut kbd = Keyboard::new();
    kbd.set_key(0, 0, true);
    kbd.set_key(7, 7, true);
    assert_eq!(kbd.read(0xFF), 0xFF);
    assert_eq!(kbd.read(0xFE), 0xFE);
    assert_eq!(kbd.read(0x7E), 0x7E);
    kbd.set_key(0, 0, false);
    assert_eq!(kbd.read(0x00), 0x7F);
    assert_eq!(kbd.modifiers(), 0xE0);
}

#[test]
fn test_state_roundtrip() {
    let mut io = Io::new();
    let mut memory = Memory::new();
    io.port_out(0x02, 0x1C);
    commit_all(&mut io, &mut memory);
    let state = io.read_state();

    let mut other = Io::new();
    other.write_state(&state);
    assert_eq!(other.border_idx, 0x0C);
    assert_eq!(other.display_mode, DisplayMode::Mode512);
    assert_eq!(other.ports, io.ports);
}
