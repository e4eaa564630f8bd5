#![no_main]
use devector::memory::{translate, AddrSpace, Memory, MemoryInterface, MEMORY_LEN};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|ops: Vec<(u8, u16, u8)>| {
    let mut memory = Memory::new();
    memory.set_rom(&vec![0xC3; 2048]);

    for (op_type, addr, val) in ops {
        let space = match val % 3 {
            0 => AddrSpace::Ram,
            1 => AddrSpace::Stack,
            _ => AddrSpace::Global,
        };
        match op_type % 6 {
            0 => {
                memory.read_byte(addr, space);
            }
            1 => memory.write_byte(addr, val, space),
            2 => memory.set_bank_switch(val),
            3 => {
                memory.get_word(addr, space);
            }
            4 => memory.restart(),
            5 => {
                let global = translate(addr as u32, space, val);
                assert!((global as usize) < MEMORY_LEN);
                assert_eq!(global, translate(addr as u32, space, val));
            }
            _ => unreachable!(),
        }
    }
});
