use super::*;
use proptest::prelude::*;

proptest! {
    // Translation depends only on its arguments
    #[test]
    fn prop_translate_is_pure(addr in 0..=0xFFFFu32, bank in any::<u8>(), space in 0..3u8) {
        let space = match space {
            0 => AddrSpace::Ram,
            1 => AddrSpace::Stack,
            _ => AddrSpace::Global,
        };
        let a = translate(addr, space, bank);
        let b = translate(addr, space, bank);
        prop_assert_eq!(a, b);
        prop_assert!((a as usize) < MEMORY_LEN);
    }

    // Low half of the address space is never remapped for data accesses
    #[test]
    fn prop_low_ram_identity(addr in 0..0x8000u32, bank in any::<u8>()) {
        prop_assert_eq!(translate(addr, AddrSpace::Ram, bank), addr);
    }

    // Mapped addresses keep their offset inside the 64K page
    #[test]
    fn prop_translate_keeps_page_offset(addr in 0..=0xFFFFu32, bank in any::<u8>()) {
        let global = translate(addr, AddrSpace::Ram, bank);
        prop_assert_eq!(global & 0xFFFF, addr);
    }

    // Any byte written through a space reads back through the same space
    #[test]
    fn prop_write_read_same_space(addr in any::<u16>(), bank in any::<u8>(), val in any::<u8>()) {
        let mut mem = Memory::new();
        mem.restart();
        mem.set_bank_switch(bank);
        mem.write_byte(addr, val, AddrSpace::Stack);
        prop_assert_eq!(mem.read_byte(addr, AddrSpace::Stack), val);
    }

    #[test]
    fn prop_mapping_byte_roundtrip(bank in any::<u8>()) {
        prop_assert_eq!(Mapping::from_byte(bank).to_byte(), bank);
    }
}
