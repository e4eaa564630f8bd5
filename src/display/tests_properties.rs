use super::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_256_index_takes_one_bit_per_plane(b8 in any::<u8>(), ba in any::<u8>(), bc in any::<u8>(), be in any::<u8>(), bit in 0usize..8) {
        let screen_bytes = (b8 as u32) << 24 | (ba as u32) << 16 | (bc as u32) << 8 | be as u32;
        let idx = bytes_to_color_idx_256(screen_bytes, bit);
        let expected = (be >> bit) & 1 | ((bc >> bit) & 1) << 1 | ((ba >> bit) & 1) << 2 | ((b8 >> bit) & 1) << 3;
        prop_assert_eq!(idx, expected);
    }

    #[test]
    fn prop_512_index_selects_four_entries(screen_bytes in any::<u32>(), pxl in 0usize..16) {
        let idx = bytes_to_color_idx_512(screen_bytes, pxl);
        if pxl & 1 != 0 {
            prop_assert!(idx < 4);
        } else {
            prop_assert_eq!(idx % 4, 0);
            prop_assert!(idx <= 12);
        }
    }

    #[test]
    fn prop_argb_is_opaque_and_unique(a in any::<u8>(), b in any::<u8>()) {
        prop_assert_eq!(FULL_PALETTE[a as usize] & 0xFF00_0000, 0xFF00_0000);
        prop_assert_eq!(FULL_PALETTE[a as usize] == FULL_PALETTE[b as usize], a == b);
    }

    // Any 16-pixel cycle advances the beam by 16 and keeps it in the frame
    #[test]
    fn prop_rasterize_advances_sixteen(cycles in 1usize..2000) {
        let mut display = Display::new();
        let mut memory = Memory::new();
        let mut io = Io::new();
        for _ in 0..cycles {
            display.rasterize(&mut memory, &mut io);
        }
        prop_assert_eq!(display.framebuffer_idx, cycles * RASTERIZED_PXLS_MAX % FRAME_LEN);
    }
}

#[test]
fn test_color_conversion_channels() {
    assert_eq!(vector_color_to_argb(0x00), 0xFF00_0000);
    // red 7
    assert_eq!(vector_color_to_argb(0x07), 0xFF00_00E0);
    // green 7
    assert_eq!(vector_color_to_argb(0x38), 0xFF00_E000);
    // blue 3
    assert_eq!(vector_color_to_argb(0xC0), 0xFFC0_0000);
}
