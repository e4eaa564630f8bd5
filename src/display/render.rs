//! Pixel decoding helpers shared by the fast and per-pixel paths

use super::constants::*;

/// Vector-06C color `BBGGGRRR` to a 32-bit `0xAABBGGRR` pixel
pub const fn vector_color_to_argb(color: u8) -> u32 {
    let r = (color & 0x07) as u32;
    let g = ((color & 0x38) >> 3) as u32;
    let b = ((color & 0xC0) >> 6) as u32;
    BLACK | r << 5 | g << (5 + 8) | b << (6 + 16)
}

/// Every hardware color, prebaked
pub static FULL_PALETTE: [u32; FULL_PALETTE_LEN] = build_full_palette();

const fn build_full_palette() -> [u32; FULL_PALETTE_LEN] {
    let mut table = [0; FULL_PALETTE_LEN];
    let mut i = 0;
    while i < FULL_PALETTE_LEN {
        table[i] = vector_color_to_argb(i as u8);
        i += 1;
    }
    table
}

/// 256 mode: one bit from each of the four planes. `bit_idx` is 0..8,
/// 7 being the leftmost pixel of the byte.
pub fn bytes_to_color_idx_256(screen_bytes: u32, bit_idx: usize) -> u8 {
    let plane = |byte: usize| (screen_bytes >> (byte * 8 + bit_idx)) & 1;
    (plane(0) | plane(1) << 1 | plane(2) << 2 | plane(3) << 3) as u8
}

/// 512 mode: two bits per pixel. Odd `pxl_idx` (0..16) pixels come from
/// planes E and C, even ones from planes A and 8 and select palette
/// entries 0, 4, 8 or 12.
pub fn bytes_to_color_idx_512(screen_bytes: u32, pxl_idx: usize) -> u8 {
    let bit_idx = pxl_idx >> 1;
    let plane = |byte: usize| (screen_bytes >> (byte * 8 + bit_idx)) & 1;
    if pxl_idx & 1 != 0 {
        (plane(0) | plane(1) << 1) as u8
    } else {
        ((plane(2) | plane(3) << 1) * 4) as u8
    }
}
