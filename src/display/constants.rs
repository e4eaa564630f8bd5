// Frame geometry, in 12 MHz pixels (512-mode pixels)
pub const FRAME_W: usize = 768;
pub const FRAME_H: usize = 312;
pub const FRAME_LEN: usize = FRAME_W * FRAME_H;

// Scanlines
pub const SCAN_VSYNC: usize = 24;
pub const SCAN_VBLANK_TOP: usize = 16;
pub const SCAN_VBLANK_BOTTOM: usize = 16;
pub const SCAN_ACTIVE_AREA_TOP: usize = SCAN_VSYNC + SCAN_VBLANK_TOP;

// Active area
pub const ACTIVE_AREA_W: usize = 512;
pub const ACTIVE_AREA_H: usize = 256;
pub const BORDER_LEFT: usize = 128;
pub const BORDER_RIGHT: usize = BORDER_LEFT + ACTIVE_AREA_W;

/// Pixels drawn per machine cycle
pub const RASTERIZED_PXLS_MAX: usize = 16;

/// Frame pixel index where the interrupt request is raised
pub const IRQ_COMMIT_PXL: usize = 112;
/// Pixel of the first active line where port A is latched as the scroll
pub const SCROLL_COMMIT_PXL: usize = BORDER_LEFT + 3;
/// 0xFF = no scroll
pub const SCROLL_DEFAULT: u8 = 0xFF;

/// Machine cycles per frame
pub const FRAME_MACHINE_CYCLES: usize = FRAME_LEN / RASTERIZED_PXLS_MAX;

/// Real-time duration of one frame
pub const FRAME_DURATION_US: u64 = 19968;

pub const FULL_PALETTE_LEN: usize = 256;
pub const BLACK: u32 = 0xFF00_0000;
