//! Vector-06C Raster Display
//!
//! The rasterizer is stepped once per CPU machine cycle and draws 16 pixels
//! of the 768 x 312 frame (borders included) each time, so video memory is
//! sampled at the same moment the real beam would read it.
//!
//! ## Frame layout
//!
//! | Lines   | Region                      |
//! |:--------|:----------------------------|
//! | 0-23    | vsync (border color)        |
//! | 24-39   | top blank (border color)    |
//! | 40-295  | active lines                |
//! | 296-311 | bottom blank (border color) |
//!
//! Each line: 128 border pixels, 512 active pixels, 128 border pixels.
//! In 256 mode every pixel is drawn twice.
//!
//! Port writes, palette writes and the scroll latch only take effect
//! between pixels, so whenever something is pending the rasterizer walks
//! pixel by pixel and calls `Io::try_to_commit`; otherwise it fills runs.

pub mod constants;
pub mod render;

#[cfg(test)]
mod tests_raster;
#[cfg(test)]
mod tests_properties;

pub use constants::*;
pub use render::{bytes_to_color_idx_256, bytes_to_color_idx_512, vector_color_to_argb, FULL_PALETTE};

use crate::debugger::Debuggable;
use crate::io::{DisplayMode, Io};
use crate::memory::Memory;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Last complete frame, shared with readers on other threads
pub type SharedFrame = Arc<Mutex<Vec<u32>>>;

fn new_frame() -> Vec<u32> {
    vec![BLACK; FRAME_LEN]
}

fn new_shared_frame() -> SharedFrame {
    Arc::new(Mutex::new(new_frame()))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Display {
    /// Next pixel to draw
    pub framebuffer_idx: usize,
    pub frame_num: u64,
    /// Interrupt request raised during the last `rasterize`
    pub irq: bool,
    /// Scroll latched for the current frame
    pub scroll_idx: u8,

    /// Frame being drawn
    #[serde(skip, default = "new_frame")]
    pub frame_buffer: Vec<u32>,
    #[serde(skip, default = "new_shared_frame")]
    back_buffer: SharedFrame,
}

impl Display {
    pub fn new() -> Self {
        Self {
            framebuffer_idx: 0,
            frame_num: 0,
            irq: false,
            scroll_idx: SCROLL_DEFAULT,
            frame_buffer: new_frame(),
            back_buffer: new_shared_frame(),
        }
    }

    /// Restart the beam at the top-left corner on a black frame
    pub fn reset(&mut self) {
        self.framebuffer_idx = 0;
        self.irq = false;
        self.frame_buffer.fill(BLACK);
    }

    pub fn raster_line(&self) -> usize {
        self.framebuffer_idx / FRAME_W
    }

    pub fn raster_pixel(&self) -> usize {
        self.framebuffer_idx % FRAME_W
    }

    /// Handle to the last complete frame
    pub fn shared_frame(&self) -> SharedFrame {
        Arc::clone(&self.back_buffer)
    }

    /// Copy of the last complete frame (`stable`) or of the frame in progress
    pub fn get_frame(&self, stable: bool) -> Vec<u32> {
        if stable {
            match self.back_buffer.lock() {
                Ok(frame) => frame.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            }
        } else {
            self.frame_buffer.clone()
        }
    }

    /// Draw the 16 pixels of one machine cycle
    pub fn rasterize(&mut self, memory: &mut Memory, io: &mut Io) {
        // set again below if the frame passes the irq pixel
        self.irq = false;

        let line = self.raster_line();
        let pixel = self.raster_pixel();

        let active_scan = (SCAN_ACTIVE_AREA_TOP..SCAN_ACTIVE_AREA_TOP + ACTIVE_AREA_H).contains(&line);
        let active_area = active_scan && (BORDER_LEFT..BORDER_RIGHT).contains(&pixel);

        if active_area {
            let pixels = (BORDER_RIGHT - pixel).min(RASTERIZED_PXLS_MAX);
            self.rasterize_active_area(pixels, memory, io);
            if pixels < RASTERIZED_PXLS_MAX {
                self.rasterize_border(RASTERIZED_PXLS_MAX - pixels, memory, io);
            }
        } else {
            let pixels = if !active_scan || pixel >= BORDER_RIGHT {
                RASTERIZED_PXLS_MAX
            } else {
                (BORDER_LEFT - pixel).min(RASTERIZED_PXLS_MAX)
            };
            self.rasterize_border(pixels, memory, io);
            if pixels < RASTERIZED_PXLS_MAX {
                self.rasterize_active_area(RASTERIZED_PXLS_MAX - pixels, memory, io);
            }
        }
    }

    fn rasterize_active_area(&mut self, pixels: usize, memory: &mut Memory, io: &mut Io) {
        let scroll_time = self.raster_line() == SCAN_ACTIVE_AREA_TOP
            && self.raster_pixel() < BORDER_LEFT + RASTERIZED_PXLS_MAX;
        let port_handling = io.is_commit_pending() || scroll_time;
        self.fill_active_area(pixels, memory, io, port_handling);
    }

    fn rasterize_border(&mut self, pixels: usize, memory: &mut Memory, io: &mut Io) {
        let line = self.raster_line();
        if io.is_commit_pending() || line == 0 || line == FRAME_H - 1 {
            self.fill_border_port_handling(pixels, memory, io);
        } else {
            self.fill_border(pixels, io);
        }
    }

    fn fill_border(&mut self, pixels: usize, io: &Io) {
        let color = FULL_PALETTE[io.border_color() as usize];
        let start = self.framebuffer_idx;
        self.frame_buffer[start..start + pixels].fill(color);
        self.framebuffer_idx += pixels;
    }

    /// Border pixel by pixel. Frame wrap and the irq pixel are only
    /// ever reached here.
    fn fill_border_port_handling(&mut self, pixels: usize, memory: &mut Memory, io: &mut Io) {
        for _ in 0..pixels {
            io.try_to_commit(io.border_idx, memory);
            self.frame_buffer[self.framebuffer_idx] = FULL_PALETTE[io.border_color() as usize];
            self.framebuffer_idx += 1;

            let new_frame = self.framebuffer_idx == FRAME_LEN;
            if new_frame {
                self.framebuffer_idx = 0;
            }

            self.irq |= self.framebuffer_idx == IRQ_COMMIT_PXL;

            if new_frame {
                self.frame_num += 1;
                self.publish_frame();
            }
        }
    }

    fn publish_frame(&self) {
        let mut back = match self.back_buffer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        back.copy_from_slice(&self.frame_buffer);
    }

    /// Line of video memory shown on `line` with the latched scroll applied
    fn scrolled_line(&self, line: usize) -> usize {
        let scroll = 255 - self.scroll_idx as usize;
        (line - SCAN_ACTIVE_AREA_TOP + scroll + ACTIVE_AREA_H) % ACTIVE_AREA_H + SCAN_ACTIVE_AREA_TOP
    }

    /// Four plane bytes under the beam. Column from the pixel, row counted
    /// from the bottom of the screen.
    fn screen_bytes(memory: &Memory, line: usize, pixel: usize) -> u32 {
        let addr_high = pixel.saturating_sub(BORDER_LEFT) / RASTERIZED_PXLS_MAX;
        let addr_low = ACTIVE_AREA_H - 1 - (line - SCAN_ACTIVE_AREA_TOP);
        memory.screen_bytes((addr_high << 8 | addr_low) as u16)
    }

    fn fill_active_area(&mut self, pixels: usize, memory: &mut Memory, io: &mut Io, port_handling: bool) {
        let line = self.raster_line();
        let line_scrolled = self.scrolled_line(line);
        let mode = io.display_mode;

        let mut screen_bytes = Self::screen_bytes(memory, line_scrolled, self.raster_pixel());
        // position inside the 16-pixel column of one screen byte
        let mut column_pxl = (self.raster_pixel() - BORDER_LEFT) % RASTERIZED_PXLS_MAX;

        for _ in 0..pixels {
            if port_handling && line == SCAN_ACTIVE_AREA_TOP && self.raster_pixel() == SCROLL_COMMIT_PXL {
                self.scroll_idx = io.scroll();
            }

            let color_idx = match mode {
                DisplayMode::Mode256 => bytes_to_color_idx_256(screen_bytes, 7 - (column_pxl >> 1)),
                DisplayMode::Mode512 => bytes_to_color_idx_512(screen_bytes, 15 - column_pxl),
            };

            let color = if port_handling {
                io.try_to_commit(color_idx, memory);
                io.active_color(color_idx)
            } else {
                io.color(color_idx)
            };

            self.frame_buffer[self.framebuffer_idx] = FULL_PALETTE[color as usize];
            self.framebuffer_idx += 1;

            column_pxl += 1;
            if column_pxl == RASTERIZED_PXLS_MAX {
                column_pxl = 0;
                screen_bytes = Self::screen_bytes(memory, line_scrolled, self.raster_pixel());
            }
        }
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

impl Debuggable for Display {
    fn read_state(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn write_state(&mut self, state: &Value) {
        match serde_json::from_value::<Display>(state.clone()) {
            Ok(restored) => {
                self.framebuffer_idx = restored.framebuffer_idx % FRAME_LEN;
                self.frame_num = restored.frame_num;
                self.irq = restored.irq;
                self.scroll_idx = restored.scroll_idx;
            }
            Err(e) => log::warn!("display state rejected: {}", e),
        }
    }
}
