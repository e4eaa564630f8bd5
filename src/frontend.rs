//! Frame output for headless front ends
//!
//! Converts the frame produced by the display (`0xAABBGGRR` pixels) into
//! RGBA8 bytes and writes screenshots as PNG.

use crate::display::{FRAME_H, FRAME_W};
use chrono::{DateTime, Local};
use image::error::{ParameterError, ParameterErrorKind};
use image::{ImageError, RgbaImage};
use std::path::Path;

/// Convert a display frame to RGBA8 bytes
pub fn frame_to_rgba8(frame: &[u32], output: &mut [u8]) {
    for (&pixel, chunk) in frame.iter().zip(output.chunks_exact_mut(4)) {
        chunk.copy_from_slice(&pixel.to_le_bytes());
    }
}

/// Write a full 768 x 312 frame as PNG
pub fn save_png<P: AsRef<Path>>(frame: &[u32], path: P) -> Result<(), ImageError> {
    let mut rgba = vec![0u8; FRAME_W * FRAME_H * 4];
    frame_to_rgba8(frame, &mut rgba);
    let image = RgbaImage::from_raw(FRAME_W as u32, FRAME_H as u32, rgba).ok_or_else(|| {
        ImageError::Parameter(ParameterError::from_kind(ParameterErrorKind::DimensionMismatch))
    })?;
    image.save(path)
}

/// `devector_YYYYMMDD_HHMMSS.png`
pub fn screenshot_name(time: DateTime<Local>) -> String {
    format!("devector_{}.png", time.format("%Y%m%d_%H%M%S"))
}
