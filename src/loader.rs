//! Program and boot ROM loading
//!
//! Vector-06C `.rom` files are raw memory images loaded at 0x100 with the
//! boot ROM switched off; `.zip` archives are unpacked to their first file.
//! Images that do not fit are rejected before anything is written.

use crate::hardware::Board;
use crate::memory::{GlobalAddr, Memory, MEMORY_LEN, MEMORY_MAIN_LEN, ROM_LOAD_ADDR};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use thiserror::Error;

/// Largest program that fits between 0x100 and the end of main RAM
pub const PROGRAM_MAX_LEN: usize = MEMORY_MAIN_LEN - ROM_LOAD_ADDR as usize;
/// Boot ROM overlays the bottom 32K
pub const BOOT_ROM_MAX_LEN: usize = 0x8000;
/// Refuse to read files bigger than the whole physical memory
pub const FILE_MAX_LEN: u64 = MEMORY_LEN as u64;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{len} bytes at {addr:#07X} exceed the {max} bytes available")]
    TooLarge { addr: GlobalAddr, len: usize, max: usize },
    #[error("file is empty")]
    Empty,
    #[error("archive holds no file")]
    EmptyArchive,
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Check that `len` bytes starting at global `addr` fit into physical memory
pub fn check_fits(addr: GlobalAddr, len: usize) -> Result<(), LoadError> {
    let max = MEMORY_LEN.saturating_sub(addr as usize);
    if len > max {
        return Err(LoadError::TooLarge { addr, len, max });
    }
    Ok(())
}

/// Read a ROM image, unpacking `.zip` archives
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, LoadError> {
    let path = path.as_ref();
    let is_zip = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("zip"));

    let file = File::open(path)?;
    let data = if is_zip {
        read_zip(file)?
    } else {
        read_limited(file)?
    };

    if data.is_empty() {
        return Err(LoadError::Empty);
    }
    log::info!("read {} bytes from {}", data.len(), path.display());
    Ok(data)
}

/// Read at most `FILE_MAX_LEN` bytes, longer input is an error
fn read_limited<R: Read>(reader: R) -> Result<Vec<u8>, LoadError> {
    let mut buffer = Vec::new();
    reader.take(FILE_MAX_LEN + 1).read_to_end(&mut buffer)?;
    if buffer.len() as u64 > FILE_MAX_LEN {
        return Err(LoadError::TooLarge {
            addr: 0,
            len: buffer.len(),
            max: MEMORY_LEN,
        });
    }
    Ok(buffer)
}

/// First regular file of a zip archive
pub fn read_zip<R: Read + Seek>(reader: R) -> Result<Vec<u8>, LoadError> {
    let mut archive = zip::ZipArchive::new(reader)?;
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if entry.is_file() {
            log::debug!("unpacking {}", entry.name());
            return read_limited(entry);
        }
    }
    Err(LoadError::EmptyArchive)
}

/// Install a boot ROM. It is visible while the ROM overlay is on.
pub fn load_boot_rom(memory: &mut Memory, data: &[u8]) -> Result<(), LoadError> {
    if data.len() > BOOT_ROM_MAX_LEN {
        return Err(LoadError::TooLarge {
            addr: 0,
            len: data.len(),
            max: BOOT_ROM_MAX_LEN,
        });
    }
    memory.set_rom(data);
    Ok(())
}

/// Copy `data` into physical memory at `addr`, all or nothing
pub fn load_ram(memory: &mut Memory, addr: GlobalAddr, data: &[u8]) -> Result<usize, LoadError> {
    check_fits(addr, data.len())?;
    memory.set_ram(addr, data);
    Ok(data.len())
}

/// Boot a program the way a `.rom` file starts: power-on reset, ROM
/// overlay off, image at 0x100, CPU from 0 running into it over zeroed RAM.
pub fn load_program(board: &mut Board, data: &[u8]) -> Result<usize, LoadError> {
    if data.len() > PROGRAM_MAX_LEN {
        return Err(LoadError::TooLarge {
            addr: ROM_LOAD_ADDR as GlobalAddr,
            len: data.len(),
            max: PROGRAM_MAX_LEN,
        });
    }
    board.reset();
    board.restart();
    load_ram(&mut board.memory, ROM_LOAD_ADDR as GlobalAddr, data)
}
