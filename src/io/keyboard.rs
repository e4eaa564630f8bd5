//! Vector-06C keyboard matrix
//!
//! 8 rows by 8 columns. The CPU selects rows by clearing bits of PPI port A
//! and reads the columns through port B; pressed keys read as 0.
//! Three modifier keys (SS, US, RUS/LAT) bypass the matrix and are read
//! through the high nibble of port C.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    /// Pressed columns per row, 1 = pressed
    pub matrix: [u8; 8],
    /// Shift
    pub key_ss: bool,
    /// Control
    pub key_us: bool,
    /// RUS/LAT
    pub key_rus: bool,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Press or release the key at `row`, `column` (both 0..8)
    pub fn set_key(&mut self, row: u8, column: u8, pressed: bool) {
        let row = (row & 7) as usize;
        let bit = 1 << (column & 7);
        if pressed {
            self.matrix[row] |= bit;
        } else {
            self.matrix[row] &= !bit;
        }
    }

    /// Column state of all rows selected by a cleared bit in `rows`
    pub fn read(&self, rows: u8) -> u8 {
        let pressed = self
            .matrix
            .iter()
            .enumerate()
            .filter(|(row, _)| rows & (1 << row) == 0)
            .fold(0, |acc, (_, columns)| acc | columns);
        !pressed
    }

    /// High nibble of port C as seen by the CPU (active-low modifiers)
    pub fn modifiers(&self) -> u8 {
        (if self.key_ss { 0 } else { 1 << 5 })
            | (if self.key_us { 0 } else { 1 << 6 })
            | (if self.key_rus { 0 } else { 1 << 7 })
    }

    pub fn release_all(&mut self) {
        *self = Self::default();
    }
}
