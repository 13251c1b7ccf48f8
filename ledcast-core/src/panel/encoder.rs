//! Pixel-word encoding: one grid cell per 32-bit word.
//!
//! ## Word layout (MSB → LSB)
//!
//! ```text
//! bits 31..18  address  (row & 0x7F) << 7 | (col & 0x7F)
//! bits 17..12  red      top 6 bits of the 8-bit channel
//! bits 11..6   green    top 6 bits
//! bits  5..0   blue     top 6 bits
//! ```
//!
//! Words travel big-endian on the wire.

use crate::panel::types::{ReducedGrid, Rgb};

/// Mask for one 7-bit address axis.
pub const AXIS_MASK: u32 = 0x7F;
/// Mask for a 6-bit quantized channel.
pub const CHANNEL_MASK: u32 = 0x3F;

const ADDR_SHIFT: u32 = 18;
const RED_SHIFT: u32 = 12;
const GREEN_SHIFT: u32 = 6;

// ── Field helpers ────────────────────────────────────────────────

/// 14-bit cell address for `(row, col)`.
#[inline]
pub const fn address(row: u32, col: u32) -> u32 {
    ((row & AXIS_MASK) << 7) | (col & AXIS_MASK)
}

/// Split a 14-bit address back into `(row, col)`.
#[inline]
pub const fn split_address(addr: u32) -> (u32, u32) {
    ((addr >> 7) & AXIS_MASK, addr & AXIS_MASK)
}

/// Top 6 bits of a channel, after clamping it into `0..=255`.
#[inline]
pub fn quantize(value: i32) -> u32 {
    (value.clamp(0, 255) as u32) >> 2
}

// ── PixelWord ────────────────────────────────────────────────────

/// One addressed, quantized cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PixelWord(pub u32);

impl PixelWord {
    /// Pack `(row, col)` and a color given as wide integers.
    ///
    /// Out-of-range channels are clamped; coordinates keep their low 7 bits.
    pub fn encode(row: u32, col: u32, r: i32, g: i32, b: i32) -> Self {
        Self(
            (address(row, col) << ADDR_SHIFT)
                | (quantize(r) << RED_SHIFT)
                | (quantize(g) << GREEN_SHIFT)
                | quantize(b),
        )
    }

    /// Pack `(row, col)` and an 8-bit color.
    #[inline]
    pub fn from_rgb(row: u32, col: u32, color: Rgb) -> Self {
        Self::encode(row, col, color.r.into(), color.g.into(), color.b.into())
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Network (big-endian) bytes.
    pub fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    pub fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(bytes))
    }

    /// The 14-bit address field.
    pub fn address(self) -> u32 {
        self.0 >> ADDR_SHIFT
    }
}

impl From<PixelWord> for u32 {
    fn from(word: PixelWord) -> u32 {
        word.0
    }
}

// ── FrameEncoder ─────────────────────────────────────────────────

/// Encodes a whole [`ReducedGrid`] into a reused, row-major word array.
pub struct FrameEncoder {
    cols: usize,
    words: Vec<PixelWord>,
}

impl FrameEncoder {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            cols: cols as usize,
            words: vec![PixelWord::default(); rows as usize * cols as usize],
        }
    }

    /// Encode every cell of `grid`, returning all words row-major.
    ///
    /// # Panics
    ///
    /// Panics if `grid` does not have the encoder's dimensions.
    pub fn encode(&mut self, grid: &ReducedGrid) -> &[PixelWord] {
        assert_eq!(grid.cells().len(), self.words.len(), "grid size changed");
        for row in 0..grid.rows() {
            let start = row as usize * self.cols;
            let out = &mut self.words[start..start + self.cols];
            for (col, (word, color)) in out.iter_mut().zip(grid.row(row)).enumerate() {
                *word = PixelWord::from_rgb(row, col as u32, *color);
            }
        }
        &self.words
    }

    /// Words of grid row `row` from the last encode.
    pub fn row(&self, row: u32) -> &[PixelWord] {
        let start = row as usize * self.cols;
        &self.words[start..start + self.cols]
    }

    pub fn words(&self) -> &[PixelWord] {
        &self.words
    }
}

// ── Tests ────────────────────────────────────────────────────────
