//! Panel-side decoding of pixel words.
//!
//! Mirrors what the receiver on the LED panel does with each datagram:
//! split every word into its address and 6-bit channels, then light the
//! addressed cell. Used to verify the sender end to end.

use crate::error::DecodeError;
use crate::panel::encoder::{split_address, PixelWord, CHANNEL_MASK};
use crate::panel::geometry::PanelGrid;

/// Fields carried by one word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedPixel {
    pub row: u32,
    pub col: u32,
    pub r6: u8,
    pub g6: u8,
    pub b6: u8,
}

impl DecodedPixel {
    /// The 6-bit channels widened back to 8 bits (low bits zero).
    pub fn rgb8(&self) -> [u8; 3] {
        [self.r6 << 2, self.g6 << 2, self.b6 << 2]
    }
}

impl PixelWord {
    /// Split the word into coordinates and quantized channels.
    pub fn decode(self) -> DecodedPixel {
        let (row, col) = split_address(self.address());
        DecodedPixel {
            row,
            col,
            r6: ((self.0 >> 12) & CHANNEL_MASK) as u8,
            g6: ((self.0 >> 6) & CHANNEL_MASK) as u8,
            b6: (self.0 & CHANNEL_MASK) as u8,
        }
    }
}

/// Iterate the words of one datagram payload.
pub fn decode_datagram(
    payload: &[u8],
) -> Result<impl Iterator<Item = DecodedPixel> + '_, DecodeError> {
    if payload.len() % 4 != 0 {
        return Err(DecodeError::Misaligned(payload.len()));
    }
    Ok(payload.chunks_exact(4).map(|chunk| {
        PixelWord::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]).decode()
    }))
}

// ── PanelFrame ───────────────────────────────────────────────────

/// Receiver-side image assembled from datagrams.
#[derive(Debug, Clone)]
pub struct PanelFrame {
    grid: PanelGrid,
    cells: Vec<Option<DecodedPixel>>,
}

impl PanelFrame {
    pub fn new(grid: PanelGrid) -> Self {
        Self {
            grid,
            cells: vec![None; grid.cell_count()],
        }
    }

    /// Apply every word in `payload`; returns how many cells were written.
    ///
    /// The whole datagram is rejected if any word addresses a cell
    /// outside the grid.
    pub fn apply_datagram(&mut self, payload: &[u8]) -> Result<usize, DecodeError> {
        let (rows, cols) = (self.grid.rows, self.grid.cols);
        for px in decode_datagram(payload)? {
            if px.row >= rows || px.col >= cols {
                return Err(DecodeError::OutOfGrid {
                    row: px.row,
                    col: px.col,
                    rows,
                    cols,
                });
            }
        }

        let mut written = 0;
        for px in decode_datagram(payload)? {
            let idx = px.row as usize * cols as usize + px.col as usize;
            self.cells[idx] = Some(px);
            written += 1;
        }
        Ok(written)
    }

    /// The last pixel written to `(row, col)`, if any.
    pub fn get(&self, row: u32, col: u32) -> Option<DecodedPixel> {
        if row >= self.grid.rows || col >= self.grid.cols {
            return None;
        }
        self.cells[row as usize * self.grid.cols as usize + col as usize]
    }

    /// Whether every cell has been written at least once.
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Number of cells written at least once.
    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn grid(&self) -> &PanelGrid {
        &self.grid
    }
}

// ── Tests ────────────────────────────────────────────────────────
