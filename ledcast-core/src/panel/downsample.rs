//! Max-pooling reduction from the captured region to the panel grid.
//!
//! Each grid cell takes the per-channel maximum of its bin, so small bright
//! features survive the reduction instead of being averaged away.

use crate::error::CaptureError;
use crate::panel::geometry::PanelGeometry;
use crate::panel::types::{FrameBuffer, ReducedGrid, Rgb};

/// Stateful reducer owning the reused output grid.
pub struct Downsampler {
    geometry: PanelGeometry,
    grid: ReducedGrid,
}

impl Downsampler {
    pub fn new(geometry: PanelGeometry) -> Self {
        let grid = ReducedGrid::new(geometry.grid().rows, geometry.grid().cols);
        Self { geometry, grid }
    }

    /// Max-pool `frame` into the internal grid and return it.
    ///
    /// The frame must have exactly the configured region's dimensions.
    pub fn reduce(&mut self, frame: &FrameBuffer) -> Result<&ReducedGrid, CaptureError> {
        let region = self.geometry.region();
        if frame.width != region.width || frame.height != region.height {
            return Err(CaptureError::SizeMismatch {
                width: region.width,
                height: region.height,
                actual_width: frame.width,
                actual_height: frame.height,
            });
        }

        let bin = *self.geometry.bin();
        let bpp = frame.format.bytes_per_pixel();
        let [ro, go, bo] = frame.format.rgb_offsets();
        let bin_bytes = bin.width as usize * bpp;
        let row_bytes = frame.width as usize * bpp;

        self.grid.clear();

        // Walk source rows top to bottom; each one folds into a single grid row.
        for y in 0..frame.height {
            let cells = self.grid.row_mut(y / bin.height);
            let pixels = &frame.row(y)[..row_bytes];
            for (cell, bin_pixels) in cells.iter_mut().zip(pixels.chunks_exact(bin_bytes)) {
                let mut acc = *cell;
                for px in bin_pixels.chunks_exact(bpp) {
                    acc = acc.max(Rgb::new(px[ro], px[go], px[bo]));
                }
                *cell = acc;
            }
        }

        Ok(&self.grid)
    }

    /// The grid produced by the last [`reduce`](Self::reduce).
    pub fn grid(&self) -> &ReducedGrid {
        &self.grid
    }
}

// ── Tests ────────────────────────────────────────────────────────
