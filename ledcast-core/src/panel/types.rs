//! Shared frame and pixel types used between pipeline stages.
//!
//! Both buffers here are sized once from the panel geometry and then
//! rewritten in place every frame.

use std::time::Instant;

// ── PixelFormat ──────────────────────────────────────────────────

/// Pixel layout of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 4 bytes per pixel: Blue, Green, Red, Alpha.
    Bgra8,
    /// 4 bytes per pixel: Red, Green, Blue, Alpha.
    Rgba8,
    /// 3 bytes per pixel: Red, Green, Blue.
    Rgb8,
}

impl PixelFormat {
    /// Bytes consumed by a single pixel in this format.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Bgra8 | PixelFormat::Rgba8 => 4,
            PixelFormat::Rgb8 => 3,
        }
    }

    /// Byte offsets of the red, green and blue channels within a pixel.
    pub const fn rgb_offsets(self) -> [usize; 3] {
        match self {
            PixelFormat::Bgra8 => [2, 1, 0],
            PixelFormat::Rgba8 | PixelFormat::Rgb8 => [0, 1, 2],
        }
    }
}

// ── FrameBuffer ──────────────────────────────────────────────────

/// Raw pixels of one captured region.
///
/// The `data` buffer holds `height` rows of `stride` bytes each.
/// `stride` may be larger than `width * bytes_per_pixel`.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Row pitch in **bytes** (may exceed `width * bpp`).
    pub stride: u32,
    /// Pixel layout.
    pub format: PixelFormat,
    /// Raw pixel data, `stride * height` bytes.
    pub data: Vec<u8>,
    /// When the pixels were last written.
    pub timestamp: Instant,
}

impl FrameBuffer {
    /// Allocate a zeroed, tightly packed buffer.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let stride = width * format.bytes_per_pixel() as u32;
        Self {
            width,
            height,
            stride,
            format,
            data: vec![0; stride as usize * height as usize],
            timestamp: Instant::now(),
        }
    }

    /// Total byte size the raw bitmap occupies.
    pub fn byte_len(&self) -> usize {
        self.stride as usize * self.height as usize
    }

    /// Returns a row slice (including possible padding bytes).
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride as usize;
        &self.data[start..start + self.stride as usize]
    }

    /// Mutable row slice (including possible padding bytes).
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride as usize;
        let stride = self.stride as usize;
        &mut self.data[start..start + stride]
    }

    /// Red, green and blue at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    pub fn rgb(&self, x: u32, y: u32) -> Rgb {
        let bpp = self.format.bytes_per_pixel();
        let offset = y as usize * self.stride as usize + x as usize * bpp;
        let [r, g, b] = self.format.rgb_offsets();
        let px = &self.data[offset..offset + bpp];
        Rgb::new(px[r], px[g], px[b])
    }

    /// Write red, green and blue at `(x, y)`; alpha is set opaque.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    pub fn set_rgb(&mut self, x: u32, y: u32, color: Rgb) {
        let bpp = self.format.bytes_per_pixel();
        let offset = y as usize * self.stride as usize + x as usize * bpp;
        let [r, g, b] = self.format.rgb_offsets();
        let px = &mut self.data[offset..offset + bpp];
        px[r] = color.r;
        px[g] = color.g;
        px[b] = color.b;
        if bpp == 4 {
            px[3] = 0xFF;
        }
    }
}

// ── Rgb ──────────────────────────────────────────────────────────

/// One 8-bit-per-channel color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Per-channel maximum.
    #[inline]
    pub fn max(self, other: Rgb) -> Rgb {
        Rgb {
            r: self.r.max(other.r),
            g: self.g.max(other.g),
            b: self.b.max(other.b),
        }
    }
}

// ── ReducedGrid ──────────────────────────────────────────────────

/// Row-major `rows × cols` array of per-cell colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducedGrid {
    rows: u32,
    cols: u32,
    cells: Vec<Rgb>,
}

impl ReducedGrid {
    /// A black grid of the given size.
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Rgb::BLACK; rows as usize * cols as usize],
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Color of cell `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the cell is outside the grid.
    pub fn get(&self, row: u32, col: u32) -> Rgb {
        self.cells[self.index(row, col)]
    }

    /// Overwrite cell `(row, col)`.
    pub fn set(&mut self, row: u32, col: u32, color: Rgb) {
        let idx = self.index(row, col);
        self.cells[idx] = color;
    }

    /// Cells of one grid row.
    pub fn row(&self, row: u32) -> &[Rgb] {
        let start = row as usize * self.cols as usize;
        &self.cells[start..start + self.cols as usize]
    }

    pub(crate) fn row_mut(&mut self, row: u32) -> &mut [Rgb] {
        let start = row as usize * self.cols as usize;
        let cols = self.cols as usize;
        &mut self.cells[start..start + cols]
    }

    /// All cells, row-major.
    pub fn cells(&self) -> &[Rgb] {
        &self.cells
    }

    /// Reset every cell to black without reallocating.
    pub fn clear(&mut self) {
        self.cells.fill(Rgb::BLACK);
    }

    fn index(&self, row: u32, col: u32) -> usize {
        assert!(row < self.rows && col < self.cols, "cell out of grid");
        row as usize * self.cols as usize + col as usize
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgra_channel_order() {
        let mut frame = FrameBuffer::new(2, 1, PixelFormat::Bgra8);
        frame.set_rgb(1, 0, Rgb::new(10, 20, 30));
        assert_eq!(&frame.row(0)[4..8], &[30, 20, 10, 0xFF]);
        assert_eq!(frame.rgb(1, 0), Rgb::new(10, 20, 30));
    }

    #[test]
    fn rgb8_has_no_alpha() {
        let mut frame = FrameBuffer::new(2, 2, PixelFormat::Rgb8);
        assert_eq!(frame.byte_len(), 12);
        frame.set_rgb(0, 1, Rgb::new(1, 2, 3));
        assert_eq!(&frame.row(1)[0..3], &[1, 2, 3]);
    }

    #[test]
    fn padded_stride_is_respected() {
        let mut frame = FrameBuffer::new(2, 2, PixelFormat::Rgba8);
        frame.stride = 16;
        frame.data = vec![0; 32];
        frame.set_rgb(1, 1, Rgb::new(9, 8, 7));
        assert_eq!(&frame.data[20..24], &[9, 8, 7, 0xFF]);
    }

    #[test]
    fn grid_clear_keeps_size() {
        let mut grid = ReducedGrid::new(2, 3);
        grid.set(1, 2, Rgb::new(1, 1, 1));
        assert_eq!(grid.row(1)[2], Rgb::new(1, 1, 1));
        grid.clear();
        assert_eq!(grid.cells().len(), 6);
        assert!(grid.cells().iter().all(|c| *c == Rgb::BLACK));
    }

    #[test]
    fn rgb_max_is_per_channel() {
        let a = Rgb::new(10, 200, 0);
        let b = Rgb::new(20, 100, 5);
        assert_eq!(a.max(b), Rgb::new(20, 200, 5));
    }
}
