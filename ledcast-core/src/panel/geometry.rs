//! Capture region, panel grid and the bin size derived from them.
//!
//! [`PanelGeometry`] is the only way to pair a region with a grid, and it
//! refuses any pairing that does not split into whole bins. Everything
//! downstream can therefore index bins without remainder checks.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest addressable rows/cols: 7 address bits per axis.
pub const MAX_GRID_DIM: u32 = 128;

// ── CaptureRegion ────────────────────────────────────────────────

/// Screen rectangle sampled every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub top: u32,
    pub left: u32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    pub const fn new(top: u32, left: u32, width: u32, height: u32) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Whether the region fits inside a `display_width × display_height` display.
    pub fn fits_within(&self, display_width: u32, display_height: u32) -> bool {
        self.left
            .checked_add(self.width)
            .is_some_and(|right| right <= display_width)
            && self
                .top
                .checked_add(self.height)
                .is_some_and(|bottom| bottom <= display_height)
    }
}

// ── PanelGrid ────────────────────────────────────────────────────

/// Logical panel resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelGrid {
    pub rows: u32,
    pub cols: u32,
}

impl PanelGrid {
    pub const fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    /// Number of cells.
    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Bytes in one row datagram.
    pub fn row_payload_len(&self) -> usize {
        self.cols as usize * 4
    }
}

// ── BinSize ──────────────────────────────────────────────────────

/// Pixels of the captured region that fold into one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinSize {
    pub width: u32,
    pub height: u32,
}

// ── PanelGeometry ────────────────────────────────────────────────

/// A validated region/grid pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelGeometry {
    region: CaptureRegion,
    grid: PanelGrid,
    bin: BinSize,
}

impl PanelGeometry {
    /// Validate `region` against `grid` and derive the bin size.
    pub fn new(region: CaptureRegion, grid: PanelGrid) -> Result<Self, ConfigError> {
        for (what, value) in [
            ("capture width", region.width),
            ("capture height", region.height),
            ("grid rows", grid.rows),
            ("grid cols", grid.cols),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDimension { what });
            }
        }

        if grid.rows > MAX_GRID_DIM || grid.cols > MAX_GRID_DIM {
            return Err(ConfigError::GridTooLarge {
                rows: grid.rows,
                cols: grid.cols,
                max: MAX_GRID_DIM,
            });
        }

        if region.width % grid.cols != 0 {
            return Err(ConfigError::NotDivisible {
                axis: "width",
                region: region.width,
                grid: grid.cols,
            });
        }
        if region.height % grid.rows != 0 {
            return Err(ConfigError::NotDivisible {
                axis: "height",
                region: region.height,
                grid: grid.rows,
            });
        }

        let bin = BinSize {
            width: region.width / grid.cols,
            height: region.height / grid.rows,
        };

        Ok(Self { region, grid, bin })
    }

    pub fn region(&self) -> &CaptureRegion {
        &self.region
    }

    pub fn grid(&self) -> &PanelGrid {
        &self.grid
    }

    pub fn bin(&self) -> &BinSize {
        &self.bin
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_bin_size() {
        let geo = PanelGeometry::new(
            CaptureRegion::new(0, 448, 1024, 1024),
            PanelGrid::new(128, 128),
        )
        .unwrap();
        assert_eq!(*geo.bin(), BinSize { width: 8, height: 8 });
    }

    #[test]
    fn wide_deployment_is_valid() {
        let geo =
            PanelGeometry::new(CaptureRegion::new(0, 0, 1024, 512), PanelGrid::new(64, 128))
                .unwrap();
        assert_eq!(geo.bin().width, 8);
        assert_eq!(geo.bin().height, 8);
        assert_eq!(geo.grid().row_payload_len(), 512);
    }

    #[test]
    fn rejects_non_divisible_width() {
        let err =
            PanelGeometry::new(CaptureRegion::new(0, 0, 100, 70), PanelGrid::new(7, 7))
                .unwrap_err();
        assert_eq!(
            err,
            ConfigError::NotDivisible {
                axis: "width",
                region: 100,
                grid: 7
            }
        );
    }

    #[test]
    fn rejects_non_divisible_height() {
        let err = PanelGeometry::new(CaptureRegion::new(0, 0, 64, 65), PanelGrid::new(8, 8))
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotDivisible { axis: "height", .. }));
    }

    #[test]
    fn rejects_oversized_grid() {
        let err = PanelGeometry::new(CaptureRegion::new(0, 0, 258, 258), PanelGrid::new(129, 129))
            .unwrap_err();
        assert!(matches!(err, ConfigError::GridTooLarge { .. }));
    }

    #[test]
    fn rejects_zero_dimensions() {
        let err = PanelGeometry::new(CaptureRegion::new(0, 0, 0, 64), PanelGrid::new(8, 8))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::ZeroDimension {
                what: "capture width"
            }
        );
        let err = PanelGeometry::new(CaptureRegion::new(0, 0, 64, 64), PanelGrid::new(0, 8))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ZeroDimension { .. }));
    }

    #[test]
    fn region_bounds() {
        let region = CaptureRegion::new(0, 448, 1024, 1024);
        assert!(region.fits_within(1920, 1080));
        assert!(!region.fits_within(1280, 1080));
        assert!(!CaptureRegion::new(u32::MAX, 0, 2, 2).fits_within(10, 10));
    }
}
