//! Capture sources for the screen region.
//!
//! [`ScreenCapturer`] reads a monitor through `xcap` when the `screen`
//! feature is enabled; otherwise construction fails at runtime, the same
//! way an unsupported platform would. [`TestPattern`] synthesises frames
//! so the rest of the pipeline can run without a display.

use std::time::Instant;

use crate::error::CaptureError;
use crate::panel::geometry::CaptureRegion;
use crate::panel::types::{FrameBuffer, Rgb};

// ── CaptureSource ────────────────────────────────────────────────

/// Anything that can fill a [`FrameBuffer`] with the pixels of a region.
///
/// Implementations write into the caller's buffer so it can be reused
/// across frames. Any per-call handle must be released before returning.
pub trait CaptureSource {
    /// Sample `region` into `frame`.
    ///
    /// `frame` is already sized to the region; implementations may change
    /// its pixel format but must keep its dimensions.
    fn capture_into(
        &mut self,
        region: &CaptureRegion,
        frame: &mut FrameBuffer,
    ) -> Result<(), CaptureError>;

    /// Short human-readable name for logs.
    fn name(&self) -> &'static str;
}

impl<S: CaptureSource + ?Sized> CaptureSource for Box<S> {
    fn capture_into(
        &mut self,
        region: &CaptureRegion,
        frame: &mut FrameBuffer,
    ) -> Result<(), CaptureError> {
        (**self).capture_into(region, frame)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

// ── ScreenCapturer ───────────────────────────────────────────────

/// Display capturer for monitor `monitor_index` (0 = first enumerated).
pub struct ScreenCapturer {
    #[cfg_attr(not(feature = "screen"), allow(dead_code))]
    monitor_index: usize,
}

#[cfg(feature = "screen")]
mod platform {
    use super::*;
    use crate::panel::types::PixelFormat;

    impl ScreenCapturer {
        /// Check that the monitor exists; the handle itself is re-opened per frame.
        pub fn new(monitor_index: usize) -> Result<Self, CaptureError> {
            let monitors = xcap::Monitor::all()
                .map_err(|e| CaptureError::Unavailable(format!("monitor enumeration: {e}")))?;
            if monitor_index >= monitors.len() {
                return Err(CaptureError::Unavailable(format!(
                    "monitor {monitor_index} not found ({} available)",
                    monitors.len()
                )));
            }
            Ok(Self { monitor_index })
        }
    }

    impl CaptureSource for ScreenCapturer {
        fn capture_into(
            &mut self,
            region: &CaptureRegion,
            frame: &mut FrameBuffer,
        ) -> Result<(), CaptureError> {
            let monitor = xcap::Monitor::all()
                .map_err(|e| CaptureError::Unavailable(format!("monitor enumeration: {e}")))?
                .into_iter()
                .nth(self.monitor_index)
                .ok_or_else(|| {
                    CaptureError::Unavailable(format!("monitor {} disappeared", self.monitor_index))
                })?;

            let image = monitor
                .capture_image()
                .map_err(|e| CaptureError::Unavailable(format!("screen grab: {e}")))?;

            let (display_width, display_height) = (image.width(), image.height());
            if !region.fits_within(display_width, display_height) {
                return Err(CaptureError::OutOfBounds {
                    left: region.left,
                    top: region.top,
                    width: region.width,
                    height: region.height,
                    display_width,
                    display_height,
                });
            }

            // xcap hands back tightly packed RGBA rows.
            frame.format = PixelFormat::Rgba8;
            frame.stride = region.width * 4;
            frame.data.resize(frame.byte_len(), 0);

            let src = image.as_raw();
            let src_stride = display_width as usize * 4;
            let row_len = region.width as usize * 4;
            for y in 0..region.height {
                let start = (region.top + y) as usize * src_stride + region.left as usize * 4;
                frame.row_mut(y)[..row_len].copy_from_slice(&src[start..start + row_len]);
            }
            frame.timestamp = Instant::now();
            Ok(())
        }

        fn name(&self) -> &'static str {
            "screen"
        }
    }
}

#[cfg(not(feature = "screen"))]
impl ScreenCapturer {
    /// Screen capture needs the `screen` feature.
    pub fn new(_monitor_index: usize) -> Result<Self, CaptureError> {
        Err(CaptureError::Unsupported(
            "screen capture not compiled in (enable the `screen` feature)",
        ))
    }
}

#[cfg(not(feature = "screen"))]
impl CaptureSource for ScreenCapturer {
    fn capture_into(
        &mut self,
        _region: &CaptureRegion,
        _frame: &mut FrameBuffer,
    ) -> Result<(), CaptureError> {
        Err(CaptureError::Unsupported("screen capture not compiled in"))
    }

    fn name(&self) -> &'static str {
        "screen"
    }
}

// ── TestPattern ──────────────────────────────────────────────────

/// Synthetic source: a dim diagonal gradient with a bright dot that
/// moves one step per captured frame.
#[derive(Debug, Default)]
pub struct TestPattern {
    frame_count: u64,
}

impl TestPattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position of the bright dot for frame `n` in a `width × height` region.
    pub fn dot_position(n: u64, width: u32, height: u32) -> (u32, u32) {
        let x = (n % width as u64) as u32;
        let y = ((n / width as u64) % height as u64) as u32;
        (x, y)
    }

    /// Gradient color at `(x, y)`; always at most 127 per channel.
    pub fn background(x: u32, y: u32) -> Rgb {
        Rgb::new((x & 0x7F) as u8, (y & 0x7F) as u8, ((x + y) & 0x3F) as u8)
    }
}

impl CaptureSource for TestPattern {
    fn capture_into(
        &mut self,
        region: &CaptureRegion,
        frame: &mut FrameBuffer,
    ) -> Result<(), CaptureError> {
        if frame.width != region.width || frame.height != region.height {
            return Err(CaptureError::SizeMismatch {
                width: region.width,
                height: region.height,
                actual_width: frame.width,
                actual_height: frame.height,
            });
        }

        for y in 0..region.height {
            for x in 0..region.width {
                frame.set_rgb(x, y, Self::background(x, y));
            }
        }
        let (dx, dy) = Self::dot_position(self.frame_count, region.width, region.height);
        frame.set_rgb(dx, dy, Rgb::new(255, 255, 255));

        self.frame_count += 1;
        frame.timestamp = Instant::now();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "test-pattern"
    }
}

// ── Tests ────────────────────────────────────────────────────────
