//! # ledcast-core
//!
//! Core library for streaming a screen region to an LED matrix panel.
//!
//! This crate contains:
//! - **Geometry**: `CaptureRegion`, `PanelGrid`, validated `PanelGeometry`
//! - **Pipeline stages**: capture sources, max-pool `Downsampler`,
//!   `FrameEncoder` producing addressed `PixelWord`s, UDP `FrameDispatcher`
//! - **Receiver side**: word decoding and `PanelFrame` assembly
//! - **Loop driver**: `PanelService` with cooperative cancellation and metrics
//! - **Error**: `LedcastError`, `ConfigError`, `CaptureError` via `thiserror`

pub mod error;
pub mod panel;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use error::{CaptureError, ConfigError, DecodeError, LedcastError};
pub use panel::{
    CaptureRegion, CaptureSource, DispatchReport, Downsampler, EndpointConfig, FrameBuffer,
    FrameDispatcher, FrameEncoder, FrameReport, PanelFrame, PanelGeometry, PanelGrid,
    PanelReceiver, PanelService, PanelServiceConfig, PixelFormat, PixelWord, ReducedGrid, Rgb,
    RunSummary, ScreenCapturer, ShardMode, TestPattern,
};
pub use tokio_util::sync::CancellationToken;
