//! # Panel pipeline
//!
//! Drives an LED matrix panel from a live screen region.
//!
//! ## Architecture
//!
//! ```text
//! SENDER                                          PANEL RECEIVER
//! ┌─────────────────────────┐                    ┌──────────────────────┐
//! │ CaptureSource           │                    │ PanelReceiver        │
//! │   ↓  FrameBuffer        │                    │   ↓                  │
//! │ Downsampler (max-pool)  │   UDP, one         │ decode_datagram      │
//! │   ↓  ReducedGrid        │   datagram/row     │   ↓                  │
//! │ FrameEncoder            │ ────────────────►  │ PanelFrame           │
//! │   ↓  PixelWord[]        │                    │                      │
//! │ FrameDispatcher         │                    │                      │
//! └─────────────────────────┘                    └──────────────────────┘
//! ```
//!
//! ## Sub-modules
//!
//! | Module       | Purpose                                             |
//! |--------------|-----------------------------------------------------|
//! | `types`      | Frame buffer, colors, reduced grid                  |
//! | `geometry`   | Capture region, panel grid, validated bin size      |
//! | `capture`    | `CaptureSource` trait, screen and test-pattern sources |
//! | `downsample` | Per-bin, per-channel max-pooling                    |
//! | `encoder`    | 32-bit addressed pixel words                        |
//! | `decoder`    | Receiver-side word decoding and frame assembly      |
//! | `transport`  | Row datagrams over UDP, port sharding               |
//! | `metrics`    | Per-frame reports and rolling throughput            |
//! | `service`    | The frame loop                                      |

pub mod capture;
pub mod decoder;
pub mod downsample;
pub mod encoder;
pub mod geometry;
pub mod metrics;
pub mod service;
pub mod transport;
pub mod types;

// ── Re-exports ───────────────────────────────────────────────────

pub use capture::{CaptureSource, ScreenCapturer, TestPattern};
pub use decoder::{decode_datagram, DecodedPixel, PanelFrame};
pub use downsample::Downsampler;
pub use encoder::{FrameEncoder, PixelWord};
pub use geometry::{BinSize, CaptureRegion, PanelGeometry, PanelGrid, MAX_GRID_DIM};
pub use metrics::{FrameReport, RunSummary, ThroughputMeter};
pub use service::{PanelService, PanelServiceConfig};
pub use transport::{DispatchReport, EndpointConfig, FrameDispatcher, PanelReceiver, ShardMode};
pub use types::{FrameBuffer, PixelFormat, ReducedGrid, Rgb};
