//! Loop driver for the capture → reduce → encode → dispatch pipeline.
//!
//! One task runs every stage in order, once per frame. The loop checks a
//! `CancellationToken` at the top of each iteration and while pacing, so a
//! shutdown request always lands between frames.
//!
//! Capture failures end the loop with an error. Send failures do not: they
//! are counted in the frame's report and the next frame carries on.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::LedcastError;
use crate::panel::capture::CaptureSource;
use crate::panel::downsample::Downsampler;
use crate::panel::encoder::FrameEncoder;
use crate::panel::geometry::PanelGeometry;
use crate::panel::metrics::{FrameReport, RunSummary, ThroughputMeter};
use crate::panel::transport::{EndpointConfig, FrameDispatcher};
use crate::panel::types::{FrameBuffer, PixelFormat, ReducedGrid};

// ── PanelServiceConfig ───────────────────────────────────────────

/// Immutable configuration for [`PanelService`].
#[derive(Debug, Clone)]
pub struct PanelServiceConfig {
    /// Validated capture region and panel grid.
    pub geometry: PanelGeometry,
    /// Where rows are sent.
    pub endpoint: EndpointConfig,
    /// Frames per second to pace to; 0 runs as fast as the pipeline allows.
    pub target_fps: u32,
    /// Stop after this many frames.
    pub frame_limit: Option<u64>,
}

// ── PanelService ─────────────────────────────────────────────────

/// Owns the capture source, the reused frame buffers and the socket.
pub struct PanelService<S: CaptureSource> {
    source: S,
    frame: FrameBuffer,
    downsampler: Downsampler,
    encoder: FrameEncoder,
    dispatcher: FrameDispatcher,
    meter: ThroughputMeter,
    config: PanelServiceConfig,
    frame_number: u64,
}

impl<S: CaptureSource> PanelService<S> {
    /// Validate the endpoint, open the socket and allocate frame buffers.
    pub async fn new(source: S, config: PanelServiceConfig) -> Result<Self, LedcastError> {
        let dispatcher = FrameDispatcher::bind(&config.endpoint, *config.geometry.grid()).await?;
        Ok(Self::with_dispatcher(source, config, dispatcher))
    }

    /// Build around an existing dispatcher.
    pub fn with_dispatcher(
        source: S,
        config: PanelServiceConfig,
        dispatcher: FrameDispatcher,
    ) -> Self {
        let region = *config.geometry.region();
        let grid = *config.geometry.grid();
        debug!(
            "pipeline: {}x{} region -> {}x{} grid, bin {}x{}, source {}",
            region.width,
            region.height,
            grid.rows,
            grid.cols,
            config.geometry.bin().width,
            config.geometry.bin().height,
            source.name()
        );

        Self {
            source,
            frame: FrameBuffer::new(region.width, region.height, PixelFormat::Bgra8),
            downsampler: Downsampler::new(config.geometry),
            encoder: FrameEncoder::new(grid.rows, grid.cols),
            dispatcher,
            meter: ThroughputMeter::new(),
            config,
            frame_number: 0,
        }
    }

    /// Run one capture → reduce → encode → dispatch iteration.
    pub async fn run_frame(&mut self) -> Result<FrameReport, LedcastError> {
        let start = Instant::now();

        self.source
            .capture_into(self.config.geometry.region(), &mut self.frame)?;
        let captured = Instant::now();

        let grid = self.downsampler.reduce(&self.frame)?;
        let reduced = Instant::now();

        let words = self.encoder.encode(grid);
        let encoded = Instant::now();

        let sent = self.dispatcher.dispatch(words).await;
        let done = Instant::now();

        let report = FrameReport {
            frame_number: self.frame_number,
            capture: captured - start,
            reduce: reduced - captured,
            encode: encoded - reduced,
            dispatch: done - encoded,
            total: done - start,
            sent,
        };
        self.frame_number += 1;
        Ok(report)
    }

    /// Run frames until `cancel` fires, the frame limit is hit, or a
    /// stage fails fatally.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<RunSummary, LedcastError> {
        let started = Instant::now();
        let mut summary = RunSummary::default();
        let interval = (self.config.target_fps > 0)
            .then(|| Duration::from_secs_f64(1.0 / f64::from(self.config.target_fps)));

        info!(
            "streaming {}x{} panel from {} to {:?}",
            self.config.geometry.grid().rows,
            self.config.geometry.grid().cols,
            self.source.name(),
            self.dispatcher.endpoints()
        );

        while !cancel.is_cancelled() {
            if self
                .config
                .frame_limit
                .is_some_and(|limit| summary.frames >= limit)
            {
                break;
            }

            let report = match self.run_frame().await {
                Ok(r) => r,
                Err(e) => {
                    error!("frame {} aborted: {e}", self.frame_number);
                    return Err(e);
                }
            };
            summary.record(&report);
            self.meter.record(report.sent.bytes_sent);

            info!(
                "frame {}: took {:.3} ms to send {} bytes in {} datagrams ({} failed, capture {:.3} ms, {:.1} fps, {} B/s)",
                report.frame_number,
                report.total_ms(),
                report.sent.bytes_sent,
                report.sent.datagrams,
                report.sent.failed,
                report.capture.as_secs_f64() * 1000.0,
                self.meter.fps(),
                self.meter.bytes_per_sec(),
            );

            if let Some(interval) = interval {
                let elapsed = report.total;
                if elapsed < interval {
                    tokio::select! {
                        _ = tokio::time::sleep(interval - elapsed) => {}
                        _ = cancel.cancelled() => break,
                    }
                }
            }
        }

        summary.elapsed = started.elapsed();
        info!(
            "stopped after {} frames, {} bytes, {} failed datagrams ({:.1} fps average)",
            summary.frames,
            summary.bytes_sent,
            summary.failed_datagrams,
            summary.average_fps()
        );
        Ok(summary)
    }

    /// The grid produced by the most recent frame.
    pub fn last_grid(&self) -> &ReducedGrid {
        self.downsampler.grid()
    }

    /// Number of frames completed so far.
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn dispatcher(&self) -> &FrameDispatcher {
        &self.dispatcher
    }

    pub fn config(&self) -> &PanelServiceConfig {
        &self.config
    }
}

// ── Tests ────────────────────────────────────────────────────────
