//! Sender service: builds the pipeline from configuration and runs it
//! until cancelled.

use tracing::info;

use ledcast_core::{
    CancellationToken, CaptureSource, LedcastError, PanelService, RunSummary, ScreenCapturer,
    TestPattern,
};

use crate::config::{SenderConfig, SourceKind};

// ── SenderService ────────────────────────────────────────────────

/// The top-level sender.
///
/// Owns the cancellation token that stops the frame loop; clones of it
/// can be handed to a signal handler.
pub struct SenderService {
    config: SenderConfig,
    cancel: CancellationToken,
}

impl SenderService {
    /// Create a new sender with the given config.
    pub fn new(config: SenderConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Obtain a handle that stops the loop when cancelled.
    pub fn stop_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Validate configuration, open the capture source and socket, then
    /// stream frames until stopped.
    ///
    /// Configuration and capture-source errors surface before the first
    /// frame; capture failures during the loop end it.
    pub async fn run(&self) -> Result<RunSummary, LedcastError> {
        let service_config = self.config.to_service_config()?;
        let source = self.open_source()?;
        info!("capture source: {}", source.name());

        let mut pipeline = PanelService::new(source, service_config).await?;
        pipeline.run(&self.cancel).await
    }

    /// Signal the loop to stop after the current frame.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether a stop has been requested.
    pub fn is_stopping(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn config(&self) -> &SenderConfig {
        &self.config
    }

    // ── Internal ─────────────────────────────────────────────────

    fn open_source(&self) -> Result<Box<dyn CaptureSource + Send>, LedcastError> {
        let source: Box<dyn CaptureSource + Send> = match self.config.capture.source {
            SourceKind::Screen => Box::new(ScreenCapturer::new(self.config.capture.monitor_index)?),
            SourceKind::TestPattern => Box::new(TestPattern::new()),
        };
        Ok(source)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ledcast_core::{ConfigError, ShardMode};
    use tokio::net::UdpSocket;

    fn test_pattern_config(port: u16, frames: u64) -> SenderConfig {
        let mut cfg = SenderConfig::default();
        cfg.capture.source = SourceKind::TestPattern;
        cfg.capture.width = 64;
        cfg.capture.height = 32;
        cfg.panel.rows = 8;
        cfg.panel.cols = 16;
        cfg.network.destination = "127.0.0.1".into();
        cfg.network.base_port = port;
        cfg.network.shard_mode = ShardMode::Single;
        cfg.performance.frame_limit = frames;
        cfg
    }

    #[test]
    fn stop_handle_works() {
        let svc = SenderService::new(SenderConfig::default());
        assert!(!svc.is_stopping());
        let handle = svc.stop_handle();
        handle.cancel();
        assert!(svc.is_stopping());
    }

    #[tokio::test]
    async fn runs_test_pattern_to_frame_limit() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = receiver.local_addr().unwrap().port();

        let svc = SenderService::new(test_pattern_config(port, 2));
        let summary = svc.run().await.unwrap();
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.bytes_sent, 2 * 8 * 16 * 4);
    }

    #[tokio::test]
    async fn invalid_geometry_fails_before_streaming() {
        let mut cfg = test_pattern_config(9, 1);
        cfg.capture.width = 100;
        cfg.panel.cols = 7;
        let err = SenderService::new(cfg).run().await.unwrap_err();
        assert!(matches!(
            err,
            LedcastError::Config(ConfigError::NotDivisible { .. })
        ));
    }

    #[tokio::test]
    async fn stopped_service_sends_nothing() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = receiver.local_addr().unwrap().port();

        let svc = SenderService::new(test_pattern_config(port, 0));
        svc.stop();
        let summary = svc.run().await.unwrap();
        assert_eq!(summary.frames, 0);
    }
}
