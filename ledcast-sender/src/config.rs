//! Configuration for the panel sender.

use std::io;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use ledcast_core::{
    CaptureRegion, ConfigError, EndpointConfig, PanelGeometry, PanelGrid, PanelServiceConfig,
    ShardMode,
};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Screen region settings.
    pub capture: CaptureConfig,
    /// Panel resolution.
    pub panel: PanelConfig,
    /// Receiver endpoint.
    pub network: NetworkConfig,
    /// Loop pacing.
    pub performance: PerformanceConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Where frames come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// A region of a real monitor.
    Screen,
    /// Synthetic moving-dot pattern, no display needed.
    TestPattern,
}

/// Capture region settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Frame source.
    pub source: SourceKind,
    /// Monitor index to capture (0 = first).
    pub monitor_index: usize,
    /// Top edge of the region in pixels.
    pub top: u32,
    /// Left edge of the region in pixels.
    pub left: u32,
    /// Region width; must be a multiple of `panel.cols`.
    pub width: u32,
    /// Region height; must be a multiple of `panel.rows`.
    pub height: u32,
}

/// Panel resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Grid rows (at most 128).
    pub rows: u32,
    /// Grid columns (at most 128).
    pub cols: u32,
}

/// Receiver endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Receiver IP address.
    pub destination: String,
    /// UDP port for row 0.
    pub base_port: u16,
    /// "single" or "per-row-group".
    pub shard_mode: ShardMode,
    /// Rows per port in per-row-group mode.
    pub rows_per_shard: u32,
}

/// Loop pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Frames per second to pace to; 0 = as fast as possible.
    pub target_fps: u32,
    /// Stop after this many frames; 0 = run until interrupted.
    pub frame_limit: u64,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Optional log file path. If empty, logs to stderr.
    pub file: String,
}

// ── Presets ──────────────────────────────────────────────────────

/// Known panel deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// 128×128 panel from a 1024×1024 region, two 64-row shards.
    Tall,
    /// 64×128 panel from a 1024×512 region, one port.
    Wide,
}

impl SenderConfig {
    /// Configuration for a known deployment.
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Tall => Self::default(),
            Preset::Wide => Self {
                capture: CaptureConfig {
                    left: 0,
                    height: 512,
                    ..CaptureConfig::default()
                },
                panel: PanelConfig { rows: 64, cols: 128 },
                network: NetworkConfig {
                    shard_mode: ShardMode::Single,
                    ..NetworkConfig::default()
                },
                ..Self::default()
            },
        }
    }
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            panel: PanelConfig::default(),
            network: NetworkConfig::default(),
            performance: PerformanceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Screen,
            monitor_index: 0,
            top: 0,
            left: 448,
            width: 1024,
            height: 1024,
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            rows: 128,
            cols: 128,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            destination: "192.168.178.50".into(),
            base_port: 26177,
            shard_mode: ShardMode::PerRowGroup,
            rows_per_shard: 64,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            target_fps: 0,
            frame_limit: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: String::new(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl SenderConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns `Ok(None)` if the file does not exist so the caller can fall
    /// back to defaults. Any other read failure, or malformed TOML, is an
    /// error.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ConfigError::Unreadable {
                    path: path.display().to_string(),
                    message: e.to_string(),
                });
            }
        };
        toml::from_str(&contents)
            .map(Some)
            .map_err(|e| ConfigError::Malformed {
                path: path.display().to_string(),
                message: e.to_string(),
            })
    }

    /// Write the default configuration to a file (for bootstrapping).
    pub fn write_default(path: &Path) -> io::Result<()> {
        let text = toml::to_string_pretty(&Self::default()).map_err(io::Error::other)?;
        std::fs::write(path, text)
    }

    /// Validate everything and build the loop configuration.
    pub fn to_service_config(&self) -> Result<PanelServiceConfig, ConfigError> {
        let c = &self.capture;
        let geometry = PanelGeometry::new(
            CaptureRegion::new(c.top, c.left, c.width, c.height),
            PanelGrid::new(self.panel.rows, self.panel.cols),
        )?;

        let endpoint = EndpointConfig {
            destination: self.network.destination.clone(),
            base_port: self.network.base_port,
            shard_mode: self.network.shard_mode,
            rows_per_shard: self.network.rows_per_shard,
        };
        endpoint.resolve(geometry.grid())?;

        Ok(PanelServiceConfig {
            geometry,
            endpoint,
            target_fps: self.performance.target_fps,
            frame_limit: (self.performance.frame_limit > 0).then_some(self.performance.frame_limit),
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────
