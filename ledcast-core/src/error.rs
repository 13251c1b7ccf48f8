//! Domain-specific error types for the LED panel pipeline.
//!
//! Errors are split by the stage that produces them so a fatal failure
//! always says where it happened: [`ConfigError`] before the loop starts,
//! [`CaptureError`] inside an iteration, and [`LedcastError`] wrapping both
//! for everything that crosses the public API.

use thiserror::Error;

/// The canonical error type for the pipeline.
#[derive(Debug, Error)]
pub enum LedcastError {
    // ── Stage Errors ─────────────────────────────────────────────
    /// Startup validation rejected the configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The capture source could not produce a frame.
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    // ── Network Errors ───────────────────────────────────────────
    /// Socket setup or receive failed.
    #[error("network error: {0}")]
    Io(#[from] std::io::Error),

    // ── Wire Errors ──────────────────────────────────────────────
    /// A datagram could not be decoded into pixel words.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

// ── ConfigError ───────────────────────────────────────────────────

/// Configuration rejected at startup, before any frame is captured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A region or grid dimension is zero.
    #[error("{what} must be non-zero")]
    ZeroDimension { what: &'static str },

    /// The grid exceeds the 7-bit per-axis address space.
    #[error("panel grid {rows}x{cols} exceeds the {max}x{max} address space")]
    GridTooLarge { rows: u32, cols: u32, max: u32 },

    /// The capture region does not split into whole bins.
    #[error("capture {axis} {region} is not divisible by grid {axis} {grid}")]
    NotDivisible {
        axis: &'static str,
        region: u32,
        grid: u32,
    },

    /// The destination could not be parsed as an IP address.
    #[error("invalid destination address {0:?}")]
    InvalidDestination(String),

    /// Base port zero cannot be sent to.
    #[error("base port must be non-zero")]
    ZeroPort,

    /// Port-sharded mode needs at least one row per shard.
    #[error("rows_per_shard must be at least 1 in per-row-group mode")]
    ZeroRowsPerShard,

    /// The highest shard port does not fit in a u16.
    #[error("shard port {base_port} + {shards} overflows the port range")]
    PortOverflow { base_port: u16, shards: u32 },

    /// A configuration file exists but could not be read.
    #[error("cannot read configuration {path}: {message}")]
    Unreadable { path: String, message: String },

    /// A configuration file could not be parsed.
    #[error("malformed configuration {path}: {message}")]
    Malformed { path: String, message: String },
}

// ── CaptureError ──────────────────────────────────────────────────

/// Failure to sample the display. Fatal for the running loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The display subsystem could not be opened or read.
    #[error("display unavailable: {0}")]
    Unavailable(String),

    /// The requested region lies outside the display.
    #[error(
        "region {width}x{height}+{left}+{top} exceeds display {display_width}x{display_height}"
    )]
    OutOfBounds {
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        display_width: u32,
        display_height: u32,
    },

    /// A frame buffer does not match the configured region.
    #[error("frame is {actual_width}x{actual_height}, expected {width}x{height}")]
    SizeMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// This build has no support for the requested source.
    #[error("{0}")]
    Unsupported(&'static str),
}

// ── DecodeError ───────────────────────────────────────────────────

/// Receiver-side decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Payload length is not a whole number of 32-bit words.
    #[error("datagram length {0} is not a multiple of 4")]
    Misaligned(usize),

    /// A word addresses a cell outside the receiving grid.
    #[error("cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfGrid {
        row: u32,
        col: u32,
        rows: u32,
        cols: u32,
    },
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for LedcastError {
    fn from(s: String) -> Self {
        LedcastError::Other(s)
    }
}

impl From<&str> for LedcastError {
    fn from(s: &str) -> Self {
        LedcastError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = ConfigError::NotDivisible {
            axis: "width",
            region: 100,
            grid: 7,
        };
        assert!(e.to_string().contains("100"));
        assert!(e.to_string().contains("7"));

        let e: LedcastError = e.into();
        assert!(e.to_string().starts_with("configuration error"));
    }

    #[test]
    fn capture_errors_name_the_stage() {
        let e: LedcastError = CaptureError::Unavailable("no monitor".into()).into();
        assert!(matches!(e, LedcastError::Capture(_)));
        assert!(e.to_string().contains("capture failed"));
    }

    #[test]
    fn from_string() {
        let e: LedcastError = "something broke".into();
        assert!(matches!(e, LedcastError::Other(_)));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let e: LedcastError = io_err.into();
        assert!(matches!(e, LedcastError::Io(_)));
    }
}
