//! # ledcast-sender
//!
//! Streams a fixed screen region to an LED matrix panel. Each frame is
//! captured, max-pooled down to the panel grid, packed into addressed
//! 32-bit words and sent to the panel receiver as one UDP datagram per row.
//!
//! Configuration comes from a TOML file with command-line overrides; the
//! loop runs until Ctrl-C or an optional frame limit.

pub mod config;
pub mod service;
