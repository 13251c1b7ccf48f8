//! UDP dispatch of encoded rows to the panel receiver.
//!
//! ## Wire format
//!
//! One datagram per grid row, no header:
//! ```text
//! word[0] .. word[cols-1]   u32 big-endian each, cols × 4 bytes
//! ```
//!
//! Delivery is fire-and-forget. A lost or reordered row is repaired by the
//! next frame, so there is no sequencing, acknowledgement or resend.
//!
//! In [`ShardMode::PerRowGroup`] the destination port for row `r` is
//! `base_port + r / rows_per_shard`, fanning a large panel out over
//! several receiver listeners.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::error::{ConfigError, LedcastError};
use crate::panel::decoder::PanelFrame;
use crate::panel::encoder::PixelWord;
use crate::panel::geometry::PanelGrid;

/// Largest datagram the receiver side reads (128 columns × 4 bytes).
pub const MAX_DATAGRAM: usize = 128 * 4;

// ── EndpointConfig ───────────────────────────────────────────────

/// How rows map to destination ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShardMode {
    /// Every row goes to `base_port`.
    Single,
    /// Row `r` goes to `base_port + r / rows_per_shard`.
    PerRowGroup,
}

/// Where datagrams are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Receiver IP address.
    pub destination: String,
    /// Port for row 0 (and every row in single mode).
    pub base_port: u16,
    /// Row-to-port mapping.
    pub shard_mode: ShardMode,
    /// Rows per port; only read in per-row-group mode.
    pub rows_per_shard: u32,
}

impl EndpointConfig {
    /// Resolve one socket address per grid row.
    ///
    /// This is where endpoint configuration is validated.
    pub fn resolve(&self, grid: &PanelGrid) -> Result<Vec<SocketAddr>, ConfigError> {
        let ip: IpAddr = self
            .destination
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidDestination(self.destination.clone()))?;

        if self.base_port == 0 {
            return Err(ConfigError::ZeroPort);
        }

        let offset_of = |row: u32| -> u32 {
            match self.shard_mode {
                ShardMode::Single => 0,
                ShardMode::PerRowGroup => row / self.rows_per_shard,
            }
        };

        if self.shard_mode == ShardMode::PerRowGroup {
            if self.rows_per_shard == 0 {
                return Err(ConfigError::ZeroRowsPerShard);
            }
            let last = offset_of(grid.rows.saturating_sub(1));
            if u32::from(self.base_port) + last > u32::from(u16::MAX) {
                return Err(ConfigError::PortOverflow {
                    base_port: self.base_port,
                    shards: last,
                });
            }
        }

        Ok((0..grid.rows)
            .map(|row| SocketAddr::new(ip, self.base_port + offset_of(row) as u16))
            .collect())
    }
}

// ── DispatchReport ───────────────────────────────────────────────

/// Outcome of sending one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Payload bytes accepted by the socket.
    pub bytes_sent: u64,
    /// Datagrams accepted by the socket.
    pub datagrams: u32,
    /// Datagrams whose send failed.
    pub failed: u32,
}

// ── FrameDispatcher ──────────────────────────────────────────────

/// Owns the long-lived UDP socket and sends one datagram per row.
pub struct FrameDispatcher {
    socket: UdpSocket,
    grid: PanelGrid,
    /// Destination for each row, resolved once.
    targets: Vec<SocketAddr>,
    /// Reused datagram scratch buffer.
    scratch: BytesMut,
}

impl FrameDispatcher {
    /// Validate `endpoint` and bind an ephemeral local socket.
    pub async fn bind(endpoint: &EndpointConfig, grid: PanelGrid) -> Result<Self, LedcastError> {
        let targets = endpoint.resolve(&grid)?;
        let local = match targets.first() {
            Some(SocketAddr::V6(_)) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
            _ => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
        };
        let socket = UdpSocket::bind(local).await?;
        Ok(Self::with_socket(socket, grid, targets))
    }

    /// Wrap an already-bound socket with pre-resolved row targets.
    ///
    /// # Panics
    ///
    /// Panics if `targets` does not hold one address per grid row.
    pub fn with_socket(socket: UdpSocket, grid: PanelGrid, targets: Vec<SocketAddr>) -> Self {
        assert_eq!(targets.len(), grid.rows as usize, "one target per row");
        if let Ok(local) = socket.local_addr() {
            debug!("dispatcher bound to {local}, {} rows", grid.rows);
        }
        Self {
            socket,
            grid,
            targets,
            scratch: BytesMut::with_capacity(grid.row_payload_len()),
        }
    }

    /// Destination of grid row `row`.
    pub fn target(&self, row: u32) -> SocketAddr {
        self.targets[row as usize]
    }

    /// Distinct destinations, in row order.
    pub fn endpoints(&self) -> Vec<SocketAddr> {
        let mut out: Vec<SocketAddr> = Vec::new();
        for t in &self.targets {
            if out.last() != Some(t) {
                out.push(*t);
            }
        }
        out
    }

    /// Send every row of `words` (row-major, `rows × cols`).
    ///
    /// Send failures are logged and counted; they never abort the frame.
    pub async fn dispatch(&mut self, words: &[PixelWord]) -> DispatchReport {
        let cols = self.grid.cols as usize;
        let mut report = DispatchReport::default();

        for (row, row_words) in words.chunks_exact(cols).enumerate() {
            self.scratch.clear();
            for word in row_words {
                self.scratch.put_u32(word.value());
            }

            let target = self.targets[row];
            match self.socket.send_to(&self.scratch, target).await {
                Ok(n) => {
                    report.bytes_sent += n as u64;
                    report.datagrams += 1;
                }
                Err(e) => {
                    warn!("send of row {row} to {target} failed: {e}");
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Returns a reference to the underlying socket.
    pub fn socket(&self) -> &UdpSocket {
        &self.socket
    }
}

// ── PanelReceiver ────────────────────────────────────────────────

/// Receiver-side listener that applies incoming rows to a [`PanelFrame`].
pub struct PanelReceiver {
    socket: UdpSocket,
    buf: Vec<u8>,
}

impl PanelReceiver {
    pub async fn bind(addr: SocketAddr) -> Result<Self, LedcastError> {
        Ok(Self::new(UdpSocket::bind(addr).await?))
    }

    pub fn new(socket: UdpSocket) -> Self {
        Self {
            socket,
            buf: vec![0u8; MAX_DATAGRAM],
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr, LedcastError> {
        Ok(self.socket.local_addr()?)
    }

    /// Receive one datagram into `frame`; returns the sender and the
    /// number of cells written.
    pub async fn receive_into(
        &mut self,
        frame: &mut PanelFrame,
    ) -> Result<(SocketAddr, usize), LedcastError> {
        let (len, from) = self.socket.recv_from(&mut self.buf).await?;
        let cells = frame.apply_datagram(&self.buf[..len])?;
        Ok((from, cells))
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::encoder::FrameEncoder;
    use crate::panel::types::{ReducedGrid, Rgb};

    fn endpoint(mode: ShardMode, rows_per_shard: u32) -> EndpointConfig {
        EndpointConfig {
            destination: "192.168.178.50".into(),
            base_port: 26177,
            shard_mode: mode,
            rows_per_shard,
        }
    }

    #[test]
    fn single_mode_uses_one_port() {
        let targets = endpoint(ShardMode::Single, 0)
            .resolve(&PanelGrid::new(64, 128))
            .unwrap();
        assert_eq!(targets.len(), 64);
        assert!(targets.iter().all(|t| t.port() == 26177));
    }

    #[test]
    fn sharded_mode_splits_rows() {
        let targets = endpoint(ShardMode::PerRowGroup, 64)
            .resolve(&PanelGrid::new(128, 128))
            .unwrap();
        assert_eq!(targets[0].port(), 26177);
        assert_eq!(targets[63].port(), 26177);
        assert_eq!(targets[64].port(), 26178);
        assert_eq!(targets[127].port(), 26178);
    }

    #[test]
    fn endpoint_validation() {
        let grid = PanelGrid::new(128, 128);
        let mut bad = endpoint(ShardMode::Single, 0);
        bad.destination = "panel.local".into();
        assert!(matches!(bad.resolve(&grid), Err(ConfigError::InvalidDestination(_))));

        assert_eq!(
            endpoint(ShardMode::PerRowGroup, 0).resolve(&grid),
            Err(ConfigError::ZeroRowsPerShard)
        );

        let mut high = endpoint(ShardMode::PerRowGroup, 1);
        high.base_port = u16::MAX - 10;
        assert!(matches!(high.resolve(&grid), Err(ConfigError::PortOverflow { .. })));

        let mut zero = endpoint(ShardMode::Single, 0);
        zero.base_port = 0;
        assert_eq!(zero.resolve(&grid), Err(ConfigError::ZeroPort));
    }

    #[test]
    fn shard_mode_serde_names() {
        #[derive(Serialize, Deserialize)]
        struct Wrap {
            mode: ShardMode,
        }
        let parsed: Wrap = toml::from_str("mode = \"per-row-group\"").unwrap();
        assert_eq!(parsed.mode, ShardMode::PerRowGroup);
        let text = toml::to_string(&Wrap {
            mode: ShardMode::Single,
        })
        .unwrap();
        assert!(text.contains("\"single\""));
    }

    #[tokio::test]
    async fn dispatch_sends_one_datagram_per_row() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let recv_addr = receiver.local_addr().unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let grid = PanelGrid::new(3, 5);
        let mut dispatcher = FrameDispatcher::with_socket(sender, grid, vec![recv_addr; 3]);

        let mut reduced = ReducedGrid::new(3, 5);
        reduced.set(2, 4, Rgb::new(255, 128, 64));
        let mut enc = FrameEncoder::new(3, 5);
        let report = dispatcher.dispatch(enc.encode(&reduced)).await;

        assert_eq!(
            report,
            DispatchReport {
                bytes_sent: 60,
                datagrams: 3,
                failed: 0
            }
        );

        let mut buf = [0u8; MAX_DATAGRAM];
        for _ in 0..3 {
            let (len, _) = receiver.recv_from(&mut buf).await.unwrap();
            assert_eq!(len, 5 * 4);
        }
    }

    #[tokio::test]
    async fn failed_sends_are_counted_not_returned() {
        // An IPv4 socket cannot send to an IPv6 destination.
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let unreachable: SocketAddr = "[::1]:9".parse().unwrap();

        let grid = PanelGrid::new(2, 3);
        let mut dispatcher = FrameDispatcher::with_socket(sender, grid, vec![unreachable; 2]);
        let mut enc = FrameEncoder::new(2, 3);
        let report = dispatcher.dispatch(enc.encode(&ReducedGrid::new(2, 3))).await;

        assert_eq!(
            report,
            DispatchReport {
                bytes_sent: 0,
                datagrams: 0,
                failed: 2
            }
        );
    }

    #[tokio::test]
    async fn receiver_applies_rows() {
        let mut receiver = PanelReceiver::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let recv_addr = receiver.local_addr().unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let grid = PanelGrid::new(2, 2);
        let mut dispatcher = FrameDispatcher::with_socket(sender, grid, vec![recv_addr; 2]);
        let mut reduced = ReducedGrid::new(2, 2);
        reduced.set(1, 0, Rgb::new(0, 0, 255));
        let mut enc = FrameEncoder::new(2, 2);
        dispatcher.dispatch(enc.encode(&reduced)).await;

        let mut panel = PanelFrame::new(grid);
        for _ in 0..2 {
            let (_, cells) = receiver.receive_into(&mut panel).await.unwrap();
            assert_eq!(cells, 2);
        }
        assert!(panel.is_complete());
        assert_eq!(panel.get(1, 0).unwrap().b6, 0x3F);
    }

    #[tokio::test]
    async fn endpoints_are_deduplicated() {
        let cfg = EndpointConfig {
            destination: "127.0.0.1".into(),
            base_port: 40000,
            shard_mode: ShardMode::PerRowGroup,
            rows_per_shard: 2,
        };
        let d = FrameDispatcher::bind(&cfg, PanelGrid::new(5, 4)).await.unwrap();
        let ports: Vec<u16> = d.endpoints().iter().map(|a| a.port()).collect();
        assert_eq!(ports, vec![40000, 40001, 40002]);
        assert_eq!(d.target(4).port(), 40002);
    }
}
