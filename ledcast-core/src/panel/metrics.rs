//! Per-frame timing and rolling throughput.
//!
//! [`FrameReport`] records what one loop iteration did. [`ThroughputMeter`]
//! keeps a rolling window of `(instant, bytes)` samples and turns it into
//! frames/second and bytes/second for the per-frame log line.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::panel::transport::DispatchReport;

// ── FrameReport ──────────────────────────────────────────────────

/// Timing and byte counts of one pipeline iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Zero-based frame counter.
    pub frame_number: u64,
    pub capture: Duration,
    pub reduce: Duration,
    pub encode: Duration,
    pub dispatch: Duration,
    /// Wall time of the whole iteration, pacing excluded.
    pub total: Duration,
    pub sent: DispatchReport,
}

impl FrameReport {
    /// Total elapsed time in fractional milliseconds.
    pub fn total_ms(&self) -> f64 {
        self.total.as_secs_f64() * 1000.0
    }
}

// ── RunSummary ───────────────────────────────────────────────────

/// Totals over a whole run of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub bytes_sent: u64,
    pub failed_datagrams: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn record(&mut self, report: &FrameReport) {
        self.frames += 1;
        self.bytes_sent += report.sent.bytes_sent;
        self.failed_datagrams += u64::from(report.sent.failed);
    }

    /// Mean frames per second over the run.
    pub fn average_fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.frames as f64 / secs
    }
}

// ── ThroughputMeter ──────────────────────────────────────────────

/// Rolling-window frame and byte rate.
pub struct ThroughputMeter {
    /// Samples: `(when, bytes)`, one per frame.
    samples: VecDeque<(Instant, u64)>,
    window: Duration,
    /// Running total of bytes in the window.
    total_bytes: u64,
}

impl ThroughputMeter {
    /// Create a meter with a 1-second rolling window.
    pub fn new() -> Self {
        Self::with_window(Duration::from_secs(1))
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            samples: VecDeque::with_capacity(256),
            window,
            total_bytes: 0,
        }
    }

    /// Record a finished frame that sent `bytes`.
    pub fn record(&mut self, bytes: u64) {
        self.record_at(Instant::now(), bytes);
    }

    /// Record with an explicit timestamp (useful for testing).
    pub fn record_at(&mut self, when: Instant, bytes: u64) {
        self.samples.push_back((when, bytes));
        self.total_bytes += bytes;
        self.evict(when);
    }

    /// Frames per second over the window.
    pub fn fps(&self) -> f64 {
        match self.span() {
            Some(secs) => (self.samples.len() - 1) as f64 / secs,
            None => 0.0,
        }
    }

    /// Bytes per second over the window.
    pub fn bytes_per_sec(&self) -> u64 {
        match self.span() {
            Some(secs) => {
                // The first sample opens the interval; its bytes precede it.
                let first = self.samples.front().map_or(0, |&(_, b)| b);
                ((self.total_bytes - first) as f64 / secs) as u64
            }
            None => 0,
        }
    }

    /// Number of samples currently in the window.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    // ── Internal ─────────────────────────────────────────────────

    /// Seconds between first and last sample, if that is non-zero.
    fn span(&self) -> Option<f64> {
        let (first, last) = (self.samples.front()?, self.samples.back()?);
        let d = last.0.duration_since(first.0);
        if d.is_zero() {
            None
        } else {
            Some(d.as_secs_f64())
        }
    }

    fn evict(&mut self, now: Instant) {
        while let Some(&(ts, bytes)) = self.samples.front() {
            if now.duration_since(ts) > self.window {
                self.samples.pop_front();
                self.total_bytes = self.total_bytes.saturating_sub(bytes);
            } else {
                break;
            }
        }
    }
}

impl Default for ThroughputMeter {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_meter_returns_zero() {
        let meter = ThroughputMeter::new();
        assert_eq!(meter.fps(), 0.0);
        assert_eq!(meter.bytes_per_sec(), 0);
    }

    #[test]
    fn steady_rate() {
        let mut meter = ThroughputMeter::with_window(Duration::from_secs(5));
        let t0 = Instant::now();
        for i in 0..=10 {
            meter.record_at(t0 + Duration::from_millis(100 * i), 65_536);
        }
        // 10 intervals over 1 s.
        let fps = meter.fps();
        assert!((fps - 10.0).abs() < 0.01, "fps = {fps}");
        let bps = meter.bytes_per_sec();
        assert!((655_000..=656_000).contains(&bps), "bps = {bps}");
    }

    #[test]
    fn evicts_old_samples() {
        let mut meter = ThroughputMeter::with_window(Duration::from_millis(500));
        let t0 = Instant::now();
        meter.record_at(t0, 1000);
        meter.record_at(t0 + Duration::from_secs(1), 500);
        assert_eq!(meter.sample_count(), 1);
    }

    #[test]
    fn summary_accumulates() {
        let mut summary = RunSummary::default();
        let report = FrameReport {
            sent: DispatchReport {
                bytes_sent: 65_536,
                datagrams: 128,
                failed: 2,
            },
            ..Default::default()
        };
        summary.record(&report);
        summary.record(&report);
        summary.elapsed = Duration::from_secs(1);

        assert_eq!(summary.frames, 2);
        assert_eq!(summary.bytes_sent, 131_072);
        assert_eq!(summary.failed_datagrams, 4);
        assert_eq!(summary.average_fps(), 2.0);
    }
}
