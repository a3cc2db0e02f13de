// ── Bounded latency / signal statistics ──
//
// Every read is recomputed from the current buffer contents; nothing
// derived is cached between calls.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ring::RingBuffer;
use crate::model::ProbeKind;

/// One point of the combined router/internet latency time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyPoint {
    pub timestamp: DateTime<Utc>,
    pub router_ms: Option<f64>,
    pub internet_ms: Option<f64>,
}

/// One Wi-Fi signal reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignalSample {
    pub timestamp: DateTime<Utc>,
    pub rssi: i32,
    pub noise: i32,
}

impl SignalSample {
    pub fn snr(&self) -> i32 {
        self.rssi - self.noise
    }
}

/// Summary over the signal history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalStats {
    pub min_rssi: i32,
    pub max_rssi: i32,
    pub avg_rssi: f64,
    pub latest_snr: i32,
}

/// Latency history and counters for a single probe kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct KindHistory {
    samples: RingBuffer<f64>,
    attempts: u64,
    successes: u64,
}

impl KindHistory {
    fn new(capacity: usize) -> Self {
        Self {
            samples: RingBuffer::new(capacity),
            attempts: 0,
            successes: 0,
        }
    }
}

/// Fixed-capacity statistics for router, internet and DNS latency plus
/// Wi-Fi signal readings.
///
/// Capacity is fixed for the life of the store; build a new store to
/// resize (history is discarded).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsStore {
    capacity: usize,
    router: KindHistory,
    internet: KindHistory,
    dns: KindHistory,
    points: RingBuffer<LatencyPoint>,
    signal: RingBuffer<SignalSample>,
}

impl MetricsStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            router: KindHistory::new(capacity),
            internet: KindHistory::new(capacity),
            dns: KindHistory::new(capacity),
            points: RingBuffer::new(capacity),
            signal: RingBuffer::new(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn history(&self, kind: ProbeKind) -> &KindHistory {
        match kind {
            ProbeKind::Router => &self.router,
            ProbeKind::Internet => &self.internet,
            ProbeKind::Dns => &self.dns,
        }
    }

    fn history_mut(&mut self, kind: ProbeKind) -> &mut KindHistory {
        match kind {
            ProbeKind::Router => &mut self.router,
            ProbeKind::Internet => &mut self.internet,
            ProbeKind::Dns => &mut self.dns,
        }
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Count an attempt; `None` is a failed probe and only counts against loss.
    pub fn record_latency(&mut self, kind: ProbeKind, value: Option<f64>) {
        let history = self.history_mut(kind);
        history.attempts += 1;
        if let Some(ms) = value {
            history.successes += 1;
            history.samples.push(ms);
        }
    }

    pub fn record_point(&mut self, router_ms: Option<f64>, internet_ms: Option<f64>) {
        self.points.push(LatencyPoint {
            timestamp: Utc::now(),
            router_ms,
            internet_ms,
        });
    }

    pub fn record_signal(&mut self, rssi: i32, noise: i32) {
        self.signal.push(SignalSample {
            timestamp: Utc::now(),
            rssi,
            noise,
        });
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn attempts(&self, kind: ProbeKind) -> u64 {
        self.history(kind).attempts
    }

    pub fn successes(&self, kind: ProbeKind) -> u64 {
        self.history(kind).successes
    }

    /// Buffered successful latencies, oldest first.
    pub fn samples(&self, kind: ProbeKind) -> Vec<f64> {
        self.history(kind).samples.to_vec()
    }

    pub fn latest(&self, kind: ProbeKind) -> Option<f64> {
        self.history(kind).samples.last().copied()
    }

    /// Mean of the buffered latencies.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn average(&self, kind: ProbeKind) -> Option<f64> {
        let samples = &self.history(kind).samples;
        if samples.is_empty() {
            return None;
        }
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }

    /// Mean absolute difference between consecutive buffered latencies.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn jitter(&self, kind: ProbeKind) -> Option<f64> {
        let samples = &self.history(kind).samples;
        if samples.len() < 2 {
            return None;
        }
        let total: f64 = samples
            .iter()
            .zip(samples.iter().skip(1))
            .map(|(prev, next)| (next - prev).abs())
            .sum();
        Some(total / (samples.len() - 1) as f64)
    }

    /// Share of attempts that failed, in percent. Zero before any attempt.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn loss_percent(&self, kind: ProbeKind) -> f64 {
        let history = self.history(kind);
        if history.attempts == 0 {
            return 0.0;
        }
        let failed = history.attempts - history.successes;
        failed as f64 / history.attempts as f64 * 100.0
    }

    pub fn points(&self) -> Vec<LatencyPoint> {
        self.points.to_vec()
    }

    pub fn signal_samples(&self) -> Vec<SignalSample> {
        self.signal.to_vec()
    }

    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn signal_stats(&self) -> Option<SignalStats> {
        let latest = self.signal.last()?;
        let (mut min, mut max, mut sum) = (i32::MAX, i32::MIN, 0i64);
        for sample in self.signal.iter() {
            min = min.min(sample.rssi);
            max = max.max(sample.rssi);
            sum += i64::from(sample.rssi);
        }
        Some(SignalStats {
            min_rssi: min,
            max_rssi: max,
            avg_rssi: sum as f64 / self.signal.len() as f64,
            latest_snr: latest.snr(),
        })
    }
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new(60)
    }
}
