// ── Throughput test domain types ──

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

/// Responsiveness bands for round-trips-per-minute under load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ResponsivenessClass {
    Low,
    Medium,
    High,
}

impl ResponsivenessClass {
    pub fn from_rpm(rpm: u32) -> Self {
        match rpm {
            0..100 => Self::Low,
            100..400 => Self::Medium,
            _ => Self::High,
        }
    }
}

/// Why a throughput test produced no figures. `Display` is the
/// human-readable message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpeedTestError {
    #[error("Test already running")]
    AlreadyRunning,

    #[error("Test timed out - check connection")]
    TimedOut,

    #[error("Network unavailable")]
    NetworkUnavailable,

    #[error("{message}")]
    Failed { code: i32, message: String },

    #[error("Parse error: {reason}")]
    Parse { reason: String },
}

/// Result of one throughput/responsiveness measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SpeedTestResult {
    pub download_mbps: f64,
    pub upload_mbps: f64,
    /// Worse of the download/upload responsiveness figures.
    pub responsiveness_rpm: u32,
    pub idle_latency_ms: f64,
    pub download_latency_ms: f64,
    pub upload_latency_ms: f64,
    pub error: Option<SpeedTestError>,
}

impl SpeedTestResult {
    pub fn failed(error: SpeedTestError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn already_running() -> Self {
        Self::failed(SpeedTestError::AlreadyRunning)
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_already_running(&self) -> bool {
        matches!(self.error, Some(SpeedTestError::AlreadyRunning))
    }

    pub fn responsiveness_class(&self) -> ResponsivenessClass {
        ResponsivenessClass::from_rpm(self.responsiveness_rpm)
    }

    /// Latency under load more than doubles idle latency and exceeds 100ms.
    pub fn has_bufferbloat(&self) -> bool {
        if self.idle_latency_ms <= 0.0 {
            return false;
        }
        let loaded = self.download_latency_ms.max(self.upload_latency_ms);
        loaded > self.idle_latency_ms * 2.0 && loaded > 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_latencies(idle: f64, down: f64, up: f64) -> SpeedTestResult {
        SpeedTestResult {
            idle_latency_ms: idle,
            download_latency_ms: down,
            upload_latency_ms: up,
            ..SpeedTestResult::default()
        }
    }

    #[test]
    fn mild_load_latency_is_not_bufferbloat() {
        assert!(!with_latencies(20.0, 50.0, 45.0).has_bufferbloat());
    }

    #[test]
    fn heavy_load_latency_is_bufferbloat() {
        assert!(with_latencies(20.0, 250.0, 0.0).has_bufferbloat());
        assert!(with_latencies(20.0, 0.0, 250.0).has_bufferbloat());
    }

    #[test]
    fn doubled_but_under_100ms_is_not_bufferbloat() {
        assert!(!with_latencies(20.0, 90.0, 10.0).has_bufferbloat());
    }

    #[test]
    fn zero_idle_latency_never_bufferbloat() {
        assert!(!with_latencies(0.0, 500.0, 500.0).has_bufferbloat());
    }

    #[test]
    fn responsiveness_breakpoints() {
        assert_eq!(ResponsivenessClass::from_rpm(0), ResponsivenessClass::Low);
        assert_eq!(ResponsivenessClass::from_rpm(99), ResponsivenessClass::Low);
        assert_eq!(ResponsivenessClass::from_rpm(100), ResponsivenessClass::Medium);
        assert_eq!(ResponsivenessClass::from_rpm(399), ResponsivenessClass::Medium);
        assert_eq!(ResponsivenessClass::from_rpm(400), ResponsivenessClass::High);
    }

    #[test]
    fn error_messages_are_human_readable() {
        assert_eq!(
            SpeedTestError::TimedOut.to_string(),
            "Test timed out - check connection"
        );
        let failed = SpeedTestError::Failed {
            code: 3,
            message: "Speed test failed (code 3)".into(),
        };
        assert_eq!(failed.to_string(), "Speed test failed (code 3)");
    }
}
