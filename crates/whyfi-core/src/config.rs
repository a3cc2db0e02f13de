// ── Runtime monitor configuration ──
//
// These types describe *what* to probe and how to judge the results.
// They never touch disk: `whyfi-config` builds a `MonitorConfig` from
// the flat key/value file and hands it in.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::Quality;

/// Three-tier latency-style thresholds. Lower values are better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tiers {
    pub excellent: f64,
    pub good: f64,
    pub fair: f64,
}

impl Tiers {
    pub const fn new(excellent: f64, good: f64, fair: f64) -> Self {
        Self {
            excellent,
            good,
            fair,
        }
    }

    /// Classify a measurement: strictly below a tier boundary earns that tier.
    pub fn classify(&self, value: f64) -> Quality {
        if value < self.excellent {
            Quality::Excellent
        } else if value < self.good {
            Quality::Good
        } else if value < self.fair {
            Quality::Fair
        } else {
            Quality::Poor
        }
    }

    /// Loss classification. The excellent boundary is inclusive so that
    /// zero loss against a zero threshold still rates as excellent.
    pub fn classify_loss(&self, percent: f64) -> Quality {
        if percent <= self.excellent {
            Quality::Excellent
        } else if percent < self.good {
            Quality::Good
        } else if percent < self.fair {
            Quality::Fair
        } else {
            Quality::Poor
        }
    }

    fn validate(&self, field: &str) -> Result<(), CoreError> {
        let ordered = self.excellent <= self.good && self.good <= self.fair;
        if !ordered || self.excellent < 0.0 {
            return Err(CoreError::Config {
                field: field.into(),
                reason: format!(
                    "expected 0 <= excellent <= good <= fair, got {}/{}/{}",
                    self.excellent, self.good, self.fair
                ),
            });
        }
        Ok(())
    }
}

/// RSSI thresholds in dBm. Higher (less negative) is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalThresholds {
    pub excellent: i32,
    pub good: i32,
    pub fair: i32,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            excellent: -50,
            good: -60,
            fair: -70,
        }
    }
}

/// Every threshold triple consumed by quality classification and the
/// suggestion rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub router: Tiers,
    pub internet: Tiers,
    pub dns: Tiers,
    pub jitter: Tiers,
    pub loss: Tiers,
    pub signal: SignalThresholds,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            router: Tiers::new(5.0, 20.0, 50.0),
            internet: Tiers::new(30.0, 60.0, 100.0),
            dns: Tiers::new(20.0, 50.0, 100.0),
            jitter: Tiers::new(5.0, 15.0, 30.0),
            loss: Tiers::new(0.0, 1.0, 5.0),
            signal: SignalThresholds::default(),
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), CoreError> {
        self.router.validate("router thresholds")?;
        self.internet.validate("internet thresholds")?;
        self.dns.validate("dns thresholds")?;
        self.jitter.validate("jitter thresholds")?;
        self.loss.validate("loss thresholds")?;

        let s = &self.signal;
        if !(s.excellent >= s.good && s.good >= s.fair) {
            return Err(CoreError::Config {
                field: "signal thresholds".into(),
                reason: format!(
                    "expected excellent >= good >= fair, got {}/{}/{}",
                    s.excellent, s.good, s.fair
                ),
            });
        }
        Ok(())
    }
}

/// External programs the probes shell out to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPaths {
    pub ping: String,
    pub dig: String,
    pub speed_test: String,
    pub route: String,
}

impl Default for CommandPaths {
    fn default() -> Self {
        Self {
            ping: "ping".into(),
            dig: "dig".into(),
            speed_test: "networkQuality".into(),
            route: "netstat".into(),
        }
    }
}

/// Configuration for a single [`Monitor`](crate::Monitor).
///
/// Built by the CLI (or tests) and passed in. The core never reads config files.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Host pinged to judge internet reachability.
    pub ping_target: String,
    /// Echo requests per ping probe.
    pub ping_count: u32,
    /// Domain resolved by the DNS probe.
    pub dns_test_domain: String,
    /// Explicit resolver for the DNS probe; `None` uses the system resolver.
    pub dns_server: Option<String>,
    pub ping_timeout: Duration,
    pub dns_timeout: Duration,
    pub speed_test_timeout: Duration,
    /// Pause between automatic refresh cycles.
    pub refresh_interval: Duration,
    /// Ring-buffer capacity shared by every history in the metrics store.
    pub history_capacity: usize,
    pub thresholds: Thresholds,
    pub commands: CommandPaths,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            ping_target: "1.1.1.1".into(),
            ping_count: 1,
            dns_test_domain: "apple.com".into(),
            dns_server: None,
            ping_timeout: Duration::from_secs(2),
            dns_timeout: Duration::from_secs(3),
            speed_test_timeout: Duration::from_secs(60),
            refresh_interval: Duration::from_secs(5),
            history_capacity: 60,
            thresholds: Thresholds::default(),
            commands: CommandPaths::default(),
        }
    }
}

impl MonitorConfig {
    /// Reject configurations the monitor cannot run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        let durations = [
            ("ping_timeout", self.ping_timeout),
            ("dns_timeout", self.dns_timeout),
            ("speed_test_timeout", self.speed_test_timeout),
            ("refresh_interval", self.refresh_interval),
        ];
        for (field, value) in durations {
            if value.is_zero() {
                return Err(CoreError::Config {
                    field: field.into(),
                    reason: "must be greater than zero".into(),
                });
            }
        }
        if self.history_capacity == 0 {
            return Err(CoreError::Config {
                field: "history_capacity".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.ping_count == 0 {
            return Err(CoreError::Config {
                field: "ping_count".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.ping_target.trim().is_empty() {
            return Err(CoreError::Config {
                field: "ping_target".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.dns_test_domain.trim().is_empty() {
            return Err(CoreError::Config {
                field: "dns_test_domain".into(),
                reason: "must not be empty".into(),
            });
        }
        self.thresholds.validate()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(MonitorConfig::default().validate().is_ok());
    }

    #[test]
    fn tiers_classify_uses_strict_boundaries() {
        let tiers = Tiers::new(5.0, 20.0, 50.0);
        assert_eq!(tiers.classify(4.9), Quality::Excellent);
        assert_eq!(tiers.classify(5.0), Quality::Good);
        assert_eq!(tiers.classify(20.0), Quality::Fair);
        assert_eq!(tiers.classify(50.0), Quality::Poor);
    }

    #[test]
    fn zero_loss_is_excellent_with_zero_threshold() {
        let loss = Tiers::new(0.0, 1.0, 5.0);
        assert_eq!(loss.classify_loss(0.0), Quality::Excellent);
        assert_eq!(loss.classify_loss(0.5), Quality::Good);
        assert_eq!(loss.classify_loss(1.0), Quality::Fair);
        assert_eq!(loss.classify_loss(5.0), Quality::Poor);
    }

    #[test]
    fn zero_capacity_rejected() {
        let cfg = MonitorConfig {
            history_capacity: 0,
            ..MonitorConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("history_capacity"));
    }

    #[test]
    fn unordered_tiers_rejected() {
        let mut cfg = MonitorConfig::default();
        cfg.thresholds.jitter = Tiers::new(30.0, 15.0, 5.0);
        assert!(cfg.validate().is_err());

        let mut cfg = MonitorConfig::default();
        cfg.thresholds.signal.fair = -40;
        assert!(cfg.validate().is_err());
    }
}
