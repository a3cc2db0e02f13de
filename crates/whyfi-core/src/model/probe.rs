// ── Probe result domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Which of the three periodic probes a measurement belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    #[strum(to_string = "Router")]
    Router,
    #[strum(to_string = "Internet")]
    Internet,
    #[strum(to_string = "DNS")]
    Dns,
}

/// Outcome of a single ping probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProbeResult {
    /// Not measured yet.
    #[default]
    Unknown,
    Success { latency_ms: f64 },
    Timeout,
    Error { message: String },
}

impl ProbeResult {
    /// Successful result; negative latencies are clamped to zero.
    pub fn success(latency_ms: f64) -> Self {
        Self::Success {
            latency_ms: latency_ms.max(0.0),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn latency(&self) -> Option<f64> {
        match self {
            Self::Success { latency_ms } => Some(*latency_ms),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Outcome of a DNS resolution probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsResult {
    /// Resolver that answered (`"System DNS"` when none was given).
    pub server: String,
    /// Query time in milliseconds; `0` whenever `success` is false.
    pub query_time_ms: f64,
    pub success: bool,
}

impl DnsResult {
    pub const SYSTEM_RESOLVER: &'static str = "System DNS";

    pub fn resolved(server: impl Into<String>, query_time_ms: f64) -> Self {
        Self {
            server: server.into(),
            query_time_ms: query_time_ms.max(0.0),
            success: true,
        }
    }

    /// The "nothing usable" result.
    pub fn unknown() -> Self {
        Self {
            server: "—".into(),
            query_time_ms: 0.0,
            success: false,
        }
    }

    pub fn latency(&self) -> Option<f64> {
        self.success.then_some(self.query_time_ms)
    }
}

impl Default for DnsResult {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Four-step rating applied to latency, jitter and loss figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Quality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Quality {
    pub fn is_healthy(self) -> bool {
        matches!(self, Self::Excellent | Self::Good)
    }
}
