// ── Per-cycle network status ──

use serde::{Deserialize, Serialize};

use super::probe::{DnsResult, ProbeResult};

/// Results of the three probes from one refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NetworkStatus {
    pub router: ProbeResult,
    pub internet: ProbeResult,
    pub dns: DnsResult,
    /// Default gateway the router probe targeted, if one was found.
    pub gateway: Option<String>,
}

impl NetworkStatus {
    pub fn unknown() -> Self {
        Self::default()
    }
}
