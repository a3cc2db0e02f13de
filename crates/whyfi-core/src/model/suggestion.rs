// ── Diagnostic suggestion types ──

use serde::{Deserialize, Serialize};
use strum::Display;

/// How urgent a suggestion is. Ordered `Info < Warning < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Which rule produced a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SuggestionKind {
    WeakSignal,
    BandUpgrade,
    RouterUnreachable,
    HighRouterLatency,
    IspDown,
    HighInternetLatency,
    DnsNotResponding,
    SlowDns,
    PacketLoss,
    HighJitter,
    Bufferbloat,
    LowResponsiveness,
}

/// One human-readable improvement hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    /// Symbolic icon name for front ends that draw one.
    pub icon: String,
    pub title: String,
    pub detail: String,
    pub severity: Severity,
}

impl Suggestion {
    pub fn new(
        kind: SuggestionKind,
        icon: &str,
        title: impl Into<String>,
        detail: &str,
        severity: Severity,
    ) -> Self {
        Self {
            kind,
            icon: icon.into(),
            title: title.into(),
            detail: detail.into(),
            severity,
        }
    }
}
