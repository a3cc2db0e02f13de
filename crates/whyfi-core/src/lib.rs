//! Probe orchestration and metrics engine behind the `whyfi` CLI.
//!
//! The crate periodically measures the local gateway, the public internet
//! and DNS resolution, keeps bounded history, and turns the latest state
//! into prioritized diagnostic suggestions:
//!
//! - **[`Monitor`]** — Central handle. [`refresh()`](Monitor::refresh) runs
//!   one cycle (three probes concurrently, then a single atomic snapshot
//!   publish); [`start()`](Monitor::start) spawns the auto-refresh loop;
//!   [`run_speed_test()`](Monitor::run_speed_test) runs an on-demand
//!   throughput test. Overlapping requests are dropped, not queued.
//!
//! - **[`ProcessRunner`]** — Child-process execution with streamed output
//!   capture, timeout enforcement and exactly-once resolution. Every outcome
//!   is a [`ProcessOutput`] value; nothing here returns `Err`.
//!
//! - **Probes** ([`probe`]) — `ping`, `dig`, `networkQuality` and routing
//!   table adapters that parse command output into typed results.
//!
//! - **[`MetricsStore`]** — Fixed-capacity history with average, jitter and
//!   loss derived on every read.
//!
//! - **Suggestions** ([`suggest`]) — Pure rules mapping a [`Snapshot`] and
//!   [`Thresholds`] to [`Suggestion`]s, most severe first.

mod busy;
pub mod config;
pub mod error;
pub mod model;
pub mod monitor;
pub mod probe;
pub mod process;
pub mod snapshot;
pub mod source;
pub mod store;
pub mod suggest;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{CommandPaths, MonitorConfig, SignalThresholds, Thresholds, Tiers};
pub use error::{CoreError, ProcessError};
pub use monitor::{Monitor, RefreshOutcome};
pub use process::{CommandRunner, CommandSpec, ProcessOutput, ProcessRunner};
pub use snapshot::Snapshot;
pub use source::{DisconnectedWifi, GatewaySource, StaticGateway, StaticWifi, WifiSource};
pub use store::{LatencyPoint, MetricsStore, SignalSample, SignalStats};

pub use model::{
    DnsResult, NetworkStatus, ProbeKind, ProbeResult, Quality, ResponsivenessClass, Severity,
    SignalQuality, SpeedTestError, SpeedTestResult, Suggestion, SuggestionKind, WifiBand,
    WifiInfo,
};
