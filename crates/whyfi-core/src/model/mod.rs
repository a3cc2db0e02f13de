// ── Domain model ──
//
// Plain data shared by probes, the metrics store, the monitor and the
// suggestion engine. No I/O lives here.

pub mod probe;
pub mod speed;
pub mod status;
pub mod suggestion;
pub mod wifi;

pub use probe::{DnsResult, ProbeKind, ProbeResult, Quality};
pub use speed::{ResponsivenessClass, SpeedTestError, SpeedTestResult};
pub use status::NetworkStatus;
pub use suggestion::{Severity, Suggestion, SuggestionKind};
pub use wifi::{SignalQuality, WifiBand, WifiInfo};
