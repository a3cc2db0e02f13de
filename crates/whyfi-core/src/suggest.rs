// ── Suggestion engine ──
//
// Pure rules over the latest state. Every rule is evaluated, all matches
// are returned, most severe first. Callers decide how many to show.

use crate::config::Thresholds;
use crate::model::{
    NetworkStatus, ProbeKind, ProbeResult, Severity, SignalQuality, SpeedTestResult, Suggestion,
    SuggestionKind, WifiBand, WifiInfo,
};
use crate::snapshot::Snapshot;
use crate::store::MetricsStore;

/// Suggestions for a published snapshot.
pub fn analyze(snapshot: &Snapshot, thresholds: &Thresholds) -> Vec<Suggestion> {
    evaluate(
        &snapshot.wifi,
        &snapshot.status,
        &snapshot.metrics,
        snapshot.speed_test.as_ref(),
        thresholds,
    )
}

pub fn evaluate(
    wifi: &WifiInfo,
    status: &NetworkStatus,
    metrics: &MetricsStore,
    speed_test: Option<&SpeedTestResult>,
    thresholds: &Thresholds,
) -> Vec<Suggestion> {
    let mut out = Vec::new();

    // ── Wi-Fi ────────────────────────────────────────────────────────
    if wifi.is_connected() {
        if wifi.signal_quality(&thresholds.signal) == SignalQuality::Poor {
            out.push(Suggestion::new(
                SuggestionKind::WeakSignal,
                "wifi.exclamationmark",
                "Weak Wi-Fi signal",
                "Move closer to router or reduce obstacles",
                Severity::Warning,
            ));
        }
        if wifi.band == WifiBand::Band2_4GHz {
            out.push(Suggestion::new(
                SuggestionKind::BandUpgrade,
                "antenna.radiowaves.left.and.right",
                "Using 2.4 GHz band",
                "5 GHz offers faster speeds if available",
                Severity::Info,
            ));
        }
    }

    // ── Router ───────────────────────────────────────────────────────
    match status.router {
        ProbeResult::Error { .. } => out.push(Suggestion::new(
            SuggestionKind::RouterUnreachable,
            "wifi.router.fill",
            "Cannot reach router",
            "Check Wi-Fi connection or restart router",
            Severity::Critical,
        )),
        ProbeResult::Success { latency_ms } if latency_ms > thresholds.router.good => {
            out.push(Suggestion::new(
                SuggestionKind::HighRouterLatency,
                "tortoise.fill",
                "High router latency",
                "Local network congestion or router overloaded",
                Severity::Warning,
            ));
        }
        _ => {}
    }

    // ── Internet ─────────────────────────────────────────────────────
    match status.internet {
        // Only blame the ISP when the router itself answers.
        ProbeResult::Error { .. } if status.router.is_success() => out.push(Suggestion::new(
            SuggestionKind::IspDown,
            "globe",
            "No internet access",
            "Router connected but ISP may be down",
            Severity::Critical,
        )),
        ProbeResult::Success { latency_ms } if latency_ms > thresholds.internet.fair => {
            out.push(Suggestion::new(
                SuggestionKind::HighInternetLatency,
                "clock.fill",
                "High internet latency",
                "ISP congestion or distant server",
                Severity::Warning,
            ));
        }
        _ => {}
    }

    // ── DNS ──────────────────────────────────────────────────────────
    if !status.dns.success {
        out.push(Suggestion::new(
            SuggestionKind::DnsNotResponding,
            "questionmark.folder.fill",
            "DNS not responding",
            "Try switching to 8.8.8.8 or 1.1.1.1",
            Severity::Warning,
        ));
    } else if status.dns.query_time_ms > thresholds.dns.fair {
        out.push(Suggestion::new(
            SuggestionKind::SlowDns,
            "magnifyingglass",
            "Slow DNS resolution",
            "Consider using a faster DNS provider",
            Severity::Info,
        ));
    }

    // ── Stability ────────────────────────────────────────────────────
    let loss = metrics.loss_percent(ProbeKind::Router);
    if loss > thresholds.loss.fair {
        out.push(Suggestion::new(
            SuggestionKind::PacketLoss,
            "exclamationmark.triangle.fill",
            format!("High packet loss ({:.0}%)", loss.round()),
            "Interference or hardware issues",
            Severity::Critical,
        ));
    }
    if let Some(jitter) = metrics
        .jitter(ProbeKind::Router)
        .filter(|jitter| *jitter > thresholds.jitter.good)
    {
        out.push(Suggestion::new(
            SuggestionKind::HighJitter,
            "waveform.path",
            format!("High jitter ({:.0}ms)", jitter.round()),
            "May cause video/voice call issues",
            Severity::Warning,
        ));
    }

    // ── Speed test ───────────────────────────────────────────────────
    if let Some(speed) = speed_test.filter(|speed| speed.is_ok()) {
        if speed.has_bufferbloat() {
            out.push(Suggestion::new(
                SuggestionKind::Bufferbloat,
                "memorychip.fill",
                "Bufferbloat detected",
                "Enable SQM/QoS on router if available",
                Severity::Warning,
            ));
        }
        if speed.responsiveness_rpm < 100 {
            out.push(Suggestion::new(
                SuggestionKind::LowResponsiveness,
                "gauge.with.dots.needle.bottom.0percent",
                "Low responsiveness",
                "Network feels sluggish under load",
                Severity::Warning,
            ));
        }
    }

    // stable: equal severities keep rule order
    out.sort_by(|a, b| b.severity.cmp(&a.severity));
    out
}
