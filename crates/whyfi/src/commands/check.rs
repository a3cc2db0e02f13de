//! One-shot diagnosis: a single probe cycle, optional speed test, and the
//! resulting suggestions.

use serde::Serialize;
use strum::IntoEnumIterator;
use tabled::Tabled;

use whyfi_core::{
    MetricsStore, Monitor, MonitorConfig, ProbeKind, RefreshOutcome, Severity, Snapshot,
    Suggestion, WifiInfo,
};

use crate::cli::{CheckArgs, GlobalOpts};
use crate::commands::{speedtest, spinner};
use crate::error::CliError;
use crate::output::{self, Painter};

// ── Report ──────────────────────────────────────────────────────────

/// What `check` prints: the published snapshot plus its suggestions.
#[derive(Debug, Serialize)]
pub struct CheckReport<'a> {
    #[serde(flatten)]
    pub snapshot: &'a Snapshot,
    pub suggestions: &'a [Suggestion],
}

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProbeRow {
    #[tabled(rename = "Probe")]
    probe: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Quality")]
    quality: String,
}

#[derive(Tabled)]
struct StatsRow {
    #[tabled(rename = "Probe")]
    probe: String,
    #[tabled(rename = "Latest")]
    latest: String,
    #[tabled(rename = "Average")]
    average: String,
    #[tabled(rename = "Jitter")]
    jitter: String,
    #[tabled(rename = "Loss")]
    loss: String,
    #[tabled(rename = "Samples")]
    samples: String,
}

#[derive(Tabled)]
struct SuggestionRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Issue")]
    title: String,
    #[tabled(rename = "What to try")]
    detail: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    args: &CheckArgs,
    monitor: &Monitor,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let bar = spinner("Probing router, internet and DNS...", global);
    let outcome = monitor.refresh().await;
    bar.finish_and_clear();
    if let RefreshOutcome::Skipped = outcome {
        tracing::warn!("probe cycle already running, reporting the last snapshot");
    }

    if args.speed_test {
        speedtest::measure(monitor, global).await;
    }

    let snapshot = monitor.snapshot();
    let suggestions = snapshot.suggestions(&monitor.config().thresholds);
    let report = CheckReport {
        snapshot: &snapshot,
        suggestions: &suggestions,
    };

    let painter = Painter::new(global.color);
    let out = output::render_single(global.output, &report, |r| {
        detail(r, monitor.config(), painter)
    })?;
    output::print_output(&out, global.quiet);

    let critical = suggestions
        .iter()
        .filter(|s| s.severity == Severity::Critical)
        .count();
    if args.strict && critical > 0 {
        return Err(CliError::Unhealthy { count: critical });
    }
    Ok(())
}

// ── Table rendering ─────────────────────────────────────────────────

pub fn detail(report: &CheckReport<'_>, config: &MonitorConfig, painter: Painter) -> String {
    let snapshot = report.snapshot;
    let mut sections = vec![
        painter.heading("Wi-Fi"),
        wifi_detail(&snapshot.wifi, config, painter),
        painter.heading("Network"),
        output::render_table(&probe_rows(snapshot, config, painter)),
        painter.heading("History"),
        output::render_table(&stats_rows(&snapshot.metrics)),
    ];

    if let Some(result) = &snapshot.speed_test {
        sections.push(painter.heading("Speed test"));
        sections.push(speedtest::detail(result, painter));
    }

    sections.push(painter.heading("Suggestions"));
    if report.suggestions.is_empty() {
        sections.push(painter.dim("No issues found."));
    } else {
        let rows: Vec<SuggestionRow> = report
            .suggestions
            .iter()
            .map(|s| SuggestionRow {
                severity: painter.severity(s.severity),
                title: s.title.clone(),
                detail: s.detail.clone(),
            })
            .collect();
        sections.push(output::render_table(&rows));
    }

    sections.join("\n")
}

fn wifi_detail(wifi: &WifiInfo, config: &MonitorConfig, painter: Painter) -> String {
    if !wifi.is_connected() {
        return painter.dim("Not connected");
    }
    let quality = painter.signal(wifi.signal_quality(&config.thresholds.signal));
    let mut pairs = vec![
        ("SSID", wifi.ssid.clone()),
        ("Signal", format!("{} dBm ({quality})", wifi.rssi)),
        ("Noise", format!("{} dBm", wifi.noise)),
        ("SNR", format!("{} dB", wifi.snr())),
    ];
    if !wifi.bssid.is_empty() {
        pairs.push(("BSSID", wifi.bssid.clone()));
    }
    if wifi.channel > 0 {
        pairs.push(("Channel", format!("{} ({})", wifi.channel, wifi.band)));
    }
    if wifi.transmit_rate > 0.0 {
        pairs.push(("Tx rate", format!("{:.0} Mbps", wifi.transmit_rate)));
    }
    output::render_pairs(&pairs)
}

fn probe_rows(snapshot: &Snapshot, config: &MonitorConfig, painter: Painter) -> Vec<ProbeRow> {
    let status = &snapshot.status;
    let thresholds = &config.thresholds;
    let rate = |latency: Option<f64>, tiers: &whyfi_core::Tiers| {
        latency.map_or_else(|| "-".into(), |ms| painter.quality(tiers.classify(ms)))
    };

    vec![
        ProbeRow {
            probe: ProbeKind::Router.to_string(),
            target: status.gateway.clone().unwrap_or_else(|| "-".into()),
            result: output::fmt_probe(&status.router),
            quality: rate(status.router.latency(), &thresholds.router),
        },
        ProbeRow {
            probe: ProbeKind::Internet.to_string(),
            target: config.ping_target.clone(),
            result: output::fmt_probe(&status.internet),
            quality: rate(status.internet.latency(), &thresholds.internet),
        },
        ProbeRow {
            probe: ProbeKind::Dns.to_string(),
            target: format!("{} via {}", config.dns_test_domain, status.dns.server),
            result: if status.dns.success {
                output::fmt_ms(status.dns.latency())
            } else {
                "failed".into()
            },
            quality: rate(status.dns.latency(), &thresholds.dns),
        },
    ]
}

fn stats_rows(metrics: &MetricsStore) -> Vec<StatsRow> {
    ProbeKind::iter()
        .map(|kind| StatsRow {
            probe: kind.to_string(),
            latest: output::fmt_ms(metrics.latest(kind)),
            average: output::fmt_ms(metrics.average(kind)),
            jitter: output::fmt_ms(metrics.jitter(kind)),
            loss: output::fmt_percent(metrics.loss_percent(kind)),
            samples: format!("{}/{}", metrics.successes(kind), metrics.attempts(kind)),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use whyfi_core::{DnsResult, NetworkStatus, ProbeResult, WifiBand};

    use crate::cli::ColorMode;

    fn snapshot() -> Snapshot {
        let mut metrics = MetricsStore::new(10);
        metrics.record_latency(ProbeKind::Router, Some(3.0));
        metrics.record_latency(ProbeKind::Internet, Some(20.0));
        metrics.record_latency(ProbeKind::Internet, None);
        metrics.record_latency(ProbeKind::Dns, Some(12.0));
        Snapshot {
            wifi: WifiInfo {
                ssid: "home".into(),
                bssid: "aa:bb:cc:dd:ee:ff".into(),
                rssi: -58,
                noise: -92,
                channel: 36,
                band: WifiBand::Band5GHz,
                transmit_rate: 866.0,
            },
            status: NetworkStatus {
                router: ProbeResult::success(3.0),
                internet: ProbeResult::Timeout,
                dns: DnsResult::resolved(DnsResult::SYSTEM_RESOLVER, 12.0),
                gateway: Some("192.168.1.1".into()),
            },
            metrics: Arc::new(metrics),
            ..Snapshot::initial(10)
        }
    }

    #[test]
    fn table_view_has_every_section() {
        let config = MonitorConfig::default();
        let snapshot = snapshot();
        let suggestions = snapshot.suggestions(&config.thresholds);
        let report = CheckReport {
            snapshot: &snapshot,
            suggestions: &suggestions,
        };

        let text = detail(&report, &config, Painter::new(ColorMode::Never));
        for needle in [
            "Wi-Fi",
            "home",
            "-58 dBm (Good)",
            "36 (5 GHz)",
            "192.168.1.1",
            "timeout",
            "apple.com via System DNS",
            "50%",
            "1/2",
            "Suggestions",
        ] {
            assert!(text.contains(needle), "missing {needle:?} in\n{text}");
        }
    }

    #[test]
    fn json_view_flattens_snapshot() {
        let config = MonitorConfig::default();
        let snapshot = snapshot();
        let suggestions = snapshot.suggestions(&config.thresholds);
        let report = CheckReport {
            snapshot: &snapshot,
            suggestions: &suggestions,
        };

        let value: serde_json::Value =
            serde_json::from_str(&output::render_json(&report, true).unwrap()).unwrap();
        assert_eq!(value["wifi"]["ssid"], "home");
        assert_eq!(value["status"]["gateway"], "192.168.1.1");
        assert!(value["suggestions"].is_array());
    }

    #[test]
    fn disconnected_wifi_is_called_out() {
        let text = wifi_detail(
            &WifiInfo::disconnected(),
            &MonitorConfig::default(),
            Painter::new(ColorMode::Never),
        );
        assert_eq!(text, "Not connected");
    }
}
