//! Continuous monitoring: one line per published snapshot until Ctrl-C.

use chrono::Local;
use serde::Serialize;
use tracing::warn;

use whyfi_core::{Monitor, ProbeKind, Severity, Snapshot, Suggestion, Thresholds};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output::{self, Painter};

/// Condensed per-cycle record; JSON output emits one per line.
#[derive(Debug, Serialize)]
pub struct WatchLine<'a> {
    pub generation: u64,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub router_ms: Option<f64>,
    pub internet_ms: Option<f64>,
    pub dns_ms: Option<f64>,
    pub loss_percent: f64,
    pub jitter_ms: Option<f64>,
    pub top_issue: Option<&'a str>,
    pub top_severity: Option<Severity>,
}

impl<'a> WatchLine<'a> {
    pub fn new(snapshot: &Snapshot, top: Option<&'a Suggestion>) -> Self {
        let metrics = &snapshot.metrics;
        Self {
            generation: snapshot.generation,
            updated_at: snapshot.updated_at,
            router_ms: snapshot.status.router.latency(),
            internet_ms: snapshot.status.internet.latency(),
            dns_ms: snapshot.status.dns.latency(),
            loss_percent: metrics.loss_percent(ProbeKind::Internet),
            jitter_ms: metrics.jitter(ProbeKind::Internet),
            top_issue: top.map(|s| s.title.as_str()),
            top_severity: top.map(|s| s.severity),
        }
    }

    pub fn render(&self, painter: Painter) -> String {
        let time = self.updated_at.map_or_else(
            || "--:--:--".to_owned(),
            |t| t.with_timezone(&Local).format("%H:%M:%S").to_string(),
        );
        let issue = match (self.top_issue, self.top_severity) {
            (Some(title), Some(severity)) => format!("  {} {title}", painter.severity(severity)),
            _ => String::new(),
        };
        format!(
            "{}  router {:>9}  internet {:>9}  dns {:>9}  loss {:>4}  jitter {:>9}{issue}",
            painter.dim(&time),
            output::fmt_ms(self.router_ms),
            output::fmt_ms(self.internet_ms),
            output::fmt_ms(self.dns_ms),
            output::fmt_percent(self.loss_percent),
            output::fmt_ms(self.jitter_ms),
        )
    }
}

fn emit(
    snapshot: &Snapshot,
    thresholds: &Thresholds,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let suggestions = snapshot.suggestions(thresholds);
    let line = WatchLine::new(snapshot, suggestions.first());
    let out = match global.output {
        OutputFormat::Table => line.render(Painter::new(global.color)),
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json(&line, true)?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(
    args: &WatchArgs,
    monitor: &Monitor,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let thresholds = &monitor.config().thresholds;
    let mut changes = monitor.subscribe();
    let limit = args.count.unwrap_or(u64::MAX);
    if limit == 0 {
        return Ok(());
    }

    // first cycle right away, then on the timer
    monitor.refresh().await;
    changes.borrow_and_update();
    emit(&monitor.snapshot(), thresholds, global)?;
    let mut emitted = 1;

    if emitted < limit {
        monitor.start().await;
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while emitted < limit {
        tokio::select! {
            biased;
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    warn!(error = %e, "could not listen for Ctrl-C");
                }
                break;
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                changes.borrow_and_update();
                emit(&monitor.snapshot(), thresholds, global)?;
                emitted += 1;
            }
        }
    }

    monitor.shutdown().await;
    Ok(())
}
