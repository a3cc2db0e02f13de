// ── Throughput / responsiveness probe ──
//
// Wraps `networkQuality -s -c`, which prints one JSON object on success.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::busy::BusyFlag;
use crate::error::ProcessError;
use crate::model::{SpeedTestError, SpeedTestResult};
use crate::process::{CommandRunner, CommandSpec, ProcessOutput};

/// Fields of the JSON report the probe cares about. Missing or null
/// numbers are read as 0.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Report {
    /// bytes per second
    dl_throughput: Option<f64>,
    ul_throughput: Option<f64>,
    /// milliseconds
    base_rtt: Option<f64>,
    /// round trips per minute
    dl_responsiveness: Option<f64>,
    ul_responsiveness: Option<f64>,
}

/// Runs one throughput test at a time; overlapping calls are refused.
pub struct SpeedTestProbe {
    runner: Arc<dyn CommandRunner>,
    program: String,
    running: BusyFlag,
}

impl SpeedTestProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
            running: BusyFlag::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_busy()
    }

    pub fn command(&self, timeout: Duration) -> CommandSpec {
        CommandSpec::new(&self.program, timeout).args(["-s", "-c"])
    }

    /// Run a test, or return an `AlreadyRunning` result immediately if one
    /// is in flight. No second child is ever started.
    pub async fn run(&self, timeout: Duration) -> SpeedTestResult {
        let Some(_guard) = self.running.try_acquire() else {
            return SpeedTestResult::already_running();
        };

        info!(timeout_secs = timeout.as_secs(), "speed test started");
        let output = self.runner.run(&self.command(timeout)).await;
        let result = interpret(&output);
        match &result.error {
            None => info!(
                download_mbps = result.download_mbps,
                upload_mbps = result.upload_mbps,
                rpm = result.responsiveness_rpm,
                "speed test finished"
            ),
            Some(e) => warn!(error = %e, "speed test failed"),
        }
        result
    }
}

pub fn interpret(output: &ProcessOutput) -> SpeedTestResult {
    match &output.error {
        None => parse_report(&output.stdout),
        Some(error) => SpeedTestResult::failed(classify_failure(error, output)),
    }
}

fn classify_failure(error: &ProcessError, output: &ProcessOutput) -> SpeedTestError {
    if error.is_timeout() {
        return SpeedTestError::TimedOut;
    }
    let stderr = output.stderr.trim();
    if stderr.contains("timed out") {
        SpeedTestError::TimedOut
    } else if stderr.contains("network") || stderr.contains("Network") {
        SpeedTestError::NetworkUnavailable
    } else if stderr.is_empty() {
        SpeedTestError::Failed {
            code: output.exit_code,
            message: format!("Speed test failed (code {})", output.exit_code),
        }
    } else {
        SpeedTestError::Failed {
            code: output.exit_code,
            message: stderr.to_owned(),
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
pub fn parse_report(json: &str) -> SpeedTestResult {
    let report: Report = match serde_json::from_str(json.trim()) {
        Ok(report) => report,
        Err(e) => {
            return SpeedTestResult::failed(SpeedTestError::Parse {
                reason: e.to_string(),
            });
        }
    };

    let dl_throughput = report.dl_throughput.unwrap_or(0.0);
    let ul_throughput = report.ul_throughput.unwrap_or(0.0);
    let dl_responsiveness = report.dl_responsiveness.unwrap_or(0.0);
    let ul_responsiveness = report.ul_responsiveness.unwrap_or(0.0);
    let per_direction_latency = |rpm: f64| if rpm > 0.0 { 60_000.0 / rpm } else { 0.0 };

    SpeedTestResult {
        download_mbps: dl_throughput.max(0.0) / 1_000_000.0 * 8.0,
        upload_mbps: ul_throughput.max(0.0) / 1_000_000.0 * 8.0,
        responsiveness_rpm: dl_responsiveness.min(ul_responsiveness).max(0.0) as u32,
        idle_latency_ms: report.base_rtt.unwrap_or(0.0).max(0.0),
        download_latency_ms: per_direction_latency(dl_responsiveness),
        upload_latency_ms: per_direction_latency(ul_responsiveness),
        error: None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;
    use pretty_assertions::assert_eq;
    use tokio::sync::Semaphore;

    const REPORT: &str = r#"{
        "base_rtt": 18.5,
        "dl_flows": 12,
        "dl_responsiveness": 600,
        "dl_throughput": 125000000,
        "interface_name": "en0",
        "ul_responsiveness": 240,
        "ul_throughput": 25000000
    }"#;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn parses_report() {
        let result = parse_report(REPORT);
        assert!(result.is_ok());
        assert!(approx(result.download_mbps, 1000.0));
        assert!(approx(result.upload_mbps, 200.0));
        assert_eq!(result.responsiveness_rpm, 240);
        assert!(approx(result.idle_latency_ms, 18.5));
        assert!(approx(result.download_latency_ms, 100.0));
        assert!(approx(result.upload_latency_ms, 250.0));
        assert!(result.has_bufferbloat());
    }

    #[test]
    fn missing_fields_default_to_zero() {
        let result = parse_report(r#"{"dl_throughput": 8000000}"#);
        assert!(approx(result.download_mbps, 64.0));
        assert_eq!(result.responsiveness_rpm, 0);
        assert!(approx(result.download_latency_ms, 0.0));
    }

    #[test]
    fn null_fields_read_as_zero() {
        let result = parse_report(
            r#"{"dl_throughput": 8000000, "ul_throughput": null, "base_rtt": null,
                "dl_responsiveness": 600, "ul_responsiveness": null}"#,
        );
        assert!(result.is_ok());
        assert!(approx(result.download_mbps, 64.0));
        assert!(approx(result.upload_mbps, 0.0));
        assert!(approx(result.idle_latency_ms, 0.0));
        assert_eq!(result.responsiveness_rpm, 0);
        assert!(approx(result.download_latency_ms, 100.0));
        assert!(approx(result.upload_latency_ms, 0.0));
    }

    #[test]
    fn bad_json_is_parse_error() {
        let result = parse_report("networkQuality: not json");
        assert!(matches!(result.error, Some(SpeedTestError::Parse { .. })));
    }

    #[test]
    fn failures_are_classified_from_stderr() {
        let timed_out = ProcessOutput::failure(1, "", "Error: The request timed out.");
        assert_eq!(interpret(&timed_out).error, Some(SpeedTestError::TimedOut));

        let offline = ProcessOutput::failure(1, "", "The network connection was lost.");
        assert_eq!(
            interpret(&offline).error,
            Some(SpeedTestError::NetworkUnavailable)
        );

        let other = ProcessOutput::failure(2, "", "permission denied\n");
        assert_eq!(
            interpret(&other).error,
            Some(SpeedTestError::Failed {
                code: 2,
                message: "permission denied".into()
            })
        );

        let silent = ProcessOutput::failure(7, "", "");
        assert_eq!(
            interpret(&silent).error.unwrap().to_string(),
            "Speed test failed (code 7)"
        );

        let killed = ProcessOutput::timeout(Duration::from_secs(60));
        assert_eq!(interpret(&killed).error, Some(SpeedTestError::TimedOut));
    }

    #[tokio::test]
    async fn concurrent_run_reports_already_running() {
        let gate = Arc::new(Semaphore::new(0));
        let runner = Arc::new(ScriptedRunner::gated(
            |_| ProcessOutput::success(REPORT),
            Arc::clone(&gate),
        ));
        let probe = Arc::new(SpeedTestProbe::new(runner.clone(), "networkQuality"));

        let first = tokio::spawn({
            let probe = Arc::clone(&probe);
            async move { probe.run(Duration::from_secs(60)).await }
        });
        while runner.count("networkQuality") == 0 {
            tokio::task::yield_now().await;
        }
        assert!(probe.is_running());

        let second = probe.run(Duration::from_secs(60)).await;
        assert!(second.is_already_running());
        assert_eq!(second.error.as_ref().unwrap().to_string(), "Test already running");

        gate.add_permits(1);
        let first = first.await.unwrap();
        assert!(first.is_ok());
        assert_eq!(runner.count("networkQuality"), 1);
        assert!(!probe.is_running());

        // guard released: a new run goes through
        gate.add_permits(1);
        assert!(probe.run(Duration::from_secs(60)).await.is_ok());
        assert_eq!(runner.count("networkQuality"), 2);
    }
}
