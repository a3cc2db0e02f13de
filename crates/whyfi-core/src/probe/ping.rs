// ── ICMP latency probe ──

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tracing::debug;

use crate::model::ProbeResult;
use crate::process::{CommandRunner, CommandSpec, ProcessOutput};

/// Extra process time on top of ping's own deadline.
const PROCESS_GRACE: Duration = Duration::from_secs(2);

/// BSD `round-trip min/avg/max/stddev = a/b/c/d ms` and Linux
/// `rtt min/avg/max/mdev = a/b/c/d ms`; the second field is the average.
static RTT_LINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"min/avg/max/(?:stddev|mdev) = [\d.]+/([\d.]+)/").ok());

const TIMEOUT_MARKERS: [&str; 3] = ["Request timeout", "100.0% packet loss", "100% packet loss"];

/// Measures round-trip latency with the system `ping` utility.
#[derive(Clone)]
pub struct PingProbe {
    runner: Arc<dyn CommandRunner>,
    program: String,
}

impl PingProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    pub fn command(&self, host: &str, count: u32, timeout: Duration) -> CommandSpec {
        let deadline_flag = if cfg!(target_os = "macos") { "-t" } else { "-w" };
        CommandSpec::new(&self.program, timeout + PROCESS_GRACE).args([
            "-c".to_owned(),
            count.max(1).to_string(),
            deadline_flag.to_owned(),
            timeout.as_secs().max(1).to_string(),
            host.to_owned(),
        ])
    }

    pub async fn measure(&self, host: &str, count: u32, timeout: Duration) -> ProbeResult {
        let output = self.runner.run(&self.command(host, count, timeout)).await;
        let result = interpret(&output);
        debug!(host, result = ?result, "ping");
        result
    }
}

/// Average round-trip time from ping's summary line.
pub fn parse_average_rtt(text: &str) -> Option<f64> {
    RTT_LINE
        .as_ref()?
        .captures(text)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Map a finished ping invocation to a probe result.
pub fn interpret(output: &ProcessOutput) -> ProbeResult {
    if output.exit_code == 0 {
        if let Some(avg) = parse_average_rtt(&output.stdout) {
            return ProbeResult::success(avg);
        }
    }
    if output.is_timeout()
        || TIMEOUT_MARKERS
            .iter()
            .any(|marker| output.stdout.contains(marker))
    {
        return ProbeResult::Timeout;
    }
    ProbeResult::error("Ping failed")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;
    use pretty_assertions::assert_eq;

    const MAC_OUTPUT: &str = "PING 1.1.1.1 (1.1.1.1): 56 data bytes
64 bytes from 1.1.1.1: icmp_seq=0 ttl=57 time=2.345 ms

--- 1.1.1.1 ping statistics ---
1 packets transmitted, 1 packets received, 0.0% packet loss
round-trip min/avg/max/stddev = 1.234/2.345/3.456/0.123 ms
";

    const LINUX_OUTPUT: &str = "PING 1.1.1.1 (1.1.1.1) 56(84) bytes of data.
64 bytes from 1.1.1.1: icmp_seq=1 ttl=57 time=11.8 ms

--- 1.1.1.1 ping statistics ---
1 packets transmitted, 1 received, 0% packet loss, time 0ms
rtt min/avg/max/mdev = 11.812/11.812/11.812/0.000 ms
";

    #[test]
    fn parses_bsd_summary() {
        assert_eq!(parse_average_rtt(MAC_OUTPUT), Some(2.345));
        assert_eq!(
            interpret(&ProcessOutput::success(MAC_OUTPUT)),
            ProbeResult::success(2.345)
        );
    }

    #[test]
    fn parses_linux_summary() {
        assert_eq!(parse_average_rtt(LINUX_OUTPUT), Some(11.812));
    }

    #[test]
    fn total_loss_is_timeout() {
        let output = ProcessOutput::failure(
            2,
            "--- 10.0.0.1 ping statistics ---\n1 packets transmitted, 0 packets received, 100.0% packet loss\n",
            "",
        );
        assert_eq!(interpret(&output), ProbeResult::Timeout);

        let linux = ProcessOutput::failure(1, "1 packets transmitted, 0 received, 100% packet loss, time 0ms", "");
        assert_eq!(interpret(&linux), ProbeResult::Timeout);
    }

    #[test]
    fn killed_process_is_timeout() {
        assert_eq!(
            interpret(&ProcessOutput::timeout(Duration::from_secs(4))),
            ProbeResult::Timeout
        );
    }

    #[test]
    fn other_failures_are_errors() {
        let output = ProcessOutput::failure(68, "", "ping: cannot resolve nowhere: Unknown host");
        assert_eq!(interpret(&output), ProbeResult::error("Ping failed"));
        assert_eq!(
            interpret(&ProcessOutput::success("garbage")),
            ProbeResult::error("Ping failed")
        );
        assert_eq!(
            interpret(&ProcessOutput::spawn_failed("ping", "not found")),
            ProbeResult::error("Ping failed")
        );
    }

    #[tokio::test]
    async fn measure_builds_command_line() {
        let runner = Arc::new(ScriptedRunner::new(|_| ProcessOutput::success(MAC_OUTPUT)));
        let probe = PingProbe::new(runner.clone(), "ping");

        let result = probe.measure("192.168.1.1", 3, Duration::from_secs(2)).await;
        assert_eq!(result, ProbeResult::success(2.345));

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        let spec = &calls[0];
        assert_eq!(spec.program, "ping");
        assert_eq!(spec.timeout, Duration::from_secs(4));
        assert_eq!(spec.args[0..2], ["-c", "3"]);
        assert_eq!(spec.args[3], "2");
        assert_eq!(spec.args.last().unwrap(), "192.168.1.1");
    }
}
