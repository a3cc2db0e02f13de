// ── DNS resolution latency probe ──

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tracing::debug;

use crate::model::DnsResult;
use crate::process::{CommandRunner, CommandSpec, ProcessOutput};

static QUERY_TIME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Query time: (\d+) msec").ok());

/// Times a lookup with `dig`, optionally against an explicit server.
#[derive(Clone)]
pub struct DnsProbe {
    runner: Arc<dyn CommandRunner>,
    program: String,
}

impl DnsProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    pub fn command(&self, domain: &str, server: Option<&str>, timeout: Duration) -> CommandSpec {
        let mut spec = CommandSpec::new(&self.program, timeout);
        if let Some(server) = server {
            spec = spec.arg(format!("@{server}"));
        }
        spec.args(["+noall", "+stats", domain])
    }

    pub async fn measure(&self, domain: &str, server: Option<&str>, timeout: Duration) -> DnsResult {
        let output = self
            .runner
            .run(&self.command(domain, server, timeout))
            .await;
        let result = interpret(&output, server);
        debug!(domain, server = ?server, success = result.success, query_ms = result.query_time_ms, "dns");
        result
    }
}

pub fn parse_query_time(text: &str) -> Option<f64> {
    QUERY_TIME
        .as_ref()?
        .captures(text)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Anything short of a clean exit with a query time is "unknown".
pub fn interpret(output: &ProcessOutput, server: Option<&str>) -> DnsResult {
    if output.exit_code != 0 {
        return DnsResult::unknown();
    }
    match parse_query_time(&output.stdout) {
        Some(ms) => DnsResult::resolved(server.unwrap_or(DnsResult::SYSTEM_RESOLVER), ms),
        None => DnsResult::unknown(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;
    use pretty_assertions::assert_eq;

    const DIG_STATS: &str = ";; Query time: 23 msec
;; SERVER: 192.168.1.1#53(192.168.1.1) (UDP)
;; WHEN: Sat Mar 01 10:00:00 PST 2025
;; MSG SIZE  rcvd: 55
";

    #[test]
    fn parses_query_time() {
        assert_eq!(parse_query_time(DIG_STATS), Some(23.0));
        let result = interpret(&ProcessOutput::success(DIG_STATS), None);
        assert_eq!(result, DnsResult::resolved("System DNS", 23.0));
        assert!(result.success);
    }

    #[test]
    fn explicit_server_is_reported() {
        let result = interpret(&ProcessOutput::success(DIG_STATS), Some("9.9.9.9"));
        assert_eq!(result.server, "9.9.9.9");
    }

    #[test]
    fn failures_are_unknown() {
        assert_eq!(
            interpret(&ProcessOutput::failure(9, DIG_STATS, "no servers"), None),
            DnsResult::unknown()
        );
        assert_eq!(
            interpret(&ProcessOutput::success(";; no stats here"), None),
            DnsResult::unknown()
        );
        assert_eq!(
            interpret(&ProcessOutput::timeout(Duration::from_secs(3)), None),
            DnsResult::unknown()
        );
    }

    #[tokio::test]
    async fn server_goes_first_on_the_command_line() {
        let runner = Arc::new(ScriptedRunner::new(|_| ProcessOutput::success(DIG_STATS)));
        let probe = DnsProbe::new(runner.clone(), "dig");

        probe
            .measure("apple.com", Some("1.1.1.1"), Duration::from_secs(3))
            .await;
        probe.measure("apple.com", None, Duration::from_secs(3)).await;

        let calls = runner.calls();
        assert_eq!(calls[0].args, ["@1.1.1.1", "+noall", "+stats", "apple.com"]);
        assert_eq!(calls[1].args, ["+noall", "+stats", "apple.com"]);
        assert_eq!(calls[1].timeout, Duration::from_secs(3));
    }
}
