// ── Default gateway discovery from the routing table ──

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tracing::debug;

use crate::process::{CommandRunner, CommandSpec};
use crate::source::GatewaySource;

const ROUTE_TIMEOUT: Duration = Duration::from_secs(5);

/// iproute2 fallback for hosts without net-tools.
const IP_PROGRAM: &str = "ip";
const IP_ROUTE_ARGS: [&str; 3] = ["route", "show", "default"];

/// Reads the default IPv4 gateway from `netstat -rn` output, falling back
/// to `ip route show default` when that yields nothing.
#[derive(Clone)]
pub struct RouteTableGateway {
    runner: Arc<dyn CommandRunner>,
    program: String,
}

impl RouteTableGateway {
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    pub async fn find(&self) -> Option<String> {
        if !self.is_iproute2() {
            let netstat = CommandSpec::new(&self.program, ROUTE_TIMEOUT).arg("-rn");
            if let Some(gateway) = self.query(&netstat).await {
                return Some(gateway);
            }
        }
        let program = if self.is_iproute2() {
            self.program.as_str()
        } else {
            IP_PROGRAM
        };
        let ip_route = CommandSpec::new(program, ROUTE_TIMEOUT).args(IP_ROUTE_ARGS);
        self.query(&ip_route).await
    }

    /// Whether the configured program is `ip` itself rather than netstat.
    fn is_iproute2(&self) -> bool {
        std::path::Path::new(&self.program)
            .file_name()
            .is_some_and(|name| name == IP_PROGRAM)
    }

    async fn query(&self, spec: &CommandSpec) -> Option<String> {
        let output = self.runner.run(spec).await;
        if output.exit_code != 0 {
            debug!(program = %spec.program, exit_code = output.exit_code, "route table unavailable");
            return None;
        }
        parse_default_gateway(&output.stdout)
    }
}

impl GatewaySource for RouteTableGateway {
    fn default_gateway(&self) -> BoxFuture<'_, Option<String>> {
        Box::pin(self.find())
    }
}

/// First IPv4 default route in a routing table dump.
///
/// Understands BSD `default 192.168.1.1 UGScg en0`, Linux netstat
/// `0.0.0.0 192.168.1.1 0.0.0.0 UG ...` and `ip route` style
/// `default via 192.168.1.1 dev wlan0`. IPv6 routes are skipped.
pub fn parse_default_gateway(table: &str) -> Option<String> {
    table.lines().find_map(|line| {
        let mut tokens = line.split_whitespace();
        let destination = tokens.next()?;
        if destination != "default" && destination != "0.0.0.0" {
            return None;
        }
        let mut gateway = tokens.next()?;
        if gateway == "via" {
            gateway = tokens.next()?;
        }
        gateway
            .parse::<Ipv4Addr>()
            .ok()
            .filter(|ip| !ip.is_unspecified())
            .map(|ip| ip.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessOutput;
    use crate::testing::ScriptedRunner;
    use pretty_assertions::assert_eq;

    const MACOS_TABLE: &str = "Routing tables

Internet:
Destination        Gateway            Flags               Netif Expire
default            192.168.1.1        UGScg                 en0
127                127.0.0.1          UCS                   lo0

Internet6:
Destination                             Gateway                                 Flags               Netif Expire
default                                 fe80::1%en0                             UGcg                  en0
";

    const LINUX_TABLE: &str = "Kernel IP routing table
Destination     Gateway         Genmask         Flags   MSS Window  irtt Iface
0.0.0.0         10.0.0.1        0.0.0.0         UG        0 0          0 wlan0
10.0.0.0        0.0.0.0         255.255.255.0   U         0 0          0 wlan0
";

    #[test]
    fn finds_bsd_default_route() {
        assert_eq!(
            parse_default_gateway(MACOS_TABLE),
            Some("192.168.1.1".to_owned())
        );
    }

    #[test]
    fn finds_linux_default_route() {
        assert_eq!(parse_default_gateway(LINUX_TABLE), Some("10.0.0.1".to_owned()));
        assert_eq!(
            parse_default_gateway("default via 172.16.0.1 dev eth0 proto dhcp"),
            Some("172.16.0.1".to_owned())
        );
    }

    #[test]
    fn ipv6_only_table_has_no_gateway() {
        assert_eq!(parse_default_gateway("default fe80::1%en0 UGcg en0"), None);
        assert_eq!(parse_default_gateway(""), None);
    }

    #[tokio::test]
    async fn failed_command_yields_none() {
        let runner = Arc::new(ScriptedRunner::new(|spec| {
            ProcessOutput::spawn_failed(&spec.program, "not found")
        }));
        let source = RouteTableGateway::new(runner.clone(), "netstat");
        assert_eq!(source.default_gateway().await, None);
        assert_eq!(runner.count("netstat"), 1);
        assert_eq!(runner.count("ip"), 1);
    }

    #[tokio::test]
    async fn netstat_answer_skips_ip_route() {
        let runner = Arc::new(ScriptedRunner::new(|_| ProcessOutput::success(LINUX_TABLE)));
        let source = RouteTableGateway::new(runner.clone(), "netstat");
        assert_eq!(source.default_gateway().await, Some("10.0.0.1".to_owned()));
        assert_eq!(runner.count("ip"), 0);
    }

    #[tokio::test]
    async fn missing_netstat_falls_back_to_ip_route() {
        let runner = Arc::new(ScriptedRunner::new(|spec| match spec.program.as_str() {
            "ip" => ProcessOutput::success(
                "default via 192.168.0.254 dev wlp2s0 proto dhcp metric 600\n",
            ),
            other => ProcessOutput::spawn_failed(other, "No such file or directory"),
        }));
        let source = RouteTableGateway::new(runner.clone(), "netstat");
        assert_eq!(
            source.default_gateway().await,
            Some("192.168.0.254".to_owned())
        );

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args, ["-rn"]);
        assert_eq!(calls[1].program, "ip");
        assert_eq!(calls[1].args, ["route", "show", "default"]);
    }

    #[tokio::test]
    async fn configured_ip_runs_route_show_directly() {
        let runner = Arc::new(ScriptedRunner::new(|_| {
            ProcessOutput::success("default via 10.1.1.1 dev eth0\n")
        }));
        let source = RouteTableGateway::new(runner.clone(), "/usr/sbin/ip");
        assert_eq!(source.default_gateway().await, Some("10.1.1.1".to_owned()));

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "/usr/sbin/ip");
        assert_eq!(calls[0].args, ["route", "show", "default"]);
    }
}
