// ── Wi-Fi association from the Linux wireless extensions ──
//
// Signal and noise come from /proc/net/wireless; SSID, BSSID and channel
// from `iwgetid`. Anything unreadable degrades to "not connected".

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tracing::debug;

use whyfi_core::{CommandRunner, CommandSpec, WifiBand, WifiInfo, WifiSource};

const PROC_WIRELESS: &str = "/proc/net/wireless";
const IWGETID_TIMEOUT: Duration = Duration::from_secs(2);

/// Floor reported when the driver has no noise figure.
const DEFAULT_NOISE_DBM: i32 = -95;

/// One interface row of /proc/net/wireless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WirelessLine {
    pub interface: String,
    pub level_dbm: i32,
    pub noise_dbm: Option<i32>,
}

pub struct LinuxWifi {
    runner: Arc<dyn CommandRunner>,
    proc_path: PathBuf,
}

impl LinuxWifi {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            proc_path: PathBuf::from(PROC_WIRELESS),
        }
    }

    async fn iwgetid(&self, interface: &str, flag: Option<&str>) -> Option<String> {
        let mut spec = CommandSpec::new("iwgetid", IWGETID_TIMEOUT).arg(interface);
        if let Some(flag) = flag {
            spec = spec.arg(flag);
        }
        let output = self.runner.run(&spec.arg("--raw")).await;
        let value = output.stdout.trim();
        (output.is_success() && !value.is_empty()).then(|| value.to_owned())
    }

    async fn read(&self) -> WifiInfo {
        let table = match tokio::fs::read_to_string(&self.proc_path).await {
            Ok(table) => table,
            Err(e) => {
                debug!(error = %e, path = %self.proc_path.display(), "no wireless table");
                return WifiInfo::disconnected();
            }
        };
        let Some(line) = parse_wireless(&table).into_iter().next() else {
            return WifiInfo::disconnected();
        };

        let ssid = self
            .iwgetid(&line.interface, None)
            .await
            .unwrap_or_else(|| line.interface.clone());
        let bssid = self
            .iwgetid(&line.interface, Some("--ap"))
            .await
            .unwrap_or_default();
        let channel = self
            .iwgetid(&line.interface, Some("--channel"))
            .await
            .and_then(|c| c.parse::<u32>().ok())
            .unwrap_or(0);

        WifiInfo {
            ssid,
            bssid,
            rssi: line.level_dbm,
            noise: line.noise_dbm.unwrap_or(DEFAULT_NOISE_DBM),
            channel,
            band: WifiBand::from_channel(channel),
            transmit_rate: 0.0,
        }
    }
}

impl WifiSource for LinuxWifi {
    fn current(&self) -> BoxFuture<'_, WifiInfo> {
        Box::pin(self.read())
    }
}

/// Parse the interface rows of /proc/net/wireless, skipping the two
/// header lines and any row without a usable level.
///
/// ```text
/// Inter-| sta-|   Quality        |   Discarded packets  ...
///  face | tus | link level noise |  nwid  crypt   frag  ...
///  wlan0: 0000   54.  -56.  -256        0      0      0 ...
/// ```
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
pub fn parse_wireless(table: &str) -> Vec<WirelessLine> {
    let number = |field: &str| field.trim_end_matches('.').parse::<f64>().ok();

    table
        .lines()
        .filter_map(|line| {
            let (interface, rest) = line.split_once(':')?;
            let fields: Vec<&str> = rest.split_whitespace().collect();
            // status, link, level, noise
            let level = number(fields.get(2)?)?;
            let noise = fields.get(3).and_then(|f| number(f));
            if level >= 0.0 {
                return None;
            }
            Some(WirelessLine {
                interface: interface.trim().to_owned(),
                level_dbm: level as i32,
                noise_dbm: noise.filter(|n| *n < 0.0 && *n > -256.0).map(|n| n as i32),
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TABLE: &str = "\
Inter-| sta-|   Quality        |   Discarded packets               | Missed | WE
 face | tus | link level noise |  nwid  crypt   frag  retry   misc | beacon | 22
wlp2s0: 0000   54.  -56.  -256        0      0      0      0      0        0
";

    #[test]
    fn parses_interface_row() {
        assert_eq!(
            parse_wireless(TABLE),
            vec![WirelessLine {
                interface: "wlp2s0".into(),
                level_dbm: -56,
                noise_dbm: None,
            }]
        );
    }

    #[test]
    fn keeps_real_noise_figure() {
        let table = "wlan0: 0000   60.  -48.  -92.   0 0 0 0 0 0\n";
        let lines = parse_wireless(table);
        assert_eq!(lines[0].noise_dbm, Some(-92));
    }

    #[test]
    fn header_only_means_disconnected() {
        let headers: String = TABLE.lines().take(2).collect::<Vec<_>>().join("\n");
        assert!(parse_wireless(&headers).is_empty());
    }

    #[test]
    fn non_dbm_levels_are_skipped() {
        // some drivers report a relative 0-100 level instead of dBm
        assert!(parse_wireless("wlan0: 0000   70.  70.  0   0 0 0 0 0 0\n").is_empty());
    }
}
