// ── Wi-Fi snapshot domain types ──
//
// The monitor never inspects radios itself; a `WifiSource` hands it a
// `WifiInfo` each cycle. These types only interpret that record.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::config::SignalThresholds;

/// Radio band derived from the channel number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum WifiBand {
    #[strum(to_string = "2.4 GHz")]
    Band2_4GHz,
    #[strum(to_string = "5 GHz")]
    Band5GHz,
    #[strum(to_string = "6 GHz")]
    Band6GHz,
    #[strum(to_string = "Unknown")]
    Unknown,
}

impl WifiBand {
    pub fn from_channel(channel: u32) -> Self {
        match channel {
            1..=14 => Self::Band2_4GHz,
            32..=177 => Self::Band5GHz,
            178..=233 => Self::Band6GHz,
            _ => Self::Unknown,
        }
    }
}

/// Signal strength rating from RSSI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum SignalQuality {
    Excellent,
    Good,
    Fair,
    Poor,
    #[strum(to_string = "No Signal")]
    NoSignal,
}

impl SignalQuality {
    /// Positive RSSI values are not physical readings and rate as no signal.
    pub fn from_rssi(rssi: i32, thresholds: &SignalThresholds) -> Self {
        if rssi > 0 {
            Self::NoSignal
        } else if rssi >= thresholds.excellent {
            Self::Excellent
        } else if rssi >= thresholds.good {
            Self::Good
        } else if rssi >= thresholds.fair {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

/// Snapshot of the current Wi-Fi association.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WifiInfo {
    pub ssid: String,
    pub bssid: String,
    /// dBm.
    pub rssi: i32,
    /// Noise floor, dBm.
    pub noise: i32,
    pub channel: u32,
    pub band: WifiBand,
    /// Mbps.
    pub transmit_rate: f64,
}

impl WifiInfo {
    pub const DISCONNECTED_SSID: &'static str = "Not Connected";

    /// The well-known "not associated" sentinel.
    pub fn disconnected() -> Self {
        Self {
            ssid: Self::DISCONNECTED_SSID.into(),
            bssid: String::new(),
            rssi: -100,
            noise: -100,
            channel: 0,
            band: WifiBand::Unknown,
            transmit_rate: 0.0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.ssid != Self::DISCONNECTED_SSID
    }

    pub fn snr(&self) -> i32 {
        self.rssi - self.noise
    }

    pub fn signal_quality(&self, thresholds: &SignalThresholds) -> SignalQuality {
        if !self.is_connected() {
            return SignalQuality::NoSignal;
        }
        SignalQuality::from_rssi(self.rssi, thresholds)
    }
}

impl Default for WifiInfo {
    fn default() -> Self {
        Self::disconnected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_from_channel() {
        assert_eq!(WifiBand::from_channel(6), WifiBand::Band2_4GHz);
        assert_eq!(WifiBand::from_channel(36), WifiBand::Band5GHz);
        assert_eq!(WifiBand::from_channel(181), WifiBand::Band6GHz);
        assert_eq!(WifiBand::from_channel(0), WifiBand::Unknown);
        assert_eq!(WifiBand::from_channel(20), WifiBand::Unknown);
    }

    #[test]
    fn signal_quality_tiers() {
        let t = SignalThresholds::default();
        assert_eq!(SignalQuality::from_rssi(-45, &t), SignalQuality::Excellent);
        assert_eq!(SignalQuality::from_rssi(-50, &t), SignalQuality::Excellent);
        assert_eq!(SignalQuality::from_rssi(-55, &t), SignalQuality::Good);
        assert_eq!(SignalQuality::from_rssi(-70, &t), SignalQuality::Fair);
        assert_eq!(SignalQuality::from_rssi(-71, &t), SignalQuality::Poor);
        assert_eq!(SignalQuality::from_rssi(5, &t), SignalQuality::NoSignal);
    }

    #[test]
    fn disconnected_sentinel() {
        let info = WifiInfo::disconnected();
        assert!(!info.is_connected());
        assert_eq!(info.snr(), 0);
        assert_eq!(
            info.signal_quality(&SignalThresholds::default()),
            SignalQuality::NoSignal
        );
    }
}
