// ── External collaborators ──
//
// The monitor asks these for the things it does not measure itself:
// the current Wi-Fi association and the default gateway.

use futures_util::future::BoxFuture;

use crate::model::WifiInfo;

/// Provides the current Wi-Fi association. Must return
/// [`WifiInfo::disconnected`] rather than fail when not associated.
pub trait WifiSource: Send + Sync {
    fn current(&self) -> BoxFuture<'_, WifiInfo>;
}

/// Provides the default IPv4 gateway, if any.
pub trait GatewaySource: Send + Sync {
    fn default_gateway(&self) -> BoxFuture<'_, Option<String>>;
}

/// Always reports "not connected". Used where no radio can be inspected.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisconnectedWifi;

impl WifiSource for DisconnectedWifi {
    fn current(&self) -> BoxFuture<'_, WifiInfo> {
        Box::pin(async { WifiInfo::disconnected() })
    }
}

/// Reports a fixed association.
#[derive(Debug, Clone)]
pub struct StaticWifi(pub WifiInfo);

impl WifiSource for StaticWifi {
    fn current(&self) -> BoxFuture<'_, WifiInfo> {
        let info = self.0.clone();
        Box::pin(async move { info })
    }
}

/// Reports a fixed gateway (or none).
#[derive(Debug, Clone, Default)]
pub struct StaticGateway(pub Option<String>);

impl GatewaySource for StaticGateway {
    fn default_gateway(&self) -> BoxFuture<'_, Option<String>> {
        let gateway = self.0.clone();
        Box::pin(async move { gateway })
    }
}
