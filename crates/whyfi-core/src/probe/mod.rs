// ── Probe adapters ──
//
// Each adapter builds a command line, runs it through a `CommandRunner`
// and folds the outcome into a typed result. Nothing here returns `Err`.

pub mod dns;
pub mod gateway;
pub mod ping;
pub mod speed;

pub use dns::DnsProbe;
pub use gateway::RouteTableGateway;
pub use ping::PingProbe;
pub use speed::SpeedTestProbe;
