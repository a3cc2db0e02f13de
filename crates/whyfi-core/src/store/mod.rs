// ── Bounded history storage ──
//
// Ring buffers and the statistics derived from them.

mod metrics;
mod ring;

pub use metrics::{LatencyPoint, MetricsStore, SignalSample, SignalStats};
pub use ring::RingBuffer;
