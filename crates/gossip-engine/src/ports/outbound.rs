//! Outbound ports (SPI) for the gossip engine.

use std::time::Duration;

/// Source of simulated network/compute latency.
///
/// Node tasks sleep for one sample before handling every push and every
/// pull request. The sleep is not interruptible.
pub trait LatencyModel: Send + Sync + 'static {
    /// Draw the next processing delay.
    fn sample(&self) -> Duration;
}
