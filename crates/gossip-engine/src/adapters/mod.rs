//! Latency model adapters.

use std::time::Duration;

use rand::Rng;

use crate::ports::outbound::LatencyModel;

/// Delay drawn uniformly from an inclusive range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformLatency {
    min: Duration,
    max: Duration,
}

impl UniformLatency {
    /// Bounds are swapped if given in the wrong order.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    pub fn bounds(&self) -> (Duration, Duration) {
        (self.min, self.max)
    }
}

impl Default for UniformLatency {
    /// 40ms to 600ms.
    fn default() -> Self {
        Self::from_millis(40, 600)
    }
}

impl LatencyModel for UniformLatency {
    fn sample(&self) -> Duration {
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

/// Constant delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixedLatency(pub Duration);

impl LatencyModel for FixedLatency {
    fn sample(&self) -> Duration {
        self.0
    }
}
