use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Cancellable recurring frame schedule.
///
/// `next()` is awaited between iterations only, so cancelling never
/// interrupts a frame in progress. Late ticks are delayed rather than
/// bursted, which keeps iterations from overlapping or piling up.
pub struct FrameTicker {
    interval: Interval,
    token: CancellationToken,
    ticks: u64,
}

impl FrameTicker {
    pub fn new(period: Duration, token: CancellationToken) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval,
            token,
            ticks: 0,
        }
    }

    /// Wait for the next frame slot. Returns false once cancelled.
    pub async fn next(&mut self) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => false,
            _ = self.interval.tick() => {
                self.ticks += 1;
                true
            }
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
