//! Wall-clock aligned tick stream
//!
//! Ticks land on whole multiples of the interval since the Unix epoch, so with
//! a one second interval every flush happens just after a second boundary.
//! A tick is never scheduled closer than half an interval away; if the next
//! boundary is nearer than that, the one after it is used.

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::{Sleep, sleep};

/// Delay from `now` (time since the epoch) to the next aligned boundary
///
/// Result is always in `[interval / 2, interval * 3 / 2)`. A zero interval
/// yields zero.
pub fn aligned_delay(now: Duration, interval: Duration) -> Duration {
    let interval_ns = interval.as_nanos();
    if interval_ns == 0 {
        return Duration::ZERO;
    }
    let remainder = now.as_nanos() % interval_ns;
    let mut delay = interval_ns - remainder;
    if delay < interval_ns / 2 {
        delay += interval_ns;
    }
    // delay < 2 * interval, which fits in u64 nanos for any sane interval
    Duration::from_nanos(u64::try_from(delay).unwrap_or(u64::MAX))
}

/// [`aligned_delay`] against the current wall clock
pub fn delay_until_next_tick(interval: Duration) -> Duration {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    aligned_delay(now, interval)
}

pin_project! {
    /// Endless stream yielding `()` at each aligned boundary
    ///
    /// The next delay is computed from the wall clock after each tick, so a
    /// slow consumer skips boundaries instead of bursting to catch up.
    ///
    /// Holds a tokio `Sleep` and is therefore `!Unpin`: pin it (`std::pin::pin!`)
    /// before calling `StreamExt::next`.
    pub struct AlignedTicks {
        interval: Duration,
        #[pin]
        sleep: Sleep,
    }
}

impl AlignedTicks {
    pub fn new(interval: Duration) -> Self {
        Self { interval, sleep: sleep(delay_until_next_tick(interval)) }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Stream for AlignedTicks {
    type Item = ();

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        ready!(this.sleep.as_mut().poll(cx));

        let next = tokio::time::Instant::now() + delay_until_next_tick(*this.interval);
        this.sleep.reset(next);
        Poll::Ready(Some(()))
    }
}
