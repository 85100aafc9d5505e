// Presence Reporter — Time Source & Bounded Waits

use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub trait Clock {
    /// Milliseconds on a clock that keeps counting through deep sleep.
    fn now_ms(&self) -> u64;

    fn sleep(&self, duration: Duration);
}

/// Wall clock.  ESP-IDF backs `gettimeofday` with the RTC timer, so it
/// survives deep sleep, unlike `esp_timer_get_time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Satisfied,
    TimedOut,
}

/// Poll `predicate` every `poll_interval` until it holds or `timeout` has
/// elapsed.  The predicate is always evaluated once more at the deadline.
pub fn await_condition<C, P>(
    clock: &C,
    mut predicate: P,
    poll_interval: Duration,
    timeout: Duration,
) -> WaitOutcome
where
    C: Clock + ?Sized,
    P: FnMut() -> bool,
{
    let start = clock.now_ms();
    let timeout_ms = timeout.as_millis() as u64;

    loop {
        if predicate() {
            return WaitOutcome::Satisfied;
        }

        let elapsed = clock.now_ms().saturating_sub(start);
        if elapsed >= timeout_ms {
            return WaitOutcome::TimedOut;
        }

        // Never oversleep the deadline.
        let remaining = Duration::from_millis(timeout_ms - elapsed);
        clock.sleep(poll_interval.min(remaining));
    }
}
