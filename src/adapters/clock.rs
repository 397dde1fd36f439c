//! Wall-clock adapter over std monotonic time.

use std::time::{Duration, Instant};

use crate::app::ports::Clock;

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, d: Duration) {
        std::thread::sleep(d);
    }
}
