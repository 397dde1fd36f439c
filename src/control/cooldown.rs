//! Fan run-on timer.
//!
//! A cancellable, re-armable one-shot deadline: fans keep spinning for a
//! fixed delay after the motor stops, then turn off. The timer holds no
//! thread or callback of its own — the session polls it on every fine
//! sub-poll step, so "timer fired" enters the control loop as an ordinary
//! event and fan state stays under the single writer.
//!
//! Invariant: at most one pending deadline exists. `arm` replaces any
//! pending deadline (restart, never additive); `cancel` is idempotent.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct FanCooldownTimer {
    deadline: Option<Instant>,
}

impl FanCooldownTimer {
    pub fn new() -> Self {
        Self { deadline: None }
    }

    /// Schedule a fan-off `delay` from `now`, replacing any pending deadline.
    pub fn arm(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    /// Drop any pending deadline. Safe to call when nothing is pending.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns `true` exactly once when the pending deadline has passed,
    /// clearing it. Returns `false` while unarmed or still pending.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for FanCooldownTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_secs(10);

    #[test]
    fn unarmed_never_fires() {
        let mut t = FanCooldownTimer::new();
        assert!(!t.is_armed());
        assert!(!t.poll(Instant::now()));
    }

    #[test]
    fn fires_once_after_delay() {
        let mut t = FanCooldownTimer::new();
        let start = Instant::now();
        t.arm(start, DELAY);

        assert!(!t.poll(start + Duration::from_secs(9)));
        assert!(t.poll(start + Duration::from_secs(10)));
        // Cleared after firing.
        assert!(!t.is_armed());
        assert!(!t.poll(start + Duration::from_secs(60)));
    }

    #[test]
    fn rearm_restarts_from_second_arm() {
        let mut t = FanCooldownTimer::new();
        let start = Instant::now();
        t.arm(start, DELAY);
        t.arm(start + Duration::from_secs(5), DELAY);

        // The first deadline (start + 10s) must not fire.
        assert!(!t.poll(start + Duration::from_secs(12)));
        // Exactly one firing, timed from the second arm.
        assert!(t.poll(start + Duration::from_secs(15)));
        assert!(!t.poll(start + Duration::from_secs(30)));
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut t = FanCooldownTimer::new();
        t.cancel();
        t.cancel();
        assert!(!t.is_armed());

        let start = Instant::now();
        t.arm(start, DELAY);
        t.cancel();
        assert!(!t.poll(start + Duration::from_secs(60)));
    }
}
