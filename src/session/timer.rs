use std::cell::Cell;
use std::rc::Rc;

/// Source of epoch-millisecond timestamps
pub trait Clock {
    fn now(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock. Clones share the same time, so a test can keep one
/// handle while the session owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<i64>>,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        ManualClock {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.set(now);
    }

    pub fn advance(&self, ms: i64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.get()
    }
}

/// One-shot deadline owned by whoever arms it. Dropping or cancelling it
/// guarantees it never fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<i64>,
}

impl Timer {
    pub fn arm(&mut self, now: i64, after_ms: i64) {
        self.deadline = Some(now + after_ms);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once, on the first poll at or past the deadline.
    pub fn poll(&mut self, now: i64) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_at_deadline() {
        let mut t = Timer::default();
        t.arm(100, 800);
        assert!(!t.poll(899));
        assert!(t.poll(900));
        assert!(!t.poll(2000));
        assert!(!t.is_armed());
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut t = Timer::default();
        t.arm(0, 10);
        t.cancel();
        assert!(!t.poll(100));
    }

    #[test]
    fn manual_clock_is_shared() {
        let clock = ManualClock::new(5);
        let other = clock.clone();
        clock.advance(10);
        assert_eq!(other.now(), 15);
    }
}
