use std::time::{Duration, Instant};

/// Decides when the logic loop may run its next tick.
///
/// Deadlines advance by whole frame durations so the average rate holds; after a
/// stall longer than one frame the schedule is rebased instead of bursting to catch up.
#[derive(Debug, Clone)]
pub struct FramePacer {
    frame: Duration,
    next: Instant,
}

impl FramePacer {
    /// `hz == 0` runs uncapped.
    pub fn new(hz: u32) -> Self {
        let frame = if hz == 0 { Duration::ZERO } else { Duration::from_secs(1) / hz };
        Self { frame, next: Instant::now() }
    }

    #[inline]
    pub fn frame_duration(&self) -> Duration {
        self.frame
    }

    /// Returns `true` (and schedules the following tick) once the current deadline
    /// has passed.
    pub fn ready(&mut self) -> bool {
        self.ready_at(Instant::now())
    }

    /// Time left until the next deadline.
    pub fn remaining(&self) -> Duration {
        self.next.saturating_duration_since(Instant::now())
    }

    fn ready_at(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        self.next += self.frame;
        if self.next <= now {
            self.next = now + self.frame;
        }
        true
    }
}
