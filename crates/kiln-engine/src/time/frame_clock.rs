use std::time::{Duration, Instant};

/// Timing snapshot handed to tick callbacks.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,
    /// Seconds since the clock started (sum of clamped deltas).
    pub elapsed: f64,
    pub now: Instant,
    /// Monotonic tick counter, starting at 0.
    pub frame_index: u64,
}

impl FrameTime {
    /// Snapshot for a fixed step, used before the first tick and in tests.
    pub fn fixed(dt: f32, frame_index: u64) -> Self {
        Self {
            dt,
            elapsed: dt as f64 * frame_index as f64,
            now: Instant::now(),
            frame_index,
        }
    }
}

/// Produces [`FrameTime`] snapshots for the logic loop.
///
/// Delta time is clamped so a debugger pause or a long stall does not feed a huge
/// step into simulation code.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    elapsed: f64,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            elapsed: 0.0,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Resets the baseline so the next delta does not include time spent waiting.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last).clamp(self.dt_min, self.dt_max);
        self.last = now;
        self.elapsed += dt.as_secs_f64();

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: self.elapsed,
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn frame_index_is_monotonic_from_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick().frame_index, 0);
        assert_eq!(clock.tick().frame_index, 1);
        assert_eq!(clock.tick().frame_index, 2);
    }

    #[test]
    fn dt_is_clamped_to_max() {
        let mut clock = FrameClock::with_clamps(Duration::ZERO, Duration::from_millis(5));
        clock.tick();
        thread::sleep(Duration::from_millis(20));
        let ft = clock.tick();
        assert!(ft.dt <= 0.005 + f32::EPSILON);
    }

    #[test]
    fn dt_is_clamped_to_min() {
        let mut clock = FrameClock::with_clamps(Duration::from_millis(1), Duration::from_secs(1));
        let ft = clock.tick();
        assert!(ft.dt >= 0.001 - f32::EPSILON);
    }
}
