use std::{cell::Cell, time::Instant};

/// A monotonic time source, in seconds.
///
/// Commands never read wall-clock time directly; they borrow a clock so
/// dwell and ramp timing can be driven by a simulated time source.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Clock backed by [`std::time::Instant`], anchored at construction.
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// A manually advanced clock for simulation and testing.
pub struct ManualClock {
    seconds: Cell<f64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            seconds: Cell::new(0.0),
        }
    }

    pub fn set(&self, seconds: f64) {
        self.seconds.set(seconds);
    }

    pub fn advance(&self, seconds: f64) {
        self.seconds.set(self.seconds.get() + seconds);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.seconds.get()
    }
}
