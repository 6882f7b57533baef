/// Tracks how long a feedback loop has stayed continuously on target.
///
/// Holds the timestamp of the most recent off-target observation; the
/// dwell time is simply `now` minus that timestamp. Any off-target
/// observation resets the dwell to zero.
pub struct SettleGuard {
    last_time_not_on_target: f64,
}

impl SettleGuard {
    pub fn new() -> Self {
        Self {
            last_time_not_on_target: 0.0,
        }
    }

    /// Starts a fresh dwell window at `now`. Called on activation.
    pub fn arm(&mut self, now: f64) {
        self.last_time_not_on_target = now;
    }

    /// Returns whether the loop has been on target for at least
    /// `wait_time` seconds. A `wait_time` of 0 finishes the instant
    /// `on_target` is first observed.
    pub fn check(&mut self, on_target: bool, now: f64, wait_time: f64) -> bool {
        if !on_target {
            self.last_time_not_on_target = now;
        }
        now - self.last_time_not_on_target >= wait_time
    }
}

impl Default for SettleGuard {
    fn default() -> Self {
        Self::new()
    }
}
