use std::sync::Mutex;

use log::trace;

use crate::utils::math::delta_clamp;

struct MotionState {
    current_speed: f64,
    max_change: f64,
}

/// A single-axis actuator that moves within a limitation, or without one.
///
/// Every requested speed passes, in order, an admissibility predicate
/// (a veto leaves the subsystem at its previous speed), a clamp to
/// [-1, 1], and a per-call rate limit of `max_change`. The speed state
/// sits behind a mutex because a feedback loop's output callback may
/// arrive from a different execution context than the scheduler tick.
pub struct BasicSubsystem {
    can_move: Box<dyn Fn(f64) -> bool + Send + Sync>,
    speed_consumer: Box<dyn Fn(f64) + Send + Sync>,
    state: Mutex<MotionState>,
}

impl BasicSubsystem {
    pub fn new(
        speed_consumer: Box<dyn Fn(f64) + Send + Sync>,
        can_move: Box<dyn Fn(f64) -> bool + Send + Sync>,
    ) -> Self {
        Self {
            can_move,
            speed_consumer,
            state: Mutex::new(MotionState {
                current_speed: 0.0,
                max_change: 1.0,
            }),
        }
    }

    /// A subsystem whose movement is not limited by a predicate.
    pub fn unrestricted(speed_consumer: Box<dyn Fn(f64) + Send + Sync>) -> Self {
        Self::new(speed_consumer, Box::new(|_| true))
    }

    /// Moves at `speed` if the admissibility predicate allows it.
    /// Vetoed requests are a policy outcome, not an error: the call is
    /// a no-op and the current speed stays unchanged.
    pub fn move_at(&self, speed: f64) {
        if !(self.can_move)(speed) {
            trace!("requested speed {speed} vetoed");
            return;
        }
        let speed = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            let speed = speed.clamp(-1.0, 1.0);
            let speed = delta_clamp(speed, state.current_speed, state.max_change);
            state.current_speed = speed;
            speed
        };
        // The consumer runs outside the lock, so it may read back
        // `speed()` or issue further moves.
        (self.speed_consumer)(speed);
    }

    pub fn stop(&self) {
        self.move_at(0.0);
    }

    pub fn speed(&self) -> f64 {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .current_speed
    }

    pub fn max_change(&self) -> f64 {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .max_change
    }

    /// Sets the largest per-call speed step this subsystem tolerates.
    pub fn set_max_change(&self, max_change: f64) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .max_change = max_change;
    }
}
