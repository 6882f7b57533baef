use core::ops::AddAssign;

use num_traits::{Float, FromPrimitive};

use super::FeedbackController;

#[derive(Clone, Copy)]
pub struct PidGains<T: Float + FromPrimitive + AddAssign> {
    kp: T, // Proportional gain
    ki: T, // Integral gain
    kd: T, // Derivative gain
}

#[derive(Clone)]
pub struct Pid<T: Float + FromPrimitive + AddAssign> {
    gains: PidGains<T>,
    prev_error: T, // Previous error for derivative calculation
    integral: T,   // Integral sum for integral term
    windup_range: T,          // Range where integral starts accumulating
    reset_on_sign_flip: bool, // Whether or not to reset integral when sign flips
}

impl<T: Float + FromPrimitive + AddAssign> Pid<T> {
    pub fn new(kp: T, ki: T, kd: T, windup_range: T, reset_on_sign_flip: bool) -> Self {
        Pid {
            gains: PidGains { kp, ki, kd },
            prev_error: T::zero(),
            integral: T::zero(),
            reset_on_sign_flip,
            windup_range,
        }
    }
}

impl<T: Float + FromPrimitive + AddAssign> FeedbackController<T> for Pid<T> {
    fn update(&mut self, error: T, delta_time: T) -> T {
        self.integral += error * delta_time;
        if error.signum() != self.prev_error.signum() && self.reset_on_sign_flip
            || self.windup_range != T::zero() && error.abs() > self.windup_range
        {
            self.integral = T::zero();
        }
        // The first update has no previous sample to differentiate against.
        let derivative: T = if delta_time > T::zero() {
            (error - self.prev_error) / delta_time
        } else {
            T::zero()
        };
        let output: T =
            self.gains.kp * error + self.gains.ki * self.integral + self.gains.kd * derivative;
        self.prev_error = error;
        output
    }

    fn reset(&mut self) {
        self.integral = T::zero();
        self.prev_error = T::zero();
    }
}
